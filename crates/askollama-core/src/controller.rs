use std::sync::Arc;

use askollama_config::host::HostConfig;
use askollama_config::overlay::OverlayConfig;
use askollama_host::{EventSource, HostCommandService, SubscriptionError};
use askollama_types::{CommandKind, CommandOutcome, HostEvent, UserIntent};
use kanal::{AsyncReceiver, AsyncSender};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::command;
use crate::session::{CompletionMismatch, DispatchError, OverlaySession};
use crate::subscriptions::EventSubscriptions;
use crate::view::OverlayView;

/// Everything the transition loop consumes, in one ordered queue
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Host(HostEvent),
    Intent(UserIntent),
    Completed(CommandCompletion),
}

#[derive(Debug, Clone)]
pub struct CommandCompletion {
    pub id: Uuid,
    pub outcome: CommandOutcome,
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Completion(#[from] CompletionMismatch),
}

/// Owns the overlay session and sequences host commands against it
///
/// Command tasks report back on a private completion channel, so the shared
/// event queue stays open only while someone outside the controller holds a
/// sender for it.
pub struct OverlayController {
    session: OverlaySession,
    host: Arc<dyn HostCommandService>,
    completions: (AsyncSender<CommandCompletion>, AsyncReceiver<CommandCompletion>),
    view_tx: watch::Sender<OverlayView>,
    waiting_placeholder: String,
    subscriptions: Option<EventSubscriptions>,
}

impl OverlayController {
    pub fn new(
        config: &OverlayConfig,
        host: Arc<dyn HostCommandService>,
    ) -> (Self, watch::Receiver<OverlayView>) {
        let session = OverlaySession::new(config);
        let (view_tx, view_rx) =
            watch::channel(OverlayView::from_session(&session, &config.waiting_placeholder));

        let controller = Self {
            session,
            host,
            completions: kanal::unbounded_async(),
            view_tx,
            waiting_placeholder: config.waiting_placeholder.clone(),
            subscriptions: None,
        };

        (controller, view_rx)
    }

    pub fn session(&self) -> &OverlaySession {
        &self.session
    }

    /// Completions of dispatched commands, in the order they finished
    pub(crate) fn completions(&self) -> AsyncReceiver<CommandCompletion> {
        self.completions.1.clone()
    }

    /// Subscribe to the host's event channels, forwarding onto `queue_tx`
    ///
    /// Failures are returned, not raised.
    pub fn attach(
        &mut self,
        source: &dyn EventSource,
        config: &HostConfig,
        queue_tx: AsyncSender<ControllerEvent>,
    ) -> &[SubscriptionError] {
        let subscriptions = EventSubscriptions::open(source, config, queue_tx);
        self.subscriptions.insert(subscriptions).failures()
    }

    /// Release the host subscriptions
    pub fn detach(&mut self) {
        if let Some(mut subscriptions) = self.subscriptions.take() {
            subscriptions.close();
            tracing::info!("Host event subscriptions released");
        }
    }

    /// Apply one event to the session and publish the resulting view
    ///
    /// # Panics
    ///
    /// Intents that start a host command spawn a task, so this must be called
    /// from within a Tokio runtime.
    pub fn handle(&mut self, event: ControllerEvent) -> Result<(), ControllerError> {
        let result = match event {
            ControllerEvent::Host(event) => {
                tracing::debug!("host event: {:?}", std::mem::discriminant(&event));
                self.session.apply_host_event(event);
                Ok(())
            }
            ControllerEvent::Intent(intent) => self.handle_intent(intent),
            ControllerEvent::Completed(CommandCompletion { id, outcome }) => {
                tracing::info!("[{id}] {} completed (ok: {})", outcome.kind(), outcome.is_success());
                self.session.complete(id, outcome).map_err(ControllerError::from)
            }
        };

        self.publish();
        result
    }

    fn handle_intent(&mut self, intent: UserIntent) -> Result<(), ControllerError> {
        if let Some(kind) = intent.command_kind() {
            return self.dispatch(kind).map_err(ControllerError::from);
        }

        match intent {
            UserIntent::Close => {
                if !self.session.close() {
                    tracing::debug!("close ignored, overlay already hidden");
                }
            }
            UserIntent::EditPrompt(text) => self.session.edit_prompt(text),
            _ => {}
        }
        Ok(())
    }

    /// Start a host command unless one is already in flight
    fn dispatch(&mut self, kind: CommandKind) -> Result<(), DispatchError> {
        let (id, request) = self.session.begin(kind)?;
        tracing::info!("[{id}] dispatching {kind}");

        let host = self.host.clone();
        let completions = self.completions.0.clone();
        tokio::spawn(async move {
            let outcome = command::execute(host.as_ref(), request).await;
            if let Err(e) = completions.send(CommandCompletion { id, outcome }).await {
                tracing::warn!("[{id}] controller gone before {kind} completed: {e}");
            }
        });

        Ok(())
    }

    fn publish(&self) {
        self.view_tx.send_replace(OverlayView::from_session(
            &self.session,
            &self.waiting_placeholder,
        ));
    }

    /// Consume the queue until cancelled or every outside sender is gone,
    /// then release subscriptions
    pub async fn run(
        mut self,
        queue_rx: AsyncReceiver<ControllerEvent>,
        cancel: CancellationToken,
    ) -> OverlaySession {
        tracing::info!("[CONTROLLER] Overlay loop started");
        let completions = self.completions();

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("[CONTROLLER] Shutdown requested");
                    break;
                }
                Ok(completion) = completions.recv() => ControllerEvent::Completed(completion),
                event = queue_rx.recv() => match event {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::info!("[CONTROLLER] Event queue closed: {e}");
                        break;
                    }
                },
            };

            if let Err(e) = self.handle(event) {
                tracing::warn!("[CONTROLLER] {e}");
            }
        }

        if let Some(kind) = self.session.pending_command() {
            tracing::warn!("[CONTROLLER] Exiting with {kind} still in flight");
        }
        self.detach();
        std::mem::take(&mut self.session)
    }
}

impl Drop for OverlayController {
    fn drop(&mut self) {
        self.detach();
    }
}
