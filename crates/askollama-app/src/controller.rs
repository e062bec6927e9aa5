use std::sync::Arc;

use askollama_config::Config;
use askollama_core::{ControllerEvent, OverlayController};
use askollama_host::{EventSource, HostCommandService};
use kanal::{AsyncReceiver, AsyncSender};
use tokio::task::JoinSet;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::console;

/// Centralized channel management
pub struct ChannelSet {
    /// Host events, user intents and command completions, in arrival order
    pub queue: (AsyncSender<ControllerEvent>, AsyncReceiver<ControllerEvent>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            // Unbounded so subscription callbacks never drop or block
            queue: kanal::unbounded_async(),
        }
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    config: Config,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(config: Config) -> Self {
        Self {
            channels: ChannelSet::new(),
            config,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn spawn_tasks(
        &self,
        host: Arc<dyn HostCommandService>,
        events: &dyn EventSource,
    ) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();

        let (mut controller, view_rx) = OverlayController::new(&self.config.overlay, host);

        let failures = controller.attach(events, &self.config.host, self.channels.queue.0.clone());
        if !failures.is_empty() {
            tracing::warn!(
                "{} host event channel(s) unavailable, overlay will not open on its own",
                failures.len()
            );
        }

        // Overlay loop
        let queue_rx = self.channels.queue.1.clone();
        let cancel = self.cancel_token.clone();
        tasks.spawn(async move {
            let session = controller.run(queue_rx, cancel).await;
            tracing::info!(
                "Overlay loop exited in state {:?} (pending: {:?})",
                session.state(),
                session.pending_command()
            );
            Ok(())
        });

        // Console presentation
        tasks.spawn(console::render_loop(view_rx, self.cancel_token.child_token()));
        console::spawn_input(self.channels.queue.0.clone(), self.cancel_token.clone());

        tasks
    }

    /// Resolves when shutdown was requested from inside the app
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel_token.cancelled()
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
