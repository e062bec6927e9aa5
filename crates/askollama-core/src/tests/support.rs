//! Scripted host double and a harness that drives the controller step by step

use std::sync::{Arc, Mutex};
use std::time::Duration;

use askollama_config::overlay::OverlayConfig;
use askollama_host::{CommandError, HostCommandService};
use askollama_types::{CommandRequest, SettingsSnapshot};
use kanal::{AsyncReceiver, AsyncSender};
use tokio::sync::watch;
use tokio::time::timeout;

use crate::controller::{CommandCompletion, ControllerError, ControllerEvent, OverlayController};
use crate::view::OverlayView;

pub const WAIT: Duration = Duration::from_secs(2);

/// Reply the test hands to whichever host call is waiting
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Ack,
    Settings(SettingsSnapshot),
    Fail(String),
}

/// Host whose every call blocks until the test feeds it a reply
pub struct ScriptedHost {
    replies: AsyncReceiver<Reply>,
    requests: Mutex<Vec<CommandRequest>>,
}

impl ScriptedHost {
    pub fn new() -> (Arc<Self>, AsyncSender<Reply>) {
        let (tx, rx) = kanal::unbounded_async();
        let host = Arc::new(Self {
            replies: rx,
            requests: Mutex::new(Vec::new()),
        });
        (host, tx)
    }

    pub fn requests(&self) -> Vec<CommandRequest> {
        self.requests.lock().unwrap().clone()
    }

    async fn next(&self, request: CommandRequest) -> Result<Reply, CommandError> {
        self.requests.lock().unwrap().push(request);
        match self.replies.recv().await {
            Ok(Reply::Fail(message)) => Err(CommandError::Host(message)),
            Ok(reply) => Ok(reply),
            Err(e) => Err(CommandError::Host(e.to_string())),
        }
    }
}

fn unexpected(reply: Reply) -> CommandError {
    CommandError::Decode(format!("unexpected scripted reply {reply:?}"))
}

#[async_trait::async_trait]
impl HostCommandService for ScriptedHost {
    async fn explain_with_prompt(
        &self,
        ocr_text: &str,
        prompt: &str,
    ) -> Result<String, CommandError> {
        let request = CommandRequest::ExplainWithPrompt {
            ocr_text: ocr_text.to_string(),
            prompt: prompt.to_string(),
        };
        match self.next(request).await? {
            Reply::Text(text) => Ok(text),
            other => Err(unexpected(other)),
        }
    }

    async fn save_settings(&self) -> Result<(), CommandError> {
        match self.next(CommandRequest::SaveSettings).await? {
            Reply::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    async fn load_settings(&self) -> Result<SettingsSnapshot, CommandError> {
        match self.next(CommandRequest::LoadSettings).await? {
            Reply::Settings(settings) => Ok(settings),
            other => Err(unexpected(other)),
        }
    }

    async fn enable_autostart(&self) -> Result<String, CommandError> {
        match self.next(CommandRequest::EnableAutostart).await? {
            Reply::Text(path) => Ok(path),
            other => Err(unexpected(other)),
        }
    }

    async fn disable_autostart(&self) -> Result<(), CommandError> {
        match self.next(CommandRequest::DisableAutostart).await? {
            Reply::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

pub struct Harness {
    pub controller: OverlayController,
    pub host: Arc<ScriptedHost>,
    pub replies: AsyncSender<Reply>,
    pub completions: AsyncReceiver<CommandCompletion>,
    pub view_rx: watch::Receiver<OverlayView>,
}

impl Harness {
    pub fn new() -> Self {
        let (host, replies) = ScriptedHost::new();
        let (controller, view_rx) = OverlayController::new(&OverlayConfig::default(), host.clone());
        let completions = controller.completions();

        Self {
            controller,
            host,
            replies,
            completions,
            view_rx,
        }
    }

    pub fn send(&mut self, event: ControllerEvent) -> Result<(), ControllerError> {
        self.controller.handle(event)
    }

    /// Hand the waiting host call its reply and apply the resulting completion
    pub async fn reply(&mut self, reply: Reply) {
        self.replies.send(reply).await.unwrap();
        let completion = timeout(WAIT, self.completions.recv())
            .await
            .expect("timed out waiting for completion")
            .unwrap();
        self.controller
            .handle(ControllerEvent::Completed(completion))
            .unwrap();
    }
}
