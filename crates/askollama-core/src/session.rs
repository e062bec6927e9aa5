use askollama_config::overlay::OverlayConfig;
use askollama_types::{CommandKind, CommandOutcome, CommandRequest, HostEvent, OverlayState};
use uuid::Uuid;

use crate::messages;

/// The command currently awaiting a host response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub id: Uuid,
    pub kind: CommandKind,
    /// Screenshot generation current at dispatch
    pub ocr_generation: u64,
    /// Draft text sent with ExplainWithPrompt
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("{rejected} rejected: {pending} still in flight")]
    Busy {
        pending: CommandKind,
        rejected: CommandKind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("completion {id} for {got} does not match in-flight command {expected:?}")]
pub struct CompletionMismatch {
    pub id: Uuid,
    pub got: CommandKind,
    pub expected: Option<CommandKind>,
}

/// All overlay state, mutated field by field by events and command results
#[derive(Debug, Clone)]
pub struct OverlaySession {
    visible: bool,
    extracted_text: Option<String>,
    explanation: Option<String>,
    draft_prompt: String,
    last_error: Option<String>,
    pending: Option<PendingCommand>,
    ocr_generation: u64,
    clear_draft_on_reply: bool,
}

impl OverlaySession {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            visible: false,
            extracted_text: None,
            explanation: None,
            draft_prompt: String::new(),
            last_error: None,
            pending: None,
            ocr_generation: 0,
            clear_draft_on_reply: config.clear_draft_on_reply,
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_text.as_deref()
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn draft_prompt(&self) -> &str {
        &self.draft_prompt
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn pending(&self) -> Option<&PendingCommand> {
        self.pending.as_ref()
    }

    pub fn pending_command(&self) -> Option<CommandKind> {
        self.pending.as_ref().map(|p| p.kind)
    }

    pub fn ocr_generation(&self) -> u64 {
        self.ocr_generation
    }

    pub fn state(&self) -> OverlayState {
        match (self.visible, &self.explanation) {
            (false, _) => OverlayState::Hidden,
            (true, None) => OverlayState::AwaitingExplanation,
            (true, Some(_)) => OverlayState::Ready,
        }
    }

    pub fn apply_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Ocr(text) => self.on_ocr(text),
            HostEvent::Explanation(text) => self.on_explanation(text),
        }
    }

    /// A new screenshot was read. Only non-empty text opens the overlay.
    pub fn on_ocr(&mut self, text: String) {
        if text.is_empty() {
            tracing::debug!("empty OCR payload, overlay left as is");
            self.extracted_text = Some(text);
            return;
        }

        self.ocr_generation += 1;
        self.extracted_text = Some(text);
        self.explanation = None;
        self.visible = true;
        self.last_error = None;
    }

    /// Accepted in any state, including before the OCR it belongs to
    pub fn on_explanation(&mut self, text: String) {
        if !self.visible {
            tracing::debug!("explanation recorded while overlay hidden");
        }
        self.explanation = Some(text);
    }

    /// Hide the overlay, keeping its content. Returns false if already hidden.
    pub fn close(&mut self) -> bool {
        if !self.visible {
            return false;
        }
        self.visible = false;
        true
    }

    pub fn edit_prompt(&mut self, text: String) {
        self.draft_prompt = text;
    }

    /// Claim the single command slot and build the request to send
    pub fn begin(&mut self, kind: CommandKind) -> Result<(Uuid, CommandRequest), DispatchError> {
        if let Some(pending) = &self.pending {
            return Err(DispatchError::Busy {
                pending: pending.kind,
                rejected: kind,
            });
        }

        let (request, prompt) = match kind {
            CommandKind::ExplainWithPrompt => {
                let prompt = self.draft_prompt.clone();
                let request = CommandRequest::ExplainWithPrompt {
                    ocr_text: self.extracted_text.clone().unwrap_or_default(),
                    prompt: prompt.clone(),
                };
                (request, Some(prompt))
            }
            CommandKind::SaveSettings => (CommandRequest::SaveSettings, None),
            CommandKind::LoadSettings => (CommandRequest::LoadSettings, None),
            CommandKind::EnableAutostart => (CommandRequest::EnableAutostart, None),
            CommandKind::DisableAutostart => (CommandRequest::DisableAutostart, None),
        };

        let id = Uuid::new_v4();
        self.pending = Some(PendingCommand {
            id,
            kind,
            ocr_generation: self.ocr_generation,
            prompt,
        });
        self.last_error = None;

        Ok((id, request))
    }

    /// Reconcile a host response with the in-flight command and release the slot
    pub fn complete(&mut self, id: Uuid, outcome: CommandOutcome) -> Result<(), CompletionMismatch> {
        let kind = outcome.kind();
        let pending = match self.pending.take() {
            Some(pending) if pending.id == id && pending.kind == kind => pending,
            other => {
                let expected = other.as_ref().map(|p| p.kind);
                self.pending = other;
                return Err(CompletionMismatch {
                    id,
                    got: kind,
                    expected,
                });
            }
        };

        if pending.ocr_generation != self.ocr_generation {
            tracing::debug!(
                "[{id}] {kind} answered after a newer screenshot, applying anyway"
            );
        }

        match outcome {
            CommandOutcome::ExplainWithPrompt(Ok(reply)) => {
                self.explanation = Some(reply);
                self.last_error = None;
                if self.clear_draft_on_reply
                    && pending.prompt.as_deref() == Some(self.draft_prompt.as_str())
                {
                    self.draft_prompt.clear();
                }
            }
            CommandOutcome::SaveSettings(Ok(())) => self.note(messages::SETTINGS_SAVED),
            CommandOutcome::LoadSettings(Ok(settings)) => {
                self.explanation = Some(messages::settings_dump(&settings));
                self.last_error = None;
            }
            CommandOutcome::EnableAutostart(Ok(path)) => {
                self.note(&messages::autostart_enabled(&path))
            }
            CommandOutcome::DisableAutostart(Ok(())) => self.note(messages::AUTOSTART_DISABLED),
            CommandOutcome::ExplainWithPrompt(Err(error))
            | CommandOutcome::SaveSettings(Err(error))
            | CommandOutcome::LoadSettings(Err(error))
            | CommandOutcome::EnableAutostart(Err(error))
            | CommandOutcome::DisableAutostart(Err(error)) => {
                tracing::warn!("[{id}] {kind} failed: {error}");
                self.last_error = Some(messages::failure(kind, &error));
            }
        }

        Ok(())
    }

    fn note(&mut self, note: &str) {
        self.explanation = Some(messages::append_note(self.explanation.as_deref(), note));
        self.last_error = None;
    }
}

impl Default for OverlaySession {
    fn default() -> Self {
        Self::new(&OverlayConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn shown(text: &str) -> OverlaySession {
        let mut session = OverlaySession::default();
        session.on_ocr(text.to_string());
        session
    }

    #[test]
    fn starts_hidden_and_empty() {
        let session = OverlaySession::default();
        assert_eq!(session.state(), OverlayState::Hidden);
        assert_eq!(session.extracted_text(), None);
        assert_eq!(session.explanation(), None);
        assert_eq!(session.pending_command(), None);
    }

    #[test]
    fn ocr_opens_and_resets_explanation() {
        let mut session = shown("first");
        session.on_explanation("old reply".to_string());
        session.close();

        session.on_ocr("second".to_string());
        assert!(session.visible());
        assert_eq!(session.extracted_text(), Some("second"));
        assert_eq!(session.explanation(), None);
        assert_eq!(session.state(), OverlayState::AwaitingExplanation);
        assert_eq!(session.ocr_generation(), 2);
    }

    #[test]
    fn empty_ocr_does_not_open() {
        let mut session = OverlaySession::default();
        session.on_explanation("kept".to_string());
        session.on_ocr(String::new());

        assert!(!session.visible());
        assert_eq!(session.extracted_text(), Some(""));
        assert_eq!(session.explanation(), Some("kept"));
        assert_eq!(session.ocr_generation(), 0);
    }

    #[test]
    fn explanation_while_hidden_is_recorded() {
        let mut session = OverlaySession::default();
        session.on_explanation("early".to_string());
        assert_eq!(session.state(), OverlayState::Hidden);
        assert_eq!(session.explanation(), Some("early"));
    }

    #[test]
    fn close_keeps_content() {
        let mut session = shown("14:00 PST");
        session.on_explanation("2pm Pacific Time".to_string());

        assert!(session.close());
        assert!(!session.close());
        assert_eq!(session.state(), OverlayState::Hidden);
        assert_eq!(session.extracted_text(), Some("14:00 PST"));
        assert_eq!(session.explanation(), Some("2pm Pacific Time"));
    }

    #[test]
    fn explain_request_uses_empty_text_without_ocr() {
        let mut session = OverlaySession::default();
        session.edit_prompt("hello".to_string());
        let (_, request) = session.begin(CommandKind::ExplainWithPrompt).unwrap();
        assert_eq!(
            request,
            CommandRequest::ExplainWithPrompt {
                ocr_text: String::new(),
                prompt: "hello".to_string(),
            }
        );
    }

    #[test]
    fn second_dispatch_is_busy() {
        let mut session = shown("text");
        let (id, request) = session.begin(CommandKind::SaveSettings).unwrap();
        assert_eq!(request.kind(), CommandKind::SaveSettings);

        let err = session.begin(CommandKind::LoadSettings).unwrap_err();
        assert_eq!(
            err,
            DispatchError::Busy {
                pending: CommandKind::SaveSettings,
                rejected: CommandKind::LoadSettings,
            }
        );
        assert_eq!(session.pending().map(|p| p.id), Some(id));
    }

    #[test]
    fn mismatched_completion_keeps_slot() {
        let mut session = shown("text");
        let (id, _) = session.begin(CommandKind::SaveSettings).unwrap();

        let stray = Uuid::new_v4();
        let err = session
            .complete(stray, CommandOutcome::SaveSettings(Ok(())))
            .unwrap_err();
        assert_eq!(err.expected, Some(CommandKind::SaveSettings));

        let err = session
            .complete(id, CommandOutcome::LoadSettings(Ok(json!({}))))
            .unwrap_err();
        assert_eq!(err.got, CommandKind::LoadSettings);
        assert_eq!(session.pending_command(), Some(CommandKind::SaveSettings));

        session.complete(id, CommandOutcome::SaveSettings(Ok(()))).unwrap();
        assert_eq!(session.pending_command(), None);
    }

    #[test]
    fn completion_without_pending_is_rejected() {
        let mut session = OverlaySession::default();
        let err = session
            .complete(Uuid::new_v4(), CommandOutcome::DisableAutostart(Ok(())))
            .unwrap_err();
        assert_eq!(err.expected, None);
    }

    #[test]
    fn reply_clears_draft_only_if_unchanged() {
        let mut session = shown("14:00 PST");
        session.edit_prompt("convert to GST".to_string());
        let (id, _) = session.begin(CommandKind::ExplainWithPrompt).unwrap();
        session
            .complete(id, CommandOutcome::ExplainWithPrompt(Ok("ok".to_string())))
            .unwrap();
        assert_eq!(session.draft_prompt(), "");

        session.edit_prompt("first".to_string());
        let (id, _) = session.begin(CommandKind::ExplainWithPrompt).unwrap();
        session.edit_prompt("typed while waiting".to_string());
        session
            .complete(id, CommandOutcome::ExplainWithPrompt(Ok("ok".to_string())))
            .unwrap();
        assert_eq!(session.draft_prompt(), "typed while waiting");
    }

    #[test]
    fn draft_kept_when_clearing_disabled() {
        let config = OverlayConfig {
            clear_draft_on_reply: false,
            ..OverlayConfig::default()
        };
        let mut session = OverlaySession::new(&config);
        session.edit_prompt("keep me".to_string());
        let (id, _) = session.begin(CommandKind::ExplainWithPrompt).unwrap();
        session
            .complete(id, CommandOutcome::ExplainWithPrompt(Ok("ok".to_string())))
            .unwrap();
        assert_eq!(session.draft_prompt(), "keep me");
    }

    #[test]
    fn failed_prompt_keeps_draft_and_explanation() {
        let mut session = shown("14:00 PST");
        session.on_explanation("2pm Pacific Time".to_string());
        session.edit_prompt("convert to GST".to_string());
        let (id, _) = session.begin(CommandKind::ExplainWithPrompt).unwrap();
        session
            .complete(
                id,
                CommandOutcome::ExplainWithPrompt(Err("model offline".to_string())),
            )
            .unwrap();

        assert_eq!(session.explanation(), Some("2pm Pacific Time"));
        assert_eq!(session.draft_prompt(), "convert to GST");
        assert_eq!(
            session.last_error(),
            Some("Error sending prompt: model offline")
        );
    }

    #[test]
    fn new_command_clears_last_error() {
        let mut session = shown("text");
        let (id, _) = session.begin(CommandKind::EnableAutostart).unwrap();
        session
            .complete(id, CommandOutcome::EnableAutostart(Err("denied".to_string())))
            .unwrap();
        assert_eq!(
            session.last_error(),
            Some("Failed to enable autostart: denied")
        );

        session.begin(CommandKind::EnableAutostart).unwrap();
        assert_eq!(session.last_error(), None);
    }

    #[test]
    fn autostart_notes_are_additive() {
        let mut session = shown("text");
        session.on_explanation("reply".to_string());

        let (id, _) = session.begin(CommandKind::EnableAutostart).unwrap();
        session
            .complete(
                id,
                CommandOutcome::EnableAutostart(Ok(
                    "/home/u/.config/autostart/askollama.desktop".to_string()
                )),
            )
            .unwrap();
        let (id, _) = session.begin(CommandKind::DisableAutostart).unwrap();
        session
            .complete(id, CommandOutcome::DisableAutostart(Ok(())))
            .unwrap();

        assert_eq!(
            session.explanation(),
            Some(
                "reply\n\nAutostart enabled: /home/u/.config/autostart/askollama.desktop\n\nAutostart disabled."
            )
        );
    }

    #[test]
    fn late_reply_lands_on_newer_screenshot() {
        let mut session = shown("first");
        let (id, _) = session.begin(CommandKind::ExplainWithPrompt).unwrap();
        session.on_ocr("second".to_string());

        session
            .complete(id, CommandOutcome::ExplainWithPrompt(Ok("about first".to_string())))
            .unwrap();
        assert_eq!(session.extracted_text(), Some("second"));
        assert_eq!(session.explanation(), Some("about first"));
        assert_eq!(session.state(), OverlayState::Ready);
    }
}
