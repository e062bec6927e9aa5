use askollama_types::{CommandKind, OverlayState};
use serde::Serialize;

use crate::session::OverlaySession;

/// What the presentation layer may render right now
///
/// Extracted text and reply are withheld while hidden; the session keeps them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayView {
    pub state: OverlayState,
    pub extracted_text: Option<String>,
    pub reply: Option<String>,
    pub draft_prompt: String,
    pub last_error: Option<String>,
    pub pending: Option<CommandKind>,
}

impl OverlayView {
    pub fn from_session(session: &OverlaySession, waiting_placeholder: &str) -> Self {
        let state = session.state();
        let (extracted_text, reply) = match state {
            OverlayState::Hidden => (None, None),
            OverlayState::AwaitingExplanation => (
                session.extracted_text().map(str::to_string),
                Some(waiting_placeholder.to_string()),
            ),
            OverlayState::Ready => (
                session.extracted_text().map(str::to_string),
                session.explanation().map(str::to_string),
            ),
        };

        Self {
            state,
            extracted_text,
            reply,
            draft_prompt: session.draft_prompt().to_string(),
            last_error: session.last_error().map(str::to_string),
            pending: session.pending_command(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }
}
