use serde::{Deserialize, Serialize};

fn default_clear_draft_on_reply() -> bool {
    true
}

fn default_waiting_placeholder() -> String {
    "Waiting for explanation...".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Clear the draft once its prompt got a reply, unless it was edited meanwhile
    #[serde(default = "default_clear_draft_on_reply")]
    pub clear_draft_on_reply: bool,
    #[serde(default = "default_waiting_placeholder")]
    pub waiting_placeholder: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            clear_draft_on_reply: default_clear_draft_on_reply(),
            waiting_placeholder: default_waiting_placeholder(),
        }
    }
}
