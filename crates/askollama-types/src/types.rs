use std::fmt;

use serde::{Deserialize, Serialize};

/// Channel carrying OCR text extracted from a new screenshot
pub const OCR_CHANNEL: &str = "screenshot:ocr";
/// Channel carrying the host's automatic explanation of a screenshot
pub const EXPLANATION_CHANNEL: &str = "screenshot:explanation";

/// Opaque settings object owned by the host
pub type SettingsSnapshot = serde_json::Value;

/// Notification pushed by the host process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Ocr(String),
    Explanation(String),
}

/// What the presentation layer asks the controller to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    Close,
    EditPrompt(String),
    SendPrompt,
    SaveSettings,
    LoadSettings,
    EnableAutostart,
    DisableAutostart,
}

impl UserIntent {
    /// Host command this intent dispatches, if any
    pub fn command_kind(&self) -> Option<CommandKind> {
        match self {
            UserIntent::Close | UserIntent::EditPrompt(_) => None,
            UserIntent::SendPrompt => Some(CommandKind::ExplainWithPrompt),
            UserIntent::SaveSettings => Some(CommandKind::SaveSettings),
            UserIntent::LoadSettings => Some(CommandKind::LoadSettings),
            UserIntent::EnableAutostart => Some(CommandKind::EnableAutostart),
            UserIntent::DisableAutostart => Some(CommandKind::DisableAutostart),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    ExplainWithPrompt,
    SaveSettings,
    LoadSettings,
    EnableAutostart,
    DisableAutostart,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::ExplainWithPrompt => "ExplainWithPrompt",
            CommandKind::SaveSettings => "SaveSettings",
            CommandKind::LoadSettings => "LoadSettings",
            CommandKind::EnableAutostart => "EnableAutostart",
            CommandKind::DisableAutostart => "DisableAutostart",
        };
        f.write_str(name)
    }
}

/// Request sent to the host command service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRequest {
    ExplainWithPrompt { ocr_text: String, prompt: String },
    SaveSettings,
    LoadSettings,
    EnableAutostart,
    DisableAutostart,
}

impl CommandRequest {
    pub fn kind(&self) -> CommandKind {
        match self {
            CommandRequest::ExplainWithPrompt { .. } => CommandKind::ExplainWithPrompt,
            CommandRequest::SaveSettings => CommandKind::SaveSettings,
            CommandRequest::LoadSettings => CommandKind::LoadSettings,
            CommandRequest::EnableAutostart => CommandKind::EnableAutostart,
            CommandRequest::DisableAutostart => CommandKind::DisableAutostart,
        }
    }
}

/// Result of a host command, with the failure already rendered to text
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    ExplainWithPrompt(Result<String, String>),
    SaveSettings(Result<(), String>),
    LoadSettings(Result<SettingsSnapshot, String>),
    /// Success carries the path of the created startup entry
    EnableAutostart(Result<String, String>),
    DisableAutostart(Result<(), String>),
}

impl CommandOutcome {
    pub fn kind(&self) -> CommandKind {
        match self {
            CommandOutcome::ExplainWithPrompt(_) => CommandKind::ExplainWithPrompt,
            CommandOutcome::SaveSettings(_) => CommandKind::SaveSettings,
            CommandOutcome::LoadSettings(_) => CommandKind::LoadSettings,
            CommandOutcome::EnableAutostart(_) => CommandKind::EnableAutostart,
            CommandOutcome::DisableAutostart(_) => CommandKind::DisableAutostart,
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            CommandOutcome::ExplainWithPrompt(r) => r.is_ok(),
            CommandOutcome::SaveSettings(r) => r.is_ok(),
            CommandOutcome::LoadSettings(r) => r.is_ok(),
            CommandOutcome::EnableAutostart(r) => r.is_ok(),
            CommandOutcome::DisableAutostart(r) => r.is_ok(),
        }
    }
}

/// Derived overlay state, never stored directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayState {
    Hidden,
    AwaitingExplanation,
    Ready,
}
