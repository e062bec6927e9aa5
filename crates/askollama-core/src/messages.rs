//! User-facing strings produced by command results

use askollama_types::{CommandKind, SettingsSnapshot};

pub const SETTINGS_SAVED: &str = "Settings saved.";
pub const AUTOSTART_DISABLED: &str = "Autostart disabled.";

pub fn autostart_enabled(path: &str) -> String {
    format!("Autostart enabled: {path}")
}

/// Render a host failure for `lastError`
pub fn failure(kind: CommandKind, error: &str) -> String {
    let prefix = match kind {
        CommandKind::ExplainWithPrompt => "Error sending prompt",
        CommandKind::SaveSettings => "Failed to save settings",
        CommandKind::LoadSettings => "Failed to load settings",
        CommandKind::EnableAutostart => "Failed to enable autostart",
        CommandKind::DisableAutostart => "Failed to disable autostart",
    };
    format!("{prefix}: {error}")
}

/// Diagnostic dump shown in place of the explanation
pub fn settings_dump(settings: &SettingsSnapshot) -> String {
    let pretty = serde_json::to_string_pretty(settings).unwrap_or_else(|_| settings.to_string());
    format!("Current settings:\n{pretty}")
}

/// Append `note` after the current explanation, separated by a blank line
pub fn append_note(current: Option<&str>, note: &str) -> String {
    match current {
        Some(text) if !text.is_empty() => format!("{text}\n\n{note}"),
        _ => note.to_string(),
    }
}
