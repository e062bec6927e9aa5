//! Line-based stand-in for the overlay window

use std::io::BufRead;

use askollama_core::{ControllerEvent, OverlayView};
use askollama_types::{OverlayState, UserIntent};
use kanal::AsyncSender;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub const HELP: &str = "\
commands:
  :send             send the draft prompt
  :close            hide the overlay
  :save / :load     save or show settings
  :autostart on|off register or remove the startup entry
  :quit             exit
anything else replaces the draft prompt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Intent(UserIntent),
    Help,
    Quit,
    Unknown(String),
    Ignore,
}

pub fn parse_line(line: &str) -> ConsoleCommand {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return ConsoleCommand::Ignore;
    }

    let Some(command) = line.trim().strip_prefix(':') else {
        return ConsoleCommand::Intent(UserIntent::EditPrompt(line.to_string()));
    };

    let mut words = command.split_whitespace();
    match (words.next(), words.next()) {
        (Some("send"), None) => ConsoleCommand::Intent(UserIntent::SendPrompt),
        (Some("close"), None) => ConsoleCommand::Intent(UserIntent::Close),
        (Some("save"), None) => ConsoleCommand::Intent(UserIntent::SaveSettings),
        (Some("load"), None) => ConsoleCommand::Intent(UserIntent::LoadSettings),
        (Some("autostart"), Some("on")) => ConsoleCommand::Intent(UserIntent::EnableAutostart),
        (Some("autostart"), Some("off")) => ConsoleCommand::Intent(UserIntent::DisableAutostart),
        (Some("help"), None) => ConsoleCommand::Help,
        (Some("quit"), None) => ConsoleCommand::Quit,
        _ => ConsoleCommand::Unknown(line.trim().to_string()),
    }
}

pub fn render(view: &OverlayView) -> String {
    let mut out = String::new();

    if view.state == OverlayState::Hidden {
        out.push_str("[overlay hidden]\n");
    } else {
        out.push_str("=== Screenshot assistant ===\n");
        out.push_str("Extracted text:\n");
        out.push_str(view.extracted_text.as_deref().unwrap_or(""));
        out.push_str("\nAssistant:\n");
        out.push_str(view.reply.as_deref().unwrap_or(""));
        out.push('\n');
    }

    if !view.draft_prompt.is_empty() {
        out.push_str(&format!("Prompt: {}\n", view.draft_prompt));
    }
    if let Some(kind) = view.pending {
        out.push_str(&format!("... {kind} in progress\n"));
    }
    if let Some(error) = &view.last_error {
        out.push_str(&format!("! {error}\n"));
    }

    out
}

/// Print every new view until cancelled
pub async fn render_loop(
    mut view_rx: watch::Receiver<OverlayView>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = view_rx.changed() => {
                if changed.is_err() {
                    tracing::debug!("view channel closed");
                    break;
                }
                let text = render(&view_rx.borrow_and_update());
                println!("{text}");
            }
        }
    }

    Ok(())
}

/// Read intents from stdin on a dedicated thread
///
/// Blocking stdin reads cannot be cancelled, so the thread is detached and
/// ends with the process.
pub fn spawn_input(queue_tx: AsyncSender<ControllerEvent>, cancel: CancellationToken) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!("Failed to read console input: {e}");
                    break;
                }
            };

            match parse_line(&line) {
                ConsoleCommand::Intent(intent) => {
                    if let Err(e) = queue_tx.try_send(ControllerEvent::Intent(intent)) {
                        tracing::debug!("Controller gone, console input stopping: {e}");
                        break;
                    }
                }
                ConsoleCommand::Help => println!("{HELP}"),
                ConsoleCommand::Quit => {
                    cancel.cancel();
                    break;
                }
                ConsoleCommand::Unknown(command) => {
                    println!("unknown command {command}, try :help");
                }
                ConsoleCommand::Ignore => {}
            }

            if cancel.is_cancelled() {
                break;
            }
        }

        tracing::info!("Console input stopping");
    });
}
