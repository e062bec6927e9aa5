use askollama_host::HostCommandService;
use askollama_types::{CommandOutcome, CommandRequest};

/// Run one request against the host, folding any error into its text form
pub async fn execute(host: &dyn HostCommandService, request: CommandRequest) -> CommandOutcome {
    tracing::debug!("sending {} to host", request.kind());
    match request {
        CommandRequest::ExplainWithPrompt { ocr_text, prompt } => CommandOutcome::ExplainWithPrompt(
            host.explain_with_prompt(&ocr_text, &prompt)
                .await
                .map_err(|e| e.to_string()),
        ),
        CommandRequest::SaveSettings => {
            CommandOutcome::SaveSettings(host.save_settings().await.map_err(|e| e.to_string()))
        }
        CommandRequest::LoadSettings => {
            CommandOutcome::LoadSettings(host.load_settings().await.map_err(|e| e.to_string()))
        }
        CommandRequest::EnableAutostart => CommandOutcome::EnableAutostart(
            host.enable_autostart().await.map_err(|e| e.to_string()),
        ),
        CommandRequest::DisableAutostart => CommandOutcome::DisableAutostart(
            host.disable_autostart().await.map_err(|e| e.to_string()),
        ),
    }
}
