use askollama_types::SettingsSnapshot;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{CommandError, HostCommandService};

/// Host command service reached over the host's JSON command endpoint
#[derive(Clone)]
pub struct HttpHostClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpHostClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Invoke a host action and return its raw response envelope
    async fn invoke<T>(
        &self,
        action: &'static str,
        params: serde_json::Value,
    ) -> Result<HostResponse<T>, CommandError>
    where
        T: DeserializeOwned,
    {
        let request = HostRequest { action, params };

        tracing::debug!("host command {action} -> {}", self.base_url);

        let response = self
            .client
            .post(&self.base_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        response
            .json::<HostResponse<T>>()
            .await
            .map_err(|e| CommandError::Decode(format!("{action}: {e}")))
    }
}

#[async_trait::async_trait]
impl HostCommandService for HttpHostClient {
    async fn explain_with_prompt(
        &self,
        ocr_text: &str,
        prompt: &str,
    ) -> Result<String, CommandError> {
        let params = json!({ "ocrText": ocr_text, "prompt": prompt });
        self.invoke("explain_with_prompt", params)
            .await?
            .into_result("explain_with_prompt")
    }

    async fn save_settings(&self) -> Result<(), CommandError> {
        self.invoke::<serde_json::Value>("save_settings", json!({}))
            .await?
            .into_ack()
    }

    async fn load_settings(&self) -> Result<SettingsSnapshot, CommandError> {
        self.invoke("get_settings", json!({}))
            .await?
            .into_result("get_settings")
    }

    async fn enable_autostart(&self) -> Result<String, CommandError> {
        self.invoke("enable_autostart", json!({}))
            .await?
            .into_result("enable_autostart")
    }

    async fn disable_autostart(&self) -> Result<(), CommandError> {
        self.invoke::<serde_json::Value>("disable_autostart", json!({}))
            .await?
            .into_ack()
    }
}

#[derive(Serialize)]
struct HostRequest {
    action: &'static str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct HostResponse<T> {
    result: Option<T>,
    error: Option<String>,
}

impl<T> HostResponse<T> {
    fn into_result(self, action: &'static str) -> Result<T, CommandError> {
        if let Some(error) = self.error {
            return Err(CommandError::Host(error));
        }

        self.result.ok_or(CommandError::EmptyResult(action))
    }

    /// Success only needs the absence of an error
    fn into_ack(self) -> Result<(), CommandError> {
        match self.error {
            Some(error) => Err(CommandError::Host(error)),
            None => Ok(()),
        }
    }
}
