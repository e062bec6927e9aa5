use std::env;

use askollama_types::{EXPLANATION_CHANNEL, OCR_CHANNEL};
use serde::{Deserialize, Serialize};

pub(crate) fn default_command_url() -> String {
    "http://127.0.0.1:7878/command".to_string()
}

pub(crate) fn default_events_url() -> String {
    "ws://127.0.0.1:7878/events".to_string()
}

fn default_ocr_channel() -> String {
    OCR_CHANNEL.to_string()
}

fn default_explanation_channel() -> String {
    EXPLANATION_CHANNEL.to_string()
}

/// Where the host process exposes its command and event bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    #[serde(default = "default_command_url")]
    pub command_url: String,
    #[serde(default = "default_events_url")]
    pub events_url: String,
    #[serde(default = "default_ocr_channel")]
    pub ocr_channel: String,
    #[serde(default = "default_explanation_channel")]
    pub explanation_channel: String,
}

impl HostConfig {
    pub fn new() -> Self {
        let command_url = env::var("ASKOLLAMA_HOST_URL").unwrap_or_else(|_| default_command_url());
        let events_url =
            env::var("ASKOLLAMA_EVENTS_URL").unwrap_or_else(|_| default_events_url());

        Self {
            command_url,
            events_url,
            ..Self::default()
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            command_url: default_command_url(),
            events_url: default_events_url(),
            ocr_channel: default_ocr_channel(),
            explanation_channel: default_explanation_channel(),
        }
    }
}
