use std::env;

use serde::{Deserialize, Serialize};

fn default_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when RUST_LOG is unset
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Force JSON output on or off; auto-detected from the terminal when unset
    pub json: Option<bool>,
}

impl LogConfig {
    pub fn new() -> Self {
        let filter = env::var("ASKOLLAMA_LOG").unwrap_or_else(|_| default_filter());

        Self { filter, json: None }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: None,
        }
    }
}
