//! Local generation service client (fixed localhost endpoint)

use crate::types::{LocalOptions, LocalRequest, LocalResponse};
use gardener_core::{EventLog, LogRole};
use std::time::Duration;

const LOCAL_URL: &str = "http://localhost:11434/api/generate";
const CONTEXT_WINDOW: u32 = 8192;
// Local generation is heavy compute; give it far longer than hosted calls
const GENERATE_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for the local generation service, fail-soft like the hosted one
#[derive(Debug, Clone)]
pub struct LocalClient {
    http: reqwest::Client,
    url: String,
    model: String,
    events: EventLog,
}

impl LocalClient {
    pub fn new(model: impl Into<String>, events: EventLog) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: LOCAL_URL.to_string(),
            model: model.into(),
            events,
        }
    }

    /// Generate code text from a prompt with a bounded context window
    pub async fn generate(&self, prompt: &str) -> Option<String> {
        let request = LocalRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: LocalOptions {
                num_ctx: CONTEXT_WINDOW,
            },
        };

        let result: Result<LocalResponse, String> = async {
            let response = self
                .http
                .post(&self.url)
                .timeout(GENERATE_TIMEOUT)
                .json(&request)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            let response = response.error_for_status().map_err(|e| e.to_string())?;
            response.json().await.map_err(|e| e.to_string())
        }
        .await;

        match result {
            Ok(response) if !response.response.is_empty() => Some(response.response),
            Ok(_) => {
                self.events
                    .log(LogRole::Error, "Local service produced no text");
                None
            }
            Err(e) => {
                self.events
                    .log(LogRole::Error, format!("Local request failed: {}", e));
                None
            }
        }
    }
}
