//! Hosted generation service client (catalog listing + content generation)

use crate::types::{GenerateRequest, GenerateResponse, ModelCatalog};
use gardener_core::{EventLog, LogRole};
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const LIST_TIMEOUT: Duration = Duration::from_secs(30);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the hosted HTTPS API, key-in-query-string auth.
///
/// Both operations are fail-soft: failures emit an Error event and return
/// an empty/`None` value so the loop's failover logic stays in charge.
#[derive(Debug, Clone)]
pub struct HostedClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    events: EventLog,
}

impl HostedClient {
    pub fn new(api_key: impl Into<String>, events: EventLog) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            api_key: api_key.into(),
            events,
        }
    }

    /// Identifiers of catalog models that support content generation
    pub async fn list_models(&self) -> Vec<String> {
        let url = format!("{}/models?key={}", self.base_url, self.api_key);
        let result: Result<ModelCatalog, String> = async {
            let response = self
                .http
                .get(&url)
                .timeout(LIST_TIMEOUT)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            let response = response.error_for_status().map_err(|e| e.to_string())?;
            response.json().await.map_err(|e| e.to_string())
        }
        .await;

        match result {
            Ok(catalog) => {
                let names: Vec<String> = catalog
                    .models
                    .into_iter()
                    .filter(|m| m.can_generate())
                    .map(|m| m.name)
                    .collect();
                debug!("Catalog lists {} usable models", names.len());
                names
            }
            Err(e) => {
                self.events
                    .log(LogRole::Error, format!("Failed to list models: {}", e));
                Vec::new()
            }
        }
    }

    /// Generate free text from a prompt with the given model
    pub async fn generate(&self, prompt: &str, model: &str) -> Option<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        let request = GenerateRequest::from_prompt(prompt);

        let result: Result<GenerateResponse, String> = async {
            let response = self
                .http
                .post(&url)
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
            Ok(response) => match response.first_text() {
                Some(text) => Some(text),
                None => {
                    self.events.log(
                        LogRole::Error,
                        format!("Hosted request returned no candidates ({})", model),
                    );
                    None
                }
            },
            Err(e) => {
                self.events
                    .log(LogRole::Error, format!("Hosted request failed: {}", e));
                None
            }
        }
    }
}
