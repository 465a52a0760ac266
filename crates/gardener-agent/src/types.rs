//! Wire formats for both generation services

use serde::{Deserialize, Serialize};

// --- Hosted service (model catalog + content generation) ---

#[derive(Debug, Deserialize)]
pub struct ModelCatalog {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEntry {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelEntry {
    /// Whether this model advertises the content-generation capability
    pub fn can_generate(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<RequestContent>,
}

impl GenerateRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RequestContent {
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
pub struct RequestPart {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<ResponseCandidate>,
}

impl GenerateResponse {
    /// Free text of the first candidate, if any
    pub fn first_text(&self) -> Option<String> {
        let part = self.candidates.first()?.content.parts.first()?;
        Some(part.text.clone())
    }
}

#[derive(Debug, Deserialize)]
pub struct ResponseCandidate {
    pub content: ResponseContent,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: String,
}

// --- Local service ---

#[derive(Debug, Serialize)]
pub struct LocalRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: LocalOptions,
}

#[derive(Debug, Serialize)]
pub struct LocalOptions {
    pub num_ctx: u32,
}

#[derive(Debug, Deserialize)]
pub struct LocalResponse {
    #[serde(default)]
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_capability_filter() {
        let raw = r#"{
            "models": [
                {"name": "models/a", "supportedGenerationMethods": ["generateContent"]},
                {"name": "models/b", "supportedGenerationMethods": ["embedContent"]},
                {"name": "models/c"}
            ]
        }"#;
        let catalog: ModelCatalog = serde_json::from_str(raw).unwrap();
        let usable: Vec<&str> = catalog
            .models
            .iter()
            .filter(|m| m.can_generate())
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(usable, vec!["models/a"]);
    }

    #[test]
    fn test_generate_response_first_text() {
        let raw = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "hello"}, {"text": "extra"}]}}
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.first_text().unwrap(), "hello");
    }

    #[test]
    fn test_generate_response_empty_candidates() {
        let response: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(response.first_text().is_none());
    }

    #[test]
    fn test_local_request_shape() {
        let request = LocalRequest {
            model: "qwen2.5-coder:7b".to_string(),
            prompt: "write code".to_string(),
            stream: false,
            options: LocalOptions { num_ctx: 8192 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["stream"], false);
        assert_eq!(value["options"]["num_ctx"], 8192);
    }
}
