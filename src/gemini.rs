use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Gemini API key not configured")]
    MissingCredential,
    #[error("Request to text-generation service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Upstream(String),
    #[error("No response from Gemini")]
    EmptyResponse,
    #[error("Model output is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

/// External text-generation service that answers a prompt with JSON.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_json(&self, prompt: &str) -> Result<Value, GenerationError>;
}

#[derive(Debug, Clone, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn for_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 2048,
                response_mime_type: "application/json",
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_json(&self, prompt: &str) -> Result<Value, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredential)?;

        let body = self
            .client
            .post(&self.api_url)
            .query(&[("key", api_key)])
            .json(&GenerateContentRequest::for_prompt(prompt))
            .send()
            .await?
            .json::<Value>()
            .await?;

        let text = extract_candidate_text(&body)?;
        serde_json::from_str::<Value>(text).map_err(GenerationError::InvalidJson)
    }
}

/// Pulls `candidates[0].content.parts[0].text` out of a generateContent body.
fn extract_candidate_text(body: &Value) -> Result<&str, GenerationError> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or("Gemini API Error");
        return Err(GenerationError::Upstream(message.to_string()));
    }

    let content = body
        .pointer("/candidates/0/content")
        .filter(|c| !c.is_null())
        .ok_or(GenerationError::EmptyResponse)?;

    content
        .pointer("/parts/0/text")
        .and_then(Value::as_str)
        .ok_or_else(|| GenerationError::Upstream("Gemini response has no text part".to_string()))
}
