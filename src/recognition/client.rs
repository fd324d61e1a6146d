use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::VisionConfig;

const PROMPT: &str = r#"Identify every food in this photo and estimate, for each one:
1. its name
2. a confidence between 0 and 1
3. the estimated calories (kcal)
4. the macronutrients in grams: carbohydrates, protein, fat

Reply with JSON only, in exactly this shape:
{
  "foods": [
    {
      "name": "steamed rice",
      "confidence": 0.95,
      "estimated_calories": 200,
      "estimated_macros": {"carbohydrates": 45, "protein": 4, "fat": 0.5},
      "suggested_servings": 1.0
    }
  ]
}"#;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("reply has no message content")]
    MissingContent,
}

impl From<reqwest::Error> for VisionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            VisionError::Timeout
        } else if let Some(status) = e.status() {
            VisionError::Status(status.as_u16())
        } else {
            VisionError::Transport(e)
        }
    }
}

/// Sends a photo to a vision model and returns the assistant's text reply.
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn describe(&self, image: Bytes, format: &str) -> Result<String, VisionError>;
}

/// OpenAI-compatible chat-completions client (DashScope compatible mode by
/// default).
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    config: VisionConfig,
}

impl ChatCompletionsClient {
    pub fn new(config: VisionConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn payload(&self, image: &[u8], format: &str) -> Value {
        let data_url = format!("data:image/{};base64,{}", format, STANDARD.encode(image));
        json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "image_url", "image_url": {"url": data_url}},
                    {"type": "text", "text": PROMPT}
                ]
            }]
        })
    }
}

#[async_trait]
impl VisionClient for ChatCompletionsClient {
    async fn describe(&self, image: Bytes, format: &str) -> Result<String, VisionError> {
        debug!(bytes = image.len(), format, model = %self.config.model, "vision request");
        let reply: Value = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&self.payload(&image, format))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        message_content(&reply).ok_or(VisionError::MissingContent)
    }
}

/// Pulls `choices[0].message.content` out of a chat-completion reply. The
/// content is either a string or a list of parts whose text is concatenated.
pub fn message_content(reply: &Value) -> Option<String> {
    let content = reply.pointer("/choices/0/message/content")?;
    match content {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => {
            let text: Vec<&str> = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect();
            (!text.is_empty()).then(|| text.join("\n"))
        }
        _ => None,
    }
}
