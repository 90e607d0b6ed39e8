use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GenConfig;
use crate::errors::GenerationError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Thin client for an OpenAI-compatible chat-completions service. One
/// request per call, no retries; every failure comes back as a tagged
/// [`GenerationError`].
pub struct LlmClient {
    client: reqwest::Client,
    config: GenConfig,
}

impl LlmClient {
    pub fn new(config: GenConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    /// Single best-effort completion for a system/user prompt pair.
    pub async fn generate(&self, system: &str, prompt: &str) -> Result<String, GenerationError> {
        let messages = vec![
            Message {
                role: "system".to_string(),
                content: system.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ];
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let mut req = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let resp = req.send().await.map_err(classify_transport)?;
        let status = resp.status();
        match status.as_u16() {
            401 | 403 => return Err(GenerationError::Auth),
            429 => return Err(GenerationError::RateLimited),
            s if !status.is_success() => {
                return Err(GenerationError::Network(format!("HTTP {}", s)))
            }
            _ => {}
        }

        let text = resp.text().await.map_err(classify_transport)?;
        let json: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let content = json["choices"]
            .get(0)
            .and_then(|c| c["message"]["content"].as_str())
            .ok_or_else(|| {
                GenerationError::MalformedResponse("missing choices[0].message.content".into())
            })?
            .trim();

        if content.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        debug!(
            prompt_len = prompt.len(),
            content_len = content.len(),
            "completion received"
        );
        Ok(content.to_string())
    }
}

fn classify_transport(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Network(e.to_string())
    }
}
