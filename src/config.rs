use std::time::Duration;

/// Everything the explanation generator needs for one run: endpoint,
/// model, credentials, sampling controls, and the result-truncation
/// threshold used when rendering prompts. Assembled once at startup and
/// passed in explicitly; nothing reads the environment after that.
#[derive(Clone)]
pub struct GenConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    /// Tool results longer than this are trimmed in the prompt.
    pub truncate_at: usize,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            model: "qwen3-30b-a3b-instruct-2507".to_string(),
            api_key: None,
            max_tokens: 2048,
            temperature: 0.3,
            timeout: Duration::from_secs(120),
            truncate_at: 2000,
        }
    }
}

impl GenConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = dotenv::var("LLM_BASE_URL") {
            if !v.is_empty() {
                cfg.base_url = v;
            }
        }
        if let Ok(v) = dotenv::var("LLM_MODEL") {
            if !v.is_empty() {
                cfg.model = v;
            }
        }
        cfg.api_key = dotenv::var("LLM_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(normalize_api_key);
        cfg
    }
}

impl std::fmt::Debug for GenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("truncate_at", &self.truncate_at)
            .finish()
    }
}

/// The upstream service expects keys with an `sk-` prefix; bare keys get
/// one prepended.
fn normalize_api_key(key: String) -> String {
    if key.starts_with("sk-") {
        key
    } else {
        format!("sk-{key}")
    }
}
