use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub model: String,
}

/// Per-call sampling knobs. Classification runs at temperature 0, payload
/// generation at 0.1, clue mutation at 0.3 with a tight token budget. A
/// `None` token cap leaves the provider default in place.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: None,
            max_tokens: None,
        }
    }
}

impl ChatOptions {
    pub fn with_temperature(temperature: f64) -> Self {
        Self {
            temperature,
            ..Default::default()
        }
    }
}
