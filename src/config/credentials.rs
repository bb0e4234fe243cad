use tracing::debug;

use crate::errors::SondoError;

pub const CHAT_API_BASE_VAR: &str = "SONDO_CHAT_API_BASE";
pub const CHAT_API_KEY_VAR: &str = "SONDO_CHAT_API_KEY";
pub const CHAT_MODEL_VAR: &str = "SONDO_CHAT_MODEL";
pub const EMBED_API_BASE_VAR: &str = "SONDO_EMBED_API_BASE";
pub const EMBED_API_KEY_VAR: &str = "SONDO_EMBED_API_KEY";
pub const EMBED_MODEL_VAR: &str = "SONDO_EMBED_MODEL";

const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Text-generation service credentials. Every pipeline stage needs these, so
/// missing values are fatal.
#[derive(Debug, Clone)]
pub struct ChatCredentials {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

impl ChatCredentials {
    pub fn from_env() -> Result<Self, SondoError> {
        let api_base = env_nonempty(CHAT_API_BASE_VAR);
        let api_key = env_nonempty(CHAT_API_KEY_VAR);
        let (Some(api_base), Some(api_key)) = (api_base, api_key) else {
            return Err(SondoError::Config(format!(
                "Missing {} or {} in environment",
                CHAT_API_BASE_VAR, CHAT_API_KEY_VAR
            )));
        };
        let model = env_nonempty(CHAT_MODEL_VAR).unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        debug!(model, "chat credentials loaded");
        Ok(Self {
            api_base,
            api_key,
            model,
        })
    }
}

/// Embedding service credentials. Optional: without them the semantic
/// fitness stage scores 0 and the lexical stage stands alone.
#[derive(Debug, Clone)]
pub struct EmbeddingCredentials {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

impl EmbeddingCredentials {
    pub fn from_env() -> Option<Self> {
        let api_base = env_nonempty(EMBED_API_BASE_VAR)?;
        let api_key = env_nonempty(EMBED_API_KEY_VAR)?;
        let model = env_nonempty(EMBED_MODEL_VAR)?;
        debug!(model, "embedding credentials loaded");
        Some(Self {
            api_base,
            api_key,
            model,
        })
    }
}
