use thiserror::Error;

#[derive(Debug, Error)]
pub enum SondoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("Rate limited: {0}")]
    RateLimit(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SondoError {
    /// True for failures of an external service that call sites degrade to an
    /// empty result instead of propagating.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SondoError::LLMApi(_)
                | SondoError::RateLimit(_)
                | SondoError::Network(_)
                | SondoError::Timeout(_)
        )
    }
}
