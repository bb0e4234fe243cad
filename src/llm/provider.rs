use async_trait::async_trait;
use crate::errors::SondoError;
use super::types::{ChatOptions, LLMResponse};

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Free-form text completion
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
        options: &ChatOptions,
    ) -> Result<LLMResponse, SondoError>;

    /// Model identifier for logging
    fn model_name(&self) -> &str;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed each input string into one numeric vector. Vectors in one batch
    /// have equal length.
    async fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f64>>, SondoError>;

    /// Model identifier for logging
    fn model_name(&self) -> &str;
}
