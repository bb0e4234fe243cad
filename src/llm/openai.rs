use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use crate::errors::SondoError;
use super::provider::{Embedder, TextGenerator};
use super::types::{ChatOptions, LLMResponse};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

fn completions_url(base: &str) -> String {
    format!("{}/v1/chat/completions", base.trim_end_matches('/'))
}

fn embeddings_url(base: &str) -> String {
    format!("{}/v1/embeddings", base.trim_end_matches('/'))
}

/// Chat client for any OpenAI-compatible completion endpoint.
pub struct OpenAiChat {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiChat {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiChat {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
        options: &ChatOptions,
    ) -> Result<LLMResponse, SondoError> {
        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(json!({"role": "system", "content": sys}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": options.temperature,
        });
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(top_p) = options.top_p {
            body["top_p"] = json!(top_p);
        }

        let resp = self.client
            .post(completions_url(&self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| SondoError::Network(format!("Chat request failed: {}", e)))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(SondoError::RateLimit("Chat service rate limit".into()));
        }
        if status.as_u16() == 401 {
            return Err(SondoError::Authentication("Invalid chat service API key".into()));
        }

        let data: Value = resp.json().await
            .map_err(|e| SondoError::LLMApi(format!("Failed to parse chat response: {}", e)))?;

        if let Some(error) = data.get("error") {
            return Err(SondoError::LLMApi(
                error["message"].as_str().unwrap_or("Unknown").to_string(),
            ));
        }

        let content = data["choices"][0]["message"]["content"].as_str()
            .ok_or_else(|| SondoError::LLMApi("No content in chat response".into()))?
            .to_string();
        let input_tokens = data["usage"]["prompt_tokens"].as_u64();
        let output_tokens = data["usage"]["completion_tokens"].as_u64();

        debug!(model = %self.model, input_tokens, output_tokens, "Chat completion");

        Ok(LLMResponse {
            content,
            input_tokens,
            output_tokens,
            model: self.model.clone(),
        })
    }

    fn model_name(&self) -> &str { &self.model }
}

/// Embedding client for any OpenAI-compatible embeddings endpoint.
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiEmbedder {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f64>>, SondoError> {
        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let resp = self.client
            .post(embeddings_url(&self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| SondoError::Network(format!("Embedding request failed: {}", e)))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(SondoError::RateLimit("Embedding service rate limit".into()));
        }
        if status.as_u16() == 401 {
            return Err(SondoError::Authentication("Invalid embedding service API key".into()));
        }

        let data: Value = resp.json().await
            .map_err(|e| SondoError::LLMApi(format!("Failed to parse embedding response: {}", e)))?;

        if let Some(error) = data.get("error") {
            return Err(SondoError::LLMApi(
                error["message"].as_str().unwrap_or("Unknown").to_string(),
            ));
        }

        let rows = data["data"].as_array()
            .ok_or_else(|| SondoError::LLMApi("No data in embedding response".into()))?;

        let mut vectors = Vec::with_capacity(rows.len());
        for row in rows {
            let vector = row["embedding"].as_array()
                .ok_or_else(|| SondoError::LLMApi("Missing embedding vector".into()))?
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0))
                .collect();
            vectors.push(vector);
        }

        debug!(model = %self.model, count = vectors.len(), "Embeddings computed");
        Ok(vectors)
    }

    fn model_name(&self) -> &str { &self.model }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url_strips_trailing_slash() {
        assert_eq!(
            completions_url("https://api.example.com/"),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_embeddings_url() {
        assert_eq!(
            embeddings_url("http://10.0.0.2:8000"),
            "http://10.0.0.2:8000/v1/embeddings"
        );
    }
}
