pub mod provider;
pub mod openai;
pub mod parse;
pub mod types;

pub use openai::{OpenAiChat, OpenAiEmbedder};
pub use provider::{Embedder, TextGenerator};
pub use types::{ChatOptions, LLMResponse};
