pub mod credentials;
pub mod parser;
pub mod types;

pub use credentials::{ChatCredentials, EmbeddingCredentials};
pub use parser::parse_config;
pub use types::*;
