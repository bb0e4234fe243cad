pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod expand;
pub mod inputs;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod store;
pub mod synthesis;
pub mod utils;
pub mod writer;
