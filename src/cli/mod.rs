pub mod commands;
pub mod execute;
pub mod generate;
pub mod verify;

pub use commands::{Cli, Commands};
