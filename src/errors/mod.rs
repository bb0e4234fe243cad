pub mod types;

pub use types::SondoError;
