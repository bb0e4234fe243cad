pub mod truncation;

pub use truncation::{preview, truncate_output};
