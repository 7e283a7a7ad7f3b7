//! Utility modules.

pub mod text;

pub use text::{preview, truncate_chars};
