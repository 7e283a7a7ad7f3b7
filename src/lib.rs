pub mod app;
pub mod cli;
pub mod error;
pub mod models;
pub mod rag;
pub mod services;
pub mod utils;

pub use app::App;
pub use cli::{Cli, Commands};
pub use error::{AppError, PipelineError};
pub use models::{Answer, Config, OutputFormat, Summary};
