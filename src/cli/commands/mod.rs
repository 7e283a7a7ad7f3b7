mod ask;
mod config;
mod dates;
mod documents;
mod fragments;
mod status;
mod summarize;

pub use ask::AskArgs;
pub use config::ConfigCommand;
pub use dates::DatesCommand;
pub use documents::DocumentsCommand;
pub use fragments::FragmentsArgs;
pub use summarize::SummarizeArgs;

pub use ask::handle_ask;
pub use config::handle_config;
pub use dates::handle_dates;
pub use documents::handle_documents;
pub use fragments::handle_fragments;
pub use status::handle_status;
pub use summarize::handle_summarize;
