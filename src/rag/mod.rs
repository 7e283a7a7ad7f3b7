//! Retrieval-augmented generation core.
//!
//! [`QueryPipeline`] answers questions from the closest fragments and cites
//! them through the [`SourceResolver`]; [`SummaryPipeline`] reassembles a whole
//! document through the [`FragmentLookup`] chain and summarizes it.

pub mod context;
pub mod key_dates;
pub mod lookup;
pub mod metadata;
mod query;
mod resolver;
mod summarize;

#[cfg(test)]
pub(crate) mod testing;

pub use key_dates::KeyDatesService;
pub use lookup::{FragmentLookup, LookupChain, LookupOutcome};
pub use query::QueryPipeline;
pub use resolver::{SourceResolver, group_sources};
pub use summarize::SummaryPipeline;
