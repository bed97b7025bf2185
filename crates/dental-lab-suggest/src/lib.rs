//! Smart input suggestions for case entry.
//!
//! Two sources of suggestions:
//! - a prompt for a hosted language model ([`build_suggestion_prompt`]) and a
//!   tolerant parser for its reply ([`parse_suggestions`]);
//! - an offline [`VocabularySuggester`] ranking the lab's fixed vocabularies
//!   by string similarity.

pub mod extraction;
pub mod prompts;
pub mod vocabulary;

pub use extraction::*;
pub use prompts::*;
pub use vocabulary::*;
