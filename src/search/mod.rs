//! Full-text search over view objects.
//!
//! - `index`: tokenizer and fuzzy inverted index
//! - `engine`: the index plus its id -> view object table

pub mod engine;
pub mod index;

pub use engine::{IndexStats, MAX_SEARCH_RESULTS, SearchEngine};
pub use index::{Hit, IndexConfig, TextIndex};
