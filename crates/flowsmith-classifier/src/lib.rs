//! Flowsmith step classifier.
//!
//! Maps a free-text task description to a step category plus the parameters,
//! prompt configuration, and handler reference that category implies.
//!
//! - **[`keywords`]** -- The versioned, ordered keyword table.
//! - **[`classifier`]** -- Aho-Corasick matching and per-category inference.
//! - **[`error`]** -- Classifier error types via [`thiserror`].

pub mod classifier;
pub mod error;
pub mod keywords;

pub use classifier::{Classification, KeywordClassifier, normalize_handler};
pub use error::{ClassifierError, Result};
pub use keywords::{KEYWORD_TABLE_VERSION, KeywordRule, KeywordTable};
