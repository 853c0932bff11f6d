use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod config;
pub mod error;
pub mod lines;
pub mod persist;
pub mod pipeline;
pub mod search;
pub mod store;
pub mod tokenizer;

pub use config::{Bm25Params, RetryPolicy};
pub use error::{IndexError, Result};
pub use pipeline::{build_index, IndexArtifacts};
pub use search::Bm25Engine;
pub use store::{IndexSnapshot, IndexStore, MemoryStore};

pub type DocId = String;
pub type Term = String;

/// A raw corpus record. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: DocId,
    pub title: String,
    pub content: String,
}

impl Document {
    pub fn new(doc_id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self { doc_id: doc_id.into(), title: title.into(), content: content.into() }
    }

    /// Build a document from a combined `doc_id_title` key, split on the first `_`.
    /// A key without `_` is all doc id and the title is empty.
    pub fn from_key(key: &str, content: impl Into<String>) -> Self {
        let (doc_id, title) = key.split_once('_').unwrap_or((key, ""));
        Self::new(doc_id, title, content)
    }
}

/// Output of the stats map step: one document's own length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocLength {
    pub doc_id: DocId,
    pub title: String,
    pub term_count: u32,
}

/// All postings of one term: doc id -> tf (tf >= 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingList {
    pub term: Term,
    pub postings: BTreeMap<DocId, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub term: Term,
    pub doc_count: u32,
}

/// Per-document row carrying the corpus-wide scalars `avg_doc_length` and `total_docs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub doc_id: DocId,
    pub title: String,
    pub term_count: u32,
    pub avg_doc_length: f64,
    pub total_docs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub doc_id: DocId,
    pub score: f64,
}

/// A ranked result joined with its title, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub rank: usize,
    pub doc_id: DocId,
    pub title: String,
    pub score: f64,
}
