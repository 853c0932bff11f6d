//! Index construction as three independent map/reduce jobs over the same corpus.

use crate::{Document, DocumentStats, PostingList, VocabularyEntry};

pub mod postings;
pub mod shuffle;
pub mod stats;
pub mod stream;
pub mod vocabulary;

pub use postings::PostingsJob;
pub use shuffle::{LocalShuffle, ShuffleEngine};
pub use stats::DocumentStatsJob;
pub use vocabulary::VocabularyJob;

/// One map/reduce pass over documents.
///
/// `reduce` receives every value emitted for `key` in no particular order, so it must fold
/// them commutatively. The line codecs are the tab-separated formats used by the
/// streaming front end.
pub trait IndexJob: Sync {
    type Key: Ord + Send;
    type Value: Send;
    type Output: Send;

    fn map(&self, doc: &Document) -> Vec<(Self::Key, Self::Value)>;
    fn reduce(&self, key: Self::Key, values: Vec<Self::Value>) -> Vec<Self::Output>;

    fn format_pair(&self, key: &Self::Key, value: &Self::Value) -> String;
    fn parse_pair(&self, line: &str) -> Option<(Self::Key, Self::Value)>;
    fn format_output(&self, output: &Self::Output) -> String;
}

/// The three corpus-level artifacts of one build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexArtifacts {
    pub vocabulary: Vec<VocabularyEntry>,
    pub postings: Vec<PostingList>,
    pub stats: Vec<DocumentStats>,
}

impl IndexArtifacts {
    pub fn num_docs(&self) -> usize { self.stats.len() }
    pub fn num_terms(&self) -> usize { self.vocabulary.len() }
}

/// Narrow a collection size to the stored `u32` count, saturating at `u32::MAX`.
pub fn saturating_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Run all three jobs over `docs` on `engine`.
pub fn build_index<E: ShuffleEngine>(engine: &E, docs: &[Document]) -> IndexArtifacts {
    let stats = engine.run(&DocumentStatsJob, docs);
    tracing::info!(rows = stats.len(), "document stats built");
    let postings = engine.run(&PostingsJob, docs);
    tracing::info!(terms = postings.len(), "postings built");
    let vocabulary = engine.run(&VocabularyJob, docs);
    tracing::info!(terms = vocabulary.len(), "vocabulary built");
    IndexArtifacts { vocabulary, postings, stats }
}
