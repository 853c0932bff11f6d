use crate::pipeline::IndexArtifacts;
use crate::{DocId, DocumentStats, PostingList, Result, Term};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Read access to one complete build of the index.
///
/// A snapshot never changes after it is handed out, whatever `replace` does to the store
/// meanwhile. The batched lookups exist so a backend can pipeline them, and default to one
/// lookup per term.
pub trait IndexSnapshot: Send + Sync {
    fn doc_count(&self, term: &str) -> Result<Option<u32>>;
    fn postings(&self, term: &str) -> Result<Option<PostingList>>;
    fn document(&self, doc_id: &str) -> Result<Option<DocumentStats>>;
    fn document_stats(&self) -> Result<Vec<DocumentStats>>;

    fn doc_counts(&self, terms: &[&str]) -> Result<HashMap<Term, u32>> {
        let mut out = HashMap::new();
        for term in terms {
            if let Some(n) = self.doc_count(term)? {
                out.insert(term.to_string(), n);
            }
        }
        Ok(out)
    }

    fn postings_for(&self, terms: &[&str]) -> Result<HashMap<Term, PostingList>> {
        let mut out = HashMap::new();
        for term in terms {
            if let Some(list) = self.postings(term)? {
                out.insert(term.to_string(), list);
            }
        }
        Ok(out)
    }
}

/// Keyed storage of the three index artifacts.
///
/// `replace` is all-or-nothing: readers see either the previous build or the new one, and a
/// failed replace leaves the previous build in place. The single-lookup helpers each read the
/// current snapshot; use [`IndexStore::snapshot`] to keep several reads on one build.
pub trait IndexStore: Send + Sync {
    /// Wholesale replace the stored index with `artifacts`.
    fn replace(&self, artifacts: &IndexArtifacts) -> Result<()>;

    /// Pin the current build.
    fn snapshot(&self) -> Result<Arc<dyn IndexSnapshot>>;

    fn doc_count(&self, term: &str) -> Result<Option<u32>> {
        self.snapshot()?.doc_count(term)
    }

    fn postings(&self, term: &str) -> Result<Option<PostingList>> {
        self.snapshot()?.postings(term)
    }

    fn document(&self, doc_id: &str) -> Result<Option<DocumentStats>> {
        self.snapshot()?.document(doc_id)
    }

    fn document_stats(&self) -> Result<Vec<DocumentStats>> {
        self.snapshot()?.document_stats()
    }

    fn doc_counts(&self, terms: &[&str]) -> Result<HashMap<Term, u32>> {
        self.snapshot()?.doc_counts(terms)
    }
}

#[derive(Default)]
struct Tables {
    vocabulary: BTreeMap<Term, u32>,
    document_index: BTreeMap<Term, BTreeMap<DocId, u32>>,
    document_stats: BTreeMap<DocId, DocumentStats>,
}

impl Tables {
    fn build(artifacts: &IndexArtifacts) -> Self {
        let mut t = Tables::default();
        for v in &artifacts.vocabulary {
            t.vocabulary.insert(v.term.clone(), v.doc_count);
        }
        for p in &artifacts.postings {
            t.document_index.entry(p.term.clone()).or_default().extend(p.postings.iter().map(|(d, tf)| (d.clone(), *tf)));
        }
        for s in &artifacts.stats {
            t.document_stats.insert(s.doc_id.clone(), s.clone());
        }
        t
    }
}

impl IndexSnapshot for Tables {
    fn doc_count(&self, term: &str) -> Result<Option<u32>> {
        Ok(self.vocabulary.get(term).copied())
    }

    fn postings(&self, term: &str) -> Result<Option<PostingList>> {
        Ok(self.document_index.get(term).map(|p| PostingList { term: term.to_string(), postings: p.clone() }))
    }

    fn document(&self, doc_id: &str) -> Result<Option<DocumentStats>> {
        Ok(self.document_stats.get(doc_id).cloned())
    }

    fn document_stats(&self) -> Result<Vec<DocumentStats>> {
        Ok(self.document_stats.values().cloned().collect())
    }
}

/// In-memory store. `replace` builds the new tables off to the side and swaps them in.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Arc<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_artifacts(artifacts: &IndexArtifacts) -> Self {
        Self { tables: RwLock::new(Arc::new(Tables::build(artifacts))) }
    }
}

impl IndexStore for MemoryStore {
    fn replace(&self, artifacts: &IndexArtifacts) -> Result<()> {
        let tables = Arc::new(Tables::build(artifacts));
        *self.tables.write() = tables;
        Ok(())
    }

    fn snapshot(&self) -> Result<Arc<dyn IndexSnapshot>> {
        let tables: Arc<Tables> = self.tables.read().clone();
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VocabularyEntry;

    fn vocabulary(term: &str, doc_count: u32) -> IndexArtifacts {
        IndexArtifacts { vocabulary: vec![VocabularyEntry { term: term.into(), doc_count }], ..Default::default() }
    }

    #[test]
    fn replace_drops_previous_build() {
        let store = MemoryStore::new();
        store.replace(&vocabulary("old", 1)).unwrap();
        assert_eq!(store.doc_count("old").unwrap(), Some(1));

        store.replace(&IndexArtifacts::default()).unwrap();
        assert_eq!(store.doc_count("old").unwrap(), None);
        assert!(store.document_stats().unwrap().is_empty());
    }

    #[test]
    fn batched_lookups_skip_missing_terms() {
        let store = MemoryStore::with_artifacts(&vocabulary("cat", 2));
        let counts = store.doc_counts(&["cat", "dog"]).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["cat"], 2);
    }

    #[test]
    fn snapshot_outlives_replace() {
        let store = MemoryStore::with_artifacts(&vocabulary("old", 1));
        let pinned = store.snapshot().unwrap();
        store.replace(&vocabulary("new", 3)).unwrap();

        assert_eq!(pinned.doc_count("old").unwrap(), Some(1));
        assert_eq!(pinned.doc_count("new").unwrap(), None);
        assert_eq!(store.doc_count("new").unwrap(), Some(3));
    }
}
