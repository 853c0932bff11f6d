//! BM25 ranking over a stored index snapshot.
//!
//! score(D, Q) = Σ idf(q) · tf · (k1 + 1) / (tf + k1 · (1 - b + b · |D| / avgdl))
//!
//! with the ratio form idf(q) = max(0, (N - n(q) + 0.5) / (n(q) + 0.5)), not the logarithmic one.

use crate::config::Bm25Params;
use crate::store::IndexStore;
use crate::tokenizer::normalize;
use crate::{DocId, DocumentStats, IndexError, Result, ScoredResult, SearchHit};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Ranked hits for one query, with the number of documents that matched before truncation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub total_hits: usize,
    pub hits: Vec<SearchHit>,
}

/// Stateless query engine. Each query owns its accumulator, so one engine serves concurrent queries.
#[derive(Clone)]
pub struct Bm25Engine {
    store: Arc<dyn IndexStore>,
    params: Bm25Params,
}

impl Bm25Engine {
    pub fn new(store: Arc<dyn IndexStore>, params: Bm25Params) -> Result<Self> {
        params.validate()?;
        Ok(Self { store, params })
    }

    pub fn params(&self) -> Bm25Params { self.params }

    pub fn store(&self) -> &dyn IndexStore { self.store.as_ref() }

    /// Top `k` documents by descending score, ties broken by ascending doc id.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredResult>> {
        let (mut results, _) = self.rank(query)?;
        results.truncate(k);
        Ok(results)
    }

    /// Like [`Bm25Engine::search`], joined with titles and 1-based ranks.
    pub fn search_hits(&self, query: &str, k: usize) -> Result<SearchOutcome> {
        let (results, stats) = self.rank(query)?;
        let total_hits = results.len();
        let hits = results
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(i, r)| SearchHit {
                rank: i + 1,
                title: stats.get(&r.doc_id).map(|s| s.title.clone()).unwrap_or_default(),
                doc_id: r.doc_id,
                score: r.score,
            })
            .collect();
        Ok(SearchOutcome { total_hits, hits })
    }

    fn rank(&self, query: &str) -> Result<(Vec<ScoredResult>, HashMap<DocId, DocumentStats>)> {
        let terms = normalize(query);
        if terms.is_empty() {
            return Ok((Vec::new(), HashMap::new()));
        }

        // one build for the whole query, even if the store is replaced meanwhile
        let snapshot = self.store.snapshot()?;
        let stats: HashMap<DocId, DocumentStats> =
            snapshot.document_stats()?.into_iter().map(|s| (s.doc_id.clone(), s)).collect();
        if stats.is_empty() {
            return Err(IndexError::IndexUnavailable);
        }

        let distinct: Vec<&str> = terms.iter().map(String::as_str).collect::<BTreeSet<_>>().into_iter().collect();
        let doc_counts = snapshot.doc_counts(&distinct)?;
        let postings = snapshot.postings_for(&distinct)?;
        tracing::debug!(terms = distinct.len(), known = doc_counts.len(), with_postings = postings.len(), "query terms resolved");

        // every occurrence of a repeated query term contributes
        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for term in &terms {
            let Some(list) = postings.get(term) else { continue };
            // absent from the vocabulary: neutral doc count, avoids a zero denominator
            let doc_count = doc_counts.get(term).copied().unwrap_or(1);
            for (doc_id, &tf) in &list.postings {
                let Some(doc) = stats.get(doc_id) else { continue };
                *scores.entry(doc_id.clone()).or_insert(0.0) += self.contribution(tf, doc, doc_count);
            }
        }

        let mut results: Vec<ScoredResult> = scores.into_iter().map(|(doc_id, score)| ScoredResult { doc_id, score }).collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id)));
        Ok((results, stats))
    }

    fn contribution(&self, tf: u32, doc: &DocumentStats, doc_count: u32) -> f64 {
        term_score(self.params, tf, doc.term_count, doc.avg_doc_length, doc.total_docs, doc_count)
    }
}

pub fn idf(total_docs: u32, doc_count: u32) -> f64 {
    let n = total_docs as f64;
    let df = doc_count as f64;
    ((n - df + 0.5) / (df + 0.5)).max(0.0)
}

/// One term's contribution to one document.
pub fn term_score(params: Bm25Params, tf: u32, doc_len: u32, avg_doc_length: f64, total_docs: u32, doc_count: u32) -> f64 {
    let Bm25Params { k1, b } = params;
    let length_norm = if avg_doc_length > 0.0 {
        1.0 - b + b * doc_len as f64 / avg_doc_length
    } else {
        1.0 - b
    };
    let tf = tf as f64;
    let tf_norm = tf * (k1 + 1.0) / (tf + k1 * length_norm);
    idf(total_docs, doc_count) * tf_norm
}

/// Render hits one per line with 4-decimal scores.
pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No relevant documents found for the query.".to_string();
    }
    hits.iter()
        .map(|h| format!("{}. Document ID: {}, Title: {}, Score: {:.4}", h.rank, h.doc_id, h.title, h.score))
        .collect::<Vec<_>>()
        .join("\n")
}
