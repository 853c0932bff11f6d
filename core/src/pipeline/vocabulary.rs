use super::{saturating_count, IndexJob};
use crate::lines::{format_occurrence, format_vocabulary, parse_occurrence};
use crate::tokenizer::normalize;
use crate::{DocId, Document, Term, VocabularyEntry};
use std::collections::BTreeSet;

/// term -> number of distinct documents containing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct VocabularyJob;

impl IndexJob for VocabularyJob {
    type Key = Term;
    type Value = DocId;
    type Output = VocabularyEntry;

    fn map(&self, doc: &Document) -> Vec<(Term, DocId)> {
        let terms: BTreeSet<String> = normalize(&doc.content).into_iter().collect();
        terms.into_iter().map(|t| (t, doc.doc_id.clone())).collect()
    }

    fn reduce(&self, term: Term, values: Vec<DocId>) -> Vec<VocabularyEntry> {
        // dedupe again, map-side dedup is not trusted
        let docs: BTreeSet<DocId> = values.into_iter().collect();
        vec![VocabularyEntry { term, doc_count: saturating_count(docs.len()) }]
    }

    fn format_pair(&self, term: &Term, doc_id: &DocId) -> String { format_occurrence(term, doc_id) }

    fn parse_pair(&self, line: &str) -> Option<(Term, DocId)> { parse_occurrence(line) }

    fn format_output(&self, output: &VocabularyEntry) -> String { format_vocabulary(output) }
}
