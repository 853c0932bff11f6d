use super::{saturating_count, IndexJob};
use crate::lines::{format_doc_length, format_stats, parse_doc_length};
use crate::tokenizer::normalize;
use crate::{DocLength, Document, DocumentStats};

/// Per-document lengths plus the corpus-wide average and size, broadcast to every row.
///
/// All map output shares the unit key, so the reduction is a single global reducer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentStatsJob;

impl IndexJob for DocumentStatsJob {
    type Key = ();
    type Value = DocLength;
    type Output = DocumentStats;

    fn map(&self, doc: &Document) -> Vec<((), DocLength)> {
        let term_count = saturating_count(normalize(&doc.content).len());
        vec![((), DocLength { doc_id: doc.doc_id.clone(), title: doc.title.clone(), term_count })]
    }

    fn reduce(&self, _key: (), mut values: Vec<DocLength>) -> Vec<DocumentStats> {
        let total_docs = saturating_count(values.len());
        let total_terms: u64 = values.iter().map(|v| u64::from(v.term_count)).sum();
        let avg_doc_length = average(total_terms, values.len());
        values.sort_by(|a, b| a.doc_id.cmp(&b.doc_id));
        values
            .into_iter()
            .map(|v| DocumentStats {
                doc_id: v.doc_id,
                title: v.title,
                term_count: v.term_count,
                avg_doc_length,
                total_docs,
            })
            .collect()
    }

    fn format_pair(&self, _key: &(), value: &DocLength) -> String { format_doc_length(value) }

    fn parse_pair(&self, line: &str) -> Option<((), DocLength)> { parse_doc_length(line).map(|d| ((), d)) }

    fn format_output(&self, output: &DocumentStats) -> String { format_stats(output) }
}

fn average(total_terms: u64, docs: usize) -> f64 {
    if docs == 0 { 0.0 } else { total_terms as f64 / docs as f64 }
}
