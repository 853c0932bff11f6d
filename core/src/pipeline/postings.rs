use super::IndexJob;
use crate::lines::{format_posting, format_posting_list, parse_posting};
use crate::tokenizer::normalize;
use crate::{DocId, Document, PostingList, Term};
use std::collections::{BTreeMap, HashMap};

/// term -> {doc_id: tf}
#[derive(Debug, Clone, Copy, Default)]
pub struct PostingsJob;

impl IndexJob for PostingsJob {
    type Key = Term;
    type Value = (DocId, u32);
    type Output = PostingList;

    fn map(&self, doc: &Document) -> Vec<(Term, (DocId, u32))> {
        let mut tf: HashMap<String, u32> = HashMap::new();
        for term in normalize(&doc.content) {
            *tf.entry(term).or_insert(0) += 1;
        }
        tf.into_iter().map(|(term, n)| (term, (doc.doc_id.clone(), n))).collect()
    }

    fn reduce(&self, term: Term, values: Vec<(DocId, u32)>) -> Vec<PostingList> {
        // one (term, doc) pair per document, so no merge on collision
        let postings: BTreeMap<DocId, u32> = values.into_iter().filter(|(_, tf)| *tf > 0).collect();
        if postings.is_empty() { return Vec::new(); }
        vec![PostingList { term, postings }]
    }

    fn format_pair(&self, term: &Term, (doc_id, tf): &(DocId, u32)) -> String { format_posting(term, doc_id, *tf) }

    fn parse_pair(&self, line: &str) -> Option<(Term, (DocId, u32))> {
        parse_posting(line).map(|(term, doc_id, tf)| (term, (doc_id, tf)))
    }

    fn format_output(&self, output: &PostingList) -> String { format_posting_list(output) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_emits_one_triple_per_distinct_term() {
        let mut out = PostingsJob.map(&Document::new("d", "", "a b a c a"));
        out.sort();
        assert_eq!(
            out,
            vec![
                ("a".to_string(), ("d".to_string(), 3)),
                ("b".to_string(), ("d".to_string(), 1)),
                ("c".to_string(), ("d".to_string(), 1)),
            ]
        );
    }

    #[test]
    fn empty_document_emits_nothing() {
        assert!(PostingsJob.map(&Document::new("d", "", "  ...  ")).is_empty());
    }
}
