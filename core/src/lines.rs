//! Tab-separated line formats exchanged between pipeline stages.
//!
//! Every `parse_*` function returns `None` for a malformed line (wrong field count, non-numeric
//! count) so callers can skip it without failing the batch. Only the line terminator is
//! stripped: leading/trailing tabs are significant because fields may be empty. Numeric fields
//! tolerate surrounding spaces.

use crate::{DocLength, Document, DocumentStats, PostingList, VocabularyEntry};
use std::collections::BTreeMap;
use std::str::FromStr;

fn fields(line: &str) -> Vec<&str> {
    line.trim_end_matches(['\n', '\r']).split('\t').collect()
}

fn number<T: FromStr>(field: &str) -> Option<T> {
    field.trim().parse().ok()
}

/// Raw input: `doc_id_title<TAB>content`. Fields past the second are ignored.
pub fn parse_document(line: &str) -> Option<Document> {
    let parts = fields(line);
    if parts.len() < 2 { return None; }
    Some(Document::from_key(parts[0], parts[1]))
}

/// Stats map output: `doc_id<TAB>title<TAB>term_count`.
pub fn format_doc_length(d: &DocLength) -> String {
    format!("{}\t{}\t{}", d.doc_id, d.title, d.term_count)
}

pub fn parse_doc_length(line: &str) -> Option<DocLength> {
    match fields(line).as_slice() {
        [doc_id, title, count] => Some(DocLength {
            doc_id: doc_id.to_string(),
            title: title.to_string(),
            term_count: number(count)?,
        }),
        _ => None,
    }
}

/// Stats reduce output: `doc_id<TAB>title<TAB>term_count<TAB>avg_doc_length<TAB>total_docs`.
pub fn format_stats(s: &DocumentStats) -> String {
    format!("{}\t{}\t{}\t{}\t{}", s.doc_id, s.title, s.term_count, s.avg_doc_length, s.total_docs)
}

pub fn parse_stats(line: &str) -> Option<DocumentStats> {
    match fields(line).as_slice() {
        [doc_id, title, count, avg, total] => Some(DocumentStats {
            doc_id: doc_id.to_string(),
            title: title.to_string(),
            term_count: number(count)?,
            avg_doc_length: number::<f64>(avg).filter(|v| v.is_finite())?,
            total_docs: number(total)?,
        }),
        _ => None,
    }
}

/// Postings map output: `term<TAB>doc_id<TAB>tf`.
pub fn format_posting(term: &str, doc_id: &str, tf: u32) -> String {
    format!("{term}\t{doc_id}\t{tf}")
}

pub fn parse_posting(line: &str) -> Option<(String, String, u32)> {
    match fields(line).as_slice() {
        [term, doc_id, tf] => {
            let tf: u32 = number(tf)?;
            (tf > 0).then(|| (term.to_string(), doc_id.to_string(), tf))
        }
        _ => None,
    }
}

/// Postings reduce output: `term<TAB>doc_id1:tf1,doc_id2:tf2,...`.
pub fn format_posting_list(list: &PostingList) -> String {
    let pairs: Vec<String> = list.postings.iter().map(|(doc_id, tf)| format!("{doc_id}:{tf}")).collect();
    format!("{}\t{}", list.term, pairs.join(","))
}

pub fn parse_posting_list(line: &str) -> Option<PostingList> {
    let parts = fields(line);
    let [term, pairs] = parts.as_slice() else { return None };
    let mut postings = BTreeMap::new();
    for pair in pairs.split(',') {
        // doc ids may contain ':', the tf never does
        let (doc_id, tf) = pair.rsplit_once(':')?;
        let tf: u32 = number(tf)?;
        if tf == 0 { return None; }
        postings.insert(doc_id.to_string(), tf);
    }
    Some(PostingList { term: term.to_string(), postings })
}

/// Vocabulary map output: `term<TAB>doc_id`.
pub fn format_occurrence(term: &str, doc_id: &str) -> String {
    format!("{term}\t{doc_id}")
}

pub fn parse_occurrence(line: &str) -> Option<(String, String)> {
    match fields(line).as_slice() {
        [term, doc_id] => Some((term.to_string(), doc_id.to_string())),
        _ => None,
    }
}

/// Vocabulary reduce output: `term<TAB>doc_count`.
pub fn format_vocabulary(entry: &VocabularyEntry) -> String {
    format!("{}\t{}", entry.term, entry.doc_count)
}

pub fn parse_vocabulary(line: &str) -> Option<VocabularyEntry> {
    match fields(line).as_slice() {
        [term, count] => Some(VocabularyEntry { term: term.to_string(), doc_count: number(count)? }),
        _ => None,
    }
}
