use search_core::pipeline::{build_index, LocalShuffle};
use search_core::Document;
use std::collections::BTreeSet;

fn corpus() -> Vec<Document> {
    vec![
        Document::from_key("1_Cats", "The cat sat."),
        Document::from_key("2_Mats", "The cat sat on the mat!"),
        Document::from_key("3", ""),
        Document::from_key("4_Dogs_and_more", "A dog chased the cat; the cat ran."),
        Document::from_key("5_Birds", "Birds sing. Birds fly."),
    ]
}

#[test]
fn vocabulary_matches_posting_lists() {
    let idx = build_index(&LocalShuffle::new(2), &corpus());
    assert_eq!(idx.vocabulary.len(), idx.postings.len());
    for entry in &idx.vocabulary {
        let list = idx.postings.iter().find(|p| p.term == entry.term).expect("posting list for term");
        assert_eq!(entry.doc_count as usize, list.postings.len(), "term {}", entry.term);
        assert!(entry.doc_count >= 1);
        assert!(list.postings.values().all(|tf| *tf >= 1));
    }
}

#[test]
fn stats_broadcast_corpus_scalars() {
    let idx = build_index(&LocalShuffle::new(3), &corpus());
    assert_eq!(idx.stats.len(), 5);
    let total_terms: u32 = idx.stats.iter().map(|s| s.term_count).sum();
    let expected_avg = total_terms as f64 / 5.0;
    for row in &idx.stats {
        assert_eq!(row.total_docs, 5);
        assert!((row.avg_doc_length - expected_avg).abs() < 1e-9);
    }
}

#[test]
fn title_comes_from_first_underscore_split() {
    let idx = build_index(&LocalShuffle::new(1), &corpus());
    let dog = idx.stats.iter().find(|s| s.doc_id == "4").unwrap();
    assert_eq!(dog.title, "Dogs_and_more");
    let untitled = idx.stats.iter().find(|s| s.doc_id == "3").unwrap();
    assert_eq!(untitled.title, "");
}

#[test]
fn empty_document_counts_but_has_no_postings() {
    let idx = build_index(&LocalShuffle::new(2), &corpus());
    let empty = idx.stats.iter().find(|s| s.doc_id == "3").unwrap();
    assert_eq!(empty.term_count, 0);
    assert_eq!(empty.total_docs, 5);
    // 3 + 6 + 0 + 8 + 4
    assert!((empty.avg_doc_length - 21.0 / 5.0).abs() < 1e-9);
    assert!(idx.postings.iter().all(|p| !p.postings.contains_key("3")));
}

#[test]
fn term_frequencies_are_counted_per_document() {
    let idx = build_index(&LocalShuffle::new(2), &corpus());
    let the = idx.postings.iter().find(|p| p.term == "the").unwrap();
    assert_eq!(the.postings.get("1"), Some(&1));
    assert_eq!(the.postings.get("2"), Some(&2));
    assert_eq!(the.postings.get("4"), Some(&2));
    let cat = idx.vocabulary.iter().find(|v| v.term == "cat").unwrap();
    assert_eq!(cat.doc_count, 3);
}

#[test]
fn output_does_not_depend_on_partitioning() {
    let docs = corpus();
    let one = build_index(&LocalShuffle::new(1), &docs);
    for partitions in [2, 3, 8] {
        assert_eq!(build_index(&LocalShuffle::new(partitions), &docs), one);
    }
}

#[test]
fn empty_corpus_builds_nothing() {
    let idx = build_index(&LocalShuffle::new(4), &[]);
    assert!(idx.stats.is_empty());
    assert!(idx.postings.is_empty());
    assert!(idx.vocabulary.is_empty());
}

#[test]
fn vocabulary_terms_are_unique() {
    let idx = build_index(&LocalShuffle::new(2), &corpus());
    let terms: BTreeSet<_> = idx.vocabulary.iter().map(|v| v.term.clone()).collect();
    assert_eq!(terms.len(), idx.vocabulary.len());
}
