use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use search_core::lines::{parse_document, parse_posting_list, parse_stats, parse_vocabulary};
use search_core::persist::open_with_retry;
use search_core::pipeline::stream::{run_map, run_reduce, StreamReport};
use search_core::pipeline::{build_index, DocumentStatsJob, IndexArtifacts, LocalShuffle, PostingsJob, VocabularyJob};
use search_core::{Document, IndexStore, RetryPolicy};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(alias = "body")]
    content: String,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and load the BM25 inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from raw tab-separated documents (or JSONL) and replace the store contents
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Index store directory
        #[arg(long, default_value = "./index")]
        index: String,
        /// Number of map partitions (defaults to available parallelism)
        #[arg(long)]
        partitions: Option<usize>,
    },
    /// Streaming map step: raw documents on stdin, map lines on stdout
    Map {
        #[arg(value_enum)]
        stage: Stage,
    },
    /// Streaming reduce step: map lines on stdin (any order), reduce lines on stdout
    Reduce {
        #[arg(value_enum)]
        stage: Stage,
    },
    /// Load reduce outputs into the store, replacing its contents
    Load {
        /// Index store directory
        #[arg(long, default_value = "./index")]
        index: String,
        /// Vocabulary reduce output (`term<TAB>doc_count`)
        #[arg(long, default_value = "./out/vocabulary.txt")]
        vocabulary: PathBuf,
        /// Postings reduce output (`term<TAB>doc:tf,...`)
        #[arg(long, default_value = "./out/document_index.txt")]
        postings: PathBuf,
        /// Document stats reduce output
        #[arg(long, default_value = "./out/document_stats.txt")]
        stats: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Stage {
    Stats,
    Postings,
    Vocabulary,
}

fn main() -> Result<()> {
    // stdout carries pipeline data, logs go to stderr
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, index, partitions } => build(&input, &index, partitions),
        Commands::Map { stage } => stream(stage, false),
        Commands::Reduce { stage } => stream(stage, true),
        Commands::Load { index, vocabulary, postings, stats } => load(&index, &vocabulary, &postings, &stats),
    }
}

fn build(input: &str, index: &str, partitions: Option<usize>) -> Result<()> {
    let docs = read_documents(Path::new(input))?;
    tracing::info!(num_docs = docs.len(), input, "ingested documents");

    let engine = partitions.map(LocalShuffle::new).unwrap_or_default();
    let artifacts = build_index(&engine, &docs);

    let store = open_with_retry(index, RetryPolicy::default())?;
    store.replace(&artifacts)?;
    tracing::info!(index, num_docs = artifacts.num_docs(), num_terms = artifacts.num_terms(), "index build complete");
    Ok(())
}

fn stream(stage: Stage, reduce: bool) -> Result<()> {
    let input = io::stdin().lock();
    let output = BufWriter::new(io::stdout().lock());
    let report: StreamReport = match (stage, reduce) {
        (Stage::Stats, false) => run_map(&DocumentStatsJob, input, output)?,
        (Stage::Stats, true) => run_reduce(&DocumentStatsJob, input, output)?,
        (Stage::Postings, false) => run_map(&PostingsJob, input, output)?,
        (Stage::Postings, true) => run_reduce(&PostingsJob, input, output)?,
        (Stage::Vocabulary, false) => run_map(&VocabularyJob, input, output)?,
        (Stage::Vocabulary, true) => run_reduce(&VocabularyJob, input, output)?,
    };
    tracing::info!(?stage, reduce, lines_in = report.lines_in, skipped = report.skipped, lines_out = report.lines_out, "stream complete");
    Ok(())
}

fn load(index: &str, vocabulary: &Path, postings: &Path, stats: &Path) -> Result<()> {
    let artifacts = IndexArtifacts {
        vocabulary: read_lines(vocabulary, parse_vocabulary)?,
        postings: read_lines(postings, parse_posting_list)?,
        stats: read_lines(stats, parse_stats)?,
    };
    let store = open_with_retry(index, RetryPolicy::default())?;
    store.replace(&artifacts)?;
    tracing::info!(index, num_docs = artifacts.num_docs(), num_terms = artifacts.num_terms(), "index load complete");
    Ok(())
}

/// Parse every well-formed line of `path`; a missing file is empty.
fn read_lines<T>(path: &Path, parse: fn(&str) -> Option<T>) -> Result<Vec<T>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "input file does not exist, skipping");
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    let mut skipped = 0usize;
    for line in BufReader::new(File::open(path)?).lines() {
        match parse(&line?) {
            Some(v) => out.push(v),
            None => skipped += 1,
        }
    }
    tracing::info!(path = %path.display(), rows = out.len(), skipped, "read reduce output");
    Ok(out)
}

fn read_documents(input_path: &Path) -> Result<Vec<Document>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            if entry.path().is_file() {
                files.push(entry.path().to_path_buf());
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        anyhow::bail!("input path {} does not exist", input_path.display());
    }

    let mut docs = Vec::new();
    for file in files {
        let jsonl = file.extension().and_then(|s| s.to_str()) == Some("jsonl");
        for line in BufReader::new(File::open(&file)?).lines() {
            let line = line?;
            let doc = if jsonl { parse_json_doc(&line) } else { parse_document(&line) };
            match doc {
                Some(doc) => docs.push(doc),
                None => tracing::debug!(file = %file.display(), "skipping malformed input line"),
            }
        }
    }
    Ok(docs)
}

fn parse_json_doc(line: &str) -> Option<Document> {
    if line.trim().is_empty() { return None; }
    let doc: InputDoc = serde_json::from_str(line).ok()?;
    Some(Document::new(doc.id, doc.title, doc.content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_tsv_and_jsonl_documents() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "1_First\tHello world\nbad line\n2\t\n").unwrap();
        fs::write(dir.path().join("b.jsonl"), "{\"id\":\"3\",\"title\":\"Third\",\"body\":\"json body\"}\n\n{oops}\n").unwrap();

        let docs = read_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0], Document::new("1", "First", "Hello world"));
        assert_eq!(docs[1], Document::new("2", "", ""));
        assert_eq!(docs[2], Document::new("3", "Third", "json body"));
    }

    #[test]
    fn build_then_load_round_trip_through_the_store() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("corpus.tsv");
        fs::write(&input, "1_Cats\tthe cat sat\n2_Mats\tthe cat sat on the mat\n").unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("vocabulary.txt"), "cat\t2\nbroken\n").unwrap();
        fs::write(out.join("document_index.txt"), "cat\t1:1,2:1\n").unwrap();

        let index = dir.path().join("idx");
        let index = index.to_str().unwrap();
        build(input.to_str().unwrap(), index, Some(2)).unwrap();
        load(index, &out.join("vocabulary.txt"), &out.join("document_index.txt"), &out.join("missing.txt")).unwrap();

        let store = search_core::persist::SledStore::open(index).unwrap();
        assert_eq!(store.doc_count("cat").unwrap(), Some(2));
        assert_eq!(store.postings("cat").unwrap().unwrap().postings.len(), 2);
        // the stats file was missing, so the loaded index has no baseline
        assert!(store.document_stats().unwrap().is_empty());
    }
}
