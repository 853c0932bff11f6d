use anyhow::{Context, Result};
use clap::Parser;
use search_core::config::DEFAULT_TOP_K;
use search_core::persist::open_with_retry;
use search_core::search::format_hits;
use search_core::tokenizer::normalize;
use search_core::{Bm25Engine, Bm25Params, IndexError, RetryPolicy};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "query")]
#[command(about = "Rank indexed documents for a free-text query with BM25")]
struct Args {
    /// Index store directory
    #[arg(long, default_value = "./index")]
    index: String,
    /// BM25 term-frequency saturation (overrides BM25_K1)
    #[arg(long)]
    k1: Option<f64>,
    /// BM25 length normalization (overrides BM25_B)
    #[arg(long)]
    b: Option<f64>,
    /// Number of results to print
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
    /// Query words
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let args = Args::parse();
    let params = Bm25Params::from_env()?.with_overrides(args.k1, args.b)?;

    let query = args.query.join(" ");
    tracing::info!(%query, terms = ?normalize(&query), "running query");

    let store = open_with_retry(&args.index, RetryPolicy::default())
        .with_context(|| format!("opening index store at {}", args.index))?;
    let engine = Bm25Engine::new(Arc::new(store), params)?;

    let outcome = match engine.search_hits(&query, args.top_k) {
        Err(IndexError::IndexUnavailable) => anyhow::bail!("no document statistics found in the index store; build or load the index first"),
        other => other?,
    };

    println!("Top {} relevant documents:", args.top_k);
    println!("--------------------------");
    println!("{}", format_hits(&outcome.hits));
    Ok(())
}
