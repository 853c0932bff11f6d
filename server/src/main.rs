use anyhow::Result;
use axum::Router;
use clap::Parser;
use search_core::Bm25Params;
use server::build_app;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index store directory
    #[arg(long, default_value = "./index")]
    index: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// BM25 term-frequency saturation (overrides BM25_K1)
    #[arg(long)]
    k1: Option<f64>,
    /// BM25 length normalization (overrides BM25_B)
    #[arg(long)]
    b: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let params = Bm25Params::from_env()?.with_overrides(args.k1, args.b)?;
    let app: Router = build_app(&args.index, params)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, k1 = params.k1, b = params.b, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
