use crate::{IndexError, Result};
use std::time::Duration;

pub const DEFAULT_K1: f64 = 1.5;
pub const DEFAULT_B: f64 = 0.75;
pub const DEFAULT_TOP_K: usize = 10;

/// BM25 scoring parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length-normalization weight.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: DEFAULT_K1, b: DEFAULT_B }
    }
}

impl Bm25Params {
    pub fn new(k1: f64, b: f64) -> Result<Self> {
        let params = Self { k1, b };
        params.validate()?;
        Ok(params)
    }

    /// Defaults, overridden by `BM25_K1` / `BM25_B` when set.
    pub fn from_env() -> Result<Self> {
        let mut params = Self::default();
        if let Some(k1) = env_f64("BM25_K1")? { params.k1 = k1; }
        if let Some(b) = env_f64("BM25_B")? { params.b = b; }
        params.validate()?;
        Ok(params)
    }

    /// Apply explicit overrides (e.g. command-line flags) on top of `self`.
    pub fn with_overrides(mut self, k1: Option<f64>, b: Option<f64>) -> Result<Self> {
        if let Some(k1) = k1 { self.k1 = k1; }
        if let Some(b) = b { self.b = b; }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(IndexError::Config(format!("k1 must be a finite value >= 0, got {}", self.k1)));
        }
        if !self.b.is_finite() || !(0.0..=1.0).contains(&self.b) {
            return Err(IndexError::Config(format!("b must be within [0, 1], got {}", self.b)));
        }
        Ok(())
    }
}

fn env_f64(name: &str) -> Result<Option<f64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| IndexError::Config(format!("{name} is not a number: {raw:?}"))),
        Err(_) => Ok(None),
    }
}

/// Bounded, fixed-delay retry used when opening the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 10, delay: Duration::from_secs(5) }
    }
}
