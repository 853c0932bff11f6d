use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("index unavailable: no document statistics found")]
    IndexUnavailable,

    #[error("store error: {0}")]
    Store(#[from] sled::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt index store: {0}")]
    Corrupt(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("store not reachable after {attempts} attempts: {source}")]
    Unreachable { attempts: u32, source: Box<IndexError> },
}

pub type Result<T> = std::result::Result<T, IndexError>;
