use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid detection frame at line {line}: {source}")]
    FrameParse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unreadable font {path}: {reason}")]
    Font { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
