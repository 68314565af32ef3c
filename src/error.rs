use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebSearchError {
    #[error("Cannot convert query from {charset} to UTF-8: {reason}")]
    EncodingConversion { charset: String, reason: String },

    #[error("Search engine '{engine}' not supported")]
    UnsupportedEngine { engine: String },

    #[error("Platform {os} not supported")]
    UnsupportedPlatform { os: String },

    #[error("Failed to convert '{path}' to a Windows path: {reason}")]
    PathConversion { path: PathBuf, reason: String },

    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, WebSearchError>;
