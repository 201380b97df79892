// error.rs - Error types shared across the fetch pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by an extractor or while inspecting its output.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("extractor exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },

    #[error("could not read extractor output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("no downloaded file was produced")]
    MissingArtifact,

    #[error("downloaded file is empty")]
    EmptyArtifact,

    #[error("downloaded file {0} is outside the scratch directory")]
    EscapedScratch(PathBuf),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Failures talking to the chat platform.
#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("chat platform error: {0}")]
    Platform(#[from] serenity::Error),

    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No botconfig.txt file found in any expected location (., .., ../.., src/)")]
    NotFound,

    #[error("DISCORD_TOKEN is missing or still set to the placeholder value")]
    MissingToken,

    #[error("{key} must be a positive number, got '{value}'")]
    InvalidNumber { key: String, value: String },

    #[error("cannot use scratch directory {path}: {source}")]
    ScratchDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse message catalog {path}: {source}")]
    Catalog {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
