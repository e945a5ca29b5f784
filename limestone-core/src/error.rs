//! Error types for the limestone-core crate.
//!
//! Per-condition parse failures are not errors: they surface as pass-through
//! [`Translation`](crate::condition::Translation)s. Only structural problems
//! with a fitted pipeline, registry loading, and configuration produce `Err`.

use thiserror::Error;

/// Top-level error type for Limestone operations.
#[derive(Debug, Error)]
pub enum LimestoneError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline not found: {0}")]
    PipelineNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LimestoneError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn pipeline_not_found(name: impl Into<String>) -> Self {
        Self::PipelineNotFound(name.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
