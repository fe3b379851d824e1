//! Error types for the DocRouter domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// A document could not be turned into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Document {path} is not valid UTF-8 text")]
    Corrupt { path: PathBuf },

    #[error("Unsupported document format '{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },
}

#[derive(Debug, Clone, Error)]
pub enum ChunkingError {
    #[error("Maximum segment size must be greater than zero")]
    InvalidSize,
}

/// Building or querying a nearest-neighbor index failed.
#[derive(Debug, Clone, Error)]
pub enum IndexBuildError {
    #[error("Cannot summarize document '{doc_id}': it has no segments")]
    EmptyDocument { doc_id: String },

    #[error("Embedding failed: {0}")]
    Embedding(#[from] ProviderError),

    #[error("Embedding oracle returned {actual} vectors for {expected} inputs")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    #[error("Duplicate tool name in registry: {0}")]
    DuplicateTool(String),

    #[error("Tool has an empty name and cannot be retrieved")]
    UnnamedTool,
}
