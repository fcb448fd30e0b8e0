use thiserror::Error;

/// Main error type for Sitegraph
#[derive(Error, Debug)]
pub enum SitegraphError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding API errors
    #[error("Embedding API error: {0}")]
    Embedding(String),

    /// Retrieval index errors (malformed index, dimension mismatch)
    #[error("Index error: {0}")]
    Index(String),

    /// Graph node not found
    #[error("Node not found: {0}")]
    NodeNotFound(String),
}

/// Convenient Result type using SitegraphError
pub type Result<T> = std::result::Result<T, SitegraphError>;
