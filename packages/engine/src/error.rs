//! Error types for the Akte engine
//!
//! Only conditions that abort an assembly are modelled here. Recoverable
//! problems (malformed conditions, unknown operators, unclosed sections,
//! missing document root, failing content generators) are logged and
//! recorded in the [`AssemblyReport`](crate::pipeline::AssemblyReport).

use thiserror::Error;

/// Main error type for assembly operations
#[derive(Error, Debug)]
pub enum AssemblyError {
    /// Condition configuration could not be interpreted
    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Input document exceeds the configured size limit
    #[error("Input too large: {size} bytes (maximum {max})")]
    InputTooLarge { size: usize, max: usize },

    /// A content generator failed for a placeholder tag
    #[error("Content generator for '{tag}' failed: {message}")]
    Generator { tag: String, message: String },

    /// Document tree is structurally invalid
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

/// Result type alias for assembly operations
pub type Result<T> = std::result::Result<T, AssemblyError>;
