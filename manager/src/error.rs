use std::path::PathBuf;

use thiserror::Error;

/// Storage-layer failures. These never propagate out of the store's
/// public operations; they surface as notifications while the operation
/// degrades to its documented fallback.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create state directory '{}': {message}", path.display())]
    CreateDirectory { path: PathBuf, message: String },
    #[error("failed to read state file '{}': {message}", path.display())]
    ReadFile { path: PathBuf, message: String },
    #[error("failed to write state file '{}': {message}", path.display())]
    WriteFile { path: PathBuf, message: String },
    #[error("failed to encode state: {message}")]
    Encode { message: String },
    #[error("failed to parse state file: {message}")]
    Parse { message: String },
}

/// Rejection of a history operation with validated input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("history position {position} is out of range 1..={len}")]
    OutOfRange { position: usize, len: usize },
}
