//! Container decoding errors
//!
//! Stream-level errors abort the decode before iteration starts. Anything
//! scoped to a single framed record is recovered by skipping that record,
//! never by failing the stream.

use thiserror::Error;

/// Result type for container operations
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Stream-level container errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContainerError {
    #[error("container magic mismatch")]
    BadMagic,

    #[error("container truncated: {0}")]
    Truncated(String),
}

/// Record-scoped decode failure; the reader logs and skips
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unreadable container segment: {0}")]
pub struct SegmentUnreadable(pub String);
