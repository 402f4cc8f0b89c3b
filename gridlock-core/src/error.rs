//! Error types for gridlock-core

use thiserror::Error;

/// Why a disc could not be placed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("Column {0} is out of range")]
    ColumnOutOfRange(i64),

    #[error("Column {0} is full")]
    ColumnFull(usize),
}

/// Errors from the result store collaborator
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Errors from the analytics collaborator
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Failed to publish analytics event: {0}")]
    PublishFailed(String),
}
