// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for storage operations
//!
//! These errors stay inside the storage layer. Read and write entry points
//! convert them into misses through `backend::best_effort`; only
//! construction-time APIs (configuration, opening a backend) return them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Storage is closed")]
    Closed,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[cfg(feature = "table-backend")]
impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        match err {
            sled::Error::Io(e) => StorageError::Io(e),
            other => StorageError::Backend(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            StorageError::Cancelled
        } else {
            StorageError::Backend(format!("storage task failed: {}", err))
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
