// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage backends
//!
//! This module provides a trait-based abstraction over the physical medium a
//! solution's blobs live on, allowing the two backends to be used
//! interchangeably.
//!
//! # Architecture
//!
//! ```text
//! PersistentStorage (keys, persistence switch)
//!     ↓
//! StorageBackend (read_stream / write_stream, never fail)
//!     ↓  best_effort
//! Concrete Implementations (FlatFileBackend, TableBackend)
//! ```
//!
//! Backends implement the fallible `read_blob` / `write_blob` primitives.
//! The provided `read_stream` / `write_stream` methods route every result
//! through [`best_effort`], the single place where errors become misses.

// Core modules
pub mod factory;
pub mod traits;
pub mod types;

// Backend implementations
pub mod flat_file;
#[cfg(feature = "table-backend")]
pub mod table;

// Public API re-exports
pub use factory::create_backend;
pub use flat_file::FlatFileBackend;
#[cfg(feature = "table-backend")]
pub use table::TableBackend;
pub use traits::StorageBackend;
pub use types::BackendType;

use super::buffer_pool::BufferPool;
use super::error::{StorageError, StorageResult};
use log::{debug, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Convert the outcome of a storage operation into a value or a miss
///
/// Closed stores and cancellation are expected during shutdown and are only
/// logged at debug level; anything else is logged as a warning with the
/// operation and blob name.
pub(crate) fn best_effort<T>(operation: &str, name: &str, result: StorageResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(StorageError::Cancelled) => {
            debug!("{} of blob '{}' cancelled", operation, name);
            None
        }
        Err(StorageError::Closed) => {
            debug!("{} of blob '{}' skipped: storage already closed", operation, name);
            None
        }
        Err(e) => {
            warn!("{} of blob '{}' failed: {}", operation, name, e);
            None
        }
    }
}

/// Copy `source` into `sink` in pooled fixed-size chunks, honouring cancellation
///
/// The pooled buffer is returned when this function exits, whatever the outcome.
pub(crate) async fn copy_chunked<W>(
    source: &mut (dyn AsyncRead + Unpin + Send),
    sink: &mut W,
    buffers: &Arc<BufferPool>,
    cancel: &CancellationToken,
) -> StorageResult<u64>
where
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    let mut buffer = buffers.acquire();
    let mut copied = 0u64;

    loop {
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StorageError::Cancelled),
            read = source.read(&mut buffer[..]) => read?,
        };
        if read == 0 {
            break;
        }
        sink.write_all(&buffer[..read]).await?;
        copied += read as u64;
    }

    sink.flush().await?;
    Ok(copied)
}

/// `<path>.<extension>`, keeping whatever extension `path` already has
pub(crate) fn with_storage_extension(path: &Path, extension: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_os_string();
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_extension_appended() {
        assert_eq!(
            with_storage_extension(Path::new("/sol/App.sln"), "ide"),
            PathBuf::from("/sol/App.sln.ide")
        );
        assert_eq!(
            with_storage_extension(Path::new("Src/Foo.cs"), "ide"),
            PathBuf::from("Src/Foo.cs.ide")
        );
    }

    #[test]
    fn test_best_effort_converts_errors() {
        assert_eq!(best_effort("read", "a", Ok(5)), Some(5));
        assert_eq!(best_effort::<i32>("read", "a", Err(StorageError::Closed)), None);
        assert_eq!(best_effort::<i32>("read", "a", Err(StorageError::Cancelled)), None);
        assert_eq!(
            best_effort::<i32>("write", "a", Err(StorageError::Backend("boom".into()))),
            None
        );
    }

    #[tokio::test]
    async fn test_copy_chunked_copies_everything() {
        let pool = BufferPool::new(3, 2);
        let data: Vec<u8> = (0..10).collect();
        let mut source: &[u8] = &data;
        let mut sink = Vec::new();

        let copied = copy_chunked(&mut source, &mut sink, &pool, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(copied, 10);
        assert_eq!(sink, data);
        assert_eq!(pool.idle_count(), 1);
    }

    #[tokio::test]
    async fn test_copy_chunked_cancelled() {
        let pool = BufferPool::new(3, 2);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut source: &[u8] = b"abcdef";
        let mut sink = Vec::new();

        let result = copy_chunked(&mut source, &mut sink, &pool, &cancel).await;
        assert!(matches!(result, Err(StorageError::Cancelled)));
        assert_eq!(pool.idle_count(), 1);
    }
}
