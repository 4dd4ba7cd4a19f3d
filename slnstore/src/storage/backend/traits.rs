// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage backend trait
//!
//! All backends implement this trait to provide a consistent read/write
//! contract to `PersistentStorage`.

use super::best_effort;
use super::types::BackendType;
use crate::storage::error::StorageResult;
use crate::storage::scope::ScopeKey;
use crate::storage::store::BlobStream;
use async_trait::async_trait;
use std::io::Cursor;
use std::path::Path;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

/// Blob read/write engine for one solution
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Which kind of backend this is
    fn backend_type(&self) -> BackendType;

    /// Root directory owned by this backend
    fn root(&self) -> &Path;

    /// Whether a blob can be stored for `key` at all
    ///
    /// A `false` answer is not an error; callers treat it as a miss.
    fn can_store(&self, key: &ScopeKey, name: &str) -> bool;

    /// Read a blob; `Ok(None)` when it does not exist
    async fn read_blob(
        &self,
        key: &ScopeKey,
        name: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<Vec<u8>>>;

    /// Replace a blob with everything `source` yields
    async fn write_blob(
        &self,
        key: &ScopeKey,
        name: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
        cancel: &CancellationToken,
    ) -> StorageResult<()>;

    /// Release files and handles; later operations report `StorageError::Closed`
    fn close(&self) -> StorageResult<()>;

    /// Whether `close` has been called
    fn is_closed(&self) -> bool;

    /// Read a blob, converting every failure into `None`
    async fn read_stream(
        &self,
        key: &ScopeKey,
        name: &str,
        cancel: &CancellationToken,
    ) -> Option<BlobStream> {
        if !self.can_store(key, name) {
            return None;
        }
        best_effort("read", name, self.read_blob(key, name, cancel).await)
            .flatten()
            .map(Cursor::new)
    }

    /// Write a blob, converting every failure into `false`
    async fn write_stream(
        &self,
        key: &ScopeKey,
        name: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
        cancel: &CancellationToken,
    ) -> bool {
        if !self.can_store(key, name) {
            return false;
        }
        best_effort("write", name, self.write_blob(key, name, source, cancel).await).is_some()
    }
}
