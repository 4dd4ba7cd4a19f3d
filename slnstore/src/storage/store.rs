// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Caller-facing blob storage contract
//!
//! Implemented by the real per-solution handle, by the no-op fallback and by
//! the lease handed out by the registry, so callers never need to know which
//! one they hold.

use super::scope::StorageScope;
use async_trait::async_trait;
use std::io::Cursor;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

/// In-memory readable copy of a stored blob
///
/// Implements both `std::io::Read` and `tokio::io::AsyncRead`.
pub type BlobStream = Cursor<Vec<u8>>;

/// Read/write access to blobs stored against a scope
///
/// Every method reports absence instead of failing: a missing blob, an
/// ineligible scope, disabled persistence, cancellation and I/O errors all
/// look the same to the caller.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the blob `name` stored against `scope`
    async fn read_stream(
        &self,
        scope: StorageScope<'_>,
        name: &str,
        cancel: &CancellationToken,
    ) -> Option<BlobStream>;

    /// Store everything `source` yields as the blob `name`, replacing any previous content
    ///
    /// Returns `true` only when the blob was written.
    async fn write_stream(
        &self,
        scope: StorageScope<'_>,
        name: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
        cancel: &CancellationToken,
    ) -> bool;

    /// Read a blob fully into memory
    async fn read_bytes(
        &self,
        scope: StorageScope<'_>,
        name: &str,
        cancel: &CancellationToken,
    ) -> Option<Vec<u8>> {
        self.read_stream(scope, name, cancel)
            .await
            .map(Cursor::into_inner)
    }

    /// Write a blob from an in-memory slice
    async fn write_bytes(
        &self,
        scope: StorageScope<'_>,
        name: &str,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> bool {
        let mut source = bytes;
        self.write_stream(scope, name, &mut source, cancel).await
    }
}
