// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage used whenever persistence cannot apply

use super::scope::StorageScope;
use super::store::{BlobStore, BlobStream};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

static INSTANCE: Lazy<Arc<NoOpPersistentStorage>> = Lazy::new(|| Arc::new(NoOpPersistentStorage));

/// Every read misses and every write reports "not stored"
#[derive(Debug, Default)]
pub struct NoOpPersistentStorage;

impl NoOpPersistentStorage {
    /// The shared instance
    pub fn instance() -> Arc<NoOpPersistentStorage> {
        Arc::clone(&INSTANCE)
    }
}

#[async_trait]
impl BlobStore for NoOpPersistentStorage {
    async fn read_stream(
        &self,
        _scope: StorageScope<'_>,
        _name: &str,
        _cancel: &CancellationToken,
    ) -> Option<BlobStream> {
        None
    }

    async fn write_stream(
        &self,
        _scope: StorageScope<'_>,
        _name: &str,
        _source: &mut (dyn AsyncRead + Unpin + Send),
        _cancel: &CancellationToken,
    ) -> bool {
        false
    }
}
