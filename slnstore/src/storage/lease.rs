// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Caller-held reference to a solution's storage
//!
//! A lease counts as one reference on the shared handle. Dropping it (or
//! calling `dispose`) hands the reference back to the registry, which closes
//! the backend once the last lease is gone.

use super::noop::NoOpPersistentStorage;
use super::persistent_storage::PersistentStorage;
use super::scope::StorageScope;
use super::service::StorageRegistry;
use super::store::{BlobStore, BlobStream};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Weak};
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

/// The registry reference held by a lease on a real handle
struct LeasedHandle {
    storage: Arc<PersistentStorage>,
    registry: Weak<StorageRegistry>,
}

/// Storage handed out by `PersistentStorageService::get_storage`
pub struct StorageLease {
    store: Arc<dyn BlobStore>,
    handle: Option<LeasedHandle>,
}

impl StorageLease {
    /// A lease on the shared no-op storage; dropping it does nothing
    pub fn no_op() -> Self {
        Self {
            store: NoOpPersistentStorage::instance(),
            handle: None,
        }
    }

    /// A lease on a real handle whose reference was already added by the registry
    pub(crate) fn persistent(storage: Arc<PersistentStorage>, registry: Weak<StorageRegistry>) -> Self {
        Self {
            store: storage.clone(),
            handle: Some(LeasedHandle { storage, registry }),
        }
    }

    /// Whether blobs can actually be persisted through this lease
    pub fn is_persistent(&self) -> bool {
        self.handle.is_some()
    }

    /// The shared handle, unless this is a no-op lease
    pub fn persistent_storage(&self) -> Option<&Arc<PersistentStorage>> {
        self.handle.as_ref().map(|handle| &handle.storage)
    }

    /// Path of the solution the handle is registered under
    pub fn solution_path(&self) -> Option<&Path> {
        self.persistent_storage()
            .map(|storage| storage.solution_path())
    }

    /// Whether two leases refer to the same underlying storage instance
    pub fn same_storage(&self, other: &StorageLease) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.store) as *const (),
            Arc::as_ptr(&other.store) as *const (),
        )
    }

    /// Hand the reference back to the registry now
    pub fn dispose(self) {
        drop(self);
    }
}

#[async_trait]
impl BlobStore for StorageLease {
    async fn read_stream(
        &self,
        scope: StorageScope<'_>,
        name: &str,
        cancel: &CancellationToken,
    ) -> Option<BlobStream> {
        self.store.read_stream(scope, name, cancel).await
    }

    async fn write_stream(
        &self,
        scope: StorageScope<'_>,
        name: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
        cancel: &CancellationToken,
    ) -> bool {
        self.store.write_stream(scope, name, source, cancel).await
    }
}

impl Drop for StorageLease {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // A registry that is already gone has closed every backend itself
            if let Some(registry) = handle.registry.upgrade() {
                registry.release(&handle.storage);
            }
        }
    }
}

impl std::fmt::Debug for StorageLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.persistent_storage() {
            Some(storage) => f.debug_tuple("StorageLease").field(storage).finish(),
            None => f.write_str("StorageLease(NoOp)"),
        }
    }
}
