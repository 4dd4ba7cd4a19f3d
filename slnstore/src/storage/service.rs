// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Registry of live per-solution storage handles
//!
//! The registry maps a normalized solution path to the handle serving it.
//! Handles are created on first request, shared by every later request for
//! the same solution, and closed when the last lease is released. Lookup,
//! creation, reference counting and removal all happen under one lock, so a
//! handle can never be evicted while a new caller is being handed a lease on it.

use super::backend::create_backend;
use super::buffer_pool::BufferPool;
use super::error::StorageResult;
use super::lease::StorageLease;
use super::persistent_storage::PersistentStorage;
use crate::options::{OptionService, PersistenceOptions, StorageConfig};
use crate::workspace::Solution;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// State shared between the service and the leases it hands out
pub(crate) struct StorageRegistry {
    config: StorageConfig,
    options: Arc<dyn OptionService>,
    buffers: Arc<BufferPool>,
    storages: Mutex<HashMap<PathBuf, Arc<PersistentStorage>>>,
}

impl StorageRegistry {
    /// Return one reference; closes and unregisters the handle when it was the last
    pub(crate) fn release(&self, storage: &Arc<PersistentStorage>) {
        let mut storages = self.storages.lock();

        if !storage.release() {
            return;
        }

        // After a shutdown the path may already be served by a newer handle
        let registered = storages
            .get(storage.solution_path())
            .is_some_and(|current| Arc::ptr_eq(current, storage));
        if registered {
            storages.remove(storage.solution_path());
        }
        debug!(
            "Last reference to storage for {:?} released",
            storage.solution_path()
        );
        storage.close();
    }

    fn open_storage(&self, solution_path: &Path) -> StorageResult<Arc<PersistentStorage>> {
        let backend = create_backend(
            self.config.backend,
            solution_path,
            &self.config.extension,
            self.buffers.clone(),
        )?;
        info!(
            "Opened {} storage for {:?} at {:?}",
            self.config.backend,
            solution_path,
            backend.root()
        );
        Ok(Arc::new(PersistentStorage::new(
            solution_path.to_path_buf(),
            backend,
            self.options.clone(),
        )))
    }

    fn close_all(&self) -> usize {
        let drained: Vec<_> = self.storages.lock().drain().collect();
        let count = drained.len();
        for (_, storage) in drained {
            storage.close();
        }
        count
    }
}

impl Drop for StorageRegistry {
    fn drop(&mut self) {
        self.close_all();
    }
}

/// Creates, shares and tears down per-solution storage
///
/// One service is created per host session. `get_storage` never fails: when
/// persistence cannot apply it returns a lease on the no-op storage.
pub struct PersistentStorageService {
    registry: Arc<StorageRegistry>,
}

impl PersistentStorageService {
    /// Create a service whose persistence switch starts at `config.enabled`
    pub fn new(config: StorageConfig) -> Self {
        let options = Arc::new(PersistenceOptions::new(config.enabled));
        Self::with_options(config, options)
    }

    /// Create a service that consults a host-provided option service
    pub fn with_options(config: StorageConfig, options: Arc<dyn OptionService>) -> Self {
        let buffers = BufferPool::new(config.buffer_size, config.max_pooled_buffers);
        Self {
            registry: Arc::new(StorageRegistry {
                config,
                options,
                buffers,
                storages: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Create a service from a JSON configuration
    pub fn from_json_config(json: &str) -> StorageResult<Self> {
        Ok(Self::new(StorageConfig::from_json(json)?))
    }

    pub fn config(&self) -> &StorageConfig {
        &self.registry.config
    }

    pub fn options(&self) -> &Arc<dyn OptionService> {
        &self.registry.options
    }

    /// Shared copy buffer pool
    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.registry.buffers
    }

    /// Get a lease on the storage for `solution`
    ///
    /// Solutions without a path, whose file does not exist, or requested while
    /// persistence is disabled get the no-op storage. Otherwise the shared
    /// handle for the solution is created if needed and one reference is added.
    pub fn get_storage(&self, solution: &Solution) -> StorageLease {
        let Some(path) = solution.file_path() else {
            return StorageLease::no_op();
        };
        if !path.is_file() {
            debug!("Solution {:?} does not exist on disk, storage disabled", path);
            return StorageLease::no_op();
        }
        if !self.registry.options.persistence_enabled() {
            return StorageLease::no_op();
        }

        let solution_path = normalize_path(path);
        let mut storages = self.registry.storages.lock();

        let storage = match storages.get(&solution_path) {
            Some(storage) => storage.clone(),
            None => match self.registry.open_storage(&solution_path) {
                Ok(storage) => {
                    storages.insert(solution_path, storage.clone());
                    storage
                }
                Err(e) => {
                    warn!(
                        "Failed to open storage for {:?}, continuing without persistence: {}",
                        solution_path, e
                    );
                    return StorageLease::no_op();
                }
            },
        };

        storage.add_ref();
        StorageLease::persistent(storage, Arc::downgrade(&self.registry))
    }

    /// Number of solutions with a live handle
    pub fn live_storage_count(&self) -> usize {
        self.registry.storages.lock().len()
    }

    /// Outstanding references on the handle for `solution_path`, if one is live
    pub fn ref_count(&self, solution_path: &Path) -> Option<usize> {
        let solution_path = normalize_path(solution_path);
        self.registry
            .storages
            .lock()
            .get(&solution_path)
            .map(|storage| storage.ref_count())
    }

    /// Close every live handle and clear the registry
    ///
    /// Outstanding leases keep working as misses; later `get_storage` calls
    /// open fresh handles.
    pub fn shutdown(&self) {
        let closed = self.registry.close_all();
        info!("Persistent storage service shut down ({} storages closed)", closed);
    }
}

/// Absolute, symlink-free form of a path used as the registry key
fn normalize_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::env::current_dir().map(|cwd| cwd.join(path)))
        .unwrap_or_else(|_| path.to_path_buf())
}
