// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Reference-counted storage handle for one solution
//!
//! A handle owns its backend, derives storage keys for every request and
//! consults the persistence switch before touching the backend. The registry
//! alone changes the reference count and decides when to close the handle.

use super::backend::{BackendType, StorageBackend};
use super::keys::StorageKeyResolver;
use super::scope::StorageScope;
use super::store::{BlobStore, BlobStream};
use crate::options::OptionService;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{error, info};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

/// Counters describing how a handle has been used
#[derive(Debug, Default)]
struct StorageStats {
    reads: AtomicU64,
    hits: AtomicU64,
    writes: AtomicU64,
    failed_writes: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of a handle's counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageStatsSnapshot {
    pub backend: BackendType,
    pub opened_at: DateTime<Utc>,
    pub reads: u64,
    pub hits: u64,
    pub writes: u64,
    pub failed_writes: u64,
    /// Requests answered without touching the backend (no key, persistence disabled, closed)
    pub skipped: u64,
}

/// Shared storage handle for one solution
pub struct PersistentStorage {
    solution_path: PathBuf,
    backend: Box<dyn StorageBackend>,
    options: Arc<dyn OptionService>,
    keys: StorageKeyResolver,
    ref_count: Mutex<usize>,
    closed: AtomicBool,
    opened_at: DateTime<Utc>,
    stats: StorageStats,
}

impl PersistentStorage {
    /// Wrap an opened backend; the reference count starts at zero
    pub(crate) fn new(
        solution_path: PathBuf,
        backend: Box<dyn StorageBackend>,
        options: Arc<dyn OptionService>,
    ) -> Self {
        Self {
            solution_path,
            backend,
            options,
            keys: StorageKeyResolver::new(),
            ref_count: Mutex::new(0),
            closed: AtomicBool::new(false),
            opened_at: Utc::now(),
            stats: StorageStats::default(),
        }
    }

    /// Normalized path this handle is registered under
    pub fn solution_path(&self) -> &Path {
        &self.solution_path
    }

    pub fn backend_type(&self) -> BackendType {
        self.backend.backend_type()
    }

    /// Root directory owned by the backend
    pub fn root(&self) -> &Path {
        self.backend.root()
    }

    pub fn ref_count(&self) -> usize {
        *self.ref_count.lock()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn key_resolver(&self) -> &StorageKeyResolver {
        &self.keys
    }

    pub fn stats(&self) -> StorageStatsSnapshot {
        StorageStatsSnapshot {
            backend: self.backend_type(),
            opened_at: self.opened_at,
            reads: self.stats.reads.load(Ordering::Relaxed),
            hits: self.stats.hits.load(Ordering::Relaxed),
            writes: self.stats.writes.load(Ordering::Relaxed),
            failed_writes: self.stats.failed_writes.load(Ordering::Relaxed),
            skipped: self.stats.skipped.load(Ordering::Relaxed),
        }
    }

    /// Record one more outstanding reference
    ///
    /// Caller must serialize; the registry does so under its lock.
    pub(crate) fn add_ref(&self) {
        *self.ref_count.lock() += 1;
    }

    /// Drop one reference; returns `true` when none remain
    ///
    /// Releasing an unreferenced handle is a caller bug: it panics in debug
    /// builds and is ignored (returning `false`) otherwise.
    ///
    /// Caller must serialize; the registry does so under its lock.
    pub(crate) fn release(&self) -> bool {
        let mut count = self.ref_count.lock();
        debug_assert!(
            *count > 0,
            "released storage for {:?} more often than it was acquired",
            self.solution_path
        );
        if *count == 0 {
            error!(
                "Reference count underflow for storage {:?}",
                self.solution_path
            );
            return false;
        }
        *count -= 1;
        *count == 0
    }

    /// Close the backend; only the first call has an effect
    pub(crate) fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.backend.close() {
            error!("Failed to close storage for {:?}: {}", self.solution_path, e);
        }
        let stats = self.stats();
        info!(
            "Closed {} storage for {:?} (reads: {}, hits: {}, writes: {}, failed writes: {})",
            stats.backend,
            self.solution_path,
            stats.reads,
            stats.hits,
            stats.writes,
            stats.failed_writes
        );
    }

    /// Whether a request may reach the backend at all
    fn accepting(&self) -> bool {
        self.options.persistence_enabled() && !self.is_closed()
    }
}

#[async_trait]
impl BlobStore for PersistentStorage {
    async fn read_stream(
        &self,
        scope: StorageScope<'_>,
        name: &str,
        cancel: &CancellationToken,
    ) -> Option<BlobStream> {
        let key = match self.keys.resolve(scope) {
            Some(key) if self.accepting() => key,
            _ => {
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        self.stats.reads.fetch_add(1, Ordering::Relaxed);
        let stream = self.backend.read_stream(&key, name, cancel).await;
        if stream.is_some() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
        }
        stream
    }

    async fn write_stream(
        &self,
        scope: StorageScope<'_>,
        name: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
        cancel: &CancellationToken,
    ) -> bool {
        let key = match self.keys.resolve(scope) {
            Some(key) if self.accepting() => key,
            _ => {
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        };

        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        let written = self.backend.write_stream(&key, name, source, cancel).await;
        if !written {
            self.stats.failed_writes.fetch_add(1, Ordering::Relaxed);
        }
        written
    }
}

impl std::fmt::Debug for PersistentStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStorage")
            .field("solution_path", &self.solution_path)
            .field("backend", &self.backend_type())
            .field("ref_count", &self.ref_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
