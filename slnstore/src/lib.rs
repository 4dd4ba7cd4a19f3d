// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! slnstore - Reference-counted per-solution persistent blob storage
//!
//! slnstore caches opaque blobs on disk next to a solution file. Blobs are
//! addressed by a scope (the solution itself, one of its projects, or one of
//! its documents) and a caller-chosen name.
//!
//! # Features
//!
//! - **Shared handles**: every caller working on one solution shares a single
//!   reference-counted storage handle
//! - **Two backends**: one file per blob, or a single embedded table store (Sled)
//! - **Best effort**: every I/O failure, cancellation or disabled setting is
//!   reported as a cache miss, never as an error
//!
//! # Usage
//!
//! ```ignore
//! use slnstore::{BlobStore, PersistentStorageService, Solution, StorageConfig, StorageScope};
//! use tokio_util::sync::CancellationToken;
//!
//! let service = PersistentStorageService::new(StorageConfig::default());
//! let solution = Solution::new(Some("/work/App.sln".into()));
//! let storage = service.get_storage(&solution);
//!
//! let cancel = CancellationToken::new();
//! storage.write_bytes(StorageScope::Solution, "index", b"data", &cancel).await;
//! let cached = storage.read_bytes(StorageScope::Solution, "index", &cancel).await;
//! ```

pub mod options;
pub mod storage;
pub mod workspace;

pub use options::{OptionService, PersistenceOptions, StorageConfig};
pub use storage::{
    BackendType, BlobStore, BlobStream, NoOpPersistentStorage, PersistentStorage,
    PersistentStorageService, ScopeKey, StorageError, StorageKeyResolver, StorageLease,
    StorageResult, StorageScope, StorageStatsSnapshot,
};
pub use workspace::{Document, Project, Solution};

/// slnstore version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// slnstore crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
