// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-solution persistent blob storage
//!
//! This module provides:
//! - Storage key derivation from solution/project/document paths
//! - Two interchangeable backends (file per blob, embedded table store)
//! - Reference-counted storage handles shared per solution
//! - The registry that creates, shares and tears down those handles
//! - A no-op fallback used whenever persistence cannot apply
//!
//! # Architecture
//!
//! ```text
//! PersistentStorageService (registry: solution path -> handle)
//!     ↓
//! PersistentStorage (ref count, persistence switch, key derivation)
//!     ↓
//! StorageBackend (FlatFileBackend | TableBackend)
//! ```

pub mod backend;
pub mod buffer_pool;
pub mod error;
pub mod keys;
pub mod lease;
pub mod noop;
pub mod persistent_storage;
pub mod scope;
pub mod service;
pub mod store;

pub use backend::{create_backend, BackendType, StorageBackend};
pub use buffer_pool::{BufferPool, PooledBuffer};
pub use error::{StorageError, StorageResult};
pub use keys::StorageKeyResolver;
pub use lease::StorageLease;
pub use noop::NoOpPersistentStorage;
pub use persistent_storage::{PersistentStorage, StorageStatsSnapshot};
pub use scope::{ScopeKey, StorageScope};
pub use service::PersistentStorageService;
pub use store::{BlobStore, BlobStream};
