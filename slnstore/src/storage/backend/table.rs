// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Sled table storage backend
//!
//! All blobs of a solution live in one Sled database at
//! `<solution>.ide/storage.ide`. Each scope maps to a tree (table):
//!
//! | scope    | table                                 | row key      |
//! |----------|---------------------------------------|--------------|
//! | solution | `Solution`                            | blob name    |
//! | project  | `Project:<project key>`               | blob name    |
//! | document | `Document:<blob name>_<project key>`  | document key |
//!
//! The scope prefixes keep a project whose key is literally `Solution` out of
//! the solution table.

use super::copy_chunked;
use super::traits::StorageBackend;
use super::types::BackendType;
use crate::storage::buffer_pool::BufferPool;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::keys::prefixed_key;
use crate::storage::scope::ScopeKey;
use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::runtime::RuntimeFlavor;
use tokio_util::sync::CancellationToken;

/// Table holding solution-scoped blobs
pub const SOLUTION_TABLE: &str = "Solution";

/// Prefix of every project table
pub const PROJECT_TABLE_PREFIX: &str = "Project:";

/// Prefix of every document table
pub const DOCUMENT_TABLE_PREFIX: &str = "Document:";

/// File name of the database inside the storage root, before the extension
const DATABASE_STEM: &str = "storage";

/// Sled-backed table store
pub struct TableBackend {
    root: PathBuf,
    database_path: PathBuf,
    db: RwLock<Option<sled::Db>>,
    buffers: Arc<BufferPool>,
}

impl TableBackend {
    /// Open (or create) the database for a solution
    pub fn open(
        solution_path: &Path,
        extension: &str,
        buffers: Arc<BufferPool>,
    ) -> StorageResult<Self> {
        let root = super::with_storage_extension(solution_path, extension);
        std::fs::create_dir_all(&root)?;

        let database_path = root.join(format!("{}.{}", DATABASE_STEM, extension));
        let db = blocking(|| sled::open(&database_path))?;
        debug!("Opened table storage at {:?}", database_path);

        Ok(Self {
            root,
            database_path,
            db: RwLock::new(Some(db)),
            buffers,
        })
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// Table and row addressing the blob `name` for `key`
    pub fn table_and_row(key: &ScopeKey, name: &str) -> (String, String) {
        match key {
            ScopeKey::Solution => (SOLUTION_TABLE.to_string(), name.to_string()),
            ScopeKey::Project { project_key, .. } => (
                format!("{}{}", PROJECT_TABLE_PREFIX, project_key),
                name.to_string(),
            ),
            ScopeKey::Document {
                project_key,
                document_key,
                ..
            } => (
                format!("{}{}", DOCUMENT_TABLE_PREFIX, prefixed_key(name, project_key)),
                document_key.clone(),
            ),
        }
    }

    /// Names of the tables created so far, excluding Sled's default tree
    pub fn table_names(&self) -> StorageResult<Vec<String>> {
        let db = self.database()?;
        Ok(db
            .tree_names()
            .into_iter()
            .map(|name| String::from_utf8_lossy(&name).to_string())
            .filter(|name| !name.starts_with("__sled__"))
            .collect())
    }

    /// Clone of the open database; the clone keeps it alive for one operation
    fn database(&self) -> StorageResult<sled::Db> {
        self.db.read().clone().ok_or(StorageError::Closed)
    }
}

/// Run Sled work that cannot go through `spawn_blocking`
///
/// Opening and closing happen in synchronous code, often while the registry
/// lock is held and sometimes from a lease dropped inside a task. On a
/// multi-threaded runtime the worker hands its other tasks off first.
fn blocking<T>(work: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}

fn table_exists(db: &sled::Db, table: &str) -> bool {
    db.tree_names()
        .iter()
        .any(|name| &**name == table.as_bytes())
}

#[async_trait]
impl StorageBackend for TableBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Table
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn can_store(&self, key: &ScopeKey, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        match key {
            ScopeKey::Solution => true,
            ScopeKey::Project { project_key, .. } => !project_key.is_empty(),
            ScopeKey::Document {
                project_key,
                document_key,
                ..
            } => !project_key.is_empty() && !document_key.is_empty(),
        }
    }

    async fn read_blob(
        &self,
        key: &ScopeKey,
        name: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<Vec<u8>>> {
        let db = self.database()?;
        let (table, row) = Self::table_and_row(key, name);
        let cancel = cancel.clone();

        tokio::task::spawn_blocking(move || {
            if cancel.is_cancelled() {
                return Err(StorageError::Cancelled);
            }
            // Reading must not create the table as a side effect
            if !table_exists(&db, &table) {
                return Ok(None);
            }
            let tree = db.open_tree(table.as_bytes())?;
            Ok(tree.get(row.as_bytes())?.map(|value| value.to_vec()))
        })
        .await?
    }

    async fn write_blob(
        &self,
        key: &ScopeKey,
        name: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        let db = self.database()?;
        let (table, row) = Self::table_and_row(key, name);

        let mut value = Vec::new();
        copy_chunked(source, &mut value, &self.buffers, cancel).await?;

        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || {
            if cancel.is_cancelled() {
                return Err(StorageError::Cancelled);
            }
            let tree = db.open_tree(table.as_bytes())?;
            tree.transaction(|tx| {
                tx.insert(row.as_bytes(), value.as_slice())?;
                Ok::<(), ConflictableTransactionError<()>>(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(()) => {
                    StorageError::Backend(format!("write to table '{}' aborted", table))
                }
                TransactionError::Storage(e) => StorageError::from(e),
            })?;
            tree.flush()?;
            debug!("Committed {} bytes to table '{}'", value.len(), table);
            Ok(())
        })
        .await?
    }

    fn close(&self) -> StorageResult<()> {
        let db = self.db.write().take();
        if let Some(db) = db {
            blocking(|| db.flush())?;
            debug!("Closed table storage at {:?}", self.database_path);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.db.read().is_none()
    }
}
