// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! File-per-blob storage backend
//!
//! Layout:
//!
//! ```text
//! <solution>.ide/<name>                                   solution blobs
//! <project output>.ide/<name>                             project blobs
//! <project output>.ide/<name>/<document key>.ide          document blobs
//! ```

use super::traits::StorageBackend;
use super::types::BackendType;
use super::{copy_chunked, with_storage_extension};
use crate::storage::buffer_pool::BufferPool;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::scope::ScopeKey;
use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

/// Stores every blob in its own file
pub struct FlatFileBackend {
    solution_path: PathBuf,
    root: PathBuf,
    extension: String,
    buffers: Arc<BufferPool>,
    closed: AtomicBool,
}

impl FlatFileBackend {
    /// Open the backend for a solution, creating its root directory if missing
    pub fn open(
        solution_path: &Path,
        extension: &str,
        buffers: Arc<BufferPool>,
    ) -> StorageResult<Self> {
        let root = with_storage_extension(solution_path, extension);
        std::fs::create_dir_all(&root)?;
        debug!("Opened flat-file storage at {:?}", root);

        Ok(Self {
            solution_path: solution_path.to_path_buf(),
            root,
            extension: extension.to_string(),
            buffers,
            closed: AtomicBool::new(false),
        })
    }

    /// Where the blob `name` for `key` lives, if it can be stored at all
    pub fn blob_path(&self, key: &ScopeKey, name: &str) -> Option<PathBuf> {
        match key {
            ScopeKey::Solution => Some(self.root.join(name)),
            ScopeKey::Project {
                output_file_path, ..
            } => {
                let project_root = with_storage_extension(output_file_path.as_ref()?, &self.extension);
                Some(project_root.join(name))
            }
            ScopeKey::Document {
                output_file_path,
                document_key,
                ..
            } => {
                let project_root = with_storage_extension(output_file_path.as_ref()?, &self.extension);
                let document_file = with_storage_extension(Path::new(document_key), &self.extension);
                Some(project_root.join(name).join(document_file))
            }
        }
    }

    fn ensure_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StorageError::Closed)
        } else {
            Ok(())
        }
    }

    fn locate(&self, key: &ScopeKey, name: &str) -> StorageResult<PathBuf> {
        self.blob_path(key, name)
            .ok_or_else(|| StorageError::Backend(format!("no storage location for blob '{}'", name)))
    }
}

/// A blob name or document key must stay below the directory it is joined to
fn is_contained(relative: &Path) -> bool {
    relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

/// Whether the files already on disk leave room for a blob at `path`
///
/// A project blob `n` is the file `<project root>/n` while document blobs
/// named `n` live below the directory `<project root>/n/`, so one name can
/// only be taken by one of the two scopes.
fn fits_layout(path: &Path) -> bool {
    if path.is_dir() {
        return false;
    }
    path.ancestors()
        .skip(1)
        .all(|ancestor| !ancestor.exists() || ancestor.is_dir())
}

#[async_trait]
impl StorageBackend for FlatFileBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::FlatFile
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn can_store(&self, key: &ScopeKey, name: &str) -> bool {
        if name.is_empty() || !is_contained(Path::new(name)) {
            return false;
        }
        if !self.solution_path.exists() {
            return false;
        }
        let eligible = match key {
            ScopeKey::Solution => true,
            ScopeKey::Project {
                output_file_path, ..
            } => output_file_path.is_some(),
            ScopeKey::Document {
                output_file_path,
                document_key,
                ..
            } => {
                output_file_path.is_some()
                    && !document_key.is_empty()
                    && is_contained(Path::new(document_key))
            }
        };
        eligible
            && self
                .blob_path(key, name)
                .is_some_and(|path| fits_layout(&path))
    }

    async fn read_blob(
        &self,
        key: &ScopeKey,
        name: &str,
        cancel: &CancellationToken,
    ) -> StorageResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        let path = self.locate(key, name)?;

        // The whole file is copied into memory so the handle is released
        // before the caller starts consuming the stream.
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StorageError::Cancelled),
            read = fs::read(&path) => read,
        };

        match read {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_blob(
        &self,
        key: &ScopeKey,
        name: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
        cancel: &CancellationToken,
    ) -> StorageResult<()> {
        self.ensure_open()?;
        let path = self.locate(key, name)?;
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&path).await?;
        let written = copy_chunked(source, &mut file, &self.buffers, cancel).await?;
        file.sync_all().await?;

        debug!("Wrote {} bytes to {:?}", written, path);
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Closed flat-file storage at {:?}", self.root);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
