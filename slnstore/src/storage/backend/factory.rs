// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage backend factory
//!
//! Creates the backend selected by configuration for one solution.

use super::traits::StorageBackend;
use super::types::BackendType;
use crate::storage::buffer_pool::BufferPool;
use crate::storage::error::StorageResult;
use std::path::Path;
use std::sync::Arc;

/// Create the backend for `solution_path`
///
/// Opening computes the backend's root directory (`<solution>.<extension>`)
/// and creates it when missing.
///
/// # Arguments
/// * `backend_type` - Which backend to create
/// * `solution_path` - Normalized path of the solution file
/// * `extension` - Suffix used for storage directories and files
/// * `buffers` - Shared copy buffer pool
pub fn create_backend(
    backend_type: BackendType,
    solution_path: &Path,
    extension: &str,
    buffers: Arc<BufferPool>,
) -> StorageResult<Box<dyn StorageBackend>> {
    match backend_type {
        BackendType::FlatFile => {
            use super::flat_file::FlatFileBackend;
            let backend = FlatFileBackend::open(solution_path, extension, buffers)?;
            Ok(Box::new(backend) as Box<dyn StorageBackend>)
        }
        #[cfg(feature = "table-backend")]
        BackendType::Table => {
            use super::table::TableBackend;
            let backend = TableBackend::open(solution_path, extension, buffers)?;
            Ok(Box::new(backend) as Box<dyn StorageBackend>)
        }
        #[cfg(not(feature = "table-backend"))]
        BackendType::Table => Err(crate::storage::error::StorageError::InvalidConfig(
            "table backend requires the 'table-backend' feature".to_string(),
        )),
    }
}
