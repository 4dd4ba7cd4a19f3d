// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage scopes and their derived keys

use crate::workspace::{Document, Project};
use std::path::PathBuf;

/// The entity a blob is stored against
#[derive(Debug, Clone, Copy)]
pub enum StorageScope<'a> {
    Solution,
    Project(&'a Project),
    Document(&'a Document),
}

impl StorageScope<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            StorageScope::Solution => "solution",
            StorageScope::Project(_) => "project",
            StorageScope::Document(_) => "document",
        }
    }
}

/// A scope whose storage keys have been derived
///
/// Produced by `StorageKeyResolver::resolve`; backends address blobs with it
/// and never look at the workspace model directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKey {
    Solution,
    Project {
        /// Project path relative to the solution directory
        project_key: String,
        output_file_path: Option<PathBuf>,
    },
    Document {
        /// Key of the owning project, unprefixed
        project_key: String,
        /// Document path relative to the project directory
        document_key: String,
        output_file_path: Option<PathBuf>,
    },
}
