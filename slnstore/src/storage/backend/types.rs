// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Backend type configuration

use serde::{Deserialize, Serialize};

/// Physical storage used by a solution's storage handle
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum BackendType {
    /// One file per blob under `<solution>.ide/` and `<project output>.ide/`
    /// Best for: inspecting cache contents, few large blobs
    #[default]
    FlatFile,

    /// A single embedded Sled database at `<solution>.ide/storage.ide`
    /// Best for: many small blobs
    Table,
}

impl std::str::FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flat-file" | "flatfile" | "file" => Ok(BackendType::FlatFile),
            "table" | "sled" => Ok(BackendType::Table),
            _ => Err(format!(
                "Unknown storage backend: {}. Valid options: flat-file, table",
                s
            )),
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BackendType::FlatFile => "flat-file",
            BackendType::Table => "table",
        };
        write!(f, "{}", name)
    }
}
