// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage configuration

use crate::storage::{BackendType, StorageError, StorageResult};
use serde::{Deserialize, Serialize};

/// Default suffix for storage directories and files (`App.sln` -> `App.sln.ide`)
pub const DEFAULT_STORAGE_EXTENSION: &str = "ide";

/// Default size of the chunks used when copying blob streams
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Default number of idle copy buffers kept for reuse
pub const DEFAULT_MAX_POOLED_BUFFERS: usize = 16;

/// Configuration for the persistent storage service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Initial value of the persistence switch
    pub enabled: bool,

    /// Physical storage used for new handles
    pub backend: BackendType,

    /// Suffix appended to owner paths to build storage locations
    pub extension: String,

    /// Chunk size for streamed copies (bytes)
    pub buffer_size: usize,

    /// Maximum number of idle buffers retained by the pool
    pub max_pooled_buffers: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: BackendType::default(),
            extension: DEFAULT_STORAGE_EXTENSION.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_pooled_buffers: DEFAULT_MAX_POOLED_BUFFERS,
        }
    }
}

impl StorageConfig {
    /// Parse and validate a JSON configuration; missing fields take their defaults
    pub fn from_json(json: &str) -> StorageResult<Self> {
        let config: StorageConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder-style backend selection
    pub fn with_backend(mut self, backend: BackendType) -> Self {
        self.backend = backend;
        self
    }

    /// Builder-style initial persistence switch
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check that the configuration can produce valid storage locations
    pub fn validate(&self) -> StorageResult<()> {
        if self.extension.is_empty() {
            return Err(StorageError::InvalidConfig(
                "storage extension must not be empty".to_string(),
            ));
        }
        if self.extension.contains(&['/', '\\', '.'][..]) {
            return Err(StorageError::InvalidConfig(format!(
                "storage extension '{}' must be a bare suffix without separators or dots",
                self.extension
            )));
        }
        if self.buffer_size == 0 {
            return Err(StorageError::InvalidConfig(
                "buffer_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StorageConfig::default();
        assert!(config.enabled);
        assert_eq!(config.backend, BackendType::FlatFile);
        assert_eq!(config.extension, "ide");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = StorageConfig::from_json(r#"{ "backend": "table", "enabled": false }"#)
            .unwrap();
        assert_eq!(config.backend, BackendType::Table);
        assert!(!config.enabled);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
    }

    #[test]
    fn test_invalid_extension_rejected() {
        let result = StorageConfig::from_json(r#"{ "extension": "a/b" }"#);
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));

        let result = StorageConfig::from_json(r#"{ "extension": "" }"#);
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let result = StorageConfig::from_json("{ not json");
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }
}
