// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Runtime persistence switch

use std::sync::atomic::{AtomicBool, Ordering};

/// Host-provided option lookup consulted before every storage operation
pub trait OptionService: Send + Sync {
    /// Whether persistence is currently enabled
    fn persistence_enabled(&self) -> bool;
}

/// Default option service backed by a single flag that can be flipped at runtime
#[derive(Debug)]
pub struct PersistenceOptions {
    enabled: AtomicBool,
}

impl PersistenceOptions {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn set_persistence_enabled(&self, enabled: bool) {
        let previous = self.enabled.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            log::info!("Persistence {}", if enabled { "enabled" } else { "disabled" });
        }
    }
}

impl Default for PersistenceOptions {
    fn default() -> Self {
        Self::new(true)
    }
}

impl OptionService for PersistenceOptions {
    fn persistence_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let options = PersistenceOptions::default();
        assert!(options.persistence_enabled());
        options.set_persistence_enabled(false);
        assert!(!options.persistence_enabled());
        options.set_persistence_enabled(true);
        assert!(options.persistence_enabled());
    }
}
