// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage configuration and the runtime persistence switch

pub mod config;
pub mod option_service;

pub use config::StorageConfig;
pub use option_service::{OptionService, PersistenceOptions};
