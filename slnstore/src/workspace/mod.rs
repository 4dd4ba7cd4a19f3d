// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Solution / project / document identity model
//!
//! Storage only needs the file paths of these entities and the ability to
//! navigate from a document to its project and from a project to its
//! solution. Everything else about them belongs to the host.

pub mod models;

pub use models::{Document, Project, Solution};
