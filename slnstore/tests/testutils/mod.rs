//! Test utilities for slnstore integration tests
//!
//! - TestFixture: a throwaway solution/project/document tree on disk
//! - ALL_BACKENDS: run a property against every backend

#![allow(dead_code)]

pub mod test_fixture;

pub use test_fixture::{init_logging, TestFixture, ALL_BACKENDS};
