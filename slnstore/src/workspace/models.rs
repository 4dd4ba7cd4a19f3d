// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Identity types for solutions, projects and documents

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Drop paths that are present but empty so that "no path" has one representation
fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

/// A solution, identified by the path of its manifest file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    file_path: Option<PathBuf>,
}

impl Solution {
    /// Create a solution; `None` or an empty path means the solution was never saved
    pub fn new(file_path: Option<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            file_path: non_empty(file_path),
        })
    }

    /// Path of the solution manifest, if any
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Directory that contains the solution manifest
    pub fn directory(&self) -> Option<&Path> {
        self.file_path()?.parent()
    }
}

/// A project belonging to a solution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    file_path: Option<PathBuf>,
    output_file_path: Option<PathBuf>,
    solution: Arc<Solution>,
}

impl Project {
    /// Create a project with its project file and build output paths
    pub fn new(
        solution: Arc<Solution>,
        file_path: Option<PathBuf>,
        output_file_path: Option<PathBuf>,
    ) -> Arc<Self> {
        Arc::new(Self {
            file_path: non_empty(file_path),
            output_file_path: non_empty(output_file_path),
            solution,
        })
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Path of the assembly/binary the project builds
    pub fn output_file_path(&self) -> Option<&Path> {
        self.output_file_path.as_deref()
    }

    pub fn solution(&self) -> &Arc<Solution> {
        &self.solution
    }
}

/// A source document belonging to a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    file_path: Option<PathBuf>,
    project: Arc<Project>,
}

impl Document {
    pub fn new(project: Arc<Project>, file_path: Option<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            file_path: non_empty(file_path),
            project,
        })
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn project(&self) -> &Arc<Project> {
        &self.project
    }

    pub fn solution(&self) -> &Arc<Solution> {
        self.project.solution()
    }
}
