// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage key derivation
//!
//! Keys are file paths made relative to the directory of their owner:
//! project files relative to the solution directory, documents relative to
//! the project directory. Keys therefore survive moving the whole solution
//! tree to another location.

use super::scope::{ScopeKey, StorageScope};
use crate::workspace::{Document, Project};
use parking_lot::Mutex;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Last key computed by a resolver, with the exact inputs it came from
#[derive(Debug)]
struct CachedKey {
    path: PathBuf,
    owner_path: PathBuf,
    key: String,
}

/// Derives stable storage keys from workspace identity
///
/// Each kind of key keeps a one-entry memo of the last (path, owner path)
/// pair it resolved. A hit requires both path strings to match exactly.
#[derive(Debug, Default)]
pub struct StorageKeyResolver {
    last_project_key: Mutex<Option<CachedKey>>,
    last_document_key: Mutex<Option<CachedKey>>,
    memo_hits: AtomicU64,
}

impl StorageKeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for a project: its path relative to the solution directory,
    /// prefixed with `"<prefix>_"` when `prefix` is non-empty
    ///
    /// Returns `None` when either the project or the solution has no path.
    pub fn key_for_project(&self, project: &Project, prefix: &str) -> Option<String> {
        let relative = self.project_relative_key(project)?;
        Some(prefixed_key(prefix, &relative))
    }

    /// Key for a document: its path relative to the project directory
    ///
    /// Returns `None` when either the document or its project has no path.
    pub fn key_for_document(&self, document: &Document) -> Option<String> {
        let document_path = document.file_path()?;
        let project_path = document.project().file_path()?;
        Some(self.memoized(
            &self.last_document_key,
            document_path,
            project_path,
        ))
    }

    /// Derive every key a backend needs to address `scope`
    pub fn resolve(&self, scope: StorageScope<'_>) -> Option<ScopeKey> {
        match scope {
            StorageScope::Solution => Some(ScopeKey::Solution),
            StorageScope::Project(project) => Some(ScopeKey::Project {
                project_key: self.project_relative_key(project)?,
                output_file_path: project.output_file_path().map(Path::to_path_buf),
            }),
            StorageScope::Document(document) => {
                let project = document.project();
                let document_key = self.key_for_document(document)?;
                Some(ScopeKey::Document {
                    project_key: self.project_relative_key(project)?,
                    document_key,
                    output_file_path: project.output_file_path().map(Path::to_path_buf),
                })
            }
        }
    }

    /// Number of lookups answered from the one-entry memo
    pub fn memo_hits(&self) -> u64 {
        self.memo_hits.load(Ordering::Relaxed)
    }

    fn project_relative_key(&self, project: &Project) -> Option<String> {
        let project_path = project.file_path()?;
        let solution_path = project.solution().file_path()?;
        Some(self.memoized(&self.last_project_key, project_path, solution_path))
    }

    fn memoized(&self, slot: &Mutex<Option<CachedKey>>, path: &Path, owner_path: &Path) -> String {
        let mut slot = slot.lock();

        if let Some(cached) = slot.as_ref() {
            if cached.path.as_os_str() == path.as_os_str()
                && cached.owner_path.as_os_str() == owner_path.as_os_str()
            {
                self.memo_hits.fetch_add(1, Ordering::Relaxed);
                return cached.key.clone();
            }
        }

        let base = owner_path.parent().unwrap_or_else(|| Path::new(""));
        let key = relative_path(path, base).to_string_lossy().into_owned();

        *slot = Some(CachedKey {
            path: path.to_path_buf(),
            owner_path: owner_path.to_path_buf(),
            key: key.clone(),
        });
        key
    }
}

/// `"<prefix>_<key>"`, or `key` alone when the prefix is empty
pub fn prefixed_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}_{}", prefix, key)
    }
}

/// Express `path` relative to the directory `base`
///
/// Paths outside `base` climb out with `..`. A path that shares no root with
/// `base` is returned unchanged.
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    if base.as_os_str().is_empty() {
        return path.to_path_buf();
    }
    if let Ok(stripped) = path.strip_prefix(base) {
        return stripped.to_path_buf();
    }

    let path_components: Vec<Component<'_>> = path.components().collect();
    let base_components: Vec<Component<'_>> = base.components().collect();

    let common = path_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 && (path.has_root() || base.has_root()) {
        return path.to_path_buf();
    }

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &path_components[common..] {
        relative.push(component.as_os_str());
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::Solution;
    use std::sync::Arc;

    fn sample_project(solution_path: &str, project_path: &str) -> Arc<Project> {
        let solution = Solution::new(Some(PathBuf::from(solution_path)));
        Project::new(solution, Some(PathBuf::from(project_path)), None)
    }

    #[test]
    fn test_project_key_relative_to_solution_directory() {
        let resolver = StorageKeyResolver::new();
        let project = sample_project("/sol/App.sln", "/sol/Proj/Proj.csproj");

        assert_eq!(
            resolver.key_for_project(&project, ""),
            Some("Proj/Proj.csproj".to_string())
        );
        assert_eq!(
            resolver.key_for_project(&project, "symbols"),
            Some("symbols_Proj/Proj.csproj".to_string())
        );
    }

    #[test]
    fn test_document_key_relative_to_project_directory() {
        let resolver = StorageKeyResolver::new();
        let project = sample_project("/sol/App.sln", "/sol/Proj/Proj.csproj");
        let document = Document::new(project, Some(PathBuf::from("/sol/Proj/Src/Foo.cs")));

        assert_eq!(
            resolver.key_for_document(&document),
            Some("Src/Foo.cs".to_string())
        );
    }

    #[test]
    fn test_missing_paths_produce_no_key() {
        let resolver = StorageKeyResolver::new();

        let unsaved_solution = Solution::new(None);
        let project = Project::new(
            unsaved_solution,
            Some(PathBuf::from("/sol/Proj/Proj.csproj")),
            None,
        );
        assert_eq!(resolver.key_for_project(&project, "x"), None);

        let pathless_project = Project::new(Solution::new(Some("/sol/App.sln".into())), None, None);
        assert_eq!(resolver.key_for_project(&pathless_project, ""), None);

        let document = Document::new(pathless_project, Some(PathBuf::from("/sol/a.cs")));
        assert_eq!(resolver.key_for_document(&document), None);

        let project = sample_project("/sol/App.sln", "/sol/Proj/Proj.csproj");
        let unsaved_document = Document::new(project, None);
        assert_eq!(resolver.key_for_document(&unsaved_document), None);
        assert!(resolver
            .resolve(StorageScope::Document(&unsaved_document))
            .is_none());
    }

    #[test]
    fn test_memo_hit_requires_exact_inputs() {
        let resolver = StorageKeyResolver::new();
        let project = sample_project("/sol/App.sln", "/sol/Proj/Proj.csproj");
        let foo = Document::new(project.clone(), Some(PathBuf::from("/sol/Proj/Foo.cs")));
        let bar = Document::new(project, Some(PathBuf::from("/sol/Proj/Bar.cs")));

        assert_eq!(resolver.key_for_document(&foo).as_deref(), Some("Foo.cs"));
        assert_eq!(resolver.key_for_document(&foo).as_deref(), Some("Foo.cs"));
        assert_eq!(resolver.memo_hits(), 1);

        // A different document evicts the memo; the old one is recomputed correctly
        assert_eq!(resolver.key_for_document(&bar).as_deref(), Some("Bar.cs"));
        assert_eq!(resolver.key_for_document(&foo).as_deref(), Some("Foo.cs"));
        assert_eq!(resolver.memo_hits(), 1);
    }

    #[test]
    fn test_changing_document_changes_only_suffix() {
        let resolver = StorageKeyResolver::new();
        let project = sample_project("/sol/App.sln", "/sol/Proj/Proj.csproj");
        let a = Document::new(project.clone(), Some(PathBuf::from("/sol/Proj/Src/A.cs")));
        let b = Document::new(project, Some(PathBuf::from("/sol/Proj/Src/B.cs")));

        let key_a = resolver.resolve(StorageScope::Document(&a)).unwrap();
        let key_b = resolver.resolve(StorageScope::Document(&b)).unwrap();
        match (key_a, key_b) {
            (
                ScopeKey::Document {
                    project_key: pa,
                    document_key: da,
                    ..
                },
                ScopeKey::Document {
                    project_key: pb,
                    document_key: db,
                    ..
                },
            ) => {
                assert_eq!(pa, pb);
                assert_eq!(da, "Src/A.cs");
                assert_eq!(db, "Src/B.cs");
            }
            other => panic!("unexpected keys: {:?}", other),
        }
    }

    #[test]
    fn test_relative_path_outside_base() {
        assert_eq!(
            relative_path(Path::new("/sol/Shared/Common.cs"), Path::new("/sol/Proj")),
            PathBuf::from("../Shared/Common.cs")
        );
        assert_eq!(
            relative_path(Path::new("Other/a.cs"), Path::new("Proj")),
            PathBuf::from("../Other/a.cs")
        );
        assert_eq!(
            relative_path(Path::new("/elsewhere/a.cs"), Path::new("relative/base")),
            PathBuf::from("/elsewhere/a.cs")
        );
    }
}
