//! Test fixture for slnstore integration tests
//!
//! Provides an isolated solution tree on disk using ONLY the public API:
//!
//! ```text
//! <temp>/Sol/App.sln
//! <temp>/Sol/Proj/Proj.csproj
//! <temp>/Sol/Proj/Src/Foo.cs
//! <temp>/Sol/Proj/bin/Proj.dll        (output path, not created)
//! ```

use slnstore::{
    BackendType, Document, PersistenceOptions, PersistentStorageService, Project, Solution,
    StorageConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Every backend the property tests run against
pub const ALL_BACKENDS: [BackendType; 2] = [BackendType::FlatFile, BackendType::Table];

/// Route `log` output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Test fixture with an isolated solution/project/document tree
pub struct TestFixture {
    pub solution: Arc<Solution>,
    pub project: Arc<Project>,
    pub document: Arc<Document>,
    solution_dir: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TestFixture {
    /// Create the solution tree with one project and one document
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        init_logging();

        let temp_dir = tempfile::tempdir()?;
        let solution_dir = temp_dir.path().join("Sol");
        let project_dir = solution_dir.join("Proj");
        std::fs::create_dir_all(project_dir.join("Src"))?;

        let solution_path = solution_dir.join("App.sln");
        let project_path = project_dir.join("Proj.csproj");
        let document_path = project_dir.join("Src").join("Foo.cs");
        std::fs::write(&solution_path, b"solution")?;
        std::fs::write(&project_path, b"<Project />")?;
        std::fs::write(&document_path, b"class Foo {}")?;

        let solution = Solution::new(Some(solution_path));
        let project = Project::new(
            solution.clone(),
            Some(project_path),
            Some(project_dir.join("bin").join("Proj.dll")),
        );
        let document = Document::new(project.clone(), Some(document_path));

        Ok(TestFixture {
            solution,
            project,
            document,
            solution_dir,
            _temp_dir: temp_dir,
        })
    }

    /// Directory containing `App.sln`
    pub fn solution_dir(&self) -> &Path {
        &self.solution_dir
    }

    pub fn solution_path(&self) -> &Path {
        self.solution
            .file_path()
            .expect("fixture solution always has a path")
    }

    /// Another document of the fixture project, at a path relative to the project directory
    pub fn document_at(&self, relative: &str) -> Arc<Document> {
        Document::new(
            self.project.clone(),
            Some(self.solution_dir.join("Proj").join(relative)),
        )
    }

    /// A fresh service using `backend`
    pub fn service(&self, backend: BackendType) -> PersistentStorageService {
        PersistentStorageService::new(StorageConfig::default().with_backend(backend))
    }

    /// A fresh service using `backend`, with a handle on its persistence switch
    pub fn service_with_options(
        &self,
        backend: BackendType,
    ) -> (PersistentStorageService, Arc<PersistenceOptions>) {
        let options = Arc::new(PersistenceOptions::new(true));
        let service = PersistentStorageService::with_options(
            StorageConfig::default().with_backend(backend),
            options.clone(),
        );
        (service, options)
    }

    /// Every file below the fixture's temp directory, relative to the solution directory
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect_files(&self.solution_dir, &self.solution_dir, &mut files);
        files.sort();
        files
    }
}

fn collect_files(dir: &Path, base: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, base, files);
        } else if let Ok(relative) = path.strip_prefix(base) {
            files.push(relative.to_path_buf());
        }
    }
}
