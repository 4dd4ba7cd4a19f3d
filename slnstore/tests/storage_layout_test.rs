//! On-disk layout of each backend
//!
//! The flat-file layout is read by other tooling, so the paths are fixed:
//!
//! ```text
//! App.sln.ide/<name>                             solution blobs
//! Proj/bin/Proj.dll.ide/<name>                   project blobs
//! Proj/bin/Proj.dll.ide/<name>/<document>.ide    document blobs
//! ```

mod testutils;

use slnstore::{BackendType, BlobStore, StorageScope};
use std::path::PathBuf;
use testutils::TestFixture;
use tokio_util::sync::CancellationToken;

fn rel(parts: &[&str]) -> PathBuf {
    parts.iter().collect()
}

#[tokio::test]
async fn test_flat_file_layout() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let service = fixture.service(BackendType::FlatFile);
    let storage = service.get_storage(&fixture.solution);
    let cancel = CancellationToken::new();

    assert!(storage
        .write_bytes(StorageScope::Solution, "index", b"s", &cancel)
        .await);
    assert!(storage
        .write_bytes(StorageScope::Project(&fixture.project), "index", b"p", &cancel)
        .await);
    assert!(storage
        .write_bytes(StorageScope::Document(&fixture.document), "cache", b"d", &cancel)
        .await);

    let files = fixture.files();
    for expected in [
        rel(&["App.sln.ide", "index"]),
        rel(&["Proj", "bin", "Proj.dll.ide", "index"]),
        rel(&["Proj", "bin", "Proj.dll.ide", "cache", "Src", "Foo.cs.ide"]),
    ] {
        assert!(files.contains(&expected), "missing {:?} in {:?}", expected, files);
    }

    let document_blob = fixture
        .solution_dir()
        .join(rel(&["Proj", "bin", "Proj.dll.ide", "cache", "Src", "Foo.cs.ide"]));
    assert_eq!(std::fs::read(document_blob).unwrap(), b"d");
}

#[test]
fn test_flat_file_root_created_on_open() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let service = fixture.service(BackendType::FlatFile);

    let _storage = service.get_storage(&fixture.solution);
    assert!(fixture.solution_dir().join("App.sln.ide").is_dir());
    // Nothing is written below the project until a project blob is
    assert!(!fixture.solution_dir().join(rel(&["Proj", "bin"])).exists());
}

#[tokio::test]
async fn test_document_outside_project_is_not_stored() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let service = fixture.service(BackendType::FlatFile);
    let storage = service.get_storage(&fixture.solution);
    let cancel = CancellationToken::new();
    let linked = fixture.document_at("../Shared/Linked.cs");
    let before = fixture.files();

    assert!(!storage
        .write_bytes(StorageScope::Document(&linked), "cache", b"x", &cancel)
        .await);
    assert_eq!(fixture.files(), before);
}

#[tokio::test]
async fn test_table_layout_keeps_everything_in_one_database() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let service = fixture.service(BackendType::Table);
    let storage = service.get_storage(&fixture.solution);
    let cancel = CancellationToken::new();

    assert!(storage
        .write_bytes(StorageScope::Project(&fixture.project), "index", b"p", &cancel)
        .await);
    assert!(storage
        .write_bytes(StorageScope::Document(&fixture.document), "cache", b"d", &cancel)
        .await);

    assert!(fixture
        .solution_dir()
        .join(rel(&["App.sln.ide", "storage.ide"]))
        .exists());
    assert!(!fixture.solution_dir().join(rel(&["Proj", "bin"])).exists());
}

#[tokio::test]
async fn test_stats_track_traffic() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let service = fixture.service(BackendType::FlatFile);
    let storage = service.get_storage(&fixture.solution);
    let cancel = CancellationToken::new();

    assert!(storage
        .write_bytes(StorageScope::Solution, "index", b"s", &cancel)
        .await);
    assert!(storage
        .read_bytes(StorageScope::Solution, "index", &cancel)
        .await
        .is_some());
    assert!(storage
        .read_bytes(StorageScope::Solution, "missing", &cancel)
        .await
        .is_none());

    let stats = storage.persistent_storage().unwrap().stats();
    assert_eq!(stats.backend, BackendType::FlatFile);
    assert_eq!(stats.writes, 1);
    assert_eq!(stats.reads, 2);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.failed_writes, 0);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["backend"], "flat-file");
}

#[tokio::test]
async fn test_flat_file_name_taken_by_project_blob() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let service = fixture.service(BackendType::FlatFile);
    let storage = service.get_storage(&fixture.solution);
    let cancel = CancellationToken::new();

    assert!(storage
        .write_bytes(StorageScope::Project(&fixture.project), "cache", b"p", &cancel)
        .await);
    assert!(!storage
        .write_bytes(StorageScope::Document(&fixture.document), "cache", b"d", &cancel)
        .await);

    let stats = storage.persistent_storage().unwrap().stats();
    assert_eq!(stats.failed_writes, 1);
    assert!(fixture
        .solution_dir()
        .join(rel(&["Proj", "bin", "Proj.dll.ide", "cache"]))
        .is_file());
}
