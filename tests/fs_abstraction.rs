// tests/fs_abstraction.rs

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use test_executor::exec::{FileResultResolver, ResultResolver};
use test_executor::fs::{FileSystem, MockFileSystem, RealFileSystem};

#[tokio::test]
async fn test_resolver_reads_and_consumes_mock_file() {
    let fs = MockFileSystem::new();
    fs.add_file("reports/junit.xml", "<testsuite/>");
    let resolver = FileResultResolver::new(Arc::new(fs.clone()));

    let body = resolver.resolve(Path::new("reports/junit.xml")).await.unwrap();

    assert_eq!(body, json!("<testsuite/>"));
    assert!(fs.is_empty());
}

#[tokio::test]
async fn test_resolver_fails_on_second_resolution() {
    let fs = MockFileSystem::new();
    fs.add_file("once.xml", "");
    let resolver = FileResultResolver::new(Arc::new(fs));

    assert!(resolver.resolve(Path::new("once.xml")).await.is_ok());
    let err = resolver.resolve(Path::new("once.xml")).await.unwrap_err();
    assert!(err.to_string().contains("File not found"));
}

#[tokio::test]
async fn test_resolver_rejects_non_utf8_content() {
    let fs = MockFileSystem::new();
    fs.add_file("binary.dat", vec![0xff, 0xfe, 0x00]);
    let resolver = FileResultResolver::new(Arc::new(fs.clone()));

    assert!(resolver.resolve(Path::new("binary.dat")).await.is_err());
    // Nothing is deleted when reading failed.
    assert!(fs.exists(Path::new("binary.dat")));
}

#[tokio::test]
async fn test_default_resolver_uses_the_real_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.xml");
    RealFileSystem.write(&path, b"<ok/>").unwrap();

    let body = FileResultResolver::default().resolve(&path).await.unwrap();

    assert_eq!(body, json!("<ok/>"));
    assert!(!RealFileSystem.exists(&path));
}

#[test]
fn test_real_fs_write_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/dir/file.txt");

    RealFileSystem.write(&path, b"hello").unwrap();

    assert_eq!(RealFileSystem.read_to_string(&path).unwrap(), "hello");
    RealFileSystem.remove_file(&path).unwrap();
    assert!(RealFileSystem.remove_file(&path).is_err());
}
