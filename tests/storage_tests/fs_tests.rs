//! Tests for FsStorage
//!
//! These tests verify:
//! - Opening/creating storage roots
//! - Reading files with their exact size
//! - Staged writes: commit, abort, overwrite
//! - Listing regular files only
//! - Name validation at the storage boundary
//! - Same-name writers are serialized
//! - Stale staging files are reclaimed

use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use minftp::storage::{FsStorage, PendingWrite, Storage};
use minftp::FtpError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_storage() -> (TempDir, FsStorage) {
    let temp_dir = TempDir::new().unwrap();
    let storage = FsStorage::open(temp_dir.path()).unwrap();
    (temp_dir, storage)
}

fn store(storage: &FsStorage, name: &str, data: &[u8]) {
    let mut pending = storage.create_for_write(name).unwrap();
    pending.write_all(data).unwrap();
    pending.commit().unwrap();
}

fn read_back(storage: &FsStorage, name: &str) -> Vec<u8> {
    let (mut reader, size) = storage.open_for_read(name).unwrap();
    let mut data = Vec::new();
    reader.read_to_end(&mut data).unwrap();
    assert_eq!(data.len() as u64, size);
    data
}

fn dir_entries(path: &PathBuf) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

// =============================================================================
// Open/Create Tests
// =============================================================================

#[test]
fn test_open_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("server");

    assert!(!path.exists());

    let storage = FsStorage::open(&path).unwrap();

    assert!(path.is_dir());
    assert_eq!(storage.root(), path.as_path());
}

#[test]
fn test_open_existing_directory_keeps_files() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("old.txt"), b"kept").unwrap();

    let storage = FsStorage::open(temp_dir.path()).unwrap();

    assert!(storage.exists("old.txt").unwrap());
    assert_eq!(read_back(&storage, "old.txt"), b"kept");
}

// =============================================================================
// Read Tests
// =============================================================================

#[test]
fn test_open_for_read_reports_size() {
    let (_temp, storage) = setup_temp_storage();
    store(&storage, "a.txt", b"hello world");

    let (_reader, size) = storage.open_for_read("a.txt").unwrap();

    assert_eq!(size, 11);
}

#[test]
fn test_open_missing_file() {
    let (_temp, storage) = setup_temp_storage();

    assert!(!storage.exists("missing.txt").unwrap());
    assert!(matches!(
        storage.open_for_read("missing.txt"),
        Err(FtpError::FileNotFound(name)) if name == "missing.txt"
    ));
}

#[test]
fn test_open_directory_is_not_found() {
    let (temp, storage) = setup_temp_storage();
    fs::create_dir(temp.path().join("subdir")).unwrap();

    assert!(!storage.exists("subdir").unwrap());
    assert!(matches!(storage.open_for_read("subdir"), Err(FtpError::FileNotFound(_))));
}

// =============================================================================
// Write Tests
// =============================================================================

#[test]
fn test_commit_makes_file_visible() {
    let (temp, storage) = setup_temp_storage();

    let mut pending = storage.create_for_write("x.bin").unwrap();
    pending.write_all(&[1, 2, 3, 4, 5]).unwrap();

    assert!(!storage.exists("x.bin").unwrap());

    pending.commit().unwrap();

    assert_eq!(fs::read(temp.path().join("x.bin")).unwrap(), vec![1, 2, 3, 4, 5]);
    assert_eq!(dir_entries(&temp.path().to_path_buf()), vec!["x.bin".to_string()]);
}

#[test]
fn test_empty_file() {
    let (_temp, storage) = setup_temp_storage();
    store(&storage, "empty", b"");

    assert!(storage.exists("empty").unwrap());
    assert!(read_back(&storage, "empty").is_empty());
}

#[test]
fn test_drop_without_commit_removes_staging() {
    let (temp, storage) = setup_temp_storage();

    {
        let mut pending = storage.create_for_write("partial.bin").unwrap();
        pending.write_all(b"half of it").unwrap();
    }

    assert!(!storage.exists("partial.bin").unwrap());
    assert!(dir_entries(&temp.path().to_path_buf()).is_empty());
    assert_eq!(storage.active_writers(), 0);
}

#[test]
fn test_abort_keeps_previous_content() {
    let (_temp, storage) = setup_temp_storage();
    store(&storage, "doc.txt", b"version 1");

    {
        let mut pending = storage.create_for_write("doc.txt").unwrap();
        pending.write_all(b"vers").unwrap();
    }

    assert_eq!(read_back(&storage, "doc.txt"), b"version 1");
}

#[test]
fn test_commit_overwrites_existing() {
    let (_temp, storage) = setup_temp_storage();
    store(&storage, "doc.txt", b"a much longer first version");
    store(&storage, "doc.txt", b"short");

    assert_eq!(read_back(&storage, "doc.txt"), b"short");
}

#[test]
fn test_create_makes_parent_directories() {
    let (temp, storage) = setup_temp_storage();
    store(&storage, "a/b/c.txt", b"nested");

    assert!(temp.path().join("a").join("b").is_dir());
    assert_eq!(read_back(&storage, "a/b/c.txt"), b"nested");
}

// =============================================================================
// Listing Tests
// =============================================================================

#[test]
fn test_list_empty_root() {
    let (_temp, storage) = setup_temp_storage();
    assert!(storage.list_regular_files().unwrap().is_empty());
}

#[test]
fn test_list_excludes_subdirectories() {
    let (temp, storage) = setup_temp_storage();
    store(&storage, "a.txt", b"a");
    store(&storage, "b.txt", b"b");
    store(&storage, "sub/c.txt", b"c");
    fs::create_dir(temp.path().join("empty-dir")).unwrap();

    let mut names = storage.list_regular_files().unwrap();
    names.sort();

    assert_eq!(names, vec!["a.txt".to_string(), "b.txt".to_string()]);
}

#[test]
fn test_list_excludes_uploads_in_progress() {
    let (_temp, storage) = setup_temp_storage();
    store(&storage, "done.txt", b"done");

    let mut pending = storage.create_for_write("busy.txt").unwrap();
    pending.write_all(b"still going").unwrap();

    assert_eq!(storage.list_regular_files().unwrap(), vec!["done.txt".to_string()]);

    pending.commit().unwrap();

    let mut names = storage.list_regular_files().unwrap();
    names.sort();
    assert_eq!(names, vec!["busy.txt".to_string(), "done.txt".to_string()]);
}

// =============================================================================
// Name Validation Tests
// =============================================================================

#[test]
fn test_rejects_escaping_names() {
    let (_temp, storage) = setup_temp_storage();

    for name in ["", "../outside.txt", "/etc/passwd", "a/../../b", "."] {
        assert!(
            matches!(storage.open_for_read(name), Err(FtpError::InvalidName(_))),
            "read {:?}",
            name
        );
        assert!(
            matches!(storage.create_for_write(name), Err(FtpError::InvalidName(_))),
            "write {:?}",
            name
        );
    }
}

#[test]
fn test_resolve_stays_under_root() {
    let (temp, storage) = setup_temp_storage();
    let path = storage.resolve("dir/file.txt").unwrap();
    assert!(path.starts_with(temp.path()));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_same_name_writers_are_serialized() {
    let (_temp, storage) = setup_temp_storage();
    let storage = Arc::new(storage);

    let mut first = storage.create_for_write("shared.txt").unwrap();
    first.write_all(b"first").unwrap();

    let (tx, rx) = mpsc::channel();
    let storage_clone = Arc::clone(&storage);
    let second = thread::spawn(move || {
        let mut pending = storage_clone.create_for_write("shared.txt").unwrap();
        tx.send(()).unwrap();
        pending.write_all(b"second").unwrap();
        pending.commit().unwrap();
    });

    // Second writer must wait for the first to finish
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

    first.commit().unwrap();
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    second.join().unwrap();

    assert_eq!(read_back(&storage, "shared.txt"), b"second");
    assert_eq!(storage.active_writers(), 0);
}

#[test]
fn test_different_names_write_concurrently() {
    let (_temp, storage) = setup_temp_storage();
    let storage = Arc::new(storage);

    let mut first = storage.create_for_write("one.txt").unwrap();

    let storage_clone = Arc::clone(&storage);
    let other = thread::spawn(move || store(&storage_clone, "two.txt", b"2"));
    other.join().unwrap();

    first.write_all(b"1").unwrap();
    first.commit().unwrap();

    assert_eq!(read_back(&storage, "one.txt"), b"1");
    assert_eq!(read_back(&storage, "two.txt"), b"2");
}

// =============================================================================
// Stale Staging Tests
// =============================================================================

#[test]
fn test_remove_stale_staging() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("dir")).unwrap();
    fs::write(root.join("kept.txt"), b"kept").unwrap();
    fs::write(root.join(".minftp-kept.txt.3.part"), b"half").unwrap();
    fs::write(root.join("dir").join(".minftp-deep.bin.9.part"), b"half").unwrap();

    let storage = FsStorage::open(root).unwrap();
    assert_eq!(storage.remove_stale_staging().unwrap(), 2);

    assert_eq!(dir_entries(&root.to_path_buf()), vec!["dir", "kept.txt"]);
    assert!(dir_entries(&root.join("dir")).is_empty());
    assert_eq!(read_back(&storage, "kept.txt"), b"kept");
    assert_eq!(storage.remove_stale_staging().unwrap(), 0);
}
