//! Tests for storage failures while a request is being served
//!
//! These tests verify:
//! - A write failure partway through an upload reaches the client as the
//!   server's error message, not as a dropped connection
//! - The server keeps serving after such a failure

use std::fs::{self, File};
use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use minftp::network::ShutdownHandle;
use minftp::storage::{FsPendingWrite, FsStorage, PendingWrite, Storage};
use minftp::{Client, ClientConfig, Config, FtpError, Result, Server};
use tempfile::TempDir;

use super::common::pattern;

// =============================================================================
// Helper Types
// =============================================================================

/// Filesystem storage whose uploads fail once `capacity` bytes are written
struct FullDiskStorage {
    inner: FsStorage,
    capacity: usize,
}

struct FullDiskWrite {
    inner: FsPendingWrite,
    room: usize,
}

impl Write for FullDiskWrite {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.room == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        let len = buf.len().min(self.room);
        let n = self.inner.write(&buf[..len])?;
        self.room -= n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl PendingWrite for FullDiskWrite {
    fn commit(self) -> Result<()> {
        self.inner.commit()
    }
}

impl Storage for FullDiskStorage {
    type Reader = File;
    type Writer = FullDiskWrite;

    fn exists(&self, name: &str) -> Result<bool> {
        self.inner.exists(name)
    }

    fn open_for_read(&self, name: &str) -> Result<(File, u64)> {
        self.inner.open_for_read(name)
    }

    fn create_for_write(&self, name: &str) -> Result<FullDiskWrite> {
        Ok(FullDiskWrite {
            inner: self.inner.create_for_write(name)?,
            room: self.capacity,
        })
    }

    fn list_regular_files(&self) -> Result<Vec<String>> {
        self.inner.list_regular_files()
    }
}

/// A server over [`FullDiskStorage`]
struct FullDiskServer {
    root: TempDir,
    client_dir: TempDir,
    client: Client,
    shutdown: ShutdownHandle,
    thread: Option<JoinHandle<()>>,
}

impl FullDiskServer {
    fn start(capacity: usize) -> Self {
        let root = TempDir::new().unwrap();
        let storage = FullDiskStorage {
            inner: FsStorage::open(root.path()).unwrap(),
            capacity,
        };
        let config = Config::builder()
            .storage_root(root.path())
            .listen_addr("127.0.0.1:0")
            .chunk_size(4096)
            .read_timeout_ms(5000)
            .write_timeout_ms(5000)
            .build();

        let server = Server::with_storage(config, Arc::new(storage)).unwrap();
        let addr = server.local_addr();
        let shutdown = server.shutdown_handle();
        let thread = thread::spawn(move || server.run().unwrap());

        let client_dir = TempDir::new().unwrap();
        let client = Client::new(
            ClientConfig::builder()
                .server_addr(addr.to_string())
                .local_dir(client_dir.path())
                .chunk_size(4096)
                .read_timeout_ms(5000)
                .write_timeout_ms(5000)
                .build(),
        )
        .unwrap();

        Self {
            root,
            client_dir,
            client,
            shutdown,
            thread: Some(thread),
        }
    }
}

impl Drop for FullDiskServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// =============================================================================
// Upload Failure Tests
// =============================================================================

#[test]
fn test_write_failure_mid_upload_is_reported() {
    let server = FullDiskServer::start(4096);
    fs::write(server.client_dir.path().join("big.bin"), pattern(8 * 1024 * 1024)).unwrap();

    for _ in 0..3 {
        let err = server.client.put("big.bin").unwrap_err();

        match err {
            FtpError::Remote(message) => assert!(message.contains("disk full"), "{}", message),
            other => panic!("Expected Remote, got {:?}", other),
        }
    }

    assert!(!server.root.path().join("big.bin").exists());
    assert!(fs::read_dir(server.root.path()).unwrap().next().is_none());
}

#[test]
fn test_server_keeps_serving_after_write_failure() {
    let server = FullDiskServer::start(4096);
    fs::write(server.client_dir.path().join("big.bin"), pattern(100_000)).unwrap();
    fs::write(server.client_dir.path().join("small.txt"), b"fits").unwrap();

    assert!(matches!(server.client.put("big.bin"), Err(FtpError::Remote(_))));

    assert_eq!(server.client.put("small.txt").unwrap(), 4);
    assert_eq!(server.client.list().unwrap(), vec!["small.txt".to_string()]);
}
