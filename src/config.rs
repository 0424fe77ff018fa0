//! Configuration for minftp
//!
//! Centralized configuration with sensible defaults. Both configs are built
//! once at process start and handed to the server/client constructors;
//! nothing reads ambient global state.

use std::path::PathBuf;

use crate::error::{FtpError, Result};

/// Default transfer buffer size (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Smallest transfer buffer accepted (4 KiB)
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Largest transfer buffer accepted (1 MiB)
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Main configuration for a minftp server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory under which all stored files live
    pub storage_root: PathBuf,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Number of connection worker threads.
    /// 1 services connections strictly one after another.
    pub workers: usize,

    /// Connection read timeout (milliseconds, 0 = block forever)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = block forever)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Transfer Configuration
    // -------------------------------------------------------------------------
    /// Transfer buffer size in bytes
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./server"),
            listen_addr: "127.0.0.1:2121".to_string(),
            workers: 1,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the values a server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(FtpError::Config("storage root must not be empty".to_string()));
        }
        if self.workers == 0 {
            return Err(FtpError::Config("at least one worker is required".to_string()));
        }
        if self.listen_addr.is_empty() {
            return Err(FtpError::Config("listen address must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage root directory
    pub fn storage_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_root = path.into();
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of worker threads
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the transfer buffer size, clamped to [`MIN_CHUNK_SIZE`]..=[`MAX_CHUNK_SIZE`]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = clamp_chunk_size(size);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Configuration for a minftp client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address (host:port)
    pub server_addr: String,

    /// Local directory files are uploaded from and downloaded into
    pub local_dir: PathBuf,

    /// Connection read timeout (milliseconds, 0 = block forever)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = block forever)
    pub write_timeout_ms: u64,

    /// Transfer buffer size in bytes
    pub chunk_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:2121".to_string(),
            local_dir: PathBuf::from("."),
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a new client config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the server address
    pub fn server_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.server_addr = addr.into();
        self
    }

    /// Set the local working directory
    pub fn local_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.local_dir = path.into();
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the transfer buffer size, clamped to [`MIN_CHUNK_SIZE`]..=[`MAX_CHUNK_SIZE`]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = clamp_chunk_size(size);
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

fn clamp_chunk_size(size: usize) -> usize {
    size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)
}

/// Parse a port argument, accepting only 1..=65535
pub fn parse_port(value: &str) -> Result<u16> {
    match value.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(FtpError::Config(format!("invalid port number: {}", value))),
        Ok(port) => Ok(port),
    }
}
