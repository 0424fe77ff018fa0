//! Client
//!
//! Issues GET, PUT and LS requests, one connection per operation.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{FtpError, Result};
use crate::protocol::{read_listing, read_size, read_status, write_header, RequestHeader};
use crate::storage::{validate_name, FsStorage, PendingWrite, Storage};
use crate::transfer::copy_exact;

/// Client for a minftp server
///
/// Local files are read from and written to `config.local_dir`, using the
/// same staging discipline as the server: a download only appears under its
/// name once every announced byte arrived.
pub struct Client {
    config: ClientConfig,
    local: FsStorage,
}

impl Client {
    /// Create a client, creating the local directory if needed
    pub fn new(config: ClientConfig) -> Result<Self> {
        let local = FsStorage::open(&config.local_dir)?;
        Ok(Self { config, local })
    }

    /// Download `name` from the server into the local directory
    ///
    /// Returns the number of bytes retrieved.
    pub fn get(&self, name: &str) -> Result<u64> {
        validate_name(name)?;
        let header = RequestHeader::get(name)?;

        let (mut reader, mut writer) = self.connect()?;
        write_header(&mut writer, &header)?;

        read_status(&mut reader)?.into_result(name)?;
        let size = read_size(&mut reader)?;

        let mut pending = self.local.create_for_write(name)?;
        copy_exact(&mut reader, &mut pending, size, self.config.chunk_size)?;
        pending.commit()?;

        tracing::debug!("Retrieved {:?} ({} bytes)", name, size);
        Ok(size)
    }

    /// Upload `name` from the local directory to the server
    ///
    /// Returns the number of bytes sent once the server acknowledged them.
    pub fn put(&self, name: &str) -> Result<u64> {
        if !self.local.exists(name)? {
            return Err(FtpError::FileNotFound(name.to_string()));
        }
        let (mut file, size) = self.local.open_for_read(name)?;
        let header = RequestHeader::put(name, size)?;

        let (mut reader, mut writer) = self.connect()?;
        write_header(&mut writer, &header)?;
        copy_exact(&mut file, &mut writer, size, self.config.chunk_size)?;

        read_status(&mut reader)?.into_result(name)?;

        tracing::debug!("Uploaded {:?} ({} bytes)", name, size);
        Ok(size)
    }

    /// Fetch the names of the files stored on the server
    pub fn list(&self) -> Result<Vec<String>> {
        let (mut reader, mut writer) = self.connect()?;
        write_header(&mut writer, &RequestHeader::list())?;

        read_status(&mut reader)?.into_result("")?;
        read_listing(&mut reader)
    }

    fn connect(&self) -> Result<(BufReader<TcpStream>, BufWriter<TcpStream>)> {
        let stream = TcpStream::connect(&self.config.server_addr)?;

        if self.config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(self.config.read_timeout_ms)))?;
        }
        if self.config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(self.config.write_timeout_ms)))?;
        }

        let chunk_size = self.config.chunk_size;
        let read_stream = stream.try_clone()?;
        Ok((
            BufReader::with_capacity(chunk_size, read_stream),
            BufWriter::with_capacity(chunk_size, stream),
        ))
    }
}
