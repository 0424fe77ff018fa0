//! Connection Handler
//!
//! Services the single request carried by one client connection.

use std::io::{self, BufReader, BufWriter, Read};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{FtpError, Result};
use crate::protocol::{
    read_header, write_listing, write_size, write_status, Operation, StatusFrame,
};
use crate::storage::{PendingWrite, Storage};
use crate::transfer::copy_exact;

/// Handles a single client connection
pub struct Connection<S: Storage> {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Where files are served from and stored into
    storage: Arc<S>,

    /// Transfer buffer size
    chunk_size: usize,

    /// Peer address for logging
    peer_addr: String,
}

impl<S: Storage> Connection<S> {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O on cloned halves of the stream
    pub fn new(stream: TcpStream, storage: Arc<S>, chunk_size: usize) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::with_capacity(chunk_size, read_stream),
            writer: BufWriter::with_capacity(chunk_size, write_stream),
            storage,
            chunk_size,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves the stream blocking)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection's request (blocking until it is serviced)
    ///
    /// Reads one header, dispatches on its operation and returns. The caller
    /// closes the connection afterwards whatever the outcome.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let header = match read_header(&mut self.reader) {
            Ok(header) => header,
            Err(e) => {
                tracing::warn!("[FAILURE] Bad request from {}: {}", self.peer_addr, e);
                return Err(e);
            }
        };

        tracing::trace!("Received header from {}: {:?}", self.peer_addr, header);

        let operation = header.operation();
        let result = match operation {
            Operation::Get => self.serve_get(header.name()),
            Operation::Put => self.serve_put(header.name(), header.declared_size()),
            Operation::List => self.serve_list(),
        };

        match &result {
            Ok(()) => {
                tracing::info!("[SUCCESS] {} {:?} for {}", operation, header.name(), self.peer_addr)
            }
            Err(e) => tracing::warn!(
                "[FAILURE] {} {:?} for {}: {}",
                operation,
                header.name(),
                self.peer_addr,
                e
            ),
        }

        result
    }

    /// Send status, size, then the file's bytes
    fn serve_get(&mut self, name: &str) -> Result<()> {
        let (mut file, size) = match self.storage.open_for_read(name) {
            Ok(opened) => opened,
            Err(e) => return self.reject(e),
        };

        write_status(&mut self.writer, &StatusFrame::ok())?;
        write_size(&mut self.writer, size)?;
        copy_exact(&mut file, &mut self.writer, size, self.chunk_size)?;

        tracing::debug!("Sent {} bytes of {:?} to {}", size, name, self.peer_addr);
        Ok(())
    }

    /// Receive exactly `size` bytes into `name`, then acknowledge
    fn serve_put(&mut self, name: &str, size: u64) -> Result<()> {
        let mut pending = match self.storage.create_for_write(name) {
            Ok(pending) => pending,
            Err(e) => {
                // Consume the payload anyway so the client reaches our answer
                copy_exact(&mut self.reader, &mut io::sink(), size, self.chunk_size)?;
                return self.reject(e);
            }
        };

        let received = {
            let mut payload = (&mut self.reader).take(size);
            match copy_exact(&mut payload, &mut pending, size, self.chunk_size) {
                Ok(_) => Ok(()),
                // Peer is gone; dropping `pending` discards the staged bytes
                Err(e @ FtpError::TransferIncomplete { .. }) => return Err(e),
                Err(e) => {
                    // Storage failed mid-upload: swallow the rest so the
                    // client finishes sending and reads our answer
                    io::copy(&mut payload, &mut io::sink())?;
                    Err(e)
                }
            }
        };
        if let Err(e) = received {
            // Discard the staged bytes before the client hears back
            drop(pending);
            return self.reject(e);
        }

        if let Err(e) = pending.commit() {
            return self.reject(e);
        }

        write_status(&mut self.writer, &StatusFrame::ok())?;

        tracing::debug!("Stored {} bytes as {:?} from {}", size, name, self.peer_addr);
        Ok(())
    }

    /// Send status, count, then the names
    fn serve_list(&mut self) -> Result<()> {
        let names = match self.storage.list_regular_files() {
            Ok(names) => names,
            Err(e) => return self.reject(e),
        };

        write_status(&mut self.writer, &StatusFrame::ok())?;
        write_listing(&mut self.writer, &names)
    }

    /// Tell the client why its request failed, then fail with `err`
    fn reject(&mut self, err: FtpError) -> Result<()> {
        let frame = match &err {
            FtpError::FileNotFound(_) => StatusFrame::not_found(),
            other => StatusFrame::error(&other.to_string()),
        };

        if let Err(e) = write_status(&mut self.writer, &frame) {
            tracing::debug!("Could not send {:?} to {}: {}", frame.status, self.peer_addr, e);
        }

        Err(err)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
