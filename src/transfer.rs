//! Payload Streaming
//!
//! Moves an exact, pre-announced number of bytes from a source to a sink.
//!
//! ## Responsibilities
//! - Bounded, chunked copying (never a single unbounded buffer)
//! - Stop exactly at the announced length, even if the source has more
//! - Tell "peer went away early" apart from "local storage failed"

use std::io::{ErrorKind, Read, Write};

use crate::error::{FtpError, Result};

/// Copy exactly `len` bytes from `source` to `sink`
///
/// Reads at most `chunk_size` bytes at a time and never asks the source for
/// more than is still owed, so bytes after the payload stay unread.
/// The sink is flushed on every exit path.
///
/// ## Errors
/// - [`FtpError::TransferIncomplete`] if the source ends or fails before
///   `len` bytes arrived
/// - [`FtpError::Io`] if writing to or flushing the sink fails
pub fn copy_exact<R, W>(source: &mut R, sink: &mut W, len: u64, chunk_size: usize) -> Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    if len == 0 {
        sink.flush()?;
        return Ok(0);
    }

    let buf_len = usize::try_from(len).map_or(chunk_size, |len| len.min(chunk_size)).max(1);
    let mut buf = vec![0u8; buf_len];
    let mut transferred: u64 = 0;

    while transferred < len {
        let want = (len - transferred).min(buf.len() as u64) as usize;

        let n = match source.read(&mut buf[..want]) {
            Ok(0) => {
                tracing::debug!("Source ended after {} of {} bytes", transferred, len);
                return Err(incomplete(sink, len, transferred));
            }
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!("Source failed after {} of {} bytes: {}", transferred, len, e);
                return Err(incomplete(sink, len, transferred));
            }
        };

        sink.write_all(&buf[..n])?;
        transferred += n as u64;
    }

    sink.flush()?;
    Ok(transferred)
}

fn incomplete<W: Write + ?Sized>(sink: &mut W, expected: u64, transferred: u64) -> FtpError {
    if let Err(e) = sink.flush() {
        tracing::debug!("Flush after incomplete transfer failed: {}", e);
    }
    FtpError::TransferIncomplete {
        expected,
        transferred,
    }
}
