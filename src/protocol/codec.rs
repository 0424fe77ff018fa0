//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol. All integers are
//! big-endian; strings carry a 16-bit length prefix followed by UTF-8 bytes.
//!
//! ## Wire Format
//!
//! ### Request Header
//! ```text
//! ┌────────────┬────────────┬──────────────┬───────────────┐
//! │ Opcode (4) │ NameLen(2) │ Name (UTF-8) │   Size (8)    │
//! └────────────┴────────────┴──────────────┴───────────────┘
//! ```
//!
//! ### Status Frame
//! ```text
//! ┌────────────┬──────────────────────────────────────┐
//! │ Status (1) │ MsgLen (2) + Msg   (ERROR status only) │
//! └────────────┴──────────────────────────────────────┘
//! ```
//!
//! ### Listing
//! ```text
//! ┌────────────┬──────────────────┬─────┬──────────────────┐
//! │ Count (4)  │ NameLen(2) + Name│ ... │ NameLen(2) + Name│
//! └────────────┴──────────────────┴─────┴──────────────────┘
//! ```

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::request::{Operation, RequestHeader, MAX_NAME_LEN};
use super::response::{Status, StatusFrame};
use crate::error::{FtpError, Result};

/// Opcode (4) + name length (2)
const HEADER_PREFIX_SIZE: usize = 6;

/// Size field width
const SIZE_FIELD_SIZE: usize = 8;

/// Smallest possible header: empty name
pub const MIN_HEADER_SIZE: usize = HEADER_PREFIX_SIZE + SIZE_FIELD_SIZE;

// =============================================================================
// Header Encoding/Decoding
// =============================================================================

/// Encode a request header to bytes
///
/// Format: opcode (4) + name_len (2) + name + size (8)
pub fn encode_header(header: &RequestHeader) -> Bytes {
    let name = header.name().as_bytes();
    let mut buf = BytesMut::with_capacity(MIN_HEADER_SIZE + name.len());

    buf.put_i32(header.operation().code());
    // RequestHeader::new bounds the name length
    buf.put_u16(name.len() as u16);
    buf.put_slice(name);
    buf.put_u64(header.declared_size());

    buf.freeze()
}

/// Decode a request header from bytes
pub fn decode_header(bytes: &[u8]) -> Result<RequestHeader> {
    let mut buf = bytes;

    if buf.remaining() < HEADER_PREFIX_SIZE {
        return Err(FtpError::MalformedHeader(format!(
            "incomplete header: expected at least {} bytes, got {}",
            MIN_HEADER_SIZE,
            bytes.len()
        )));
    }

    let operation = Operation::from_code(buf.get_i32())?;
    let name_len = buf.get_u16() as usize;

    if buf.remaining() < name_len + SIZE_FIELD_SIZE {
        return Err(FtpError::MalformedHeader(format!(
            "incomplete header: expected {} bytes, got {}",
            MIN_HEADER_SIZE + name_len,
            bytes.len()
        )));
    }

    let name = header_name(buf[..name_len].to_vec())?;
    buf.advance(name_len);
    let declared_size = buf.get_u64();

    RequestHeader::new(operation, name, declared_size)
}

/// Read a complete request header from a stream
///
/// Reads exactly the header's bytes and nothing beyond them, so a payload
/// that follows on the same stream stays unread.
pub fn read_header<R: Read>(reader: &mut R) -> Result<RequestHeader> {
    let mut prefix = [0u8; HEADER_PREFIX_SIZE];
    read_header_field(reader, &mut prefix, "opcode")?;

    let mut buf = &prefix[..];
    let operation = Operation::from_code(buf.get_i32())?;
    let name_len = buf.get_u16() as usize;

    let mut name = vec![0u8; name_len];
    read_header_field(reader, &mut name, "name")?;

    let mut size = [0u8; SIZE_FIELD_SIZE];
    read_header_field(reader, &mut size, "size")?;

    RequestHeader::new(operation, header_name(name)?, u64::from_be_bytes(size))
}

/// Write a request header to a stream
pub fn write_header<W: Write>(writer: &mut W, header: &RequestHeader) -> Result<()> {
    writer.write_all(&encode_header(header))?;
    writer.flush()?;
    Ok(())
}

fn read_header_field<R: Read>(reader: &mut R, buf: &mut [u8], field: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            FtpError::MalformedHeader(format!("stream ended before {} field", field))
        }
        _ => FtpError::Io(e),
    })
}

fn header_name(raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw)
        .map_err(|_| FtpError::MalformedHeader("name is not valid UTF-8".to_string()))
}

// =============================================================================
// Status Frames
// =============================================================================

/// Encode a status frame
pub fn encode_status(frame: &StatusFrame) -> Bytes {
    let mut buf = BytesMut::with_capacity(1);
    buf.put_u8(frame.status as u8);

    if frame.status == Status::Error {
        let message = truncate_utf8(frame.message.as_deref().unwrap_or(""), MAX_NAME_LEN);
        put_string(&mut buf, message);
    }

    buf.freeze()
}

/// Write a status frame to a stream
pub fn write_status<W: Write>(writer: &mut W, frame: &StatusFrame) -> Result<()> {
    writer.write_all(&encode_status(frame))?;
    writer.flush()?;
    Ok(())
}

/// Read a status frame from a stream
pub fn read_status<R: Read>(reader: &mut R) -> Result<StatusFrame> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            FtpError::Protocol("connection closed before response status".to_string())
        }
        _ => FtpError::Io(e),
    })?;

    let status = Status::from_byte(byte[0])?;
    let message = match status {
        Status::Error => Some(read_response_string(reader)?),
        Status::Ok | Status::NotFound => None,
    };

    Ok(StatusFrame { status, message })
}

// =============================================================================
// Size Field
// =============================================================================

/// Write the size that announces a payload
pub fn write_size<W: Write>(writer: &mut W, size: u64) -> Result<()> {
    let size = i64::try_from(size)
        .map_err(|_| FtpError::Protocol(format!("payload too large: {} bytes", size)))?;
    writer.write_all(&size.to_be_bytes())?;
    Ok(())
}

/// Read the size that announces a payload
pub fn read_size<R: Read>(reader: &mut R) -> Result<u64> {
    let mut raw = [0u8; SIZE_FIELD_SIZE];
    read_response_field(reader, &mut raw, "size")?;

    let size = i64::from_be_bytes(raw);
    u64::try_from(size).map_err(|_| FtpError::Protocol(format!("negative payload size: {}", size)))
}

// =============================================================================
// Listing Encoding/Decoding
// =============================================================================

/// Encode a listing
///
/// Format: count (4) + count × (name_len (2) + name)
pub fn encode_listing(names: &[String]) -> Result<Bytes> {
    let count = i32::try_from(names.len())
        .map_err(|_| FtpError::Protocol(format!("too many names: {}", names.len())))?;

    let body: usize = names.iter().map(|n| 2 + n.len()).sum();
    let mut buf = BytesMut::with_capacity(4 + body);
    buf.put_i32(count);

    for name in names {
        if name.len() > MAX_NAME_LEN {
            return Err(FtpError::InvalidName(format!(
                "name is {} bytes (max {})",
                name.len(),
                MAX_NAME_LEN
            )));
        }
        put_string(&mut buf, name);
    }

    Ok(buf.freeze())
}

/// Write a listing to a stream
pub fn write_listing<W: Write>(writer: &mut W, names: &[String]) -> Result<()> {
    writer.write_all(&encode_listing(names)?)?;
    writer.flush()?;
    Ok(())
}

/// Read a listing from a stream
///
/// Reads the count, then exactly that many names.
pub fn read_listing<R: Read>(reader: &mut R) -> Result<Vec<String>> {
    let mut raw = [0u8; 4];
    read_response_field(reader, &mut raw, "count")?;

    let count = i32::from_be_bytes(raw);
    let count = usize::try_from(count)
        .map_err(|_| FtpError::Protocol(format!("negative listing count: {}", count)))?;

    // Count comes off the wire; don't trust it for preallocation
    let mut names = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        names.push(read_response_string(reader)?);
    }

    Ok(names)
}

// =============================================================================
// String helpers
// =============================================================================

fn put_string(buf: &mut BytesMut, s: &str) {
    buf.put_u16(s.len() as u16);
    buf.put_slice(s.as_bytes());
}

fn read_response_string<R: Read>(reader: &mut R) -> Result<String> {
    let mut len = [0u8; 2];
    read_response_field(reader, &mut len, "string length")?;

    let mut raw = vec![0u8; u16::from_be_bytes(len) as usize];
    read_response_field(reader, &mut raw, "string")?;

    String::from_utf8(raw).map_err(|_| FtpError::Protocol("string is not valid UTF-8".to_string()))
}

fn read_response_field<R: Read>(reader: &mut R, buf: &mut [u8], field: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            FtpError::Protocol(format!("connection closed before {} field", field))
        }
        _ => FtpError::Io(e),
    })
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a character
fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
