//! Response definitions
//!
//! Every response opens with a one-byte status so the client can tell
//! "file absent" apart from "connection dropped".

use crate::error::{FtpError, Result};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Error = 0x02,
}

impl Status {
    /// Map a status byte back to a status
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(Status::Ok),
            0x01 => Ok(Status::NotFound),
            0x02 => Ok(Status::Error),
            _ => Err(FtpError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                byte
            ))),
        }
    }
}

/// A decoded status frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFrame {
    /// Status code
    pub status: Status,

    /// Message carried by an `Error` status
    pub message: Option<String>,
}

impl StatusFrame {
    /// Create an OK frame
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            message: None,
        }
    }

    /// Create a NOT_FOUND frame
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            message: None,
        }
    }

    /// Create an ERROR frame
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.to_string()),
        }
    }

    /// Turn a non-OK frame into the matching error for `name`
    pub fn into_result(self, name: &str) -> Result<()> {
        match self.status {
            Status::Ok => Ok(()),
            Status::NotFound => Err(FtpError::FileNotFound(name.to_string())),
            Status::Error => Err(FtpError::Remote(self.message.unwrap_or_default())),
        }
    }
}
