//! Request definitions
//!
//! Represents the header a client sends at the start of every connection.

use crate::error::{FtpError, Result};

/// Longest name the 16-bit length prefix can carry
pub const MAX_NAME_LEN: usize = u16::MAX as usize;

/// Operations a client can request
///
/// The wire codes live here and only here; dispatch everywhere else matches
/// on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Fetch a stored file
    Get,

    /// Store a file
    Put,

    /// List stored files
    List,
}

impl Operation {
    /// All operations, in wire-code order
    pub const ALL: [Operation; 3] = [Operation::Get, Operation::Put, Operation::List];

    /// Wire code of this operation
    pub fn code(self) -> i32 {
        match self {
            Operation::Get => 1,
            Operation::Put => 2,
            Operation::List => 3,
        }
    }

    /// Map a wire code back to an operation.
    /// Unknown codes are rejected, never mapped to a default.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            1 => Ok(Operation::Get),
            2 => Ok(Operation::Put),
            3 => Ok(Operation::List),
            _ => Err(FtpError::MalformedHeader(format!("unknown opcode: {}", code))),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Get => "GET",
            Operation::Put => "PUT",
            Operation::List => "LS",
        };
        f.write_str(name)
    }
}

/// Fixed-shape request header: operation, target name, declared size
///
/// For `List` the name is empty and the size zero; the shape is the same
/// for every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    operation: Operation,
    name: String,
    declared_size: u64,
}

impl RequestHeader {
    /// Build a header, rejecting names the length prefix cannot carry
    pub fn new(operation: Operation, name: impl Into<String>, declared_size: u64) -> Result<Self> {
        let name = name.into();
        if name.len() > MAX_NAME_LEN {
            return Err(FtpError::InvalidName(format!(
                "name is {} bytes (max {})",
                name.len(),
                MAX_NAME_LEN
            )));
        }
        Ok(Self {
            operation,
            name,
            declared_size,
        })
    }

    /// Header for fetching `name`
    pub fn get(name: impl Into<String>) -> Result<Self> {
        Self::new(Operation::Get, name, 0)
    }

    /// Header for storing `size` bytes as `name`
    pub fn put(name: impl Into<String>, size: u64) -> Result<Self> {
        Self::new(Operation::Put, name, size)
    }

    /// Header for listing stored files
    pub fn list() -> Self {
        Self {
            operation: Operation::List,
            name: String::new(),
            declared_size: 0,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }
}
