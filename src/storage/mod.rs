//! Storage Module
//!
//! Where the server keeps files, and where the client reads uploads from and
//! writes downloads to.
//!
//! ## Responsibilities
//! - Resolve names under a storage root without escaping it
//! - Open files for streaming reads, reporting their exact size
//! - Stage writes so an incomplete transfer never replaces a file
//! - List the regular files directly under the root
//!
//! ## Layout
//! ```text
//! {root}/
//!   ├── a.txt
//!   ├── b.txt
//!   ├── dir/nested.bin                 (reachable by name, not listed)
//!   └── .minftp-c.txt.7.part           (upload in progress, not listed)
//! ```

use std::io::{Read, Write};

use crate::error::Result;

mod name;
mod fs;

pub use name::validate_name;
pub use fs::{FsPendingWrite, FsStorage};

/// Backend the protocol reads files from and writes files into
///
/// Any backend honoring this contract works: names are relative to the
/// backend's root, writes only become visible on [`PendingWrite::commit`].
pub trait Storage: Send + Sync {
    /// Streaming reader over a stored file
    type Reader: Read;

    /// Write handle for an upload in progress
    type Writer: PendingWrite;

    /// Whether `name` refers to a stored regular file
    fn exists(&self, name: &str) -> Result<bool>;

    /// Open `name` for reading, returning the reader and the exact size
    fn open_for_read(&self, name: &str) -> Result<(Self::Reader, u64)>;

    /// Start writing `name`, creating missing parent directories
    fn create_for_write(&self, name: &str) -> Result<Self::Writer>;

    /// Names of the regular files directly under the root, unsorted
    fn list_regular_files(&self) -> Result<Vec<String>>;
}

/// An upload that is not yet visible under its name
///
/// Dropping it without calling `commit` discards the written bytes.
pub trait PendingWrite: Write {
    /// Make the written bytes visible under the destination name,
    /// replacing any previous content
    fn commit(self) -> Result<()>;
}
