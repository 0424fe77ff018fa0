//! Storage name validation
//!
//! Names arrive off the wire and are joined onto the storage root, so they
//! must never be able to point outside it.

use std::path::{Component, Path};

use crate::error::{FtpError, Result};
use crate::protocol::MAX_NAME_LEN;

/// Prefix of in-progress staging files
pub(crate) const STAGING_PREFIX: &str = ".minftp-";

/// Suffix of in-progress staging files
pub(crate) const STAGING_SUFFIX: &str = ".part";

/// Validate a name relative to a storage root
///
/// Rejects:
/// - Empty names and names longer than the wire prefix allows
/// - Absolute paths and path prefixes (`/etc`, `C:\`)
/// - Parent directory traversal (`..`)
/// - Names with no file component (`.`)
/// - Names that collide with staging files
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FtpError::InvalidName("empty name".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(FtpError::InvalidName(format!(
            "name is {} bytes (max {})",
            name.len(),
            MAX_NAME_LEN
        )));
    }

    let path = Path::new(name);
    if path.is_absolute() {
        return Err(FtpError::InvalidName(format!("absolute path not allowed: {}", name)));
    }

    let mut last_normal = None;
    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(FtpError::InvalidName(format!(
                    "parent directory traversal not allowed: {}",
                    name
                )));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(FtpError::InvalidName(format!("absolute path not allowed: {}", name)));
            }
            Component::CurDir => {}
            Component::Normal(part) => last_normal = Some(part),
        }
    }

    let file_name = last_normal
        .ok_or_else(|| FtpError::InvalidName(format!("no file name in: {}", name)))?;

    if is_staging_name(&file_name.to_string_lossy()) {
        return Err(FtpError::InvalidName(format!("reserved name: {}", name)));
    }

    Ok(())
}

/// Whether a directory entry is an in-progress staging file
pub(crate) fn is_staging_name(file_name: &str) -> bool {
    file_name.starts_with(STAGING_PREFIX) && file_name.ends_with(STAGING_SUFFIX)
}
