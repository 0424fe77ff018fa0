//! # minftp
//!
//! A minimal remote file-transfer protocol with:
//! - Fixed-shape request headers (operation, name, declared size)
//! - Exact-length payload streaming through bounded buffers
//! - Status-framed responses (OK / NOT_FOUND / ERROR)
//! - Staged uploads that only become visible once complete
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐                 ┌──────────────────────────────┐
//! │       Client         │   one TCP conn  │          TCP Server          │
//! │  get / put / ls      ├────────────────►│   acceptor → worker pool     │
//! └──────────┬───────────┘   per request   └──────────────┬───────────────┘
//!            │                                            │
//!            ▼                                            ▼
//!   ┌─────────────────┐        ┌──────────────┐    ┌─────────────┐
//!   │ Local Storage   │◄──────►│   Protocol   │◄──►│ Connection  │
//!   │ (FsStorage)     │        │ header/status│    │  dispatch   │
//!   └─────────────────┘        │   listing    │    └──────┬──────┘
//!                              └──────────────┘           │
//!                              ┌──────────────┐           ▼
//!                              │   Transfer   │    ┌─────────────┐
//!                              │ (copy_exact) │◄──►│   Storage   │
//!                              └──────────────┘    │   (root)    │
//!                                                  └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod transfer;
pub mod storage;
pub mod network;
pub mod command;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FtpError, Result};
pub use config::{ClientConfig, Config};
pub use network::{Client, Server};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of minftp
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
