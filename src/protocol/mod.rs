//! Protocol Module
//!
//! Defines the wire protocol shared by client and server.
//!
//! ## Protocol Format (Big-Endian)
//!
//! ### Request Header
//! ```text
//! ┌────────────┬──────────────────┬───────────┐
//! │ Opcode (4) │ NameLen(2) + Name│  Size (8) │
//! └────────────┴──────────────────┴───────────┘
//! ```
//!
//! ### Operations
//! - 1: GET  - name = file to fetch, size unused (0)
//! - 2: PUT  - name = destination, size = payload bytes that follow
//! - 3: LS   - name unused (""), size unused (0)
//!
//! ### Responses
//! - GET: Status, then (OK) size (8) + raw bytes
//! - PUT: Status acknowledgement after the payload was committed
//! - LS:  Status, then (OK) count (4) + names
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND
//! - 0x02: ERROR (followed by a message string)

mod request;
mod response;
mod codec;

pub use request::{Operation, RequestHeader, MAX_NAME_LEN};
pub use response::{Status, StatusFrame};
pub use codec::{
    encode_header, decode_header, read_header, write_header,
    encode_status, read_status, write_status,
    read_size, write_size,
    encode_listing, read_listing, write_listing,
    MIN_HEADER_SIZE,
};
