//! Network Module
//!
//! TCP server and client.
//!
//! ## Architecture
//! - Single acceptor thread
//! - Worker thread pool for connections
//! - One request per connection, dispatched on its operation

mod server;
mod connection;
mod client;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
pub use client::Client;
