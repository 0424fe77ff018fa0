//! minftp Server Binary
//!
//! Serves files from a storage root over TCP.

use clap::Parser;
use minftp::config::parse_port;
use minftp::{Config, Server};
use tracing_subscriber::{fmt, EnvFilter};

/// minftp Server
#[derive(Parser, Debug)]
#[command(name = "minftp-server")]
#[command(about = "Minimal file-transfer server")]
#[command(version)]
struct Args {
    /// Port to listen on (1-65535)
    #[arg(value_parser = port_arg)]
    port: u16,

    /// Interface to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Storage root directory
    #[arg(short, long, default_value = "./server")]
    root: String,

    /// Worker threads (1 = one connection at a time)
    #[arg(short, long, default_value = "1")]
    workers: usize,

    /// Transfer buffer size in KiB
    #[arg(long, default_value = "64")]
    chunk_kb: usize,

    /// Read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    write_timeout_ms: u64,
}

fn port_arg(value: &str) -> Result<u16, String> {
    parse_port(value).map_err(|e| e.to_string())
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,minftp=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("minftp Server v{}", minftp::VERSION);
    tracing::info!("Storage root: {}", args.root);

    // Build config from args
    let config = Config::builder()
        .storage_root(&args.root)
        .listen_addr(format!("{}:{}", args.host, args.port))
        .workers(args.workers)
        .chunk_size(args.chunk_kb * 1024)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    let server = match Server::open(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
