//! minftp Client
//!
//! Interactive prompt for fetching, storing and listing files on a server.

use std::io::{self, BufRead, Write};

use clap::Parser;
use minftp::command::{parse_command, Command};
use minftp::config::parse_port;
use minftp::{Client, ClientConfig, FtpError};
use tracing_subscriber::{fmt, EnvFilter};

/// minftp client
#[derive(Parser, Debug)]
#[command(name = "minftp-client")]
#[command(about = "Interactive client for a minftp server")]
#[command(version)]
struct Args {
    /// Server port (1-65535)
    #[arg(value_parser = port_arg)]
    port: u16,

    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Local directory for uploads and downloads
    #[arg(short, long, default_value = ".")]
    dir: String,

    /// Read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,
}

fn port_arg(value: &str) -> Result<u16, String> {
    parse_port(value).map_err(|e| e.to_string())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = Args::parse();

    let config = ClientConfig::builder()
        .server_addr(format!("{}:{}", args.host, args.port))
        .local_dir(&args.dir)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    let client = match Client::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to start client: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_prompt(&client) {
        eprintln!("Prompt failed: {}", e);
        std::process::exit(1);
    }
}

/// Read commands until `quit` or end of input
fn run_prompt(client: &Client) -> io::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("ftp> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => return Ok(()),
        };

        match parse_command(&line) {
            Command::Get(name) => match client.get(&name) {
                Ok(size) => println!("Retrieved {} from server. ({} bytes)", name, size),
                Err(e) => report(&e),
            },
            Command::Put(name) => match client.put(&name) {
                Ok(size) => println!("Uploaded {} to server. ({} bytes)", name, size),
                Err(e) => report(&e),
            },
            Command::List => match client.list() {
                Ok(names) => {
                    for (i, name) in names.iter().enumerate() {
                        println!("  {}. {}", i + 1, name);
                    }
                }
                Err(e) => report(&e),
            },
            Command::Quit => return Ok(()),
            Command::Invalid(reason) => eprintln!("{}", reason),
        }
    }
}

fn report(err: &FtpError) {
    match err {
        FtpError::FileNotFound(name) => eprintln!("File {} was not found!", name),
        other => eprintln!("{}", other),
    }
}
