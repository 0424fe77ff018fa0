//! TCP Server
//!
//! Accepts connections and hands them to worker threads.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Sender};

use crate::config::Config;
use crate::error::{FtpError, Result};
use crate::storage::{FsStorage, Storage};

use super::Connection;

/// Pause after a failed `accept` before trying again
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// TCP server for minftp
///
/// One acceptor loop feeds a fixed pool of `config.workers` threads through a
/// bounded channel. Each connection carries exactly one request and is closed
/// once that request has been serviced. With a single worker, connections are
/// serviced strictly one after another.
pub struct Server<S: Storage> {
    config: Config,
    storage: Arc<S>,
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
}

impl Server<FsStorage> {
    /// Open the storage root from `config` and bind the listener
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let storage = FsStorage::open(&config.storage_root)?;
        storage.remove_stale_staging()?;
        Self::with_storage(config, Arc::new(storage))
    }
}

impl<S: Storage> Server<S> {
    /// Bind the listener for a server over an existing storage backend
    pub fn with_storage(config: Config, storage: Arc<S>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            FtpError::Config(format!("cannot listen on {}: {}", config.listen_addr, e))
        })?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            config,
            storage,
            listener,
            local_addr,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A handle that stops `run` from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            addr: self.local_addr,
        }
    }

    /// Start the server (blocking until shut down)
    ///
    /// A failed request is logged and never stops the accept loop.
    pub fn run(&self) -> Result<()> {
        tracing::info!(
            "Listening on {} with {} worker(s)",
            self.local_addr,
            self.config.workers
        );

        let (tx, rx) = channel::bounded::<TcpStream>(self.config.workers);

        thread::scope(|scope| {
            for id in 0..self.config.workers {
                let rx = rx.clone();
                scope.spawn(move || {
                    tracing::trace!("Worker {} started", id);
                    for stream in rx.iter() {
                        self.serve(stream);
                    }
                    tracing::trace!("Worker {} stopped", id);
                });
            }

            self.accept_loop(self.listener.incoming(), &tx);

            // Workers drain what is queued, then exit
            drop(tx);
        });

        tracing::info!("Server on {} stopped", self.local_addr);
        Ok(())
    }

    /// Hand accepted streams to the workers until shutdown or until the
    /// workers are gone
    fn accept_loop<I>(&self, incoming: I, tx: &Sender<TcpStream>)
    where
        I: IntoIterator<Item = io::Result<TcpStream>>,
    {
        for stream in incoming {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }

            match stream {
                Ok(stream) => {
                    if tx.send(stream).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Accept failed: {}", e);
                    // Persistent failures (e.g. out of descriptors) would spin
                    thread::sleep(ACCEPT_BACKOFF);
                }
            }
        }
    }

    /// Service one connection, logging instead of propagating failures
    fn serve(&self, stream: TcpStream) {
        let mut connection =
            match Connection::new(stream, Arc::clone(&self.storage), self.config.chunk_size) {
                Ok(connection) => connection,
                Err(e) => {
                    tracing::warn!("Failed to set up connection: {}", e);
                    return;
                }
            };

        if let Err(e) =
            connection.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)
        {
            tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
            return;
        }

        if let Err(e) = connection.handle() {
            if e.is_disconnect() {
                tracing::debug!("Client {} disconnected: {}", connection.peer_addr(), e);
            }
        }
    }
}

/// Stops a running [`Server`]
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    /// Signal the server to shutdown gracefully
    ///
    /// The accept loop is blocked in `accept`, so a throwaway connection
    /// wakes it up to notice the flag.
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);

        let mut addr = self.addr;
        if addr.ip().is_unspecified() {
            addr.set_ip(match addr {
                SocketAddr::V4(_) => std::net::Ipv4Addr::LOCALHOST.into(),
                SocketAddr::V6(_) => std::net::Ipv6Addr::LOCALHOST.into(),
            });
        }
        if let Err(e) = TcpStream::connect(addr) {
            tracing::debug!("Wake-up connection to {} failed: {}", addr, e);
        }
    }
}
