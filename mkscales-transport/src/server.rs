//! TCP listener for the emulated device

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use mkscales_core::{constants::DEFAULT_READ_LIMIT, Emulator};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::{connection::ConnectionHandler, error::*};

/// Accepts connections and serves one request on each
///
/// Every connection runs on its own task. There is no connection limit;
/// the number of concurrent tasks is bounded only by the OS.
pub struct TcpServer {
    listener: TcpListener,
    emulator: Arc<Emulator>,
    read_limit: usize,
}

impl TcpServer {
    /// Bind to `addr`
    pub async fn bind(addr: &str, emulator: Arc<Emulator>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", addr, e)))?;

        Ok(Self {
            listener,
            emulator,
            read_limit: DEFAULT_READ_LIMIT,
        })
    }

    /// Set the maximum request size taken in the single read
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = limit;
        self
    }

    /// Bound address (useful after binding port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve forever
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves
    ///
    /// Connections already accepted keep running on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!(address = %addr, "Emulator listening");

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(address = %addr, "Shutting down listener");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(peer = %peer, "New connection");

                        if let Err(e) = stream.set_nodelay(true) {
                            debug!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
                        }

                        let handler = ConnectionHandler::new(stream, Arc::clone(&self.emulator))
                            .with_peer(peer.to_string())
                            .with_read_limit(self.read_limit);

                        // Failures are logged by the handler
                        tokio::spawn(async move {
                            let _ = handler.run().await;
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to accept connection");
                    }
                },
            }
        }
    }
}
