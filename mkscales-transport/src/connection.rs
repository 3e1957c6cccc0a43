//! Per-connection request handling
//!
//! Each accepted connection serves exactly one request:
//!
//! ```text
//! Reading ──► Processing ──► Writing ──► Closed
//!    │             │            │
//!    └─────────────┴────────────┴──► Closed (no response)
//! ```
//!
//! A request must arrive in a single read; frames split across reads are
//! not reassembled.

use std::fmt;
use std::sync::Arc;

use bytes::BytesMut;
use mkscales_core::{constants::DEFAULT_READ_LIMIT, Emulator};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for the request bytes
    Reading,

    /// Validating and dispatching the request
    Processing,

    /// Sending the response
    Writing,

    /// Stream shut down
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reading => "reading",
            Self::Processing => "processing",
            Self::Writing => "writing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Drives one connection from first read to close
///
/// Generic over the stream so it can run on a `TcpStream` or an in-memory
/// duplex pipe.
pub struct ConnectionHandler<S> {
    stream: S,
    peer: String,
    emulator: Arc<Emulator>,
    read_limit: usize,
    state: ConnectionState,
    request: BytesMut,
    response: BytesMut,
    error: Option<Error>,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a handler in the `Reading` state
    pub fn new(stream: S, emulator: Arc<Emulator>) -> Self {
        Self {
            stream,
            peer: "unknown".to_string(),
            emulator,
            read_limit: DEFAULT_READ_LIMIT,
            state: ConnectionState::Reading,
            request: BytesMut::new(),
            response: BytesMut::new(),
            error: None,
        }
    }

    /// Set the peer label used in logs
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = peer.into();
        self
    }

    /// Set the maximum bytes taken by the single read
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = limit.max(1);
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Run to completion
    ///
    /// # Errors
    ///
    /// Returns the reason the connection closed without a response.
    pub async fn run(mut self) -> Result<()> {
        while self.state != ConnectionState::Closed {
            self.step().await;
        }

        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Perform one state transition and return the new state
    pub async fn step(&mut self) -> ConnectionState {
        match self.state {
            ConnectionState::Reading => self.read_request().await,
            ConnectionState::Processing => self.process_request().await,
            ConnectionState::Writing => self.write_response().await,
            ConnectionState::Closed => {}
        }

        self.state
    }

    async fn read_request(&mut self) {
        self.request.resize(self.read_limit, 0);

        match self.stream.read(&mut self.request[..]).await {
            Ok(0) => {
                self.request.clear();
                self.close(Some(Error::ConnectionClosed)).await;
            }
            Ok(n) => {
                self.request.truncate(n);
                trace!(
                    peer = %self.peer,
                    len = n,
                    request = %hex::encode(&self.request),
                    "Received request"
                );
                self.state = ConnectionState::Processing;
            }
            Err(e) => {
                self.request.clear();
                self.close(Some(Error::Io(e))).await;
            }
        }
    }

    async fn process_request(&mut self) {
        match self.emulator.process(&self.request) {
            Ok(response) => {
                self.response = response;
                self.state = ConnectionState::Writing;
            }
            Err(e) => self.close(Some(Error::Core(e))).await,
        }
    }

    async fn write_response(&mut self) {
        trace!(
            peer = %self.peer,
            len = self.response.len(),
            response = %hex::encode(&self.response),
            "Sending response"
        );

        let result = match self.stream.write_all(&self.response).await {
            Ok(()) => self.stream.flush().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => self.close(None).await,
            Err(e) => self.close(Some(Error::Io(e))).await,
        }
    }

    async fn close(&mut self, error: Option<Error>) {
        match &error {
            Some(e) if e.is_rejected_request() => {
                warn!(peer = %self.peer, state = %self.state, error = %e, "Rejected request");
            }
            Some(e) => {
                debug!(peer = %self.peer, state = %self.state, error = %e, "Connection aborted");
            }
            None => debug!(peer = %self.peer, "Request served"),
        }

        // The peer may already be gone
        let _ = self.stream.shutdown().await;

        self.error = error;
        self.state = ConnectionState::Closed;
    }
}
