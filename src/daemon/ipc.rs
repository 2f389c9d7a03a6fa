//! IPC server for the FitBlock daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for user actions
//! - Dispatch of requests to the [`SessionController`]

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use crate::interceptor::InputInterceptor;
use crate::notification::Notifier;
use crate::presenter::Surface;
use crate::session::SessionController;
use crate::shortcuts::ShortcutGuard;
use crate::types::{IpcRequest, IpcResponse, ResponseData};

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Client closed the connection without sending anything
    #[error("Connection closed by client")]
    ConnectionClosed,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

impl IpcError {
    /// Returns true if the server can keep serving other clients.
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// Returns a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::ReadError(_) | Self::ConnectionClosed => "Retry the command",
            Self::Timeout => "Send the whole request right after connecting",
            Self::RequestTooLarge => "Requests are small JSON documents; check the client",
        }
    }
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        // A previous daemon that died leaves its socket behind
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Hands the socket and its directory to `uid`, so the unprivileged
    /// CLI can connect to an elevated daemon.
    ///
    /// # Errors
    ///
    /// Returns an error if ownership cannot be changed.
    pub fn set_owner(&self, uid: u32) -> Result<()> {
        if let Some(parent) = self.socket_path.parent() {
            std::os::unix::fs::chown(parent, Some(uid), None)
                .with_context(|| format!("Failed to hand {:?} to uid {}", parent, uid))?;
        }
        std::os::unix::fs::chown(&self.socket_path, Some(uid), None)
            .with_context(|| format!("Failed to hand {:?} to uid {}", self.socket_path, uid))?;
        Ok(())
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            return Err(IpcError::ConnectionClosed.into());
        }
        if n == MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the session controller.
///
/// `start` and `quit` are forwarded to the daemon loop over channels, since
/// a session outlives the request that asked for it. Everything else runs
/// against the controller directly.
pub struct RequestHandler<G, I, N, S>
where
    G: ShortcutGuard,
    I: InputInterceptor,
    N: Notifier,
    S: Surface,
{
    controller: Rc<SessionController<G, I, N, S>>,
    start_tx: mpsc::Sender<()>,
    quit_tx: mpsc::Sender<()>,
}

impl<G, I, N, S> RequestHandler<G, I, N, S>
where
    G: ShortcutGuard,
    I: InputInterceptor,
    N: Notifier,
    S: Surface,
{
    /// Creates a new request handler.
    pub fn new(
        controller: Rc<SessionController<G, I, N, S>>,
        start_tx: mpsc::Sender<()>,
        quit_tx: mpsc::Sender<()>,
    ) -> Self {
        Self {
            controller,
            start_tx,
            quit_tx,
        }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        tracing::debug!("IPC request: {:?}", request);
        match request {
            IpcRequest::Start => self.handle_start(),
            IpcRequest::Pause => self.handle_pause(),
            IpcRequest::Resume => self.handle_resume(),
            IpcRequest::Reset => self.handle_reset(),
            IpcRequest::Status => self.handle_status(),
            IpcRequest::Quit => self.handle_quit().await,
        }
    }

    fn snapshot(&self) -> Option<ResponseData> {
        Some(ResponseData::from_snapshot(&self.controller.status()))
    }

    fn handle_start(&self) -> IpcResponse {
        if let Err(e) = self.controller.can_start() {
            return IpcResponse::error(format!("{} ({})", e, e.suggestion()));
        }

        match self.start_tx.try_send(()) {
            Ok(()) => IpcResponse::success("Blocking session starting", self.snapshot()),
            Err(mpsc::error::TrySendError::Full(())) => {
                IpcResponse::success("A session start is already queued", self.snapshot())
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                IpcResponse::error("This daemon does not accept new sessions")
            }
        }
    }

    fn handle_pause(&self) -> IpcResponse {
        match self.controller.pause() {
            Ok(true) => IpcResponse::success("Sessions paused", self.snapshot()),
            Ok(false) => IpcResponse::success("Sessions were already paused", self.snapshot()),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    fn handle_resume(&self) -> IpcResponse {
        match self.controller.resume() {
            Ok(true) => IpcResponse::success("Sessions resumed", self.snapshot()),
            Ok(false) => IpcResponse::success("Sessions were not paused", self.snapshot()),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    fn handle_reset(&self) -> IpcResponse {
        match self.controller.reset() {
            Ok(()) => IpcResponse::success("Statistics reset", self.snapshot()),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    fn handle_status(&self) -> IpcResponse {
        IpcResponse::success("", self.snapshot())
    }

    async fn handle_quit(&self) -> IpcResponse {
        if self.quit_tx.send(()).await.is_err() {
            return IpcResponse::error("Daemon is already shutting down");
        }
        IpcResponse::success("Daemon shutting down", self.snapshot())
    }

    /// Serves one client connection: reads a request and writes the response.
    pub async fn serve(&self, mut stream: UnixStream) {
        let response = match IpcServer::receive_request(&mut stream).await {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                tracing::debug!("Rejected IPC request: {:#}", e);
                IpcResponse::error(format!("Invalid request: {}", e))
            }
        };

        if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
            tracing::debug!("Failed to answer IPC client: {:#}", e);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
