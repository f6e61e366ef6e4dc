//! Unix socket listener for IPC.
//!
//! This module provides an async Unix socket server speaking a line
//! protocol: one JSON [`MutationRequest`] per line in, one JSON
//! [`ApiResponse`] per line out.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::request::{ApiResponse, MutationRequest};

/// Upper bound on one request line.
pub const MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Unix socket server for handling client connections.
pub struct SocketServer {
    /// Server configuration.
    config: ServerConfig,
    /// Unix socket listener.
    listener: UnixListener,
    /// Semaphore for limiting concurrent connections.
    connection_semaphore: Arc<Semaphore>,
}

impl SocketServer {
    /// Creates a new socket server with the given configuration.
    ///
    /// This will bind to the socket path specified in the configuration.
    /// If `cleanup_stale_socket` is true, it will attempt to remove any
    /// existing socket file before binding.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let socket_path = &config.socket_path;

        if let Some(parent) = socket_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            return Err(ServerError::socket_path_invalid(
                parent.to_string_lossy().to_string(),
            ));
        }

        // Clean up stale socket if configured
        if config.cleanup_stale_socket && socket_path.exists() {
            // Try to connect to see if it's a live socket
            match tokio::net::UnixStream::connect(socket_path).await {
                Ok(_) => {
                    // Socket is live, another server is running
                    return Err(ServerError::socket_in_use(
                        socket_path.to_string_lossy().to_string(),
                    ));
                }
                Err(_) => {
                    info!(
                        path = %socket_path.display(),
                        "Removing stale socket"
                    );
                    std::fs::remove_file(socket_path)?;
                }
            }
        } else if socket_path.exists() {
            return Err(ServerError::socket_in_use(
                socket_path.to_string_lossy().to_string(),
            ));
        }

        let listener = UnixListener::bind(socket_path)?;
        info!(
            path = %socket_path.display(),
            "Socket server listening"
        );

        let connection_semaphore = Arc::new(Semaphore::new(config.max_connections));

        Ok(Self {
            config,
            listener,
            connection_semaphore,
        })
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    /// Accepts a single connection.
    pub async fn accept(&self) -> ServerResult<Connection> {
        let permit = self.connection_semaphore.clone().acquire_owned().await;
        let permit = permit.expect("semaphore should not be closed");

        let (stream, _addr) = self.listener.accept().await?;
        debug!("Accepted new connection");

        Ok(Connection {
            reader: BufReader::new(stream),
            timeout: self.config.connection_timeout,
            _permit: permit,
        })
    }

    /// Runs the server accept loop, calling the handler for each connection.
    ///
    /// This method runs indefinitely until the server is stopped.
    pub async fn run<F, Fut>(&self, handler: F) -> ServerResult<()>
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        loop {
            match self.accept().await {
                Ok(connection) => {
                    let fut = handler(connection);
                    tokio::spawn(fut);
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    // Continue accepting despite errors
                }
            }
        }
    }

    /// Runs the server accept loop with a shutdown signal.
    ///
    /// The server will stop when the shutdown future completes.
    pub async fn run_until_shutdown<F, Fut, S>(&self, handler: F, shutdown: S) -> ServerResult<()>
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
        S: std::future::Future<Output = ()> + Send,
    {
        tokio::select! {
            result = self.run(handler) => result,
            _ = shutdown => {
                info!("Shutdown signal received");
                Ok(())
            }
        }
    }
}

impl Drop for SocketServer {
    fn drop(&mut self) {
        // Clean up the socket file
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!(
                    path = %self.config.socket_path.display(),
                    error = %e,
                    "Failed to remove socket file"
                );
            } else {
                debug!(
                    path = %self.config.socket_path.display(),
                    "Removed socket file"
                );
            }
        }
    }
}

/// A client connection to the server.
pub struct Connection {
    reader: BufReader<UnixStream>,
    timeout: std::time::Duration,
    _permit: tokio::sync::OwnedSemaphorePermit,
}

impl Connection {
    /// Reads one request line from the connection.
    ///
    /// Returns `Ok(None)` if the connection was closed cleanly.
    pub async fn read_request(&mut self) -> ServerResult<Option<MutationRequest>> {
        let mut line = String::new();
        // Cap the read before buffering: a client streaming bytes without a
        // newline is cut off one byte past the limit instead of growing the
        // line without bound.
        let mut capped = (&mut self.reader).take(MAX_REQUEST_SIZE as u64 + 1);
        let read = tokio::time::timeout(self.timeout, capped.read_line(&mut line)).await;
        let n = match read {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(ServerError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "read request timed out",
                )));
            }
        };
        if n == 0 {
            return Ok(None);
        }
        if n > MAX_REQUEST_SIZE {
            return Err(ServerError::RequestTooLarge {
                size: n,
                max: MAX_REQUEST_SIZE,
            });
        }

        match serde_json::from_str(line.trim_end()) {
            Ok(request) => Ok(Some(request)),
            Err(e) => {
                warn!(error = %e, "Malformed request line");
                // A malformed line still maps onto the dispatcher's
                // empty-request failure path.
                Ok(Some(MutationRequest::default()))
            }
        }
    }

    /// Writes one response line to the connection.
    pub async fn write_response(&mut self, response: &ApiResponse) -> ServerResult<()> {
        let mut json = serde_json::to_vec(response).map_err(|e| {
            ServerError::config(format!("failed to serialize response: {e}"))
        })?;
        json.push(b'\n');

        let stream = self.reader.get_mut();
        match tokio::time::timeout(self.timeout, stream.write_all(&json)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(ServerError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "write response timed out",
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn socket_server_creates_socket_file() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("test.sock");

        let config = ServerConfig::new(&socket_path);
        let server = SocketServer::new(config).await.unwrap();

        assert!(socket_path.exists());
        drop(server);
        assert!(!socket_path.exists());
    }

    #[tokio::test]
    async fn socket_server_rejects_duplicate() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("test.sock");

        let config = ServerConfig::new(&socket_path).with_cleanup_stale_socket(false);
        let _server = SocketServer::new(config.clone()).await.unwrap();

        let result = SocketServer::new(config).await;
        assert!(matches!(result, Err(ServerError::SocketInUse { .. })));
    }

    #[tokio::test]
    async fn socket_server_cleans_stale_socket() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("test.sock");

        // A stale socket file, not a live listener
        std::fs::write(&socket_path, b"stale").unwrap();

        let config = ServerConfig::new(&socket_path).with_cleanup_stale_socket(true);
        let server = SocketServer::new(config).await.unwrap();

        assert!(socket_path.exists());
        drop(server);
    }

    #[tokio::test]
    async fn connection_roundtrip() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("test.sock");

        let config =
            ServerConfig::new(&socket_path).with_connection_timeout(Duration::from_secs(5));
        let server = SocketServer::new(config).await.unwrap();

        let socket_path_clone = socket_path.clone();
        let client_task = tokio::spawn(async move {
            let stream = tokio::net::UnixStream::connect(&socket_path_clone)
                .await
                .unwrap();
            let mut reader = tokio::io::BufReader::new(stream);

            let request = MutationRequest::with_query("DELETE", "id=ev-1");
            let mut line = serde_json::to_vec(&request).unwrap();
            line.push(b'\n');
            reader.get_mut().write_all(&line).await.unwrap();

            let mut response_line = String::new();
            reader.read_line(&mut response_line).await.unwrap();
            let response: ApiResponse = serde_json::from_str(response_line.trim()).unwrap();
            assert_eq!(response.status, 405);
        });

        let mut conn = server.accept().await.unwrap();
        let request = conn.read_request().await.unwrap().unwrap();
        assert_eq!(request.method, "DELETE");
        assert_eq!(request.query, "id=ev-1");

        let response = ApiResponse::from_error(
            &calbridge_providers::SyncError::method_not_allowed(),
        );
        conn.write_response(&response).await.unwrap();

        client_task.await.unwrap();
    }

    #[tokio::test]
    async fn oversized_request_line_is_rejected_at_the_cap() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("test.sock");

        let config =
            ServerConfig::new(&socket_path).with_connection_timeout(Duration::from_secs(5));
        let server = SocketServer::new(config).await.unwrap();

        let socket_path_clone = socket_path.clone();
        let writer = tokio::spawn(async move {
            let mut stream = tokio::net::UnixStream::connect(&socket_path_clone)
                .await
                .unwrap();
            // Far past the limit, and never a newline.
            let flood = vec![b'x'; MAX_REQUEST_SIZE + 1024];
            let _ = stream.write_all(&flood).await;
        });

        let mut conn = server.accept().await.unwrap();
        let err = conn.read_request().await.unwrap_err();
        match err {
            ServerError::RequestTooLarge { size, max } => {
                assert_eq!(max, MAX_REQUEST_SIZE);
                // Only one byte past the limit was ever buffered.
                assert_eq!(size, MAX_REQUEST_SIZE + 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        writer.abort();
    }

    #[tokio::test]
    async fn connection_handles_client_disconnect() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("test.sock");

        let config = ServerConfig::new(&socket_path);
        let server = SocketServer::new(config).await.unwrap();

        let socket_path_clone = socket_path.clone();
        let handle = tokio::spawn(async move {
            let _stream: tokio::net::UnixStream =
                tokio::net::UnixStream::connect(&socket_path_clone)
                    .await
                    .unwrap();
            // Stream dropped, connection closed
        });

        let mut conn = server.accept().await.unwrap();
        handle.await.unwrap();

        let result = conn.read_request().await.unwrap();
        assert!(result.is_none());
    }
}
