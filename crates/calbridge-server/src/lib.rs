//! Daemon: request dispatcher, reconciliation, Unix-socket server.
//!
//! This crate provides the calbridge server daemon that handles:
//! - Unix socket IPC speaking a JSON-line request protocol
//! - Request validation and method-to-operation dispatch
//! - Store reconciliation after confirmed provider mutations
//!
//! # Example
//!
//! ```rust,no_run
//! use calbridge_server::{ServerConfig, SocketServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let server = SocketServer::new(config).await?;
//!
//!     // Handle connections...
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod handler;
mod reconcile;
mod request;
mod signals;
mod socket;
mod validate;

pub use config::{
    DEFAULT_GOOGLE_CALENDARS_URL, DEFAULT_OFFICE365_EVENTS_URL, ServerConfig, default_socket_path,
};
pub use error::{ServerError, ServerResult};
pub use handler::Dispatcher;
pub use reconcile::{Ownership, apply_create, apply_delete, apply_update};
pub use request::{ApiResponse, MutationRequest};
pub use signals::{ShutdownSignal, SignalHandler};
pub use socket::{Connection, MAX_REQUEST_SIZE, SocketServer};
pub use validate::{check_create, check_delete, check_update};
