//! Daemon: meeting store, venue search, scheduling.
//!
//! This crate provides the wheretomeet server daemon that handles:
//! - Unix socket IPC for client communication
//! - The meeting lifecycle backed by a pluggable store
//! - Venue search and calendar scheduling via the provider adapters
//!
//! # Example
//!
//! ```rust,no_run
//! use wheretomeet_server::{ServerConfig, SocketServer};
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
mod socket;
mod store;

pub use config::{DEFAULT_BASE_ORIGIN, ServerConfig, default_socket_path};
pub use error::{ServerError, ServerResult};
pub use handler::{
    RequestHandler, ServerState, SharedState, make_connection_handler, new_shared_state,
};
pub use socket::{Connection, SocketServer};
pub use store::{MeetingStore, MemoryStore, StoreError, StoreResult, StoreStats};
