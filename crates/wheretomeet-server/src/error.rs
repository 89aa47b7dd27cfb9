//! Error type for the daemon.

use std::io;
use thiserror::Error;

use crate::store::StoreError;

/// Result alias used throughout the server crate.
pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),

    #[error("protocol violation: {0}")]
    Protocol(#[from] wheretomeet_protocol::ProtocolError),

    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    /// Another live server already owns the socket file.
    #[error("socket {path} is already in use")]
    SocketInUse { path: String },

    /// The directory the socket should live in is missing.
    #[error("socket directory {path} does not exist")]
    SocketPathInvalid { path: String },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// A client asked the daemon to stop.
    #[error("shutdown requested")]
    Shutdown,
}

impl ServerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn socket_in_use(path: impl Into<String>) -> Self {
        Self::SocketInUse { path: path.into() }
    }

    pub fn socket_path_invalid(path: impl Into<String>) -> Self {
        Self::SocketPathInvalid { path: path.into() }
    }
}
