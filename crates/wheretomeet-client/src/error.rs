//! Error type shared by every CLI command.

use std::fmt;

use wheretomeet_protocol::ErrorResponse;

/// Result alias for CLI operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// What can go wrong between the CLI and the daemon.
///
/// A plain enum over message strings: the binary prints the error and
/// exits, so nothing downstream matches on structured payloads.
#[derive(Debug)]
pub enum ClientError {
    /// Bad or missing configuration.
    Config(String),
    /// Underlying I/O failure.
    Io(std::io::Error),
    /// The daemon socket could not be reached.
    Connection(String),
    /// A frame could not be encoded or decoded.
    Protocol(String),
    /// An exchange phase exceeded the client timeout.
    Timeout(String),
    /// The daemon answered with an error response.
    Server(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "bad configuration: {}", msg),
            Self::Io(err) => write!(f, "i/o failure: {}", err),
            Self::Connection(msg) => write!(f, "connection failed: {}", msg),
            Self::Protocol(msg) => write!(f, "protocol violation: {}", msg),
            Self::Timeout(msg) => write!(f, "timed out while {}", msg),
            Self::Server(msg) => write!(f, "server rejected request: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ErrorResponse> for ClientError {
    fn from(err: ErrorResponse) -> Self {
        Self::Server(format!("{:?}: {}", err.code, err.message))
    }
}
