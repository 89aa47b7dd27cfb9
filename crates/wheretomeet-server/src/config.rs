//! Daemon configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Origin baked into shareable meeting links when none is configured.
pub const DEFAULT_BASE_ORIGIN: &str = "http://localhost:3000";

const SOCKET_FILE_NAME: &str = "wheretomeet.sock";
const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_CONNECTIONS: usize = 100;

/// Settings for the daemon: where it listens and how meeting links are built.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Unix socket the daemon listens on.
    pub socket_path: PathBuf,

    /// Per-operation I/O deadline on a connection.
    pub connection_timeout: Duration,

    /// Cap on concurrently served connections.
    pub max_connections: usize,

    /// Remove a dead socket file left behind by a previous run.
    pub cleanup_stale_socket: bool,

    /// Scheme + host (+ port) that meeting links are built under.
    pub base_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(default_socket_path())
    }
}

impl ServerConfig {
    /// Configuration listening at `socket_path`, everything else default.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            cleanup_stale_socket: true,
            base_origin: DEFAULT_BASE_ORIGIN.to_string(),
        }
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_cleanup_stale_socket(mut self, cleanup: bool) -> Self {
        self.cleanup_stale_socket = cleanup;
        self
    }

    /// Overrides the origin used for shareable meeting links.
    pub fn with_base_origin(mut self, base_origin: impl Into<String>) -> Self {
        self.base_origin = base_origin.into();
        self
    }
}

/// Default socket location: `$XDG_RUNTIME_DIR` when set, the system temp
/// directory otherwise.
pub fn default_socket_path() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(SOCKET_FILE_NAME)
}
