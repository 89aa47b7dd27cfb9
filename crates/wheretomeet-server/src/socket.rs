//! Unix domain socket listener.
//!
//! Connections exchange length-prefixed JSON envelopes. A semaphore caps
//! how many are served at once, and the socket file is removed again when
//! the listener is dropped.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};

use wheretomeet_protocol::{
    Envelope, PROTOCOL_VERSION, ProtocolError, Request, Response, decode_payload, encode_frame,
    read_length_prefix,
};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Listener that accepts framed client connections.
pub struct SocketServer {
    config: ServerConfig,
    listener: UnixListener,
    permits: Arc<Semaphore>,
}

impl SocketServer {
    /// Binds to the configured socket path.
    ///
    /// With `cleanup_stale_socket` set, a leftover socket file from a
    /// crashed server is probed and removed; a file that still accepts
    /// connections means another server owns it.
    pub async fn new(config: ServerConfig) -> ServerResult<Self> {
        let path = &config.socket_path;

        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            return Err(ServerError::socket_path_invalid(parent.to_string_lossy()));
        }

        if path.exists() {
            if !config.cleanup_stale_socket || is_live_socket(path).await {
                return Err(ServerError::socket_in_use(path.to_string_lossy()));
            }
            info!(path = %path.display(), "removing stale socket file");
            std::fs::remove_file(path)?;
        }

        let listener = UnixListener::bind(path)?;
        info!(path = %path.display(), "listening");

        let permits = Arc::new(Semaphore::new(config.max_connections));

        Ok(Self {
            config,
            listener,
            permits,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    /// Waits for a connection permit and accepts the next client.
    pub async fn accept(&self) -> ServerResult<Connection> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore should not be closed");

        let (stream, _addr) = self.listener.accept().await?;
        debug!("client connected");

        Ok(Connection {
            stream,
            timeout: self.config.connection_timeout,
            _permit: permit,
        })
    }

    /// Accepts connections forever, spawning the handler for each one.
    ///
    /// Accept errors are logged and the loop keeps going.
    pub async fn run<F, Fut>(&self, handler: F) -> ServerResult<()>
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        loop {
            match self.accept().await {
                Ok(conn) => {
                    tokio::spawn(handler(conn));
                }
                Err(e) => {
                    error!(error = %e, "accept failed");
                }
            }
        }
    }

    /// Like [`SocketServer::run`], but stops when `shutdown` completes.
    pub async fn run_until_shutdown<F, Fut, S>(&self, handler: F, shutdown: S) -> ServerResult<()>
    where
        F: Fn(Connection) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        S: Future<Output = ()> + Send,
    {
        tokio::select! {
            result = self.run(handler) => result,
            _ = shutdown => {
                info!("shutdown requested, closing listener");
                Ok(())
            }
        }
    }
}

impl Drop for SocketServer {
    fn drop(&mut self) {
        let path = &self.config.socket_path;
        if path.exists()
            && let Err(e) = std::fs::remove_file(path)
        {
            warn!(path = %path.display(), error = %e, "could not remove socket file");
        }
    }
}

/// Probes whether the socket file at `path` still has a server behind it.
async fn is_live_socket(path: &Path) -> bool {
    UnixStream::connect(path).await.is_ok()
}

/// One accepted client connection, held until the exchange finishes.
pub struct Connection {
    stream: UnixStream,
    timeout: Duration,
    _permit: OwnedSemaphorePermit,
}

impl Connection {
    /// Reads the next request frame, or `None` on a clean disconnect.
    pub async fn read_request(&mut self) -> ServerResult<Option<Envelope<Request>>> {
        let mut prefix = [0u8; 4];
        match timed(self.timeout, "read request length", self.stream.read_exact(&mut prefix)).await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Ok(Err(e)) => return Err(e.into()),
            Err(e) => return Err(e),
        }

        let len = read_length_prefix(prefix)?;
        let mut payload = vec![0u8; len];
        timed(self.timeout, "read request payload", self.stream.read_exact(&mut payload)).await??;

        let envelope: Envelope<Request> = decode_payload(&payload)?;
        if !envelope.is_compatible() {
            warn!(
                client_version = %envelope.protocol_version,
                server_version = %PROTOCOL_VERSION,
                "protocol version mismatch, answering anyway"
            );
        }

        Ok(Some(envelope))
    }

    /// Frames and writes a response envelope.
    pub async fn write_response(&mut self, envelope: &Envelope<Response>) -> ServerResult<()> {
        let frame = encode_frame(envelope)?;
        timed(self.timeout, "write response", self.stream.write_all(&frame)).await??;
        Ok(())
    }

    /// Sends a response correlated to the given request id.
    pub async fn respond(
        &mut self,
        request_id: impl Into<String>,
        response: Response,
    ) -> ServerResult<()> {
        self.write_response(&Envelope::response(request_id, response))
            .await
    }
}

/// Runs `fut` under the connection deadline, mapping elapsed time onto a
/// protocol timeout error naming the operation.
async fn timed<T>(
    timeout: Duration,
    operation: &str,
    fut: impl Future<Output = T>,
) -> ServerResult<T> {
    tokio::time::timeout(timeout, fut).await.map_err(|_| {
        ServerError::Protocol(ProtocolError::Timeout {
            operation: operation.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn bind(config: ServerConfig) -> SocketServer {
        SocketServer::new(config).await.unwrap()
    }

    #[tokio::test]
    async fn creates_and_removes_socket_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sock");

        let server = bind(ServerConfig::new(&path)).await;
        assert!(path.exists());

        drop(server);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn refuses_live_socket() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sock");

        let _first = bind(ServerConfig::new(&path)).await;
        let second = SocketServer::new(ServerConfig::new(&path)).await;
        assert!(matches!(second, Err(ServerError::SocketInUse { .. })));
    }

    #[tokio::test]
    async fn refuses_existing_file_without_cleanup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sock");
        std::fs::write(&path, b"stale").unwrap();

        let config = ServerConfig::new(&path).with_cleanup_stale_socket(false);
        let result = SocketServer::new(config).await;
        assert!(matches!(result, Err(ServerError::SocketInUse { .. })));
    }

    #[tokio::test]
    async fn replaces_stale_socket_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sock");
        std::fs::write(&path, b"stale").unwrap();

        let server = bind(ServerConfig::new(&path).with_cleanup_stale_socket(true)).await;
        assert!(path.exists());
        drop(server);
    }

    #[tokio::test]
    async fn refuses_missing_parent_directory() {
        let result = SocketServer::new(ServerConfig::new("/no/such/dir/test.sock")).await;
        assert!(matches!(result, Err(ServerError::SocketPathInvalid { .. })));
    }

    #[tokio::test]
    async fn ping_roundtrip_over_socket() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sock");
        let server = bind(ServerConfig::new(&path)).await;

        let client_path = path.clone();
        let client = tokio::spawn(async move {
            let mut stream = UnixStream::connect(&client_path).await.unwrap();

            let frame = encode_frame(&Envelope::request("rt-1", Request::Ping)).unwrap();
            stream.write_all(&frame).await.unwrap();

            let mut prefix = [0u8; 4];
            stream.read_exact(&mut prefix).await.unwrap();
            let mut payload = vec![0u8; read_length_prefix(prefix).unwrap()];
            stream.read_exact(&mut payload).await.unwrap();

            let response: Envelope<Response> = decode_payload(&payload).unwrap();
            assert_eq!(response.request_id, "rt-1");
            assert_eq!(response.payload, Response::Pong);
        });

        let mut conn = server.accept().await.unwrap();
        let envelope = conn.read_request().await.unwrap().unwrap();
        assert_eq!(envelope.payload, Request::Ping);
        conn.respond(&envelope.request_id, Response::Pong)
            .await
            .unwrap();

        client.await.unwrap();
    }

    #[tokio::test]
    async fn clean_disconnect_reads_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sock");
        let server = bind(ServerConfig::new(&path)).await;

        let client_path = path.clone();
        let client = tokio::spawn(async move {
            let _stream = UnixStream::connect(&client_path).await.unwrap();
        });

        let mut conn = server.accept().await.unwrap();
        client.await.unwrap();

        assert!(conn.read_request().await.unwrap().is_none());
    }
}
