//! Socket client for the wheretomeet daemon.
//!
//! Every call opens a fresh connection, writes one framed request, and
//! reads one framed response. Each phase runs under the client timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, warn};
use uuid::Uuid;

use wheretomeet_protocol::{
    Envelope, Request, Response, decode_payload, encode_frame, read_length_prefix,
};

use crate::error::{ClientError, ClientResult};

/// Client side of the daemon's Unix socket protocol.
pub struct SocketClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl SocketClient {
    pub fn new(socket_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout,
        }
    }

    /// Client pointed at the default socket path with a 5 second timeout.
    pub fn with_defaults() -> Self {
        Self::new(
            wheretomeet_server::default_socket_path(),
            Duration::from_secs(5),
        )
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Whether a socket file is present at the configured path.
    pub fn socket_exists(&self) -> bool {
        self.socket_path.exists()
    }

    /// Sends one request and returns the server's response payload.
    ///
    /// A mismatched request id in the reply is logged but not fatal; the
    /// connection carries a single exchange so the reply is unambiguous.
    pub async fn send(&self, request: Request) -> ClientResult<Response> {
        let request_id = Uuid::new_v4().to_string();
        debug!(
            socket = %self.socket_path.display(),
            request_id = %request_id,
            "dispatching request"
        );

        let mut stream = self.connect().await?;
        self.send_frame(&mut stream, &Envelope::request(&request_id, request))
            .await?;
        let reply = self.read_frame(&mut stream).await?;

        if reply.request_id != request_id {
            warn!(
                sent = %request_id,
                got = %reply.request_id,
                "reply correlates to a different request id"
            );
        }

        Ok(reply.payload)
    }

    /// Checks whether a live server answers on the socket.
    pub async fn ping(&self) -> ClientResult<bool> {
        Ok(matches!(self.send(Request::Ping).await, Ok(Response::Pong)))
    }

    async fn connect(&self) -> ClientResult<UnixStream> {
        match tokio::time::timeout(self.timeout, UnixStream::connect(&self.socket_path)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(ClientError::Connection(format!(
                "cannot reach server at {}: {}",
                self.socket_path.display(),
                e
            ))),
            Err(_) => Err(ClientError::Timeout(format!(
                "connecting to {}",
                self.socket_path.display()
            ))),
        }
    }

    async fn send_frame(
        &self,
        stream: &mut UnixStream,
        envelope: &Envelope<Request>,
    ) -> ClientResult<()> {
        let frame =
            encode_frame(envelope).map_err(|e| ClientError::Protocol(e.to_string()))?;

        tokio::time::timeout(self.timeout, async {
            stream.write_all(&frame).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| ClientError::Timeout("sending request".into()))?
        .map_err(ClientError::Io)
    }

    async fn read_frame(&self, stream: &mut UnixStream) -> ClientResult<Envelope<Response>> {
        let payload = tokio::time::timeout(self.timeout, async {
            let mut prefix = [0u8; 4];
            stream.read_exact(&mut prefix).await?;
            let len = read_length_prefix(prefix).map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
            })?;
            let mut payload = vec![0u8; len];
            stream.read_exact(&mut payload).await?;
            Ok::<_, std::io::Error>(payload)
        })
        .await
        .map_err(|_| ClientError::Timeout("reading response".into()))?
        .map_err(ClientError::Io)?;

        decode_payload(&payload)
            .map_err(|e| ClientError::Protocol(format!("undecodable response: {}", e)))
    }
}
