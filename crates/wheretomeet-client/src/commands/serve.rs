//! Serve command — starts the daemon in the foreground.
//!
//! Wires together the meeting store, the Google adapters built from
//! config, and the socket server, then blocks until Ctrl-C or a
//! Shutdown request.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use wheretomeet_providers::{
    GoogleCalendarClient, GooglePlacesClient, PlacesConfig, SessionTokens,
};
use wheretomeet_server::{
    MemoryStore, RequestHandler, ServerConfig, SocketServer, default_socket_path,
    make_connection_handler, new_shared_state,
};

use crate::cli::Cli;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Starts the server daemon in the foreground.
///
/// Blocks until Ctrl-C is received or a client sends a Shutdown request.
pub async fn run(cli: &Cli, config: &ClientConfig, base_origin: Option<String>) -> ClientResult<()> {
    let google = config.google.as_ref().ok_or_else(|| {
        ClientError::Config(
            "no [google] section in config.toml; an api_key is required for venue search".into(),
        )
    })?;

    let api_key = google.api_key.as_deref().ok_or_else(|| {
        ClientError::Config("google.api_key is missing from config.toml".into())
    })?;

    let places = Arc::new(GooglePlacesClient::new(PlacesConfig::new(api_key)));
    let calendar = Arc::new(GoogleCalendarClient::new(Duration::from_secs(10)));

    let session = google.access_token.as_ref().map(|token| {
        let tokens = SessionTokens::new(token);
        match google.refresh_token.as_ref() {
            Some(refresh) => tokens.with_refresh_token(refresh),
            None => tokens,
        }
    });
    if session.is_none() {
        info!("no calendar session configured; scheduling requests will be rejected");
    }

    let socket_path = cli
        .socket_path
        .clone()
        .or_else(|| config.server.socket_path.clone())
        .unwrap_or_else(default_socket_path);

    let mut server_config = ServerConfig::new(&socket_path);
    if let Some(origin) = base_origin.or_else(|| config.server.base_origin.clone()) {
        server_config = server_config.with_base_origin(origin);
    }

    let state = new_shared_state();
    let store = MemoryStore::shared();

    let mut handler = RequestHandler::new(
        state.clone(),
        store,
        places,
        calendar,
        server_config.base_origin.clone(),
    );
    if let Some(session) = session {
        handler = handler.with_session(session);
    }

    let server = SocketServer::new(server_config)
        .await
        .map_err(|e| ClientError::Config(format!("failed to start socket server: {}", e)))?;

    info!(path = %socket_path.display(), "Server listening");

    let connection_handler = make_connection_handler(Arc::new(handler));

    let shutdown_state = state.clone();
    let shutdown = async move {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            tokio::select! {
                _ = &mut ctrl_c => break,
                _ = tokio::time::sleep(Duration::from_millis(500)) => {
                    if shutdown_state.read().await.shutdown_requested() {
                        break;
                    }
                }
            }
        }
    };

    server
        .run_until_shutdown(connection_handler, shutdown)
        .await
        .map_err(|e| ClientError::Config(format!("server error: {}", e)))?;

    info!("Server stopped");
    Ok(())
}
