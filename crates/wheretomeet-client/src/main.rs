//! wheretomeet CLI entry point.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use wheretomeet_client::cli::{Cli, Command};
use wheretomeet_client::config::ClientConfig;
use wheretomeet_client::error::{ClientError, ClientResult};
use wheretomeet_client::socket::SocketClient;
use wheretomeet_core::tracing::{TracingConfig, init_tracing};
use wheretomeet_protocol::{Request, Response};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else if matches!(cli.command, Command::Serve { .. }) {
        TracingConfig::daemon()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().unwrap_or_default()
    };

    let socket_path = cli
        .socket_path
        .clone()
        .or_else(|| config.server.socket_path.clone())
        .unwrap_or_else(wheretomeet_server::default_socket_path);
    let timeout = Duration::from_secs(cli.timeout.unwrap_or(config.server.timeout));
    let client = SocketClient::new(&socket_path, timeout);

    match cli.command {
        Command::Serve { ref base_origin } => {
            let base_origin = base_origin.clone();
            wheretomeet_client::commands::serve::run(&cli, &config, base_origin).await
        }
        Command::Create {
            ref creator_id,
            ref location,
        } => wheretomeet_client::commands::meeting::create(&client, creator_id, location, cli.json)
            .await,
        Command::Get { ref meeting_id } => {
            wheretomeet_client::commands::meeting::get(&client, meeting_id, cli.json).await
        }
        Command::Join {
            ref meeting_id,
            ref location,
        } => {
            wheretomeet_client::commands::meeting::join(&client, meeting_id, location, cli.json)
                .await
        }
        Command::Venues {
            ref meeting,
            lat,
            lng,
        } => match (meeting, lat, lng) {
            (Some(meeting_id), _, _) => {
                wheretomeet_client::commands::venues::for_meeting(&client, meeting_id, cli.json)
                    .await
            }
            (None, Some(lat), Some(lng)) => {
                wheretomeet_client::commands::venues::at(&client, lat, lng, cli.json).await
            }
            _ => Err(ClientError::Config(
                "pass either --meeting <ID> or both --lat and --lng".into(),
            )),
        },
        Command::Schedule {
            ref meeting_id,
            ref venue_id,
        } => {
            wheretomeet_client::commands::meeting::schedule(&client, meeting_id, venue_id, cli.json)
                .await
        }
        Command::Status => {
            let response = client.send(Request::Status).await?;
            match response {
                Response::Status { info } => {
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&info).unwrap_or_default()
                        );
                    } else {
                        println!("uptime:           {}s", info.uptime_seconds);
                        println!("meetings:         {}", info.meeting_count);
                        println!("scheduled:        {}", info.scheduled_count);
                        println!(
                            "calendar session: {}",
                            if info.calendar_session { "yes" } else { "no" }
                        );
                    }
                    Ok(())
                }
                Response::Error { error } => Err(error.into()),
                other => Err(ClientError::Protocol(format!(
                    "unexpected response: {:?}",
                    other
                ))),
            }
        }
        Command::Ping => {
            if client.ping().await? {
                println!("pong");
                Ok(())
            } else {
                Err(ClientError::Connection(format!(
                    "no response from server at {}",
                    socket_path.display()
                )))
            }
        }
    }
}
