//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// wheretomeet - Find a place to meet halfway
#[derive(Debug, Parser)]
#[command(name = "wheretomeet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "WHERETOMEET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Output raw JSON instead of formatted text
    #[arg(long)]
    pub json: bool,

    /// Path to the server socket
    #[arg(long, env = "WHERETOMEET_SOCKET")]
    pub socket_path: Option<PathBuf>,

    /// Connection timeout in seconds (defaults to the config value)
    #[arg(long)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the server daemon in the foreground
    Serve {
        /// Origin used when building shareable meeting links
        #[arg(long)]
        base_origin: Option<String>,
    },

    /// Create a new meeting from your location
    Create {
        /// Your user id
        #[arg(long, default_value = "cli-user")]
        creator_id: String,

        /// Your location as "lat,lng"
        location: String,
    },

    /// Show a meeting record
    Get {
        /// The meeting id
        meeting_id: String,
    },

    /// Join an existing meeting with your location
    Join {
        /// The meeting id
        meeting_id: String,

        /// Your location as "lat,lng"
        location: String,
    },

    /// List venue candidates near a point or a meeting's midpoint
    Venues {
        /// Search around the midpoint of this meeting
        #[arg(long, conflicts_with_all = ["lat", "lng"])]
        meeting: Option<String>,

        /// Latitude of the search anchor
        #[arg(long, requires = "lng")]
        lat: Option<f64>,

        /// Longitude of the search anchor
        #[arg(long, requires = "lat")]
        lng: Option<f64>,
    },

    /// Pick a venue and put the meeting on the calendar
    Schedule {
        /// The meeting id
        meeting_id: String,

        /// The venue id from a previous venues listing
        venue_id: String,
    },

    /// Show daemon status
    Status,

    /// Check whether the daemon is reachable
    Ping,
}
