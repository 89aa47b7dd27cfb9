//! CLI and socket client for the wheretomeet daemon.
//!
//! This crate provides the `wheretomeet` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod socket;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
pub use socket::SocketClient;
