//! Subcommand implementations.

pub mod meeting;
pub mod serve;
pub mod venues;
