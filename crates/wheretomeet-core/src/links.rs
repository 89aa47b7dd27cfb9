//! Shareable meeting links.

use thiserror::Error;
use url::Url;

/// Errors produced while building a meeting link.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The base origin is not a parseable URL.
    #[error("invalid base origin: {0}")]
    InvalidBase(#[from] url::ParseError),

    /// The base origin cannot carry a path (e.g. `mailto:`).
    #[error("base origin cannot carry a path: {0}")]
    CannotBeBase(String),
}

/// Builds the deterministic shareable URL for a meeting:
/// `{base_origin}/meet/{meeting_id}`.
///
/// The meeting id is percent-encoded as a path segment.
pub fn meeting_link(base_origin: &str, meeting_id: &str) -> Result<String, LinkError> {
    let mut url = Url::parse(base_origin)?;
    url.path_segments_mut()
        .map_err(|_| LinkError::CannotBeBase(base_origin.to_string()))?
        .pop_if_empty()
        .push("meet")
        .push(meeting_id);
    Ok(url.to_string())
}
