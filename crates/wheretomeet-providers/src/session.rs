//! OAuth session tokens handed to the calendar adapter.

/// Access and refresh tokens from the authenticated user's session.
///
/// These originate from the identity provider at sign-in; the adapters
/// never mint or refresh tokens themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    /// OAuth access token, sent as a bearer credential.
    pub access_token: String,
    /// OAuth refresh token, carried along when the session provides one.
    pub refresh_token: Option<String>,
}

impl SessionTokens {
    /// Creates session tokens from an access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
        }
    }

    /// Builder: set the refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Returns true if an access token is present and non-empty.
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }
}
