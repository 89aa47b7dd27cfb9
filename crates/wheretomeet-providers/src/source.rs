//! Provider trait seams.
//!
//! The server depends on these traits rather than on the Google clients
//! directly, so tests can substitute in-memory fakes. Boxed futures keep
//! the traits object-safe.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};

use wheretomeet_core::{Coordinates, Venue};

use crate::error::ProviderResult;
use crate::session::SessionTokens;

/// A boxed future for async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A source of venue candidates near a coordinate pair.
///
/// Implementations query fresh on every call; there is no caching layer.
pub trait VenueSource: Send + Sync {
    /// Returns the name of this source (e.g. "google-places").
    fn name(&self) -> &str;

    /// Searches for venues near the given anchor.
    ///
    /// Candidates missing an id, name, address, or coordinates are
    /// dropped; the provider's order is preserved for the rest.
    fn nearby(&self, center: Coordinates) -> BoxFuture<'_, ProviderResult<Vec<Venue>>>;
}

/// The outcome of creating a calendar event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    /// Provider-assigned event id.
    pub event_id: String,
    /// User-facing link to the event.
    pub event_link: String,
}

/// A calendar backend that can create and cancel events.
pub trait EventScheduler: Send + Sync {
    /// Returns the name of this scheduler (e.g. "google-calendar").
    fn name(&self) -> &str;

    /// Creates a one-hour event at the given venue starting at `start`.
    ///
    /// Fails with an authentication error, without any network call, when
    /// the session carries no access token.
    fn schedule<'a>(
        &'a self,
        tokens: &'a SessionTokens,
        venue: &'a Venue,
        start: DateTime<Utc>,
    ) -> BoxFuture<'a, ProviderResult<ScheduledEvent>>;

    /// Deletes a previously created event. Used as compensation when the
    /// meeting record cannot be updated after the event was created.
    fn cancel<'a>(
        &'a self,
        tokens: &'a SessionTokens,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}
