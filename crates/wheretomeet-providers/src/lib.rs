//! Provider adapters for wheretomeet.
//!
//! Two external capabilities live behind object-safe traits so the server
//! and tests can swap implementations:
//! - [`VenueSource`]: nearby-venue search, implemented by [`GooglePlacesClient`]
//! - [`EventScheduler`]: calendar event creation, implemented by [`GoogleCalendarClient`]

mod calendar;
mod error;
mod places;
mod session;
mod source;

pub use calendar::GoogleCalendarClient;
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use places::{GooglePlacesClient, PlacesConfig};
pub use session::SessionTokens;
pub use source::{BoxFuture, EventScheduler, ScheduledEvent, VenueSource};
