//! Core types: coordinates, locations, meetings, venues, links

pub mod geo;
pub mod links;
pub mod meeting;
pub mod tracing;

pub use geo::{Coordinates, GeoError, Location, midpoint};
pub use links::{LinkError, meeting_link};
pub use meeting::{Meeting, MeetingError, MeetingStatus, Venue};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
