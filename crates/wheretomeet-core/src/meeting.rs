//! Meeting records and their lifecycle.
//!
//! A [`Meeting`] is the sole durable entity in the system. It moves through
//! an explicit state machine:
//!
//! ```text
//! Pending ──join──▶ AwaitingSelection ──schedule──▶ Scheduled
//! ```
//!
//! Every transition is a guarded method; backward moves and repeated writes
//! are rejected so a retried call cannot overwrite a field that was already
//! set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{Coordinates, GeoError, Location};

/// Errors produced by meeting lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeetingError {
    /// The supplied location does not resolve to a coordinate pair.
    #[error("location does not resolve to coordinates")]
    UnresolvedLocation,

    /// The supplied location resolves to an invalid coordinate pair.
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(#[from] GeoError),

    /// The transition is not allowed from the current status.
    #[error("cannot {operation} a meeting in status {status}")]
    InvalidTransition {
        /// The attempted operation ("join" or "schedule").
        operation: &'static str,
        /// The status the meeting was in.
        status: MeetingStatus,
    },
}

/// The lifecycle status of a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    /// Created; only the creator's location is set.
    Pending,
    /// Both locations are set; a venue has not been chosen yet.
    AwaitingSelection,
    /// A venue was chosen and a calendar event created.
    Scheduled,
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::AwaitingSelection => "awaiting_selection",
            Self::Scheduled => "scheduled",
        };
        f.write_str(s)
    }
}

/// A venue candidate returned by the places provider.
///
/// Venues are ephemeral: fetched fresh per query, never stored on their
/// own. A copy of the chosen venue is embedded in the meeting record when
/// it is scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    /// Provider-assigned identifier.
    pub id: String,
    /// Venue name.
    pub name: String,
    /// Short address (the provider's "vicinity").
    pub address: String,
    /// Rating on the provider's scale; 0 when the provider omits it.
    pub rating: f64,
    /// Price level on the provider's scale; 0 when the provider omits it.
    pub price_level: u8,
    /// Signed photo URL, present only when the provider supplied a photo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Venue coordinates.
    pub coordinates: Coordinates,
}

/// A durable meeting record pairing two parties' locations with a venue
/// selection and scheduling outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    /// Opaque meeting identifier.
    pub id: String,
    /// Identifier of the user who created the meeting.
    pub creator_id: String,
    /// The creator's location.
    pub creator_location: Location,
    /// The invitee's location, set by the join transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitee_location: Option<Location>,
    /// Current lifecycle status.
    pub status: MeetingStatus,
    /// The chosen venue, set by the schedule transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_venue: Option<Venue>,
    /// Calendar event id, set by the schedule transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Meeting {
    /// Creates a new pending meeting.
    ///
    /// Fails if the creator location does not resolve to a valid
    /// coordinate pair.
    pub fn new(
        id: impl Into<String>,
        creator_id: impl Into<String>,
        creator_location: Location,
    ) -> Result<Self, MeetingError> {
        resolve_valid(&creator_location)?;
        Ok(Self {
            id: id.into(),
            creator_id: creator_id.into(),
            creator_location,
            invitee_location: None,
            status: MeetingStatus::Pending,
            selected_venue: None,
            calendar_event_id: None,
            created_at: Utc::now(),
        })
    }

    /// Records the invitee's location and advances to `AwaitingSelection`.
    ///
    /// Only allowed while the meeting is `Pending`; a second join or a join
    /// after scheduling is rejected.
    pub fn join(&mut self, invitee_location: Location) -> Result<(), MeetingError> {
        if self.status != MeetingStatus::Pending {
            return Err(MeetingError::InvalidTransition {
                operation: "join",
                status: self.status,
            });
        }
        resolve_valid(&invitee_location)?;
        self.invitee_location = Some(invitee_location);
        self.status = MeetingStatus::AwaitingSelection;
        Ok(())
    }

    /// Records the chosen venue and calendar event, advancing to `Scheduled`.
    ///
    /// Only allowed from `AwaitingSelection`.
    pub fn schedule(
        &mut self,
        venue: Venue,
        calendar_event_id: impl Into<String>,
    ) -> Result<(), MeetingError> {
        if self.status != MeetingStatus::AwaitingSelection {
            return Err(MeetingError::InvalidTransition {
                operation: "schedule",
                status: self.status,
            });
        }
        self.selected_venue = Some(venue);
        self.calendar_event_id = Some(calendar_event_id.into());
        self.status = MeetingStatus::Scheduled;
        Ok(())
    }

    /// Returns the midpoint of the two parties' locations, once both are
    /// set and resolvable.
    pub fn midpoint(&self) -> Option<Coordinates> {
        let creator = self.creator_location.resolve()?;
        let invitee = self.invitee_location.as_ref()?.resolve()?;
        Some(crate::geo::midpoint(creator, invitee))
    }
}

/// Resolves a location and validates the resulting coordinate pair.
fn resolve_valid(location: &Location) -> Result<Coordinates, MeetingError> {
    let coords = location
        .resolve()
        .ok_or(MeetingError::UnresolvedLocation)?;
    coords.validate()?;
    Ok(coords)
}
