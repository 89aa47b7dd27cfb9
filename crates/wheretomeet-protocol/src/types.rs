//! Wire types: the envelope, requests, responses, and error codes.

use serde::{Deserialize, Serialize};

use wheretomeet_core::{Location, Meeting, Venue};

use crate::PROTOCOL_VERSION;

/// Versioned wrapper around every message on the wire.
///
/// The request id ties a response back to the request that caused it;
/// the version lets either side notice a mismatched peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub protocol_version: String,
    pub request_id: String,
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Wraps `payload` under the current protocol version.
    pub fn new(request_id: impl Into<String>, payload: T) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            request_id: request_id.into(),
            payload,
        }
    }

    pub fn request(request_id: impl Into<String>, request: T) -> Self {
        Self::new(request_id, request)
    }

    pub fn response(request_id: impl Into<String>, response: T) -> Self {
        Self::new(request_id, response)
    }

    /// Whether the sender speaks our protocol version.
    pub fn is_compatible(&self) -> bool {
        self.protocol_version == PROTOCOL_VERSION
    }
}

/// Operations a client can ask the daemon to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Create a new meeting with the creator's location.
    CreateMeeting {
        /// Identifier of the creating user.
        creator_id: String,
        /// The creator's location.
        location: Location,
    },

    /// Fetch a meeting record by id.
    GetMeeting {
        /// The meeting id.
        meeting_id: String,
    },

    /// Record the invitee's location on an existing meeting.
    JoinMeeting {
        /// The meeting id.
        meeting_id: String,
        /// The invitee's location.
        location: Location,
    },

    /// Search for venues near a coordinate pair.
    NearbyVenues {
        /// Latitude of the search anchor.
        lat: f64,
        /// Longitude of the search anchor.
        lng: f64,
    },

    /// Choose a venue for a meeting and create the calendar event.
    ScheduleMeeting {
        /// The meeting id.
        meeting_id: String,
        /// The provider id of the chosen venue.
        venue_id: String,
    },

    /// Report daemon uptime and store counts.
    Status,

    /// Ask the daemon to stop after in-flight requests finish.
    Shutdown,

    /// Liveness probe.
    Ping,
}

impl Request {
    pub fn create_meeting(creator_id: impl Into<String>, location: Location) -> Self {
        Self::CreateMeeting {
            creator_id: creator_id.into(),
            location,
        }
    }

    pub fn get_meeting(meeting_id: impl Into<String>) -> Self {
        Self::GetMeeting {
            meeting_id: meeting_id.into(),
        }
    }

    pub fn join_meeting(meeting_id: impl Into<String>, location: Location) -> Self {
        Self::JoinMeeting {
            meeting_id: meeting_id.into(),
            location,
        }
    }

    pub fn nearby_venues(lat: f64, lng: f64) -> Self {
        Self::NearbyVenues { lat, lng }
    }

    pub fn schedule_meeting(meeting_id: impl Into<String>, venue_id: impl Into<String>) -> Self {
        Self::ScheduleMeeting {
            meeting_id: meeting_id.into(),
            venue_id: venue_id.into(),
        }
    }
}

/// The daemon's answers, one variant per request family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// A meeting record with its shareable link.
    Meeting {
        /// The meeting record.
        meeting: Meeting,
        /// The shareable link for the meeting.
        link: String,
    },

    /// Venue candidates near the requested anchor.
    Venues {
        /// The venues, provider order preserved.
        venues: Vec<Venue>,
    },

    /// A calendar event was created for the meeting.
    Scheduled {
        /// The calendar event id.
        event_id: String,
        /// A user-facing link to the event.
        event_link: String,
    },

    /// Daemon uptime and store counts.
    Status {
        #[serde(flatten)]
        info: StatusInfo,
    },

    /// Acknowledgement with no payload.
    Ok,

    /// The request failed; see the code and message.
    Error {
        #[serde(flatten)]
        error: ErrorResponse,
    },

    /// Answer to [`Request::Ping`].
    Pong,
}

impl Response {
    pub fn meeting(meeting: Meeting, link: impl Into<String>) -> Self {
        Self::Meeting {
            meeting,
            link: link.into(),
        }
    }

    pub fn venues(venues: Vec<Venue>) -> Self {
        Self::Venues { venues }
    }

    pub fn scheduled(event_id: impl Into<String>, event_link: impl Into<String>) -> Self {
        Self::Scheduled {
            event_id: event_id.into(),
            event_link: event_link.into(),
        }
    }

    pub fn status(info: StatusInfo) -> Self {
        Self::Status { info }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            error: ErrorResponse::new(code, message),
        }
    }

    /// Anything that is not an error counts as success.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Error { .. })
    }

    /// The error payload, when this is an error response.
    pub fn as_error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }
}

/// Payload of a status response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    /// Seconds since the daemon started.
    pub uptime_seconds: u64,
    /// Number of meeting records held.
    pub meeting_count: usize,
    /// Number of meetings that reached the scheduled state.
    pub scheduled_count: usize,
    /// Whether a calendar session is configured for scheduling.
    pub calendar_session: bool,
}

/// Machine-readable failure categories carried in error responses.
///
/// Clients branch on the code; the message is free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Something unexpected broke inside the daemon.
    InternalError,

    /// The request itself was malformed.
    InvalidRequest,

    /// A location is missing, unresolvable, or out of range.
    InvalidLocation,

    /// The requested meeting or venue was not found.
    NotFound,

    /// The meeting is not in a state that permits the operation.
    InvalidTransition,

    /// No calendar session is available for scheduling.
    NotAuthenticated,

    /// An upstream provider call failed.
    ProviderError,

    /// Rate limited by an upstream provider.
    RateLimited,

    /// The daemon is draining and refuses new work.
    ShuttingDown,
}

/// Code/message pair flattened into error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

}
