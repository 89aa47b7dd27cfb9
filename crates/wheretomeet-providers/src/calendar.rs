//! Google Calendar event creation.
//!
//! Creates one-hour meeting events on the user's primary calendar and can
//! delete them again. Requests carry the session's access token as a
//! bearer credential; the adapter refuses to go on the wire when the
//! session has no token.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use wheretomeet_core::Venue;

use crate::error::{ProviderError, ProviderResult};
use crate::session::SessionTokens;
use crate::source::{BoxFuture, EventScheduler, ScheduledEvent};

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com";

/// Length of a scheduled meeting.
const EVENT_DURATION: chrono::Duration = chrono::Duration::hours(1);

/// Google Calendar API client.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl GoogleCalendarClient {
    /// Creates a new calendar client.
    pub fn new(timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create HTTP client");

        Self {
            http_client,
            base_url: Url::parse(CALENDAR_API_BASE).expect("static base URL parses"),
        }
    }

    /// Overrides the API base URL. Used by tests to point at a local server.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Creates a one-hour event on the primary calendar.
    async fn insert_event(
        &self,
        tokens: &SessionTokens,
        venue: &Venue,
        start: DateTime<Utc>,
    ) -> ProviderResult<ScheduledEvent> {
        if !tokens.is_authenticated() {
            return Err(ProviderError::authentication("no access token in session"));
        }

        let url = self
            .base_url
            .join("/calendar/v3/calendars/primary/events")
            .map_err(|e| ProviderError::configuration(format!("invalid base URL: {}", e)))?;

        let body = EventRequest::for_venue(venue, start);

        let response = self
            .http_client
            .post(url)
            .bearer_auth(&tokens.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::network("request timeout")
                } else {
                    ProviderError::network(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::authentication(
                "access token expired or invalid",
            ));
        }
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::authorization("access denied to calendar"));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::rate_limited("rate limit exceeded"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::server(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        let created: CreatedEvent = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
        })?;

        debug!(event_id = %created.id, "created calendar event");

        Ok(ScheduledEvent {
            event_id: created.id,
            event_link: created.html_link,
        })
    }

    /// Deletes an event from the primary calendar.
    async fn delete_event(&self, tokens: &SessionTokens, event_id: &str) -> ProviderResult<()> {
        if !tokens.is_authenticated() {
            return Err(ProviderError::authentication("no access token in session"));
        }

        let url = self
            .base_url
            .join(&format!(
                "/calendar/v3/calendars/primary/events/{}",
                event_id
            ))
            .map_err(|e| ProviderError::configuration(format!("invalid base URL: {}", e)))?;

        let response = self
            .http_client
            .delete(url)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("request failed: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::authentication(
                "access token expired or invalid",
            ));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::not_found(format!(
                "event {} not found",
                event_id
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::server(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        debug!(event_id, "deleted calendar event");
        Ok(())
    }
}

impl EventScheduler for GoogleCalendarClient {
    fn name(&self) -> &str {
        "google-calendar"
    }

    fn schedule<'a>(
        &'a self,
        tokens: &'a SessionTokens,
        venue: &'a Venue,
        start: DateTime<Utc>,
    ) -> BoxFuture<'a, ProviderResult<ScheduledEvent>> {
        Box::pin(async move {
            self.insert_event(tokens, venue, start).await.map_err(|e| {
                warn!(error = %e, venue = %venue.name, "calendar event creation failed");
                e.with_provider("google-calendar")
            })
        })
    }

    fn cancel<'a>(
        &'a self,
        tokens: &'a SessionTokens,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            self.delete_event(tokens, event_id).await.map_err(|e| {
                warn!(error = %e, event_id, "calendar event deletion failed");
                e.with_provider("google-calendar")
            })
        })
    }
}

/// Request body for the events.insert endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventRequest {
    summary: String,
    location: String,
    description: String,
    start: EventTime,
    end: EventTime,
    reminders: EventReminders,
}

impl EventRequest {
    fn for_venue(venue: &Venue, start: DateTime<Utc>) -> Self {
        Self {
            summary: format!("Meeting at {}", venue.name),
            location: venue.address.clone(),
            description: format!(
                "Meeting at {} ({}), rated {:.1}",
                venue.name, venue.address, venue.rating
            ),
            start: EventTime::at(start),
            end: EventTime::at(start + EVENT_DURATION),
            reminders: EventReminders { use_default: true },
        }
    }
}

/// Event time bound for the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: String,
    time_zone: String,
}

impl EventTime {
    fn at(instant: DateTime<Utc>) -> Self {
        Self {
            date_time: instant.to_rfc3339(),
            time_zone: "UTC".to_string(),
        }
    }
}

/// Reminder settings for the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventReminders {
    use_default: bool,
}

/// Response from the events.insert endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedEvent {
    id: String,
    html_link: String,
}
