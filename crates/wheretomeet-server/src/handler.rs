//! Request/response dispatch handler.
//!
//! Routes incoming requests to the meeting store and the provider
//! adapters, and maps every failure onto a protocol error response.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use wheretomeet_core::{Coordinates, Location, Meeting, MeetingError, MeetingStatus, meeting_link};
use wheretomeet_protocol::{ErrorCode, Request, Response, StatusInfo};
use wheretomeet_providers::{
    EventScheduler, ProviderError, ProviderErrorCode, SessionTokens, VenueSource,
};

use crate::error::{ServerError, ServerResult};
use crate::socket::Connection;
use crate::store::MeetingStore;

/// How far in the future a scheduled meeting starts.
const SCHEDULE_LEAD: chrono::Duration = chrono::Duration::hours(1);

/// Mutable daemon-wide state, visible to every connection.
#[derive(Debug)]
pub struct ServerState {
    started_at: DateTime<Utc>,
    shutdown_requested: bool,
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            shutdown_requested: false,
        }
    }

    /// Seconds since the daemon started.
    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    /// Marks the daemon for orderly shutdown.
    pub fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }
}

/// Handle on [`ServerState`] that connection tasks clone.
pub type SharedState = Arc<RwLock<ServerState>>;

pub fn new_shared_state() -> SharedState {
    Arc::new(RwLock::new(ServerState::new()))
}

/// Turns decoded requests into responses via the store and the provider
/// adapters.
pub struct RequestHandler {
    state: SharedState,
    store: Arc<dyn MeetingStore>,
    venues: Arc<dyn VenueSource>,
    scheduler: Arc<dyn EventScheduler>,
    session: Option<SessionTokens>,
    base_origin: String,
}

impl RequestHandler {
    pub fn new(
        state: SharedState,
        store: Arc<dyn MeetingStore>,
        venues: Arc<dyn VenueSource>,
        scheduler: Arc<dyn EventScheduler>,
        base_origin: impl Into<String>,
    ) -> Self {
        Self {
            state,
            store,
            venues,
            scheduler,
            session: None,
            base_origin: base_origin.into(),
        }
    }

    /// Builder: set the calendar session used for scheduling.
    pub fn with_session(mut self, session: SessionTokens) -> Self {
        self.session = Some(session);
        self
    }

    /// Produces the response for one request. Never fails; every error
    /// becomes an error response.
    #[tracing::instrument(skip(self), fields(request_type))]
    pub async fn handle(&self, request: &Request) -> Response {
        use tracing::Span;

        let request_type = format!("{:?}", request);
        Span::current().record("request_type", &request_type);

        match request {
            Request::Ping => {
                debug!("ping");
                Response::Pong
            }
            Request::Status => {
                debug!("status query");
                let stats = self.store.stats().await;
                let state = self.state.read().await;
                Response::status(StatusInfo {
                    uptime_seconds: state.uptime_seconds(),
                    meeting_count: stats.meeting_count,
                    scheduled_count: stats.scheduled_count,
                    calendar_session: self.has_session(),
                })
            }
            Request::CreateMeeting {
                creator_id,
                location,
            } => {
                debug!(creator_id = %creator_id, "creating meeting");
                self.create_meeting(creator_id, location.clone()).await
            }
            Request::GetMeeting { meeting_id } => {
                debug!(meeting_id = %meeting_id, "fetching meeting");
                self.get_meeting(meeting_id).await
            }
            Request::JoinMeeting {
                meeting_id,
                location,
            } => {
                debug!(meeting_id = %meeting_id, "joining meeting");
                self.join_meeting(meeting_id, location.clone()).await
            }
            Request::NearbyVenues { lat, lng } => {
                debug!(lat = *lat, lng = *lng, "venue search");
                self.nearby_venues(*lat, *lng).await
            }
            Request::ScheduleMeeting {
                meeting_id,
                venue_id,
            } => {
                debug!(meeting_id = %meeting_id, venue_id = %venue_id, "scheduling");
                self.schedule_meeting(meeting_id, venue_id).await
            }
            Request::Shutdown => {
                info!("shutdown requested by client");
                let mut state = self.state.write().await;
                state.request_shutdown();
                Response::Ok
            }
        }
    }

    fn has_session(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(SessionTokens::is_authenticated)
    }

    fn link_for(&self, meeting_id: &str) -> Result<String, Response> {
        meeting_link(&self.base_origin, meeting_id).map_err(|e| {
            warn!(error = %e, "meeting link construction failed");
            Response::error(ErrorCode::InternalError, format!("link error: {}", e))
        })
    }

    async fn create_meeting(
        &self,
        creator_id: &str,
        location: Location,
    ) -> Response {
        let id = uuid::Uuid::new_v4().to_string();

        let meeting = match Meeting::new(&id, creator_id, location) {
            Ok(meeting) => meeting,
            Err(e) => return meeting_error_response(e),
        };

        let link = match self.link_for(&meeting.id) {
            Ok(link) => link,
            Err(response) => return response,
        };

        if let Err(e) = self.store.insert(meeting.clone()).await {
            warn!(error = %e, meeting_id = %meeting.id, "Failed to store meeting");
            return Response::error(ErrorCode::InternalError, format!("store error: {}", e));
        }

        info!(meeting_id = %meeting.id, creator_id = %creator_id, "Meeting created");
        Response::meeting(meeting, link)
    }

    async fn get_meeting(&self, meeting_id: &str) -> Response {
        let meeting = match self.store.get(meeting_id).await {
            Ok(meeting) => meeting,
            Err(e) => return Response::error(ErrorCode::NotFound, e.to_string()),
        };
        let link = match self.link_for(&meeting.id) {
            Ok(link) => link,
            Err(response) => return response,
        };
        Response::meeting(meeting, link)
    }

    async fn join_meeting(
        &self,
        meeting_id: &str,
        location: Location,
    ) -> Response {
        let mut meeting = match self.store.get(meeting_id).await {
            Ok(meeting) => meeting,
            Err(e) => return Response::error(ErrorCode::NotFound, e.to_string()),
        };

        if let Err(e) = meeting.join(location) {
            return meeting_error_response(e);
        }

        if let Err(e) = self.store.update(meeting.clone()).await {
            warn!(error = %e, meeting_id = %meeting_id, "Failed to update meeting");
            return Response::error(ErrorCode::InternalError, format!("store error: {}", e));
        }

        let link = match self.link_for(&meeting.id) {
            Ok(link) => link,
            Err(response) => return response,
        };

        info!(meeting_id = %meeting_id, "Invitee joined meeting");
        Response::meeting(meeting, link)
    }

    async fn nearby_venues(&self, lat: f64, lng: f64) -> Response {
        let center = match Coordinates::validated(lat, lng) {
            Ok(center) => center,
            Err(e) => return Response::error(ErrorCode::InvalidLocation, e.to_string()),
        };

        match self.venues.nearby(center).await {
            Ok(venues) => Response::venues(venues),
            Err(e) => provider_error_response(e),
        }
    }

    async fn schedule_meeting(&self, meeting_id: &str, venue_id: &str) -> Response {
        let Some(session) = self.session.as_ref().filter(|s| s.is_authenticated()) else {
            return Response::error(
                ErrorCode::NotAuthenticated,
                "no calendar session available for scheduling",
            );
        };

        let mut meeting = match self.store.get(meeting_id).await {
            Ok(meeting) => meeting,
            Err(e) => return Response::error(ErrorCode::NotFound, e.to_string()),
        };

        if meeting.status != MeetingStatus::AwaitingSelection {
            return Response::error(
                ErrorCode::InvalidTransition,
                format!("cannot schedule a meeting in status {}", meeting.status),
            );
        }

        let Some(midpoint) = meeting.midpoint() else {
            return Response::error(
                ErrorCode::InvalidLocation,
                "meeting locations do not resolve to a midpoint",
            );
        };

        // Re-resolve the venue from a fresh search so the stored copy
        // reflects current provider data.
        let candidates = match self.venues.nearby(midpoint).await {
            Ok(candidates) => candidates,
            Err(e) => return provider_error_response(e),
        };

        let Some(venue) = candidates.into_iter().find(|v| v.id == venue_id) else {
            return Response::error(
                ErrorCode::NotFound,
                format!("venue {} is not among the current candidates", venue_id),
            );
        };

        let start = Utc::now() + SCHEDULE_LEAD;
        let event = match self.scheduler.schedule(session, &venue, start).await {
            Ok(event) => event,
            Err(e) => return provider_error_response(e),
        };

        if let Err(e) = meeting.schedule(venue, &event.event_id) {
            // The guard above makes this unreachable in practice, but a
            // created event must not leak if it ever fires.
            self.cancel_event(session, &event.event_id).await;
            return meeting_error_response(e);
        }

        if let Err(e) = self.store.update(meeting).await {
            warn!(
                error = %e,
                meeting_id = %meeting_id,
                event_id = %event.event_id,
                "Failed to persist scheduled meeting, cancelling event"
            );
            self.cancel_event(session, &event.event_id).await;
            return Response::error(ErrorCode::InternalError, format!("store error: {}", e));
        }

        info!(
            meeting_id = %meeting_id,
            event_id = %event.event_id,
            "Meeting scheduled"
        );
        Response::scheduled(event.event_id, event.event_link)
    }

    /// Best-effort compensation: the meeting record could not be written,
    /// so the already-created calendar event is removed.
    async fn cancel_event(&self, session: &SessionTokens, event_id: &str) {
        if let Err(e) = self.scheduler.cancel(session, event_id).await {
            warn!(error = %e, event_id = %event_id, "Failed to cancel orphaned event");
        }
    }

    /// Handles a connection, processing all requests until the connection closes.
    pub async fn handle_connection(&self, mut conn: Connection) -> ServerResult<()> {
        loop {
            match conn.read_request().await {
                Ok(Some(envelope)) => {
                    let response = self.handle(&envelope.payload).await;
                    conn.respond(&envelope.request_id, response).await?;

                    if self.state.read().await.shutdown_requested() {
                        return Err(ServerError::Shutdown);
                    }
                }
                Ok(None) => {
                    debug!("Client disconnected");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "Error reading request");
                    return Err(e);
                }
            }
        }
    }
}

/// Maps a meeting lifecycle error onto a protocol error response.
fn meeting_error_response(error: MeetingError) -> Response {
    let code = match error {
        MeetingError::UnresolvedLocation | MeetingError::InvalidCoordinates(_) => {
            ErrorCode::InvalidLocation
        }
        MeetingError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
    };
    Response::error(code, error.to_string())
}

/// Maps a provider error onto a protocol error response.
fn provider_error_response(error: ProviderError) -> Response {
    let code = match error.code() {
        ProviderErrorCode::RateLimited => ErrorCode::RateLimited,
        ProviderErrorCode::AuthenticationFailed | ProviderErrorCode::AuthorizationFailed => {
            ErrorCode::NotAuthenticated
        }
        ProviderErrorCode::NotFound => ErrorCode::NotFound,
        _ => ErrorCode::ProviderError,
    };
    Response::error(code, error.to_string())
}

/// Creates a connection handler function for use with SocketServer::run.
pub fn make_connection_handler(
    handler: Arc<RequestHandler>,
) -> impl Fn(Connection) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
+ Send
+ Sync
+ 'static {
    move |conn| {
        let handler = handler.clone();
        Box::pin(async move {
            if let Err(e) = handler.handle_connection(conn).await
                && !matches!(e, ServerError::Shutdown)
            {
                warn!(error = %e, "Connection handler error");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use wheretomeet_core::Venue;
    use wheretomeet_providers::{BoxFuture, ProviderResult, ScheduledEvent};

    use crate::store::{MemoryStore, StoreError, StoreResult, StoreStats};

    struct FakeVenues {
        venues: Vec<Venue>,
        fail_with: Option<ProviderErrorCode>,
    }

    impl FakeVenues {
        fn with(venues: Vec<Venue>) -> Self {
            Self {
                venues,
                fail_with: None,
            }
        }

        fn failing(code: ProviderErrorCode) -> Self {
            Self {
                venues: Vec::new(),
                fail_with: Some(code),
            }
        }
    }

    impl VenueSource for FakeVenues {
        fn name(&self) -> &str {
            "fake-venues"
        }

        fn nearby(&self, _center: Coordinates) -> BoxFuture<'_, ProviderResult<Vec<Venue>>> {
            Box::pin(async move {
                match self.fail_with {
                    Some(code) => Err(ProviderError::new(code, "injected failure")),
                    None => Ok(self.venues.clone()),
                }
            })
        }
    }

    #[derive(Default)]
    struct FakeScheduler {
        fail: bool,
        cancelled: Mutex<Vec<String>>,
    }

    impl EventScheduler for FakeScheduler {
        fn name(&self) -> &str {
            "fake-scheduler"
        }

        fn schedule<'a>(
            &'a self,
            tokens: &'a SessionTokens,
            _venue: &'a Venue,
            _start: DateTime<Utc>,
        ) -> BoxFuture<'a, ProviderResult<ScheduledEvent>> {
            Box::pin(async move {
                if !tokens.is_authenticated() {
                    return Err(ProviderError::authentication("no access token"));
                }
                if self.fail {
                    return Err(ProviderError::server("injected failure"));
                }
                Ok(ScheduledEvent {
                    event_id: "evt-1".to_string(),
                    event_link: "https://calendar.example/evt-1".to_string(),
                })
            })
        }

        fn cancel<'a>(
            &'a self,
            _tokens: &'a SessionTokens,
            event_id: &'a str,
        ) -> BoxFuture<'a, ProviderResult<()>> {
            Box::pin(async move {
                self.cancelled.lock().unwrap().push(event_id.to_string());
                Ok(())
            })
        }
    }

    /// A store whose updates always fail, for compensation tests.
    struct BrokenUpdateStore {
        inner: MemoryStore,
    }

    impl MeetingStore for BrokenUpdateStore {
        fn insert(&self, meeting: Meeting) -> BoxFuture<'_, StoreResult<()>> {
            self.inner.insert(meeting)
        }

        fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Meeting>> {
            self.inner.get(id)
        }

        fn update(&self, _meeting: Meeting) -> BoxFuture<'_, StoreResult<()>> {
            Box::pin(async { Err(StoreError::backend("disk full")) })
        }

        fn stats(&self) -> BoxFuture<'_, StoreStats> {
            self.inner.stats()
        }
    }

    fn venue(id: &str) -> Venue {
        Venue {
            id: id.to_string(),
            name: "Test Cafe".to_string(),
            address: "1 Main St".to_string(),
            rating: 4.0,
            price_level: 1,
            photo_url: None,
            coordinates: Coordinates::new(37.5, -122.0),
        }
    }

    struct HandlerBuilder {
        store: Arc<dyn MeetingStore>,
        venues: Arc<dyn VenueSource>,
        scheduler: Arc<FakeScheduler>,
        session: Option<SessionTokens>,
    }

    impl HandlerBuilder {
        fn new() -> Self {
            Self {
                store: Arc::new(MemoryStore::new()),
                venues: Arc::new(FakeVenues::with(vec![venue("v1"), venue("v2")])),
                scheduler: Arc::new(FakeScheduler::default()),
                session: Some(SessionTokens::new("token")),
            }
        }

        fn build(self) -> RequestHandler {
            let handler = RequestHandler::new(
                new_shared_state(),
                self.store,
                self.venues,
                self.scheduler,
                "http://localhost:3000",
            );
            match self.session {
                Some(session) => handler.with_session(session),
                None => handler,
            }
        }
    }

    async fn create_meeting(handler: &RequestHandler) -> Meeting {
        let response = handler
            .handle(&Request::create_meeting("user-a", Location::raw("37.0,-122.0")))
            .await;
        match response {
            Response::Meeting { meeting, .. } => meeting,
            other => panic!("expected meeting response, got {:?}", other),
        }
    }

    async fn joined_meeting(handler: &RequestHandler) -> Meeting {
        let meeting = create_meeting(handler).await;
        let response = handler
            .handle(&Request::join_meeting(
                &meeting.id,
                Location::raw("38.0,-122.0"),
            ))
            .await;
        match response {
            Response::Meeting { meeting, .. } => meeting,
            other => panic!("expected meeting response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn ping_pong() {
        let handler = HandlerBuilder::new().build();
        assert_eq!(handler.handle(&Request::Ping).await, Response::Pong);
    }

    #[tokio::test]
    async fn create_returns_meeting_and_link() {
        let handler = HandlerBuilder::new().build();
        let response = handler
            .handle(&Request::create_meeting("user-a", Location::raw("37.0,-122.0")))
            .await;

        let Response::Meeting { meeting, link } = response else {
            panic!("expected meeting response");
        };
        assert_eq!(meeting.creator_id, "user-a");
        assert_eq!(meeting.status, MeetingStatus::Pending);
        assert_eq!(link, format!("http://localhost:3000/meet/{}", meeting.id));
    }

    #[tokio::test]
    async fn create_rejects_bad_location() {
        let handler = HandlerBuilder::new().build();
        let response = handler
            .handle(&Request::create_meeting("user-a", Location::raw("nowhere")))
            .await;

        let error = response.as_error().unwrap();
        assert_eq!(error.code, ErrorCode::InvalidLocation);
    }

    #[tokio::test]
    async fn get_unknown_meeting_is_not_found() {
        let handler = HandlerBuilder::new().build();
        let response = handler.handle(&Request::get_meeting("missing")).await;
        assert_eq!(response.as_error().unwrap().code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn join_advances_to_awaiting_selection() {
        let handler = HandlerBuilder::new().build();
        let meeting = joined_meeting(&handler).await;
        assert_eq!(meeting.status, MeetingStatus::AwaitingSelection);

        // The stored record advanced as well.
        let response = handler.handle(&Request::get_meeting(&meeting.id)).await;
        let Response::Meeting { meeting, .. } = response else {
            panic!("expected meeting response");
        };
        assert_eq!(meeting.status, MeetingStatus::AwaitingSelection);
    }

    #[tokio::test]
    async fn join_twice_is_invalid_transition() {
        let handler = HandlerBuilder::new().build();
        let meeting = joined_meeting(&handler).await;

        let response = handler
            .handle(&Request::join_meeting(
                &meeting.id,
                Location::raw("39.0,-121.0"),
            ))
            .await;
        assert_eq!(
            response.as_error().unwrap().code,
            ErrorCode::InvalidTransition
        );
    }

    #[tokio::test]
    async fn nearby_venues_returns_candidates() {
        let handler = HandlerBuilder::new().build();
        let response = handler.handle(&Request::nearby_venues(37.5, -122.0)).await;

        let Response::Venues { venues } = response else {
            panic!("expected venues response");
        };
        assert_eq!(venues.len(), 2);
        assert_eq!(venues[0].id, "v1");
    }

    #[tokio::test]
    async fn nearby_venues_rejects_out_of_range() {
        let handler = HandlerBuilder::new().build();
        let response = handler.handle(&Request::nearby_venues(95.0, 0.0)).await;
        assert_eq!(
            response.as_error().unwrap().code,
            ErrorCode::InvalidLocation
        );
    }

    #[tokio::test]
    async fn nearby_venues_maps_rate_limit() {
        let mut builder = HandlerBuilder::new();
        builder.venues = Arc::new(FakeVenues::failing(ProviderErrorCode::RateLimited));
        let handler = builder.build();

        let response = handler.handle(&Request::nearby_venues(37.5, -122.0)).await;
        assert_eq!(response.as_error().unwrap().code, ErrorCode::RateLimited);
    }

    #[tokio::test]
    async fn schedule_happy_path() {
        let handler = HandlerBuilder::new().build();
        let meeting = joined_meeting(&handler).await;

        let response = handler
            .handle(&Request::schedule_meeting(&meeting.id, "v2"))
            .await;

        let Response::Scheduled {
            event_id,
            event_link,
        } = response
        else {
            panic!("expected scheduled response, got {:?}", response);
        };
        assert_eq!(event_id, "evt-1");
        assert!(event_link.contains("evt-1"));

        let response = handler.handle(&Request::get_meeting(&meeting.id)).await;
        let Response::Meeting { meeting, .. } = response else {
            panic!("expected meeting response");
        };
        assert_eq!(meeting.status, MeetingStatus::Scheduled);
        assert_eq!(meeting.selected_venue.as_ref().unwrap().id, "v2");
        assert_eq!(meeting.calendar_event_id.as_deref(), Some("evt-1"));
    }

    #[tokio::test]
    async fn schedule_without_session_is_not_authenticated() {
        let mut builder = HandlerBuilder::new();
        builder.session = None;
        let handler = builder.build();
        let meeting = joined_meeting(&handler).await;

        let response = handler
            .handle(&Request::schedule_meeting(&meeting.id, "v1"))
            .await;
        assert_eq!(
            response.as_error().unwrap().code,
            ErrorCode::NotAuthenticated
        );
    }

    #[tokio::test]
    async fn schedule_pending_meeting_is_invalid_transition() {
        let handler = HandlerBuilder::new().build();
        let meeting = create_meeting(&handler).await;

        let response = handler
            .handle(&Request::schedule_meeting(&meeting.id, "v1"))
            .await;
        assert_eq!(
            response.as_error().unwrap().code,
            ErrorCode::InvalidTransition
        );
    }

    #[tokio::test]
    async fn schedule_unknown_venue_is_not_found() {
        let handler = HandlerBuilder::new().build();
        let meeting = joined_meeting(&handler).await;

        let response = handler
            .handle(&Request::schedule_meeting(&meeting.id, "v99"))
            .await;
        assert_eq!(response.as_error().unwrap().code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn schedule_cancels_event_when_store_write_fails() {
        let scheduler = Arc::new(FakeScheduler::default());
        let builder = HandlerBuilder::new();
        let handler = RequestHandler::new(
            new_shared_state(),
            Arc::new(BrokenUpdateStore {
                inner: MemoryStore::new(),
            }),
            builder.venues,
            scheduler.clone(),
            "http://localhost:3000",
        )
        .with_session(SessionTokens::new("token"));

        // Seed a meeting directly in awaiting-selection state; the broken
        // store allows inserts but refuses updates.
        let mut meeting =
            Meeting::new("m1", "user-a", Location::raw("37.0,-122.0")).unwrap();
        meeting.join(Location::raw("38.0,-122.0")).unwrap();
        handler.store.insert(meeting).await.unwrap();

        let response = handler
            .handle(&Request::schedule_meeting("m1", "v1"))
            .await;
        assert_eq!(
            response.as_error().unwrap().code,
            ErrorCode::InternalError
        );
        assert_eq!(
            scheduler.cancelled.lock().unwrap().as_slice(),
            ["evt-1".to_string()]
        );
    }

    #[tokio::test]
    async fn status_reports_counts_and_session() {
        let handler = HandlerBuilder::new().build();
        let meeting = joined_meeting(&handler).await;
        handler
            .handle(&Request::schedule_meeting(&meeting.id, "v1"))
            .await;

        let response = handler.handle(&Request::Status).await;
        let Response::Status { info } = response else {
            panic!("expected status response");
        };
        assert_eq!(info.meeting_count, 1);
        assert_eq!(info.scheduled_count, 1);
        assert!(info.calendar_session);
    }

    #[tokio::test]
    async fn shutdown_sets_flag() {
        let handler = HandlerBuilder::new().build();
        assert_eq!(handler.handle(&Request::Shutdown).await, Response::Ok);
        assert!(handler.state.read().await.shutdown_requested());
    }
}
