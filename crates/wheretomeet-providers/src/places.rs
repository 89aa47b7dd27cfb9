//! Google Places nearby search client.
//!
//! Wraps the Places Nearby Search endpoint: one request per call, fixed
//! radius and category, no caching and no retries. Incomplete candidates
//! are dropped rather than defaulted.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use wheretomeet_core::{Coordinates, Venue};

use crate::error::{ProviderError, ProviderResult};
use crate::source::{BoxFuture, VenueSource};

/// Default base URL for the Google Maps APIs.
const MAPS_API_BASE: &str = "https://maps.googleapis.com";

/// Configuration for the places client.
#[derive(Debug, Clone)]
pub struct PlacesConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Search radius in meters.
    pub radius_m: u32,
    /// The single place category searched for.
    pub venue_type: String,
    /// Width embedded in generated photo URLs.
    pub photo_max_width: u32,
    /// Request timeout.
    pub timeout: Duration,
}

impl PlacesConfig {
    /// Creates a config with the given API key and the standard search
    /// parameters (2 km radius, restaurants, 400px photos).
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            radius_m: 2000,
            venue_type: "restaurant".to_string(),
            photo_max_width: 400,
            timeout: Duration::from_secs(10),
        }
    }

    /// Builder: set the search radius in meters.
    pub fn with_radius_m(mut self, radius_m: u32) -> Self {
        self.radius_m = radius_m;
        self
    }

    /// Builder: set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Google Places nearby search client.
#[derive(Debug)]
pub struct GooglePlacesClient {
    http_client: reqwest::Client,
    config: PlacesConfig,
    base_url: Url,
}

impl GooglePlacesClient {
    /// Creates a new places client.
    pub fn new(config: PlacesConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to create HTTP client");

        Self {
            http_client,
            config,
            base_url: Url::parse(MAPS_API_BASE).expect("static base URL parses"),
        }
    }

    /// Overrides the API base URL. Used by tests to point at a local server.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Searches for venues near the anchor and maps them into [`Venue`]s.
    async fn search(&self, center: Coordinates) -> ProviderResult<Vec<Venue>> {
        let url = self
            .base_url
            .join("/maps/api/place/nearbysearch/json")
            .map_err(|e| ProviderError::configuration(format!("invalid base URL: {}", e)))?;

        let response = self
            .http_client
            .get(url)
            .query(&[
                ("location", format!("{},{}", center.lat, center.lng)),
                ("radius", self.config.radius_m.to_string()),
                ("type", self.config.venue_type.clone()),
                ("key", self.config.api_key.clone()),
            ])
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

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::rate_limited("too many requests"));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::authentication("API key rejected"));
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

        let search: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::invalid_response(format!("failed to parse response: {}", e)))?;

        // The Places API reports most failures in-band with HTTP 200.
        match search.status.as_str() {
            "OK" | "ZERO_RESULTS" => {}
            "OVER_QUERY_LIMIT" => {
                return Err(ProviderError::rate_limited(
                    search.error_message.unwrap_or_else(|| "query limit exceeded".to_string()),
                ));
            }
            "REQUEST_DENIED" => {
                return Err(ProviderError::authentication(
                    search.error_message.unwrap_or_else(|| "request denied".to_string()),
                ));
            }
            "INVALID_REQUEST" => {
                return Err(ProviderError::bad_request(
                    search.error_message.unwrap_or_else(|| "invalid request".to_string()),
                ));
            }
            other => {
                return Err(ProviderError::server(format!(
                    "unexpected status: {} {}",
                    other,
                    search.error_message.unwrap_or_default()
                )));
            }
        }

        let total = search.results.len();
        let venues: Vec<Venue> = search
            .results
            .into_iter()
            .filter_map(|place| self.convert_place(place))
            .collect();

        if venues.len() < total {
            debug!(
                dropped = total - venues.len(),
                kept = venues.len(),
                "dropped incomplete venue candidates"
            );
        }

        Ok(venues)
    }

    /// Converts an API candidate into a venue, or `None` when a required
    /// field is missing.
    fn convert_place(&self, place: ApiPlace) -> Option<Venue> {
        let id = place.place_id?;
        let name = place.name?;
        let address = place.vicinity?;
        let location = place.geometry?.location;

        let photo_url = place
            .photos
            .as_deref()
            .and_then(|photos| photos.first())
            .map(|photo| self.photo_url(&photo.photo_reference));

        Some(Venue {
            id,
            name,
            address,
            rating: place.rating.unwrap_or(0.0),
            price_level: place.price_level.unwrap_or(0),
            photo_url,
            coordinates: Coordinates::new(location.lat, location.lng),
        })
    }

    /// Builds the signed photo URL for a photo reference.
    fn photo_url(&self, photo_reference: &str) -> String {
        let mut url = self
            .base_url
            .join("/maps/api/place/photo")
            .expect("static photo path joins");
        url.query_pairs_mut()
            .append_pair("maxwidth", &self.config.photo_max_width.to_string())
            .append_pair("photoreference", photo_reference)
            .append_pair("key", &self.config.api_key);
        url.to_string()
    }
}

impl VenueSource for GooglePlacesClient {
    fn name(&self) -> &str {
        "google-places"
    }

    fn nearby(&self, center: Coordinates) -> BoxFuture<'_, ProviderResult<Vec<Venue>>> {
        Box::pin(async move {
            let venues = self.search(center).await.map_err(|e| {
                warn!(error = %e, "places search failed");
                e.with_provider("google-places")
            })?;
            debug!(count = venues.len(), "places search returned venues");
            Ok(venues)
        })
    }
}

/// Response from the nearby search endpoint.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ApiPlace>,
    status: String,
    error_message: Option<String>,
}

/// A single candidate from the nearby search endpoint.
#[derive(Debug, Deserialize)]
struct ApiPlace {
    place_id: Option<String>,
    name: Option<String>,
    vicinity: Option<String>,
    rating: Option<f64>,
    price_level: Option<u8>,
    geometry: Option<ApiGeometry>,
    photos: Option<Vec<ApiPhoto>>,
}

#[derive(Debug, Deserialize)]
struct ApiGeometry {
    location: ApiLatLng,
}

#[derive(Debug, Deserialize)]
struct ApiLatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct ApiPhoto {
    photo_reference: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GooglePlacesClient {
        GooglePlacesClient::new(PlacesConfig::new("test-key"))
            .with_base_url(Url::parse(&server.uri()).unwrap())
    }

    fn place_json(id: &str, name: &str) -> serde_json::Value {
        serde_json::json!({
            "place_id": id,
            "name": name,
            "vicinity": "1 Test St",
            "rating": 4.2,
            "price_level": 2,
            "geometry": {"location": {"lat": 37.0, "lng": -122.0}}
        })
    }

    #[test]
    fn parse_search_response() {
        let json = r#"{
            "status": "OK",
            "results": [
                {
                    "place_id": "p1",
                    "name": "Cafe",
                    "vicinity": "1 Main St",
                    "rating": 4.5,
                    "price_level": 1,
                    "geometry": {"location": {"lat": 1.0, "lng": 2.0}},
                    "photos": [{"photo_reference": "ref-1"}]
                }
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, "OK");
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].place_id.as_deref(), Some("p1"));
    }

    #[test]
    fn convert_drops_incomplete_candidates() {
        let client = GooglePlacesClient::new(PlacesConfig::new("k"));

        let complete: ApiPlace = serde_json::from_value(place_json("p1", "Cafe")).unwrap();
        assert!(client.convert_place(complete).is_some());

        let missing_name: ApiPlace = serde_json::from_value(serde_json::json!({
            "place_id": "p2",
            "vicinity": "2 Side St",
            "geometry": {"location": {"lat": 1.0, "lng": 2.0}}
        }))
        .unwrap();
        assert!(client.convert_place(missing_name).is_none());

        let missing_geometry: ApiPlace = serde_json::from_value(serde_json::json!({
            "place_id": "p3",
            "name": "No Geometry",
            "vicinity": "3 Side St"
        }))
        .unwrap();
        assert!(client.convert_place(missing_geometry).is_none());
    }

    #[test]
    fn convert_defaults_rating_and_price() {
        let client = GooglePlacesClient::new(PlacesConfig::new("k"));
        let place: ApiPlace = serde_json::from_value(serde_json::json!({
            "place_id": "p1",
            "name": "Cafe",
            "vicinity": "1 Main St",
            "geometry": {"location": {"lat": 1.0, "lng": 2.0}}
        }))
        .unwrap();

        let venue = client.convert_place(place).unwrap();
        assert_eq!(venue.rating, 0.0);
        assert_eq!(venue.price_level, 0);
        assert!(venue.photo_url.is_none());
    }

    #[test]
    fn photo_url_embeds_width_and_key() {
        let client = GooglePlacesClient::new(PlacesConfig::new("secret-key"));
        let url = client.photo_url("ref-abc");
        assert!(url.starts_with("https://maps.googleapis.com/maps/api/place/photo?"));
        assert!(url.contains("maxwidth=400"));
        assert!(url.contains("photoreference=ref-abc"));
        assert!(url.contains("key=secret-key"));
    }

    #[tokio::test]
    async fn nearby_filters_and_preserves_order() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "status": "OK",
            "results": [
                place_json("p1", "First"),
                {"place_id": "p2", "vicinity": "no name", "geometry": {"location": {"lat": 0.0, "lng": 0.0}}},
                place_json("p3", "Third"),
            ]
        });

        Mock::given(method("GET"))
            .and(path("/maps/api/place/nearbysearch/json"))
            .and(query_param("radius", "2000"))
            .and(query_param("type", "restaurant"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let venues = client.nearby(Coordinates::new(37.0, -122.0)).await.unwrap();

        let ids: Vec<&str> = venues.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
    }

    #[tokio::test]
    async fn nearby_maps_request_denied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/place/nearbysearch/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "REQUEST_DENIED",
                "results": [],
                "error_message": "The provided API key is invalid."
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .nearby(Coordinates::new(37.0, -122.0))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
    }

    #[tokio::test]
    async fn nearby_maps_over_query_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/place/nearbysearch/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OVER_QUERY_LIMIT",
                "results": []
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .nearby(Coordinates::new(37.0, -122.0))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::RateLimited);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn nearby_maps_http_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/place/nearbysearch/json"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .nearby(Coordinates::new(37.0, -122.0))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
    }

    #[tokio::test]
    async fn nearby_zero_results_is_empty_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maps/api/place/nearbysearch/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ZERO_RESULTS",
                "results": []
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let venues = client.nearby(Coordinates::new(37.0, -122.0)).await.unwrap();
        assert!(venues.is_empty());
    }
}
