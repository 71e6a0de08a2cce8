//! A USGS feed fetcher implementing the `quakefeed::fetcher::Fetcher` trait.
//!
//! This crate provides a [`UsgsFetcher`] that performs the HTTP request
//! against the USGS FDSN event service and parses the GeoJSON response into
//! `EventRecord`s, plus a [`FeedQuery`] builder for assembling feed URLs.

use async_trait::async_trait;
use quakefeed::event::EventRecord;
use quakefeed::fetcher::{FetchError, Fetcher};
use serde::Deserialize;
use tracing::{debug, error, instrument};

const DEFAULT_ENDPOINT: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

/// Builder for FDSN event feed URLs.
///
/// Always requests the GeoJSON format; everything else is optional and left
/// out of the query string unless set.
///
/// # Examples
///
/// ```
/// use quakefeed_usgs::FeedQuery;
///
/// let url = FeedQuery::new()
///     .event_type("earthquake")
///     .order_by("time")
///     .min_magnitude(5.0)
///     .limit(10)
///     .to_url();
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FeedQuery {
    endpoint: String,
    event_type: Option<String>,
    order_by: Option<String>,
    min_magnitude: Option<f64>,
    limit: Option<u32>,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            event_type: None,
            order_by: None,
            min_magnitude: None,
            limit: None,
        }
    }
}

impl FeedQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the feed endpoint, mainly useful for pointing at a mirror
    /// or a test server.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    #[must_use]
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    #[must_use]
    pub fn min_magnitude(mut self, min_magnitude: f64) -> Self {
        self.min_magnitude = Some(min_magnitude);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Renders the query into the URL placed in a `LoadRequest`.
    #[must_use]
    pub fn to_url(&self) -> String {
        let mut url = format!("{}?format=geojson", self.endpoint);
        if let Some(event_type) = &self.event_type {
            url.push_str(&format!("&eventtype={event_type}"));
        }
        if let Some(order_by) = &self.order_by {
            url.push_str(&format!("&orderby={order_by}"));
        }
        if let Some(min_magnitude) = self.min_magnitude {
            url.push_str(&format!("&minmag={min_magnitude}"));
        }
        if let Some(limit) = self.limit {
            url.push_str(&format!("&limit={limit}"));
        }
        url
    }
}

/// GeoJSON envelope of the FDSN event service.
#[derive(Debug, Deserialize)]
struct FeedPayload {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: String,
    #[serde(default)]
    properties: Properties,
}

/// The service omits properties it has no value for, so every field is
/// optional and defaults apply at record construction.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Properties {
    mag: Option<f64>,
    place: Option<String>,
    time: Option<i64>,
    url: Option<String>,
}

impl Feature {
    fn into_record(self) -> EventRecord {
        EventRecord {
            id: self.id,
            magnitude: self.properties.mag.unwrap_or(0.0),
            place: self.properties.place.unwrap_or_default(),
            time: self.properties.time.unwrap_or(0),
            url: self.properties.url.unwrap_or_default(),
        }
    }
}

/// Fetcher for the USGS FDSN event feed.
///
/// Holds one shared HTTP client; construct it once and hand it to the
/// loaders or coordinator that need it.
pub struct UsgsFetcher {
    client: reqwest::Client,
}

impl UsgsFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for UsgsFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for UsgsFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<EventRecord>, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            error!(error = ?e, "feed request failed");
            FetchError::Network(e.to_string())
        })?;

        let status = response.status();
        debug!(%status, "received feed response");
        if !status.is_success() {
            return Err(FetchError::Network(format!(
                "feed returned HTTP status {status}"
            )));
        }

        let payload: FeedPayload = response.json().await.map_err(|e| {
            error!(error = ?e, "failed to parse feed payload");
            FetchError::Parse(e.to_string())
        })?;

        let records: Vec<EventRecord> = payload
            .features
            .into_iter()
            .map(Feature::into_record)
            .collect();
        debug!(count = records.len(), "parsed feed records");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quakefeed::loader::{LoadRequest, LoadResult, Loader};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const FEED_BODY: &str = r#"{
        "type": "FeatureCollection",
        "metadata": {"generated": 1560000000000, "count": 2, "title": "USGS Earthquakes"},
        "features": [
            {
                "type": "Feature",
                "id": "us7000abcd",
                "properties": {
                    "mag": 6.5,
                    "place": "74km NW of Rumoi, Japan",
                    "time": 1560000000000,
                    "url": "https://earthquake.usgs.gov/earthquakes/eventpage/us7000abcd",
                    "tsunami": 0
                }
            },
            {
                "type": "Feature",
                "id": "us7000efgh",
                "properties": {
                    "mag": 5.2,
                    "place": "Southern Sumatra, Indonesia",
                    "time": 1559990000000,
                    "url": "https://earthquake.usgs.gov/earthquakes/eventpage/us7000efgh",
                    "tsunami": 0
                }
            }
        ]
    }"#;

    #[test]
    fn test_query_defaults_to_bare_geojson_url() {
        let url = FeedQuery::new().to_url();
        assert_eq!(
            url,
            "https://earthquake.usgs.gov/fdsnws/event/1/query?format=geojson"
        );
    }

    #[test]
    fn test_query_renders_all_knobs() {
        let url = FeedQuery::new()
            .event_type("earthquake")
            .order_by("time")
            .min_magnitude(5.0)
            .limit(10)
            .to_url();
        assert_eq!(
            url,
            "https://earthquake.usgs.gov/fdsnws/event/1/query?format=geojson&eventtype=earthquake&orderby=time&minmag=5&limit=10"
        );
    }

    #[test]
    fn test_query_deserialization() {
        let json = r#"{
            "endpoint": "https://mirror.example.org/fdsnws/event/1/query",
            "min_magnitude": 4.5,
            "limit": 20
        }"#;

        let query: FeedQuery = serde_json::from_str(json).unwrap();
        assert_eq!(
            query.to_url(),
            "https://mirror.example.org/fdsnws/event/1/query?format=geojson&minmag=4.5&limit=20"
        );
    }

    #[tokio::test]
    async fn test_parses_feed_into_records() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(FEED_BODY)
            .create();

        let records = UsgsFetcher::new().fetch(&server.url()).await.unwrap();

        mock.assert();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "us7000abcd");
        assert_eq!(records[0].magnitude, 6.5);
        assert_eq!(records[0].place, "74km NW of Rumoi, Japan");
        assert_eq!(records[0].time, 1560000000000);
        assert_eq!(records[1].id, "us7000efgh");
    }

    #[tokio::test]
    async fn test_absent_properties_fall_back_to_defaults() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(r#"{"features": [{"id": "us7000zzzz", "properties": {"mag": null}}]}"#)
            .create();

        let records = UsgsFetcher::new().fetch(&server.url()).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "us7000zzzz");
        assert_eq!(records[0].magnitude, 0.0);
        assert_eq!(records[0].place, "");
        assert_eq!(records[0].time, 0);
        assert_eq!(records[0].url, "");
    }

    #[tokio::test]
    async fn test_empty_feed_yields_no_records() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(r#"{"type": "FeatureCollection", "features": []}"#)
            .create();

        let records = UsgsFetcher::new().fetch(&server.url()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html>definitely not geojson</html>")
            .create();

        let err = UsgsFetcher::new().fetch(&server.url()).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_a_network_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("GET", "/").with_status(500).create();

        let err = UsgsFetcher::new().fetch(&server.url()).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_network_error() {
        // nothing listens on this port
        let err = UsgsFetcher::new()
            .fetch("http://127.0.0.1:9/feed")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[tokio::test]
    async fn test_full_loader_cycle_hits_feed_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(FEED_BODY)
            .expect(1)
            .create();

        let loader = Loader::new(
            LoadRequest::new("recent", server.url()),
            Arc::new(UsgsFetcher::new()),
        );

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        loader.start(tx1);
        let first = timeout(Duration::from_secs(2), rx1.recv())
            .await
            .expect("no result within 2s")
            .unwrap();
        let LoadResult::Success(records) = &first else {
            panic!("expected a successful load, got {first:?}");
        };
        assert_eq!(records.len(), 2);

        // a detach/attach round-trip is served from cache
        loader.stop();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        loader.start(tx2);
        let second = timeout(Duration::from_secs(2), rx2.recv())
            .await
            .expect("no result within 2s")
            .unwrap();

        assert_eq!(first, second);
        mock.assert();
    }
}
