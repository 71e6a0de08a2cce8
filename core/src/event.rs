use serde::{Deserialize, Serialize};

/// A single seismic event parsed out of a remote feed.
///
/// Records are produced by fetchers and inspected by consumers; loaders only
/// carry them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Feed-stable identifier of the event.
    pub id: String,
    /// Magnitude as reported by the feed.
    pub magnitude: f64,
    /// Human-readable location, e.g. "74km NW of Rumoi, Japan".
    pub place: String,
    /// Origin time in milliseconds since the Unix epoch.
    pub time: i64,
    /// Detail page for the event.
    pub url: String,
}

impl EventRecord {
    pub fn new(
        id: impl Into<String>,
        magnitude: f64,
        place: impl Into<String>,
        time: i64,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            magnitude,
            place: place.into(),
            time,
            url: url.into(),
        }
    }
}
