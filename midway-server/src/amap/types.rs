//! AMap web service response DTOs.
//!
//! These types map directly to the AMap v3 JSON responses. AMap sends
//! numbers as strings and encodes an empty string as `[]`, so scalar
//! fields are decoded with [`lenient_string`] and parsed during conversion.

use serde::{Deserialize, Deserializer};

/// Envelope fields shared by every AMap response.
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    /// `"1"` on success, `"0"` on failure.
    pub status: String,

    /// Human-readable status, e.g. `"OK"` or `"INVALID_USER_KEY"`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub info: Option<String>,

    /// Numeric status code, e.g. `"10000"`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub infocode: Option<String>,
}

impl Status {
    /// Whether AMap reported success.
    pub fn is_ok(&self) -> bool {
        self.status == "1"
    }
}

/// Response from `/v3/geocode/geo`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponse {
    #[serde(flatten)]
    pub status: Status,

    #[serde(default)]
    pub geocodes: Vec<Geocode>,
}

/// A single structured geocoding match.
#[derive(Debug, Clone, Deserialize)]
pub struct Geocode {
    #[serde(default, deserialize_with = "lenient_string")]
    pub formatted_address: Option<String>,

    /// `"lng,lat"`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
}

/// Response from `/v3/place/text` and `/v3/place/around`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceResponse {
    #[serde(flatten)]
    pub status: Status,

    #[serde(default)]
    pub pois: Vec<Poi>,
}

/// A point of interest.
#[derive(Debug, Clone, Deserialize)]
pub struct Poi {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,

    /// `"lng,lat"`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,

    /// Distance from the search centre in metres (place/around only).
    #[serde(default, deserialize_with = "lenient_string")]
    pub distance: Option<String>,
}

/// Response from `/v3/direction/transit/integrated`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitResponse {
    #[serde(flatten)]
    pub status: Status,

    pub route: Option<TransitRoute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitRoute {
    #[serde(default)]
    pub transits: Vec<Transit>,
}

/// One complete transit plan.
#[derive(Debug, Clone, Deserialize)]
pub struct Transit {
    /// Seconds.
    #[serde(default, deserialize_with = "lenient_string")]
    pub duration: Option<String>,

    /// Metres.
    #[serde(default, deserialize_with = "lenient_string")]
    pub distance: Option<String>,

    /// Metres.
    #[serde(default, deserialize_with = "lenient_string")]
    pub walking_distance: Option<String>,

    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// A leg of a transit plan. Only the bus part carries subway lines.
#[derive(Debug, Clone, Deserialize)]
pub struct Segment {
    pub bus: Option<BusSegment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusSegment {
    #[serde(default)]
    pub buslines: Vec<BusLine>,
}

/// A bus or subway line ridden within a segment.
#[derive(Debug, Clone, Deserialize)]
pub struct BusLine {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    /// Line type, e.g. `"地铁线路"` or `"普通公交线路"`.
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub line_type: Option<String>,

    pub departure_stop: Option<Stop>,

    pub arrival_stop: Option<Stop>,

    #[serde(default)]
    pub via_stops: Vec<Stop>,
}

impl BusLine {
    /// Whether this line is a subway line.
    pub fn is_subway(&self) -> bool {
        self.line_type
            .as_deref()
            .is_some_and(|t| t.contains("地铁"))
    }
}

/// A stop on a line.
#[derive(Debug, Clone, Deserialize)]
pub struct Stop {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    /// `"lng,lat"`, sometimes missing or `[]`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
}

/// Decode a scalar that AMap may send as a string, a number, `[]` or null.
///
/// Empty strings and empty arrays become `None`.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        List(Vec<serde_json::Value>),
        Null,
    }

    let value = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => Some(s),
        Some(Raw::Number(n)) => Some(n.to_string()),
        Some(Raw::List(items)) => items
            .into_iter()
            .next()
            .and_then(|v| v.as_str().map(str::to_string)),
        Some(Raw::Null) | None => None,
    };

    Ok(value.filter(|s| !s.trim().is_empty()))
}
