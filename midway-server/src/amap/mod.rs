//! AMap (高德地图) web service client.
//!
//! Key characteristics of the AMap v3 API:
//! - Coordinates are `"lng,lat"` strings in GCJ-02
//! - Numbers arrive as strings, and empty values are often `[]`
//! - A `200 OK` can still carry a failure; the `status` field is `"0"` then

mod client;
mod convert;
mod error;
mod types;

pub use client::{AmapClient, AmapConfig, DEFAULT_CITY};
pub use convert::{ConversionError, station_name};
pub use error::AmapError;
pub use types::{
    BusLine, Geocode, GeocodeResponse, Poi, PlaceResponse, Status, Stop, Transit, TransitResponse,
};
