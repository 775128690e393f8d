//! Geocoding and routing collaborator interface.
//!
//! The pipeline never talks to a mapping backend directly. Callers pass in
//! something implementing [`MapProvider`]: the AMap HTTP client in
//! production, a fake in tests.

use std::future::Future;
use std::time::Duration;

use crate::domain::{CandidateStation, Location, Route};

/// Errors reported by a [`MapProvider`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// The address could not be resolved to a coordinate
    #[error("address not found: {0}")]
    AddressNotFound(String),

    /// No transit itinerary exists between the two points
    #[error("no transit route found")]
    NoRouteFound,

    /// The backend did not answer in time
    #[error("{operation} timed out after {}s", after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Any other backend failure
    #[error("map service error: {0}")]
    Service(String),
}

/// The mapping backend as seen by the pipeline.
///
/// All futures are `Send` so a pipeline run can live inside a
/// multi-threaded server task.
pub trait MapProvider: Sync {
    /// Resolve a free-form address to a location.
    ///
    /// Implementations own any fallback strategy (e.g. a POI search when
    /// structured geocoding finds nothing).
    fn geocode(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Location, ProviderError>> + Send;

    /// Find a public transit itinerary between two points.
    fn transit_route(
        &self,
        origin: &Location,
        destination: &Location,
    ) -> impl Future<Output = Result<Route, ProviderError>> + Send;

    /// Subway stations within `radius_m` metres of `center`.
    ///
    /// An empty result is not an error.
    fn nearby_stations(
        &self,
        center: &Location,
        radius_m: u32,
    ) -> impl Future<Output = Result<Vec<CandidateStation>, ProviderError>> + Send;

    /// Resolve a station name to a coordinate, searching near `near`.
    ///
    /// Used for route stops that came back without coordinates. Providers
    /// that can't do this keep the default.
    fn locate_station(
        &self,
        name: &str,
        near: &Location,
    ) -> impl Future<Output = Result<Option<Location>, ProviderError>> + Send {
        let _ = (name, near);
        async { Ok(None) }
    }
}

/// Bound a provider call by `limit`, reporting expiry as [`ProviderError::Timeout`].
pub(crate) async fn with_timeout<T>(
    operation: &'static str,
    limit: Duration,
    call: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(ProviderError::Timeout {
            operation,
            after: limit,
        }))
}
