//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Location, Route};
use crate::planner::{MeetingPlan, ScoredCandidate};

/// Query for the middle-stations endpoint.
///
/// Fields are optional so that missing ones produce a JSON error body
/// rather than axum's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct MiddleStationsRequest {
    /// First traveller's address
    pub start: Option<String>,

    /// Second traveller's address
    pub end: Option<String>,

    /// Override for the configured balance weight
    pub balance_weight: Option<f64>,
}

/// A resolved location.
#[derive(Debug, Serialize, Deserialize)]
pub struct LocationResult {
    pub lng: f64,
    pub lat: f64,
    pub address: Option<String>,
}

impl LocationResult {
    pub fn from_location(location: &Location) -> Self {
        Self {
            lng: location.lng(),
            lat: location.lat(),
            address: location.address().map(str::to_string),
        }
    }
}

/// Summary of the direct route between the two travellers.
#[derive(Debug, Serialize, Deserialize)]
pub struct RouteSummary {
    /// Seconds
    pub duration: f64,

    /// Metres
    pub distance: f64,

    /// Metres
    pub walking_distance: f64,

    /// Distinct subway stations passed, in travel order
    pub subway_stations: Vec<String>,
}

impl RouteSummary {
    pub fn from_route(route: &Route) -> Self {
        Self {
            duration: route.duration,
            distance: route.distance,
            walking_distance: route.walking_distance,
            subway_stations: route
                .subway_station_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// A recommended meeting station.
#[derive(Debug, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    pub address: Option<String>,
    pub location: LocationResult,

    /// Which discovery strategy found the station
    pub source: String,

    pub time_from_start: f64,
    pub time_to_end: f64,
    pub distance_from_start: f64,
    pub distance_to_end: f64,
    pub max_time: f64,
    pub time_diff: f64,
    pub total_time: f64,
    pub score: f64,
    pub balance_score: f64,
}

impl Recommendation {
    pub fn from_scored(scored: &ScoredCandidate) -> Self {
        let station = &scored.station;
        Self {
            name: station.name.clone(),
            address: station.address.clone(),
            location: LocationResult::from_location(&station.location),
            source: station.source.to_string(),
            time_from_start: scored.time_from_start,
            time_to_end: scored.time_to_end,
            distance_from_start: scored.distance_from_start,
            distance_to_end: scored.distance_to_end,
            max_time: scored.max_time,
            time_diff: scored.time_diff,
            total_time: scored.total_time,
            score: scored.score,
            balance_score: scored.balance_score,
        }
    }
}

/// Response from the middle-stations endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeetingPlanResponse {
    pub start_location: LocationResult,
    pub end_location: LocationResult,
    pub main_route: RouteSummary,

    /// Best first
    pub recommendations: Vec<Recommendation>,

    /// Candidates considered after deduplication and pruning
    pub total_candidates: usize,
}

impl MeetingPlanResponse {
    pub fn from_plan(plan: &MeetingPlan) -> Self {
        Self {
            start_location: LocationResult::from_location(&plan.start_location),
            end_location: LocationResult::from_location(&plan.end_location),
            main_route: RouteSummary::from_route(&plan.main_route),
            recommendations: plan
                .recommendations
                .iter()
                .map(Recommendation::from_scored)
                .collect(),
            total_candidates: plan.total_candidates,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
