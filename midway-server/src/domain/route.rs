//! Transit itineraries returned by the routing backend.

use std::collections::HashSet;

use super::Location;

/// A subway stop that a route passes through.
///
/// The backend usually reports coordinates for stops, but they are not
/// guaranteed.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStop {
    pub name: String,
    pub location: Option<Location>,
}

impl RouteStop {
    pub fn new(name: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

/// One transit itinerary between two locations.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Total duration in seconds.
    pub duration: f64,

    /// Total distance in metres.
    pub distance: f64,

    /// Walking distance in metres, already included in `duration`.
    pub walking_distance: f64,

    /// Subway stops passed through, in travel order. May repeat across
    /// line changes.
    pub subway_stops: Vec<RouteStop>,
}

impl Route {
    /// Distinct subway station names, in first-seen order.
    pub fn subway_station_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.subway_stops
            .iter()
            .map(|stop| stop.name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Distinct subway stops, keeping the first occurrence of each name.
    pub fn distinct_subway_stops(&self) -> Vec<&RouteStop> {
        let mut seen = HashSet::new();
        self.subway_stops
            .iter()
            .filter(|stop| seen.insert(stop.name.as_str()))
            .collect()
    }

    /// Whether the duration is usable for scoring.
    pub fn has_valid_duration(&self) -> bool {
        self.duration.is_finite() && self.duration >= 0.0
    }
}
