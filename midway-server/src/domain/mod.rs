//! Domain types for the meeting-point planner.
//!
//! Coordinates are validated when a [`Location`] is built, so code that
//! receives one can trust it lies on the globe.

mod candidate;
mod location;
mod route;

pub use candidate::{CandidateStation, StationSource};
pub use location::{EARTH_RADIUS_M, InvalidCoordinate, Location};
pub use route::{Route, RouteStop};
