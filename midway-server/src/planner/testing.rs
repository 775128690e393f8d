//! In-memory map provider for planner tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::{CandidateStation, Location, Route, RouteStop, StationSource};
use crate::provider::{MapProvider, ProviderError};

pub fn loc(lng: f64, lat: f64) -> Location {
    Location::new(lng, lat).unwrap()
}

pub fn station(name: &str, lng: f64, lat: f64) -> CandidateStation {
    CandidateStation::new(name, loc(lng, lat), StationSource::Nearby)
}

pub fn route(duration: f64, stops: &[(&str, Option<(f64, f64)>)]) -> Route {
    Route {
        duration,
        distance: duration * 8.0,
        walking_distance: 400.0,
        subway_stops: stops
            .iter()
            .map(|(name, coord)| RouteStop::new(*name, coord.map(|(lng, lat)| loc(lng, lat))))
            .collect(),
    }
}

/// A recorded call against the fake.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Geocode(String),
    Route { from: String, to: String },
    Nearby { center: String, radius_m: u32 },
    Locate(String),
}

fn key(location: &Location) -> String {
    location.to_lng_lat()
}

/// Scriptable [`MapProvider`] that records every call with its (virtual) time.
#[derive(Default)]
pub struct FakeMaps {
    geocodes: HashMap<String, Location>,
    routes: HashMap<(String, String), Route>,
    failing_route_ends: HashSet<String>,
    nearby: HashMap<String, Vec<CandidateStation>>,
    failing_nearby: HashSet<String>,
    slow_nearby: HashMap<String, Duration>,
    located: HashMap<String, Location>,
    route_latency: Duration,
    geocode_latency: Duration,
    locate_latency: Duration,
    calls: Mutex<Vec<(Call, Instant)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geocode(&mut self, address: &str, location: Location) {
        self.geocodes
            .insert(address.to_string(), location.with_address(address));
    }

    pub fn add_route(&mut self, from: &Location, to: &Location, route: Route) {
        self.routes.insert((key(from), key(to)), route);
    }

    /// Time a candidate: `a` seconds from `start`, `b` seconds to `end`.
    pub fn add_timing(
        &mut self,
        start: &Location,
        end: &Location,
        candidate: &Location,
        a: f64,
        b: f64,
    ) {
        self.add_route(start, candidate, route(a, &[]));
        self.add_route(candidate, end, route(b, &[]));
    }

    /// Any route query starting or ending at `location` fails.
    pub fn fail_routes_at(&mut self, location: &Location) {
        self.failing_route_ends.insert(key(location));
    }

    pub fn add_nearby(&mut self, center: &Location, stations: Vec<CandidateStation>) {
        self.nearby.insert(key(center), stations);
    }

    pub fn fail_nearby_at(&mut self, center: &Location) {
        self.failing_nearby.insert(key(center));
    }

    /// Nearby searches centred on `center` take `latency` to answer.
    pub fn slow_nearby_at(&mut self, center: &Location, latency: Duration) {
        self.slow_nearby.insert(key(center), latency);
    }

    pub fn add_located(&mut self, name: &str, location: Location) {
        self.located.insert(name.to_string(), location);
    }

    pub fn with_route_latency(mut self, latency: Duration) -> Self {
        self.route_latency = latency;
        self
    }

    pub fn with_geocode_latency(mut self, latency: Duration) -> Self {
        self.geocode_latency = latency;
        self
    }

    pub fn with_locate_latency(mut self, latency: Duration) -> Self {
        self.locate_latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<(Call, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn route_calls(&self) -> Vec<(String, String, Instant)> {
        self.calls()
            .into_iter()
            .filter_map(|(call, at)| match call {
                Call::Route { from, to } => Some((from, to, at)),
                _ => None,
            })
            .collect()
    }

    pub fn nearby_calls(&self) -> Vec<(String, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|(call, _)| match call {
                Call::Nearby { center, radius_m } => Some((center, radius_m)),
                _ => None,
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((call, Instant::now()));
    }
}

impl MapProvider for FakeMaps {
    async fn geocode(&self, address: &str) -> Result<Location, ProviderError> {
        self.record(Call::Geocode(address.to_string()));
        if !self.geocode_latency.is_zero() {
            tokio::time::sleep(self.geocode_latency).await;
        }
        self.geocodes
            .get(address)
            .cloned()
            .ok_or_else(|| ProviderError::AddressNotFound(address.to_string()))
    }

    async fn transit_route(
        &self,
        origin: &Location,
        destination: &Location,
    ) -> Result<Route, ProviderError> {
        let (from, to) = (key(origin), key(destination));
        self.record(Call::Route {
            from: from.clone(),
            to: to.clone(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.route_latency.is_zero() {
            tokio::time::sleep(self.route_latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_route_ends.contains(&from) || self.failing_route_ends.contains(&to) {
            return Err(ProviderError::Service("scripted failure".to_string()));
        }
        self.routes
            .get(&(from, to))
            .cloned()
            .ok_or(ProviderError::NoRouteFound)
    }

    async fn nearby_stations(
        &self,
        center: &Location,
        radius_m: u32,
    ) -> Result<Vec<CandidateStation>, ProviderError> {
        let center = key(center);
        self.record(Call::Nearby {
            center: center.clone(),
            radius_m,
        });
        if let Some(latency) = self.slow_nearby.get(&center) {
            tokio::time::sleep(*latency).await;
        }
        if self.failing_nearby.contains(&center) {
            return Err(ProviderError::Service("scripted nearby failure".to_string()));
        }
        Ok(self.nearby.get(&center).cloned().unwrap_or_default())
    }

    async fn locate_station(
        &self,
        name: &str,
        _near: &Location,
    ) -> Result<Option<Location>, ProviderError> {
        self.record(Call::Locate(name.to_string()));
        if !self.locate_latency.is_zero() {
            tokio::time::sleep(self.locate_latency).await;
        }
        Ok(self.located.get(name).cloned())
    }
}
