//! Geographic coordinates and great-circle distance.

use std::fmt;

/// Mean Earth radius in metres used for Haversine distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Error returned when a coordinate is outside the valid WGS84 range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinate: {reason}")]
pub struct InvalidCoordinate {
    reason: String,
}

impl InvalidCoordinate {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A geographic point, optionally carrying the address it was resolved from.
///
/// Longitude comes first, matching the `"lng,lat"` convention of the
/// mapping backend. A `Location` is always finite and within
/// `[-180, 180] × [-90, 90]`.
///
/// # Examples
///
/// ```
/// use midway_server::domain::Location;
///
/// let loc = Location::parse_lng_lat("116.397428,39.90923").unwrap();
/// assert_eq!(loc.lng(), 116.397428);
/// assert_eq!(loc.lat(), 39.90923);
///
/// assert!(Location::parse_lng_lat("116.39").is_err());
/// assert!(Location::new(200.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    lng: f64,
    lat: f64,
    address: Option<String>,
}

impl Location {
    /// Create a location from longitude and latitude in degrees.
    pub fn new(lng: f64, lat: f64) -> Result<Self, InvalidCoordinate> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(InvalidCoordinate::new("coordinates must be finite"));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(InvalidCoordinate::new(format!(
                "longitude {lng} out of range"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidCoordinate::new(format!(
                "latitude {lat} out of range"
            )));
        }
        Ok(Self {
            lng,
            lat,
            address: None,
        })
    }

    /// Parse a `"lng,lat"` pair as used by the mapping backend.
    pub fn parse_lng_lat(s: &str) -> Result<Self, InvalidCoordinate> {
        let (lng, lat) = s
            .split_once(',')
            .ok_or_else(|| InvalidCoordinate::new(format!("expected \"lng,lat\", got {s:?}")))?;

        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| InvalidCoordinate::new(format!("bad longitude in {s:?}")))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| InvalidCoordinate::new(format!("bad latitude in {s:?}")))?;

        Self::new(lng, lat)
    }

    /// Attach the human-readable address this location was resolved from.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Arithmetic midpoint of two locations.
    ///
    /// This is a search anchor, not a geodesic midpoint. The result never
    /// carries an address.
    pub fn midpoint(a: &Location, b: &Location) -> Location {
        Location {
            lng: (a.lng + b.lng) / 2.0,
            lat: (a.lat + b.lat) / 2.0,
            address: None,
        }
    }

    /// Great-circle distance to `other` in metres (Haversine formula).
    pub fn haversine_distance(&self, other: &Location) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let delta_phi = (other.lat - self.lat).to_radians();
        let delta_lambda = (other.lng - self.lng).to_radians();

        // Rounding can push `a` just past 1 for near-antipodal points.
        let a = ((delta_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2))
        .min(1.0);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Format as `"lng,lat"` for backend query strings.
    pub fn to_lng_lat(&self) -> String {
        format!("{:.6},{:.6}", self.lng, self.lat)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(address) => write!(f, "{address} ({:.6},{:.6})", self.lng, self.lat),
            None => write!(f, "({:.6},{:.6})", self.lng, self.lat),
        }
    }
}
