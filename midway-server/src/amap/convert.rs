//! Conversion from AMap DTOs to domain types.

use tracing::debug;

use crate::domain::{CandidateStation, InvalidCoordinate, Location, Route, RouteStop, StationSource};

use super::types::{BusLine, GeocodeResponse, Poi, Stop, Transit, TransitResponse};

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// A `"lng,lat"` string could not be parsed
    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinate),

    /// A numeric field held something other than a number
    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Suffixes AMap appends to subway station POI names.
const STATION_SUFFIXES: [&str; 2] = ["(地铁站)", "（地铁站）"];

/// Strip the POI category suffix so POI names match route stop names.
pub fn station_name(raw: &str) -> &str {
    let raw = raw.trim();
    STATION_SUFFIXES
        .iter()
        .find_map(|suffix| raw.strip_suffix(suffix))
        .map(str::trim_end)
        .unwrap_or(raw)
}

/// First structured geocoding match, tagged with the queried address.
pub fn convert_geocode(
    resp: &GeocodeResponse,
    address: &str,
) -> Result<Option<Location>, ConversionError> {
    let Some(raw) = resp.geocodes.iter().find_map(|g| g.location.as_deref()) else {
        return Ok(None);
    };
    Ok(Some(Location::parse_lng_lat(raw)?.with_address(address)))
}

/// Location of the first POI that has one.
pub fn first_poi_location(pois: &[Poi]) -> Result<Option<Location>, ConversionError> {
    let Some(poi) = pois.iter().find(|p| p.location.is_some()) else {
        return Ok(None);
    };
    poi_location(poi).map(Some)
}

fn poi_location(poi: &Poi) -> Result<Location, ConversionError> {
    let raw = poi
        .location
        .as_deref()
        .ok_or(ConversionError::MissingField("location"))?;
    let location = Location::parse_lng_lat(raw)?;
    Ok(match &poi.address {
        Some(address) => location.with_address(address.clone()),
        None => location,
    })
}

/// Convert subway station POIs into candidates.
///
/// POIs without a name or with an unusable location are skipped rather
/// than failing the whole search.
pub fn convert_stations(pois: &[Poi], source: StationSource) -> Vec<CandidateStation> {
    pois.iter()
        .filter_map(|poi| {
            let name = poi.name.as_deref().map(station_name)?;
            match poi_location(poi) {
                Ok(location) => {
                    let candidate = CandidateStation::new(name, location, source);
                    Some(match &poi.address {
                        Some(address) => candidate.with_address(address.clone()),
                        None => candidate,
                    })
                }
                Err(e) => {
                    debug!(station = name, error = %e, "skipping station POI");
                    None
                }
            }
        })
        .collect()
}

/// Convert the first transit plan into a [`Route`].
///
/// Returns `None` when AMap found no plan.
pub fn convert_transit(resp: &TransitResponse) -> Result<Option<Route>, ConversionError> {
    let Some(transit) = resp.route.as_ref().and_then(|r| r.transits.first()) else {
        return Ok(None);
    };
    convert_plan(transit).map(Some)
}

fn convert_plan(transit: &Transit) -> Result<Route, ConversionError> {
    let duration = transit
        .duration
        .as_deref()
        .ok_or(ConversionError::MissingField("duration"))?;

    let subway_stops = transit
        .segments
        .iter()
        .filter_map(|segment| segment.bus.as_ref())
        .flat_map(|bus| bus.buslines.iter())
        .filter(|line| line.is_subway())
        .flat_map(line_stops)
        .collect();

    Ok(Route {
        duration: parse_number("duration", duration)?,
        distance: optional_number("distance", transit.distance.as_deref())?,
        walking_distance: optional_number("walking_distance", transit.walking_distance.as_deref())?,
        subway_stops,
    })
}

/// Departure, via and arrival stops of a line, in travel order.
fn line_stops(line: &BusLine) -> Vec<RouteStop> {
    line.departure_stop
        .iter()
        .chain(line.via_stops.iter())
        .chain(line.arrival_stop.iter())
        .filter_map(convert_stop)
        .collect()
}

fn convert_stop(stop: &Stop) -> Option<RouteStop> {
    let name = stop.name.as_deref()?;
    // A stop with a garbled coordinate is still worth keeping by name.
    let location = stop
        .location
        .as_deref()
        .and_then(|raw| Location::parse_lng_lat(raw).ok());
    Some(RouteStop::new(station_name(name), location))
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, ConversionError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ConversionError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

fn optional_number(field: &'static str, value: Option<&str>) -> Result<f64, ConversionError> {
    value.map_or(Ok(0.0), |v| parse_number(field, v))
}
