//! AMap web service HTTP client.
//!
//! Provides async methods for geocoding, transit routing and POI search,
//! and implements [`MapProvider`] on top of them.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{CandidateStation, Location, Route, StationSource};
use crate::provider::{MapProvider, ProviderError};

use super::convert::{
    ConversionError, convert_geocode, convert_stations, convert_transit, first_poi_location,
};
use super::error::AmapError;
use super::types::{GeocodeResponse, PlaceResponse, Poi, Status, TransitResponse};

/// Default base URL for the AMap web service API.
const DEFAULT_BASE_URL: &str = "https://restapi.amap.com";

/// Default city used to disambiguate addresses.
pub const DEFAULT_CITY: &str = "上海";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 3;

/// AMap POI type code for subway stations.
const SUBWAY_STATION_TYPE: &str = "150500";

/// Page size for nearby station searches.
const NEARBY_PAGE_SIZE: u32 = 25;

/// Largest radius AMap accepts for an around search, used when looking a
/// station up by name.
const STATION_LOOKUP_RADIUS_M: u32 = 50_000;

/// Configuration for the AMap client.
#[derive(Debug, Clone)]
pub struct AmapConfig {
    /// Web service key
    pub api_key: String,
    /// Base URL for the API (defaults to production AMap)
    pub base_url: String,
    /// City used for geocoding and transit queries
    pub city: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl AmapConfig {
    /// Create a new config with the given web service key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            city: DEFAULT_CITY.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the city.
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// AMap web service client.
///
/// Uses a semaphore to limit concurrent requests, on top of the pacing
/// the planner already applies.
#[derive(Debug, Clone)]
pub struct AmapClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    city: String,
    semaphore: Arc<Semaphore>,
}

impl AmapClient {
    /// Create a new AMap client with the given configuration.
    pub fn new(config: AmapConfig) -> Result<Self, AmapError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            city: config.city,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Structured geocoding. `None` when AMap has no match.
    pub async fn geocode_address(&self, address: &str) -> Result<Option<Location>, AmapError> {
        let resp: GeocodeResponse = self
            .get(
                "/v3/geocode/geo",
                &[("address", address), ("city", self.city.as_str())],
            )
            .await?;
        check_status(&resp.status)?;
        convert_geocode(&resp, address).map_err(invalid)
    }

    /// Keyword POI search, optionally restricted to a POI type code.
    pub async fn search_places(
        &self,
        keywords: &str,
        types: Option<&str>,
    ) -> Result<Vec<Poi>, AmapError> {
        let mut query = vec![("keywords", keywords), ("city", self.city.as_str())];
        if let Some(types) = types {
            query.push(("types", types));
        }
        let resp: PlaceResponse = self.get("/v3/place/text", &query).await?;
        check_status(&resp.status)?;
        Ok(resp.pois)
    }

    /// Subway stations whose name matches `name`, nearest to `near` first.
    pub async fn stations_named_near(
        &self,
        name: &str,
        near: &Location,
    ) -> Result<Vec<Poi>, AmapError> {
        let location = near.to_lng_lat();
        let radius = STATION_LOOKUP_RADIUS_M.to_string();
        let resp: PlaceResponse = self
            .get(
                "/v3/place/around",
                &[
                    ("keywords", name),
                    ("location", location.as_str()),
                    ("radius", radius.as_str()),
                    ("types", SUBWAY_STATION_TYPE),
                    ("sortrule", "distance"),
                ],
            )
            .await?;
        check_status(&resp.status)?;
        Ok(resp.pois)
    }

    /// First integrated transit plan between two points. `None` when AMap
    /// finds no plan.
    pub async fn transit(
        &self,
        origin: &Location,
        destination: &Location,
    ) -> Result<Option<Route>, AmapError> {
        let origin = origin.to_lng_lat();
        let destination = destination.to_lng_lat();
        let resp: TransitResponse = self
            .get(
                "/v3/direction/transit/integrated",
                &[
                    ("origin", origin.as_str()),
                    ("destination", destination.as_str()),
                    ("city", self.city.as_str()),
                    ("cityd", self.city.as_str()),
                    ("strategy", "0"),
                ],
            )
            .await?;
        check_status(&resp.status)?;
        convert_transit(&resp).map_err(invalid)
    }

    /// Subway stations around a point.
    pub async fn stations_around(
        &self,
        center: &Location,
        radius_m: u32,
    ) -> Result<Vec<CandidateStation>, AmapError> {
        let location = center.to_lng_lat();
        let radius = radius_m.to_string();
        let offset = NEARBY_PAGE_SIZE.to_string();
        let resp: PlaceResponse = self
            .get(
                "/v3/place/around",
                &[
                    ("location", location.as_str()),
                    ("radius", radius.as_str()),
                    ("types", SUBWAY_STATION_TYPE),
                    ("offset", offset.as_str()),
                ],
            )
            .await?;
        check_status(&resp.status)?;
        Ok(convert_stations(&resp.pois, StationSource::Nearby))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AmapError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| AmapError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("output", "JSON")])
            .query(query)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AmapError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmapError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| AmapError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }
}

fn check_status(status: &Status) -> Result<(), AmapError> {
    if status.is_ok() {
        return Ok(());
    }
    Err(AmapError::Status {
        code: status.infocode.clone().unwrap_or_default(),
        info: status
            .info
            .clone()
            .unwrap_or_else(|| "unknown error".to_string()),
    })
}

fn invalid(err: ConversionError) -> AmapError {
    AmapError::Invalid(err.to_string())
}

impl MapProvider for AmapClient {
    /// Structured geocoding first, then the first keyword POI match.
    async fn geocode(&self, address: &str) -> Result<Location, ProviderError> {
        if let Some(location) = self.geocode_address(address).await? {
            return Ok(location);
        }

        debug!(address, "no geocode match, falling back to place search");
        let pois = self.search_places(address, None).await?;
        first_poi_location(&pois)
            .map_err(invalid)?
            .map(|location| location.with_address(address))
            .ok_or_else(|| ProviderError::AddressNotFound(address.to_string()))
    }

    async fn transit_route(
        &self,
        origin: &Location,
        destination: &Location,
    ) -> Result<Route, ProviderError> {
        self.transit(origin, destination)
            .await?
            .ok_or(ProviderError::NoRouteFound)
    }

    async fn nearby_stations(
        &self,
        center: &Location,
        radius_m: u32,
    ) -> Result<Vec<CandidateStation>, ProviderError> {
        Ok(self.stations_around(center, radius_m).await?)
    }

    /// The same-named station closest to `near`, then any in the city.
    async fn locate_station(
        &self,
        name: &str,
        near: &Location,
    ) -> Result<Option<Location>, ProviderError> {
        let pois = self.stations_named_near(name, near).await?;
        if let Some(location) = first_poi_location(&pois).map_err(invalid)? {
            return Ok(Some(location));
        }

        debug!(name, "no station of that name nearby, searching the whole city");
        let pois = self.search_places(name, Some(SUBWAY_STATION_TYPE)).await?;
        Ok(first_poi_location(&pois).map_err(invalid)?)
    }
}
