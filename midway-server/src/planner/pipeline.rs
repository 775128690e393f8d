//! The meeting-point search pipeline.
//!
//! Phases run strictly in sequence: geocode both addresses, fetch the
//! main route between them, collect candidates, time each candidate, rank.
//! Only the timing phase issues queries concurrently.

use tracing::{Instrument, debug, info, info_span};

use crate::domain::{Location, Route};
use crate::provider::{MapProvider, ProviderError, with_timeout};

use super::collect::collect;
use super::config::{ConfigError, PipelineConfig};
use super::score::{ScoredCandidate, rank};
use super::timing::annotate;

/// Errors that end a search.
///
/// Every variant renders as a message a user can read.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// One of the addresses could not be resolved
    #[error("could not locate {address:?}: {source}")]
    GeocodeFailed {
        address: String,
        source: ProviderError,
    },

    /// No transit route connects the two addresses
    #[error("no transit route between the two addresses: {0}")]
    NoRouteFound(ProviderError),

    /// No station survived discovery and timing
    #[error("no suitable subway stations found between the two addresses")]
    NoCandidatesFound,

    /// The search was configured with out-of-range values
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Result of a successful search.
#[derive(Debug, Clone)]
pub struct MeetingPlan {
    pub start_location: Location,
    pub end_location: Location,

    /// Direct transit route between the two travellers.
    pub main_route: Route,

    /// Best stations, best first.
    pub recommendations: Vec<ScoredCandidate>,

    /// Candidates considered after deduplication and pruning.
    pub total_candidates: usize,
}

/// Meeting-point planner bound to a map provider.
pub struct Planner<'a, P: MapProvider> {
    provider: &'a P,
    config: &'a PipelineConfig,
}

impl<'a, P: MapProvider> Planner<'a, P> {
    /// Create a new planner.
    pub fn new(provider: &'a P, config: &'a PipelineConfig) -> Self {
        Self { provider, config }
    }

    /// Find the fairest subway stations for two travellers.
    pub async fn plan(
        &self,
        start_address: &str,
        end_address: &str,
    ) -> Result<MeetingPlan, PipelineError> {
        let span = info_span!("find_middle_stations", start = %start_address, end = %end_address);
        self.run(start_address, end_address).instrument(span).await
    }

    async fn run(
        &self,
        start_address: &str,
        end_address: &str,
    ) -> Result<MeetingPlan, PipelineError> {
        self.config.validate()?;

        let start_location = self.geocode(start_address).await?;
        let end_location = self.geocode(end_address).await?;
        debug!(start = %start_location, end = %end_location, "addresses resolved");

        let main_route = with_timeout(
            "route query",
            self.config.route_timeout,
            self.provider.transit_route(&start_location, &end_location),
        )
        .await
        .map_err(PipelineError::NoRouteFound)?;
        info!(
            duration_s = main_route.duration,
            stops = main_route.subway_stops.len(),
            "main route found"
        );

        let candidates = collect(
            self.provider,
            &start_location,
            &end_location,
            &main_route,
            self.config,
        )
        .await?;
        let total_candidates = candidates.len();

        let timed = annotate(
            self.provider,
            &start_location,
            &end_location,
            &candidates,
            self.config,
        )
        .await;
        if timed.is_empty() {
            return Err(PipelineError::NoCandidatesFound);
        }

        let recommendations = rank(timed, self.config.balance_weight, self.config.max_results);
        info!(
            total_candidates,
            recommendations = recommendations.len(),
            "search complete"
        );

        Ok(MeetingPlan {
            start_location,
            end_location,
            main_route,
            recommendations,
            total_candidates,
        })
    }

    async fn geocode(&self, address: &str) -> Result<Location, PipelineError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(PipelineError::GeocodeFailed {
                address: String::new(),
                source: ProviderError::AddressNotFound("empty address".to_string()),
            });
        }

        with_timeout(
            "geocode",
            self.config.geocode_timeout,
            self.provider.geocode(address),
        )
        .await
        .map_err(|source| PipelineError::GeocodeFailed {
            address: address.to_string(),
            source,
        })
    }
}

/// Find the fairest subway stations between two addresses.
///
/// Convenience wrapper around [`Planner::plan`].
pub async fn find_middle_stations<P: MapProvider>(
    provider: &P,
    start_address: &str,
    end_address: &str,
    config: &PipelineConfig,
) -> Result<MeetingPlan, PipelineError> {
    Planner::new(provider, config)
        .plan(start_address, end_address)
        .await
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
