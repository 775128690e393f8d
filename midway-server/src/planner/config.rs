//! Pipeline configuration.

use std::str::FromStr;
use std::time::Duration;

/// Error from reading or validating configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held something unparsable
    #[error("invalid value for {key}: {value:?}")]
    Unparsable { key: &'static str, value: String },

    /// A value parsed but is out of range
    #[error("{0}")]
    OutOfRange(String),
}

/// Pacing for travel-time queries against the routing backend.
///
/// The backend enforces a request-rate ceiling, so candidate timing runs in
/// small batches with fixed pauses. The values here are the base delays
/// for the default load; [`RateLimit::load_factor`] scales all of them up
/// when more work is in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimit {
    /// Candidates timed concurrently per batch.
    pub batch_size: usize,

    /// Pause between consecutive batches.
    pub inter_batch_delay: Duration,

    /// Pause between a candidate's two route queries.
    pub inter_query_delay: Duration,

    /// Lower bound of the random delay before a candidate's first query.
    pub jitter_min: Duration,

    /// Upper bound of the random delay before a candidate's first query.
    pub jitter_max: Duration,
}

/// Batch size the base delays are calibrated for.
const BASE_BATCH_SIZE: usize = 2;

/// Route queries per candidate the base delays are calibrated for.
pub const QUERIES_PER_CANDIDATE: usize = 2;

/// Candidate count the base delays are calibrated for.
const BASE_CANDIDATE_COUNT: usize = 10;

impl RateLimit {
    /// No pacing at all. Only useful against fakes.
    pub fn none() -> Self {
        Self {
            batch_size: BASE_BATCH_SIZE,
            inter_batch_delay: Duration::ZERO,
            inter_query_delay: Duration::ZERO,
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
        }
    }

    /// Multiplier applied to every delay for a given amount of work.
    ///
    /// Each term is the ratio of the actual value to its calibrated value,
    /// floored at 1, so the base delays are a floor. Eleven candidates
    /// instead of ten stretch every delay by 10%.
    pub fn load_factor(&self, candidate_count: usize, queries_per_candidate: usize) -> f64 {
        let (num, den) = self.load_ratio(candidate_count, queries_per_candidate);
        num as f64 / den as f64
    }

    /// Delays scaled for the given workload.
    ///
    /// Scaling is done in exact integer nanoseconds.
    pub fn scaled(&self, candidate_count: usize, queries_per_candidate: usize) -> Self {
        let (num, den) = self.load_ratio(candidate_count, queries_per_candidate);
        let scale = |delay: Duration| {
            let nanos = delay.as_nanos().saturating_mul(num) / den;
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        };
        Self {
            batch_size: self.batch_size,
            inter_batch_delay: scale(self.inter_batch_delay),
            inter_query_delay: scale(self.inter_query_delay),
            jitter_min: scale(self.jitter_min),
            jitter_max: scale(self.jitter_max),
        }
    }

    /// Load factor as a fraction `num / den`.
    fn load_ratio(&self, candidate_count: usize, queries_per_candidate: usize) -> (u128, u128) {
        let term = |actual: usize, base: usize| actual.max(base) as u128;
        let num = term(self.batch_size, BASE_BATCH_SIZE)
            .saturating_mul(term(queries_per_candidate, QUERIES_PER_CANDIDATE))
            .saturating_mul(term(candidate_count, BASE_CANDIDATE_COUNT));
        let den = (BASE_BATCH_SIZE * QUERIES_PER_CANDIDATE * BASE_CANDIDATE_COUNT) as u128;
        (num, den)
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            batch_size: BASE_BATCH_SIZE,
            inter_batch_delay: Duration::from_millis(800),
            inter_query_delay: Duration::from_millis(300),
            jitter_min: Duration::from_millis(100),
            jitter_max: Duration::from_millis(200),
        }
    }
}

/// Configuration parameters for a meeting-point search.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// How strongly unequal legs are penalised, in `[0, 1]`.
    pub balance_weight: f64,

    /// Maximum number of recommendations returned.
    pub max_results: usize,

    /// Radius of the nearby search around the midpoint (metres).
    pub search_radius_m: u32,

    /// Candidates kept after pruning; bounds the routing queries issued.
    pub max_candidates: usize,

    /// Radius of the nearby searches around each endpoint (metres).
    pub endpoint_radius_m: u32,

    /// Pacing of travel-time queries.
    pub rate_limit: RateLimit,

    /// Time limit for each address resolution.
    pub geocode_timeout: Duration,

    /// Time limit for each route query.
    pub route_timeout: Duration,

    /// Time limit for each nearby-station search.
    pub nearby_timeout: Duration,
}

impl PipelineConfig {
    /// Defaults overridden by `BALANCE_WEIGHT`, `MAX_RESULTS`,
    /// `SEARCH_RADIUS` and `MAX_CANDIDATES` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`PipelineConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "BALANCE_WEIGHT")? {
            config.balance_weight = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_RESULTS")? {
            config.max_results = v;
        }
        if let Some(v) = parse_var(&lookup, "SEARCH_RADIUS")? {
            config.search_radius_m = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_CANDIDATES")? {
            config.max_candidates = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the balance weight.
    pub fn with_balance_weight(mut self, weight: f64) -> Self {
        self.balance_weight = weight;
        self
    }

    /// Set the maximum number of recommendations.
    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = n;
        self
    }

    /// Set the maximum number of candidates kept after pruning.
    pub fn with_max_candidates(mut self, n: usize) -> Self {
        self.max_candidates = n;
        self
    }

    /// Set the query pacing.
    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Check every field is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.balance_weight) {
            return Err(ConfigError::OutOfRange(format!(
                "balance weight must be between 0 and 1, got {}",
                self.balance_weight
            )));
        }
        if self.max_results == 0 {
            return Err(ConfigError::OutOfRange(
                "max results must be at least 1".to_string(),
            ));
        }
        if self.max_candidates == 0 {
            return Err(ConfigError::OutOfRange(
                "max candidates must be at least 1".to_string(),
            ));
        }
        if self.search_radius_m == 0 || self.endpoint_radius_m == 0 {
            return Err(ConfigError::OutOfRange(
                "search radii must be positive".to_string(),
            ));
        }
        if self.rate_limit.batch_size == 0 {
            return Err(ConfigError::OutOfRange(
                "batch size must be at least 1".to_string(),
            ));
        }
        if self.rate_limit.jitter_min > self.rate_limit.jitter_max {
            return Err(ConfigError::OutOfRange(
                "jitter minimum exceeds maximum".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            balance_weight: 0.3,
            max_results: 5,
            search_radius_m: 3000,
            max_candidates: 10,
            endpoint_radius_m: 2000,
            rate_limit: RateLimit::default(),
            geocode_timeout: Duration::from_secs(10),
            route_timeout: Duration::from_secs(15),
            nearby_timeout: Duration::from_secs(10),
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Unparsable { key, value: raw }),
    }
}
