//! Travel-time aggregation for candidate stations.
//!
//! Each candidate needs two route queries (start → station and
//! station → end). The routing backend enforces a request-rate ceiling,
//! so candidates are timed in small batches:
//!
//! - a random jitter before each candidate's first query,
//! - a fixed pause between a candidate's two queries,
//! - a fixed pause between batches.
//!
//! All pauses grow with the amount of work (see [`RateLimit::scaled`]).
//! A candidate whose timing fails for any reason is dropped; the batch
//! carries on without it.

use std::time::Duration;

use futures::future::join_all;
use rand::Rng;
use tracing::{debug, info};

use crate::domain::{CandidateStation, Location, Route};
use crate::provider::{MapProvider, ProviderError, with_timeout};

use super::config::{PipelineConfig, QUERIES_PER_CANDIDATE, RateLimit};

/// A candidate station with travel times from both endpoints.
///
/// Both times are finite and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedCandidate {
    pub station: CandidateStation,

    /// Seconds from the start location to the station.
    pub time_from_start: f64,

    /// Seconds from the station to the end location.
    pub time_to_end: f64,

    /// Metres from the start location to the station.
    pub distance_from_start: f64,

    /// Metres from the station to the end location.
    pub distance_to_end: f64,
}

/// Why a single candidate could not be timed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimingError {
    /// The start → station query failed
    #[error("route from start failed: {0}")]
    FromStart(ProviderError),

    /// The station → end query failed
    #[error("route to end failed: {0}")]
    ToEnd(ProviderError),

    /// The backend reported a duration we can't score
    #[error("unusable duration {0}")]
    InvalidDuration(f64),
}

/// Attach travel times to every candidate that can be timed.
///
/// Output keeps the input order, minus candidates that failed.
pub async fn annotate<P: MapProvider>(
    provider: &P,
    start: &Location,
    end: &Location,
    candidates: &[CandidateStation],
    config: &PipelineConfig,
) -> Vec<TimedCandidate> {
    let pacing = config
        .rate_limit
        .scaled(candidates.len(), QUERIES_PER_CANDIDATE);
    let batch_size = pacing.batch_size.max(1);
    let mut timed = Vec::with_capacity(candidates.len());

    for (batch_index, batch) in candidates.chunks(batch_size).enumerate() {
        if batch_index > 0 {
            pause(pacing.inter_batch_delay).await;
        }

        let results = join_all(batch.iter().map(|candidate| {
            time_candidate(provider, start, end, candidate, &pacing, config.route_timeout)
        }))
        .await;

        for (candidate, result) in batch.iter().zip(results) {
            match result {
                Ok(t) => timed.push(t),
                Err(e) => debug!(station = %candidate.name, error = %e, "dropping candidate"),
            }
        }
    }

    info!(
        candidates = candidates.len(),
        timed = timed.len(),
        "travel times collected"
    );

    timed
}

/// Run both route queries for one candidate.
async fn time_candidate<P: MapProvider>(
    provider: &P,
    start: &Location,
    end: &Location,
    candidate: &CandidateStation,
    pacing: &RateLimit,
    route_timeout: Duration,
) -> Result<TimedCandidate, TimingError> {
    pause(jitter(pacing.jitter_min, pacing.jitter_max)).await;

    let outbound = with_timeout(
        "route query",
        route_timeout,
        provider.transit_route(start, &candidate.location),
    )
    .await
    .map_err(TimingError::FromStart)?;
    check_duration(&outbound)?;

    pause(pacing.inter_query_delay).await;

    let inbound = with_timeout(
        "route query",
        route_timeout,
        provider.transit_route(&candidate.location, end),
    )
    .await
    .map_err(TimingError::ToEnd)?;
    check_duration(&inbound)?;

    Ok(TimedCandidate {
        station: candidate.clone(),
        time_from_start: outbound.duration,
        time_to_end: inbound.duration,
        distance_from_start: outbound.distance,
        distance_to_end: inbound.distance,
    })
}

fn check_duration(route: &Route) -> Result<(), TimingError> {
    if route.has_valid_duration() {
        Ok(())
    } else {
        Err(TimingError::InvalidDuration(route.duration))
    }
}

/// Uniform random delay in `[min, max]`.
fn jitter(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let millis = rand::thread_rng().gen_range(min.as_millis()..=max.as_millis());
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::testing::{FakeMaps, loc, route, station};

    fn fast_config() -> PipelineConfig {
        PipelineConfig::default().with_rate_limit(RateLimit::none())
    }

    #[test]
    fn jitter_stays_in_range() {
        let min = Duration::from_millis(100);
        let max = Duration::from_millis(200);
        for _ in 0..200 {
            let j = jitter(min, max);
            assert!(j >= min && j <= max, "jitter {j:?} out of range");
        }
    }

    #[test]
    fn jitter_with_empty_range() {
        assert_eq!(jitter(Duration::ZERO, Duration::ZERO), Duration::ZERO);
        let d = Duration::from_millis(150);
        assert_eq!(jitter(d, d), d);
    }

    #[tokio::test]
    async fn annotates_every_candidate() {
        let start = loc(116.30, 39.95);
        let end = loc(116.50, 39.90);
        let a = station("A", 116.40, 39.92);
        let b = station("B", 116.41, 39.93);

        let mut maps = FakeMaps::new();
        maps.add_timing(&start, &end, &a.location, 600.0, 700.0);
        maps.add_timing(&start, &end, &b.location, 900.0, 300.0);

        let timed = annotate(&maps, &start, &end, &[a, b], &fast_config()).await;

        assert_eq!(timed.len(), 2);
        assert_eq!(timed[0].station.name, "A");
        assert_eq!(timed[0].time_from_start, 600.0);
        assert_eq!(timed[0].time_to_end, 700.0);
        assert_eq!(timed[0].distance_from_start, 4800.0);
        assert_eq!(timed[1].station.name, "B");
        assert_eq!(timed[1].time_to_end, 300.0);
    }

    #[tokio::test]
    async fn failed_candidate_is_dropped_without_error() {
        let start = loc(116.30, 39.95);
        let end = loc(116.50, 39.90);
        let x = station("X", 116.38, 39.91);
        let y = station("Y", 116.40, 39.92);
        let z = station("Z", 116.42, 39.93);

        let mut maps = FakeMaps::new();
        maps.add_timing(&start, &end, &y.location, 500.0, 500.0);
        maps.add_timing(&start, &end, &z.location, 400.0, 800.0);
        maps.fail_routes_at(&x.location);

        let timed = annotate(&maps, &start, &end, &[x, y, z], &fast_config()).await;

        let names: Vec<_> = timed.iter().map(|t| t.station.name.as_str()).collect();
        assert_eq!(names, vec!["Y", "Z"]);
    }

    #[tokio::test]
    async fn failure_on_second_leg_drops_candidate() {
        let start = loc(116.30, 39.95);
        let end = loc(116.50, 39.90);
        let a = station("A", 116.40, 39.92);

        let mut maps = FakeMaps::new();
        // Only the outbound leg exists.
        maps.add_route(&start, &a.location, route(600.0, &[]));

        let timed = annotate(&maps, &start, &end, &[a], &fast_config()).await;
        assert!(timed.is_empty());
        assert_eq!(maps.route_calls().len(), 2);
    }

    #[tokio::test]
    async fn failure_on_first_leg_skips_second_query() {
        let start = loc(116.30, 39.95);
        let end = loc(116.50, 39.90);
        let a = station("A", 116.40, 39.92);

        let maps = FakeMaps::new();
        let timed = annotate(&maps, &start, &end, &[a], &fast_config()).await;

        assert!(timed.is_empty());
        assert_eq!(maps.route_calls().len(), 1);
    }

    #[tokio::test]
    async fn negative_duration_is_rejected() {
        let start = loc(116.30, 39.95);
        let end = loc(116.50, 39.90);
        let a = station("A", 116.40, 39.92);

        let mut maps = FakeMaps::new();
        maps.add_timing(&start, &end, &a.location, -5.0, 300.0);

        let timed = annotate(&maps, &start, &end, &[a], &fast_config()).await;
        assert!(timed.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_route_query_times_out() {
        let start = loc(116.30, 39.95);
        let end = loc(116.50, 39.90);
        let a = station("A", 116.40, 39.92);

        let mut maps = FakeMaps::new().with_route_latency(Duration::from_secs(20));
        maps.add_timing(&start, &end, &a.location, 600.0, 600.0);

        let timed = annotate(&maps, &start, &end, &[a], &fast_config()).await;
        assert!(timed.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn batches_bound_concurrency() {
        let start = loc(116.30, 39.95);
        let end = loc(116.50, 39.90);
        let stations: Vec<_> = (0..5)
            .map(|i| station(&format!("S{i}"), 116.40 + i as f64 * 0.01, 39.92))
            .collect();

        let mut maps = FakeMaps::new().with_route_latency(Duration::from_millis(50));
        for s in &stations {
            maps.add_timing(&start, &end, &s.location, 600.0, 600.0);
        }

        let timed = annotate(&maps, &start, &end, &stations, &fast_config()).await;

        assert_eq!(timed.len(), 5);
        assert_eq!(maps.max_in_flight(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn default_pacing_is_respected() {
        let start = loc(116.30, 39.95);
        let end = loc(116.50, 39.90);
        let stations: Vec<_> = (0..3)
            .map(|i| station(&format!("S{i}"), 116.40 + i as f64 * 0.01, 39.92))
            .collect();

        let mut maps = FakeMaps::new();
        for s in &stations {
            maps.add_timing(&start, &end, &s.location, 600.0, 600.0);
        }

        let began = tokio::time::Instant::now();
        let config = PipelineConfig::default();
        let timed = annotate(&maps, &start, &end, &stations, &config).await;
        assert_eq!(timed.len(), 3);

        let calls = maps.route_calls();
        assert_eq!(calls.len(), 6);

        let first_query = |s: &CandidateStation| {
            calls
                .iter()
                .find(|(from, to, _)| *from == start.to_lng_lat() && *to == s.location.to_lng_lat())
                .map(|(_, _, at)| *at - began)
                .unwrap()
        };
        let second_query = |s: &CandidateStation| {
            calls
                .iter()
                .find(|(from, to, _)| *from == s.location.to_lng_lat() && *to == end.to_lng_lat())
                .map(|(_, _, at)| *at - began)
                .unwrap()
        };

        // Batch one: jitter, query, 300 ms, query.
        for s in &stations[..2] {
            let first = first_query(s);
            // Timer deadlines round up to the next millisecond.
            assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(205));
            assert!(second_query(s) - first >= Duration::from_millis(300));
        }

        // Batch two starts 800 ms after batch one finished, plus its own jitter.
        let batch_one_done = stations[..2].iter().map(second_query).max().unwrap();
        let third_first = first_query(&stations[2]);
        assert!(third_first - batch_one_done >= Duration::from_millis(900));
        assert!(third_first - batch_one_done <= Duration::from_millis(1010));
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_stretches_with_one_extra_candidate() {
        let start = loc(116.30, 39.95);
        let end = loc(116.50, 39.90);
        let stations: Vec<_> = (0..11)
            .map(|i| station(&format!("S{i}"), 116.40 + i as f64 * 0.01, 39.92))
            .collect();

        let mut maps = FakeMaps::new();
        for s in &stations {
            maps.add_timing(&start, &end, &s.location, 600.0, 600.0);
        }

        let timed = annotate(&maps, &start, &end, &stations, &PipelineConfig::default()).await;
        assert_eq!(timed.len(), 11);

        let calls = maps.route_calls();
        let at = |from: String, to: String| {
            calls
                .iter()
                .find(|(f, t, _)| *f == from && *t == to)
                .map(|(_, _, at)| *at)
                .unwrap()
        };

        // 300 ms between a candidate's queries becomes 330 ms.
        let s0_first = at(start.to_lng_lat(), stations[0].location.to_lng_lat());
        let s0_second = at(stations[0].location.to_lng_lat(), end.to_lng_lat());
        assert!(s0_second - s0_first >= Duration::from_millis(330));

        // 800 ms between batches becomes 880 ms, plus jitter of 110..=220 ms.
        let batch_one_done = stations[..2]
            .iter()
            .map(|s| at(s.location.to_lng_lat(), end.to_lng_lat()))
            .max()
            .unwrap();
        let s2_first = at(start.to_lng_lat(), stations[2].location.to_lng_lat());
        assert!(s2_first - batch_one_done >= Duration::from_millis(990));
        assert!(s2_first - batch_one_done <= Duration::from_millis(1110));
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let maps = FakeMaps::new();
        let timed = annotate(
            &maps,
            &loc(116.3, 39.9),
            &loc(116.5, 39.9),
            &[],
            &PipelineConfig::default(),
        )
        .await;

        assert!(timed.is_empty());
        assert!(maps.calls().is_empty());
    }
}
