//! Candidate station discovery.
//!
//! Three independent strategies propose stations:
//!
//! 1. **Route**: subway stops the main route between the two travellers
//!    passes through.
//! 2. **Midpoint**: a nearby search around the midpoint of the two
//!    endpoints.
//! 3. **Endpoint**: nearby searches around each endpoint.
//!
//! Results are merged by station name, first strategy wins. When too many
//! stations turn up, only the ones closest to the midpoint are kept so the
//! number of routing queries stays bounded.

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::{debug, info, warn};

use crate::domain::{CandidateStation, Location, Route, StationSource};
use crate::provider::{MapProvider, ProviderError, with_timeout};

use super::config::PipelineConfig;
use super::pipeline::PipelineError;

/// Gather, deduplicate and prune candidate stations.
///
/// Fails with [`PipelineError::NoCandidatesFound`] only when every
/// strategy comes back empty. A strategy whose backend call fails simply
/// contributes nothing.
pub async fn collect<P: MapProvider>(
    provider: &P,
    start: &Location,
    end: &Location,
    main_route: &Route,
    config: &PipelineConfig,
) -> Result<Vec<CandidateStation>, PipelineError> {
    let midpoint = Location::midpoint(start, end);

    let (route_stations, midpoint_stations, near_start, near_end) = futures::join!(
        route_strategy(provider, main_route, &midpoint, config),
        nearby_strategy(
            provider,
            &midpoint,
            config.search_radius_m,
            StationSource::Nearby,
            config,
        ),
        nearby_strategy(
            provider,
            start,
            config.endpoint_radius_m,
            StationSource::Endpoint,
            config,
        ),
        nearby_strategy(
            provider,
            end,
            config.endpoint_radius_m,
            StationSource::Endpoint,
            config,
        ),
    );

    debug!(
        route = route_stations.len(),
        midpoint = midpoint_stations.len(),
        near_start = near_start.len(),
        near_end = near_end.len(),
        "strategy results"
    );

    let merged = merge_candidates([route_stations, midpoint_stations, near_start, near_end]);
    if merged.is_empty() {
        return Err(PipelineError::NoCandidatesFound);
    }

    let discovered = merged.len();
    let candidates = prune_to_closest(merged, &midpoint, config.max_candidates);

    info!(discovered, kept = candidates.len(), "candidates collected");

    Ok(candidates)
}

/// Stations the main route passes through.
///
/// Stops without coordinates are looked up by name; those the provider
/// can't place are skipped.
async fn route_strategy<P: MapProvider>(
    provider: &P,
    main_route: &Route,
    midpoint: &Location,
    config: &PipelineConfig,
) -> Vec<CandidateStation> {
    let mut stations = Vec::new();

    for stop in main_route.distinct_subway_stops() {
        if let Some(location) = &stop.location {
            stations.push(CandidateStation::new(
                stop.name.clone(),
                location.clone(),
                StationSource::Route,
            ));
            continue;
        }

        let lookup = with_timeout(
            "station lookup",
            config.nearby_timeout,
            provider.locate_station(&stop.name, midpoint),
        )
        .await;

        match lookup {
            Ok(Some(location)) => stations.push(CandidateStation::new(
                stop.name.clone(),
                location,
                StationSource::Route,
            )),
            Ok(None) => debug!(station = %stop.name, "route stop has no known location"),
            Err(e) => debug!(station = %stop.name, error = %e, "route stop lookup failed"),
        }
    }

    stations
}

/// Stations within `radius_m` of `center`, tagged with `source`.
async fn nearby_strategy<P: MapProvider>(
    provider: &P,
    center: &Location,
    radius_m: u32,
    source: StationSource,
    config: &PipelineConfig,
) -> Vec<CandidateStation> {
    let result: Result<_, ProviderError> = with_timeout(
        "nearby search",
        config.nearby_timeout,
        provider.nearby_stations(center, radius_m),
    )
    .await;

    match result {
        Ok(stations) => stations
            .into_iter()
            .map(|s| s.with_source(source))
            .collect(),
        Err(e) => {
            warn!(%center, radius_m, %source, error = %e, "nearby search failed");
            Vec::new()
        }
    }
}

/// Merge strategy outputs by station name, keeping the first occurrence.
///
/// Order of first discovery is preserved.
pub fn merge_candidates(
    groups: impl IntoIterator<Item = Vec<CandidateStation>>,
) -> Vec<CandidateStation> {
    let mut by_name: IndexMap<String, CandidateStation> = IndexMap::new();

    for station in groups.into_iter().flatten() {
        let name = station.name.trim();
        if name.is_empty() {
            continue;
        }
        if let Entry::Vacant(slot) = by_name.entry(name.to_string()) {
            slot.insert(station);
        }
    }

    by_name.into_values().collect()
}

/// Keep the `max` candidates closest to `midpoint` by Haversine distance.
///
/// Returns the input unchanged when it already fits. Survivors keep their
/// discovery order; equally distant candidates are kept in discovery
/// order too.
pub fn prune_to_closest(
    candidates: Vec<CandidateStation>,
    midpoint: &Location,
    max: usize,
) -> Vec<CandidateStation> {
    if candidates.len() <= max {
        return candidates;
    }

    let mut by_distance: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, c.location.haversine_distance(midpoint)))
        .collect();
    by_distance.sort_by(|a, b| a.1.total_cmp(&b.1));
    by_distance.truncate(max);

    let mut keep: Vec<usize> = by_distance.into_iter().map(|(i, _)| i).collect();
    keep.sort_unstable();

    let mut keep = keep.into_iter().peekable();
    candidates
        .into_iter()
        .enumerate()
        .filter_map(|(i, c)| {
            if keep.peek() == Some(&i) {
                keep.next();
                Some(c)
            } else {
                None
            }
        })
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::planner::testing::loc;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn candidate_strategy() -> impl Strategy<Value = CandidateStation> {
        // Small name pool so duplicates are common.
        (0u8..8, 116.0f64..117.0, 39.5f64..40.5).prop_map(|(n, lng, lat)| {
            CandidateStation::new(format!("Station {n}"), loc(lng, lat), StationSource::Nearby)
        })
    }

    fn groups_strategy() -> impl Strategy<Value = Vec<Vec<CandidateStation>>> {
        prop::collection::vec(prop::collection::vec(candidate_strategy(), 0..8), 0..4)
    }

    proptest! {
        #[test]
        fn merged_names_are_unique(groups in groups_strategy()) {
            let merged = merge_candidates(groups);
            let mut seen = HashSet::new();
            for c in &merged {
                prop_assert!(seen.insert(c.name.clone()), "duplicate {}", c.name);
            }
        }

        #[test]
        fn merge_loses_no_name(groups in groups_strategy()) {
            let expected: HashSet<String> = groups.iter().flatten().map(|c| c.name.clone()).collect();
            let merged: HashSet<String> = merge_candidates(groups).into_iter().map(|c| c.name).collect();
            prop_assert_eq!(merged, expected);
        }

        #[test]
        fn pruned_set_is_the_closest(
            candidates in prop::collection::vec(candidate_strategy(), 0..25),
            max in 1usize..12,
        ) {
            let midpoint = loc(116.5, 40.0);
            let pruned = prune_to_closest(candidates.clone(), &midpoint, max);

            prop_assert_eq!(pruned.len(), candidates.len().min(max));

            // Nothing dropped is strictly closer than anything kept.
            let kept_worst = pruned
                .iter()
                .map(|c| c.location.haversine_distance(&midpoint))
                .fold(0.0f64, f64::max);
            let dropped_best = candidates
                .iter()
                .filter(|c| !pruned.contains(c))
                .map(|c| c.location.haversine_distance(&midpoint))
                .fold(f64::INFINITY, f64::min);
            prop_assert!(kept_worst <= dropped_best);
        }
    }
}
