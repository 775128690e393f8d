//! Balance-aware scoring of timed candidates.
//!
//! A candidate's score is the longer of the two legs plus a penalty for
//! the gap between them:
//!
//! ```text
//! score = max(a, b) + |a - b| * balance_weight
//! ```
//!
//! Lower is better. With `balance_weight = 0` only the longer leg
//! matters; raising it pushes equal-leg stations up the list.

use std::cmp::Ordering;

use crate::domain::CandidateStation;

use super::timing::TimedCandidate;

/// A timed candidate with its derived score fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub station: CandidateStation,

    /// Seconds from the first traveller's start to the station.
    pub time_from_start: f64,

    /// Seconds from the station to the second traveller's start.
    pub time_to_end: f64,

    pub distance_from_start: f64,
    pub distance_to_end: f64,

    /// The longer of the two legs.
    pub max_time: f64,

    /// Absolute difference between the two legs.
    pub time_diff: f64,

    /// Sum of the two legs.
    pub total_time: f64,

    /// Ranking key; lower is better.
    pub score: f64,

    /// Fairness percentage for display, 100 meaning equal legs.
    /// Not used for ordering.
    pub balance_score: f64,
}

/// Compute score fields for one candidate.
pub fn score_candidate(timed: TimedCandidate, balance_weight: f64) -> ScoredCandidate {
    let a = timed.time_from_start;
    let b = timed.time_to_end;

    let max_time = a.max(b);
    let time_diff = (a - b).abs();
    let total_time = a + b;
    let score = max_time + time_diff * balance_weight;
    let balance_score = balance_score(time_diff, max_time);

    ScoredCandidate {
        station: timed.station,
        time_from_start: a,
        time_to_end: b,
        distance_from_start: timed.distance_from_start,
        distance_to_end: timed.distance_to_end,
        max_time,
        time_diff,
        total_time,
        score,
        balance_score,
    }
}

/// `100 * (1 - diff / max)`, with a zero-length trip counting as
/// perfectly balanced.
fn balance_score(time_diff: f64, max_time: f64) -> f64 {
    if max_time == 0.0 {
        return 100.0;
    }
    100.0 * (1.0 - time_diff / max_time)
}

/// Score candidates and return the best `max_results`, best first.
///
/// The sort is stable, so candidates with equal scores keep the order in
/// which they were discovered.
pub fn rank(
    timed: Vec<TimedCandidate>,
    balance_weight: f64,
    max_results: usize,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = timed
        .into_iter()
        .map(|t| score_candidate(t, balance_weight))
        .collect();

    scored.sort_by(compare_scores);
    scored.truncate(max_results);
    scored
}

fn compare_scores(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    a.score.total_cmp(&b.score)
}
