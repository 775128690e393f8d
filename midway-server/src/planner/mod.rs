//! Meeting-point planner.
//!
//! Answers: "given where the two of us start, which subway station should
//! we meet at so neither of us travels much longer than the other?"
//!
//! The pipeline collects candidate stations from three discovery
//! strategies, times each candidate from both endpoints under a
//! rate-limiting discipline, and ranks them with a balance-aware score.

mod collect;
mod config;
mod pipeline;
mod score;
mod timing;

#[cfg(test)]
pub(crate) mod testing;

pub use collect::{collect, merge_candidates, prune_to_closest};
pub use config::{ConfigError, PipelineConfig, QUERIES_PER_CANDIDATE, RateLimit};
pub use pipeline::{MeetingPlan, PipelineError, Planner, find_middle_stations};
pub use score::{ScoredCandidate, rank, score_candidate};
pub use timing::{TimedCandidate, TimingError, annotate};
