//! Candidate meeting-point stations.

use std::fmt;

use super::Location;

/// Which discovery strategy first found a candidate.
///
/// Diagnostic only; never used for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationSource {
    /// A subway stop the main route passes through.
    Route,
    /// Found by the nearby search around the midpoint.
    Nearby,
    /// Found by the nearby search around one of the two endpoints.
    Endpoint,
}

impl StationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StationSource::Route => "route",
            StationSource::Nearby => "nearby",
            StationSource::Endpoint => "endpoint",
        }
    }
}

impl fmt::Display for StationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subway station considered as a possible meeting point.
///
/// The station name is the deduplication key within a single search.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateStation {
    pub name: String,
    pub address: Option<String>,
    pub location: Location,
    pub source: StationSource,
}

impl CandidateStation {
    pub fn new(name: impl Into<String>, location: Location, source: StationSource) -> Self {
        Self {
            name: name.into(),
            address: None,
            location,
            source,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Re-tag the candidate with the strategy that found it.
    ///
    /// The collaborator's nearby search doesn't know which strategy is
    /// calling it, so the collector stamps the source on merge.
    pub fn with_source(mut self, source: StationSource) -> Self {
        self.source = source;
        self
    }
}
