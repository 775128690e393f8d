//! Application state for the web layer.

use std::sync::Arc;

use crate::planner::PipelineConfig;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
pub struct AppState<P> {
    /// Map provider, usually the cached AMap client
    pub provider: Arc<P>,

    /// Default search configuration
    pub config: Arc<PipelineConfig>,
}

impl<P> AppState<P> {
    /// Create a new app state.
    pub fn new(provider: P, config: PipelineConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            config: Arc::new(config),
        }
    }
}

// Derived Clone would demand `P: Clone`.
impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            config: Arc::clone(&self.config),
        }
    }
}
