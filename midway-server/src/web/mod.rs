//! Web layer for the meeting-point planner.
//!
//! Provides a JSON endpoint that a browser map page can call.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
