//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::planner::{PipelineConfig, PipelineError, find_middle_stations};
use crate::provider::MapProvider;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<P>(state: AppState<P>) -> Router
where
    P: MapProvider + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/api/middle-stations", get(middle_stations::<P>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Find the fairest meeting stations between two addresses.
async fn middle_stations<P>(
    State(state): State<AppState<P>>,
    query: Result<Query<MiddleStationsRequest>, QueryRejection>,
) -> Result<Json<MeetingPlanResponse>, AppError>
where
    P: MapProvider + Send + Sync + 'static,
{
    let Query(req) = query.map_err(|e| AppError::BadRequest {
        message: e.body_text(),
    })?;

    let start = required(req.start, "start")?;
    let end = required(req.end, "end")?;

    let mut config = PipelineConfig::clone(&state.config);
    if let Some(weight) = req.balance_weight {
        if !(0.0..=1.0).contains(&weight) {
            return Err(AppError::BadRequest {
                message: format!("balance_weight must be between 0 and 1, got {weight}"),
            });
        }
        config = config.with_balance_weight(weight);
    }

    let plan = find_middle_stations(state.provider.as_ref(), &start, &end, &config).await?;

    Ok(Json(MeetingPlanResponse::from_plan(&plan)))
}

fn required(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest {
            message: format!("missing {name} address"),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        let message = e.to_string();
        match e {
            PipelineError::GeocodeFailed { .. } => AppError::BadRequest { message },
            PipelineError::NoRouteFound(_) | PipelineError::NoCandidatesFound => {
                AppError::NotFound { message }
            }
            PipelineError::InvalidConfig(_) => AppError::Internal { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
