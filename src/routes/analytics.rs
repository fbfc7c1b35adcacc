/**
 * Analytics Routes
 * Visit counter and monthly stats for the dashboard overview
 */
use axum::{extract::State, Json};
use chrono::Utc;

use crate::error::ApiError;
use crate::routes::auth::AdminUser;
use crate::routes::SuccessResponse;
use crate::state::AppState;
use crate::stats::{label_buckets, window_start, VisitStats};

/// POST /api/visit
pub async fn record_visit(State(state): State<AppState>) -> Result<Json<SuccessResponse>, ApiError> {
    state.content.record_visit(Utc::now()).await?;
    tracing::debug!("visit recorded");
    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/stats
pub async fn get_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<VisitStats>, ApiError> {
    let since = window_start(Utc::now());
    let monthly = state.content.monthly_visits(since).await?;
    let total = state.content.total_visits().await?;

    Ok(Json(VisitStats {
        monthly: label_buckets(monthly),
        total,
    }))
}
