//! On-demand purge sweep trigger.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::middleware::RequesterId;
use crate::services::Sweeper;
use crate::AppState;
use service_core::error::AppError;

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub purged: u64,
}

/// Purge everything past the grace window. Idempotent; a second call with no
/// intervening deletions reports zero.
///
/// POST /media/sweep
#[tracing::instrument(skip_all, fields(user_id = %requester.0))]
pub async fn run_sweep(
    State(state): State<AppState>,
    requester: RequesterId,
) -> Result<Json<SweepResponse>, AppError> {
    let sweeper = Sweeper::new(
        state.store.clone(),
        state.storage.clone(),
        state.config.retention.grace_days,
        state.config.retention.sweep_page_size,
    );

    let outcome = sweeper.sweep().await?;
    Ok(Json(SweepResponse {
        purged: outcome.purged,
    }))
}
