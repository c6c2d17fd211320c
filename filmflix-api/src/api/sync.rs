//! Sync outbox inspection
//!
//! Pending and dead intents can be observed, and dead ones pushed back into
//! the queue once the underlying problem is fixed.

use axum::{extract::State, Json};
use filmflix_common::sync::{DeadLetter, OutboxStatus};
use serde::Serialize;
use tracing::info;

use super::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RequeueResponse {
    pub requeued: u64,
}

/// GET /api/sync/status
pub async fn sync_status(State(state): State<AppState>) -> ApiResult<Json<OutboxStatus>> {
    Ok(Json(state.catalog.outbox().status().await?))
}

/// GET /api/sync/dead-letters
pub async fn dead_letters(State(state): State<AppState>) -> ApiResult<Json<Vec<DeadLetter>>> {
    Ok(Json(state.catalog.outbox().dead_letters().await?))
}

/// POST /api/sync/dead-letters/requeue
pub async fn requeue_dead_letters(
    State(state): State<AppState>,
) -> ApiResult<Json<RequeueResponse>> {
    let requeued = state.catalog.outbox().requeue_dead().await?;
    info!(requeued, "Requeued dead sync intents");
    Ok(Json(RequeueResponse { requeued }))
}
