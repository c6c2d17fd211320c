//! Actor and director endpoints
//!
//! Both resources share one set of handlers, instantiated per kind by
//! [`participant_routes`].

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use filmflix_common::catalog::Participant;
use filmflix_common::models::{NewParticipant, ParticipantPatch};

use super::films::delete_response;
use super::query::ListQuery;
use super::ApiResult;
use crate::AppState;

/// Routes for one participant kind mounted at `base` (e.g. `/actors`)
pub fn participant_routes<P: Participant>(base: &str) -> Router<AppState> {
    Router::new()
        .route(base, get(list::<P>).post(create::<P>))
        .route(
            &format!("{base}/:id"),
            get(get_one::<P>).patch(update::<P>).delete(delete::<P>),
        )
}

async fn list<P: Participant>(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<P>>> {
    Ok(Json(state.catalog.list_participants::<P>(query.limit()).await?))
}

async fn create<P: Participant>(
    State(state): State<AppState>,
    payload: Result<Json<NewParticipant>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<P>)> {
    let Json(new) = payload?;
    let participant = state.catalog.create_participant::<P>(new).await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

async fn get_one<P: Participant>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<P>> {
    Ok(Json(state.catalog.get_participant::<P>(&id).await?))
}

async fn update<P: Participant>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ParticipantPatch>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(patch) = payload?;
    state.catalog.update_participant::<P>(&id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete<P: Participant>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let outcome = state.catalog.delete_participant::<P>(&id).await?;
    Ok(delete_response(outcome, P::COLLECTION.kind()))
}
