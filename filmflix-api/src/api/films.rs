//! Film endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use filmflix_common::catalog::DeleteOutcome;
use filmflix_common::models::{DirectorsUpdate, Film, FilmPatch, NewFilm, RolesUpdate};
use tracing::debug;

use super::query::ListQuery;
use super::ApiResult;
use crate::AppState;

/// GET /api/films
pub async fn list_films(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Film>>> {
    Ok(Json(state.catalog.list_films(query.limit()).await?))
}

/// POST /api/films
pub async fn create_film(
    State(state): State<AppState>,
    payload: Result<Json<NewFilm>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Film>)> {
    let Json(new) = payload?;
    let film = state.catalog.create_film(new).await?;
    Ok((StatusCode::CREATED, Json(film)))
}

/// GET /api/films/:id
pub async fn get_film(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Film>> {
    Ok(Json(state.catalog.get_film(&id).await?))
}

/// PATCH /api/films/:id
pub async fn update_film(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<FilmPatch>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(patch) = payload?;
    state.catalog.update_film(&id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/films/:id/roles
pub async fn update_film_roles(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RolesUpdate>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(request) = payload?;
    state.catalog.update_film_roles(&id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/films/:id/directors
pub async fn update_film_directors(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<DirectorsUpdate>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(request) = payload?;
    state.catalog.update_film_directors(&id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/films/:id
pub async fn delete_film(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    Ok(delete_response(state.catalog.delete_film(&id).await?, "film"))
}

/// 204 when something was deleted, otherwise a bodyless 304
pub(crate) fn delete_response(outcome: DeleteOutcome, kind: &str) -> Response {
    match outcome {
        DeleteOutcome::Deleted => StatusCode::NO_CONTENT.into_response(),
        DeleteOutcome::NothingDeleted => {
            debug!("No {} with the specified id", kind);
            StatusCode::NOT_MODIFIED.into_response()
        }
    }
}
