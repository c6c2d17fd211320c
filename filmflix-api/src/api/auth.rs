//! Authentication middleware
//!
//! Mutating methods (POST, PUT, PATCH, DELETE) must carry the admin key as
//! the `auth` query parameter. Reads pass through.

use axum::{
    extract::{Query, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use tracing::warn;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
struct AuthQuery {
    auth: Option<String>,
}

fn requires_auth(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Reject mutating requests without a matching `?auth=` key.
///
/// With no admin key configured every mutating request is rejected.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !requires_auth(request.method()) {
        return Ok(next.run(request).await);
    }

    let provided = Query::<AuthQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(query)| query.auth);

    match (state.admin_key.as_deref(), provided.as_deref()) {
        (Some(expected), Some(provided)) if provided == expected => Ok(next.run(request).await),
        _ => {
            warn!(
                method = %request.method(),
                path = request.uri().path(),
                "Rejected request without valid admin key"
            );
            Err(ApiError::Forbidden("Forbidden".to_string()))
        }
    }
}
