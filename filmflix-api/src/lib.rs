//! filmflix-api library - HTTP surface of the Filmflix catalog
//!
//! Every catalog route lives under `/api`. Reads are public; mutating
//! requests need the admin key (`?auth=`). `/health` and static files sit
//! outside `/api`.

use axum::http::Method;
use axum::Router;
use filmflix_common::catalog::Catalog;
use filmflix_common::models::{Actor, Director};
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub catalog: Catalog,
    /// Admin key for mutating requests; `None` rejects them all
    pub admin_key: Option<String>,
    /// Directory served for paths no route matches
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(catalog: Catalog, admin_key: Option<String>) -> Self {
        Self {
            catalog,
            admin_key,
            static_dir: None,
        }
    }

    pub fn with_static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, patch, post};

    let catalog_routes = Router::new()
        .route("/films", get(api::list_films).post(api::create_film))
        .route(
            "/films/:id",
            get(api::get_film)
                .patch(api::update_film)
                .delete(api::delete_film),
        )
        .route("/films/:id/roles", patch(api::update_film_roles))
        .route("/films/:id/directors", patch(api::update_film_directors))
        .merge(api::participant_routes::<Actor>("/actors"))
        .merge(api::participant_routes::<Director>("/directors"))
        .route("/sync/status", get(api::sync_status))
        .route("/sync/dead-letters", get(api::dead_letters))
        .route("/sync/dead-letters/requeue", post(api::requeue_dead_letters))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    let mut router = Router::new()
        .nest("/api", catalog_routes)
        .merge(api::health_routes());

    if let Some(dir) = &state.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
