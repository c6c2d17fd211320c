//! HTTP API handlers for filmflix-api

pub mod auth;
pub mod error;
pub mod films;
pub mod health;
pub mod participants;
pub mod query;
pub mod sync;

pub use auth::auth_middleware;
pub use error::{ApiError, ApiResult};
pub use films::{
    create_film, delete_film, get_film, list_films, update_film, update_film_directors,
    update_film_roles,
};
pub use health::health_routes;
pub use participants::participant_routes;
pub use sync::{dead_letters, requeue_dead_letters, sync_status};
