//! Reverse-reference synchronization
//!
//! A film's `roles`/`directors` and a participant's `films` describe the same
//! relationship from both ends. The side written by a request is updated
//! synchronously; the opposite side is described as [`SyncIntent`]s, stored
//! in the [`Outbox`] and applied by the [`SyncWorker`] in the background.
//!
//! Every operation here is a single-document update with set semantics, so
//! applying an intent twice leaves the same state as applying it once.

mod intent;
mod outbox;
mod worker;

pub use intent::SyncIntent;
pub use outbox::{DeadLetter, Outbox, OutboxEntry, OutboxStatus};
pub use worker::{DrainReport, SyncWorker};

use crate::models::{Role, DIRECTORS_FIELD, FILMS_FIELD, ROLES_FIELD, ROLE_ACTOR_KEY};
use crate::repository::Repositories;
use crate::store::{Update, UpdateResult};
use crate::Result;
use serde_json::Value;
use tracing::{debug, warn};

/// Applies reverse-reference updates
#[derive(Debug, Clone)]
pub struct Synchronizer {
    repos: Repositories,
}

fn strings(ids: &[String]) -> Vec<Value> {
    ids.iter().cloned().map(Value::String).collect()
}

impl Synchronizer {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn add_film_ref_to_actor(
        &self,
        actor_id: &str,
        film_ids: &[String],
    ) -> Result<UpdateResult> {
        let update = Update::add_to_set(FILMS_FIELD, strings(film_ids));
        self.repos.actors.update_by_id(actor_id, &update).await
    }

    pub async fn remove_film_ref_from_actor(
        &self,
        actor_id: &str,
        film_ids: &[String],
    ) -> Result<UpdateResult> {
        let update = Update::pull_in(FILMS_FIELD, strings(film_ids));
        self.repos.actors.update_by_id(actor_id, &update).await
    }

    pub async fn add_film_ref_to_director(
        &self,
        director_id: &str,
        film_ids: &[String],
    ) -> Result<UpdateResult> {
        let update = Update::add_to_set(FILMS_FIELD, strings(film_ids));
        self.repos.directors.update_by_id(director_id, &update).await
    }

    pub async fn remove_film_ref_from_director(
        &self,
        director_id: &str,
        film_ids: &[String],
    ) -> Result<UpdateResult> {
        let update = Update::pull_in(FILMS_FIELD, strings(film_ids));
        self.repos.directors.update_by_id(director_id, &update).await
    }

    /// Add roles keyed by actor: an actor already cast keeps its existing role
    pub async fn add_actor_role_to_film(
        &self,
        film_id: &str,
        roles: &[Role],
    ) -> Result<UpdateResult> {
        let roles = roles
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let update = Update::add_to_set_by_key(ROLES_FIELD, ROLE_ACTOR_KEY, roles);
        self.repos.films.update_by_id(film_id, &update).await
    }

    pub async fn remove_actor_role_from_film(
        &self,
        film_id: &str,
        actor_ids: &[String],
    ) -> Result<UpdateResult> {
        let update = Update::pull_where(ROLES_FIELD, ROLE_ACTOR_KEY, strings(actor_ids));
        self.repos.films.update_by_id(film_id, &update).await
    }

    pub async fn add_director_ref_to_film(
        &self,
        film_id: &str,
        director_ids: &[String],
    ) -> Result<UpdateResult> {
        let update = Update::add_to_set(DIRECTORS_FIELD, strings(director_ids));
        self.repos.films.update_by_id(film_id, &update).await
    }

    pub async fn remove_director_ref_from_film(
        &self,
        film_id: &str,
        director_ids: &[String],
    ) -> Result<UpdateResult> {
        let update = Update::pull_in(DIRECTORS_FIELD, strings(director_ids));
        self.repos.films.update_by_id(film_id, &update).await
    }

    /// Apply one intent.
    ///
    /// A target that no longer exists is not an error: whoever deleted it
    /// also took the relationship with it.
    pub async fn apply(&self, intent: &SyncIntent) -> Result<UpdateResult> {
        let result = match intent {
            SyncIntent::AddFilmRefToActor { actor_id, film_ids } => {
                self.add_film_ref_to_actor(actor_id, film_ids).await?
            }
            SyncIntent::RemoveFilmRefFromActor { actor_id, film_ids } => {
                self.remove_film_ref_from_actor(actor_id, film_ids).await?
            }
            SyncIntent::AddFilmRefToDirector { director_id, film_ids } => {
                self.add_film_ref_to_director(director_id, film_ids).await?
            }
            SyncIntent::RemoveFilmRefFromDirector { director_id, film_ids } => {
                self.remove_film_ref_from_director(director_id, film_ids).await?
            }
            SyncIntent::AddActorRoleToFilm { film_id, roles } => {
                self.add_actor_role_to_film(film_id, roles).await?
            }
            SyncIntent::RemoveActorRoleFromFilm { film_id, actor_ids } => {
                self.remove_actor_role_from_film(film_id, actor_ids).await?
            }
            SyncIntent::AddDirectorRefToFilm { film_id, director_ids } => {
                self.add_director_ref_to_film(film_id, director_ids).await?
            }
            SyncIntent::RemoveDirectorRefFromFilm { film_id, director_ids } => {
                self.remove_director_ref_from_film(film_id, director_ids).await?
            }
        };

        let (collection, id) = intent.target();
        if result.matched == 0 {
            warn!(
                collection = %collection,
                id,
                operation = intent.operation(),
                "Sync target no longer exists"
            );
        } else {
            debug!(
                collection = %collection,
                id,
                operation = intent.operation(),
                modified = result.modified,
                "Applied sync intent"
            );
        }
        Ok(result)
    }
}
