//! Reverse-reference maintenance intents
//!
//! Each intent names one single-document update on the opposite side of a
//! film relationship. Intents are persisted in the outbox as JSON, tagged by
//! `op`, so the encoding must stay stable across releases.

use crate::models::Role;
use crate::store::Collection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SyncIntent {
    /// Add films to an actor's `films`
    AddFilmRefToActor {
        actor_id: String,
        film_ids: Vec<String>,
    },
    /// Remove films from an actor's `films`
    RemoveFilmRefFromActor {
        actor_id: String,
        film_ids: Vec<String>,
    },
    /// Add films to a director's `films`
    AddFilmRefToDirector {
        director_id: String,
        film_ids: Vec<String>,
    },
    /// Remove films from a director's `films`
    RemoveFilmRefFromDirector {
        director_id: String,
        film_ids: Vec<String>,
    },
    /// Add roles to a film, skipping actors already cast
    AddActorRoleToFilm { film_id: String, roles: Vec<Role> },
    /// Remove every role played by the given actors
    RemoveActorRoleFromFilm {
        film_id: String,
        actor_ids: Vec<String>,
    },
    /// Add directors to a film's `directors`
    AddDirectorRefToFilm {
        film_id: String,
        director_ids: Vec<String>,
    },
    /// Remove directors from a film's `directors`
    RemoveDirectorRefFromFilm {
        film_id: String,
        director_ids: Vec<String>,
    },
}

impl SyncIntent {
    /// Collection and id of the document this intent updates
    pub fn target(&self) -> (Collection, &str) {
        match self {
            SyncIntent::AddFilmRefToActor { actor_id, .. }
            | SyncIntent::RemoveFilmRefFromActor { actor_id, .. } => (Collection::Actors, actor_id),
            SyncIntent::AddFilmRefToDirector { director_id, .. }
            | SyncIntent::RemoveFilmRefFromDirector { director_id, .. } => {
                (Collection::Directors, director_id)
            }
            SyncIntent::AddActorRoleToFilm { film_id, .. }
            | SyncIntent::RemoveActorRoleFromFilm { film_id, .. }
            | SyncIntent::AddDirectorRefToFilm { film_id, .. }
            | SyncIntent::RemoveDirectorRefFromFilm { film_id, .. } => (Collection::Films, film_id),
        }
    }

    /// Operation name, as used in logs
    pub fn operation(&self) -> &'static str {
        match self {
            SyncIntent::AddFilmRefToActor { .. } => "add_film_ref_to_actor",
            SyncIntent::RemoveFilmRefFromActor { .. } => "remove_film_ref_from_actor",
            SyncIntent::AddFilmRefToDirector { .. } => "add_film_ref_to_director",
            SyncIntent::RemoveFilmRefFromDirector { .. } => "remove_film_ref_from_director",
            SyncIntent::AddActorRoleToFilm { .. } => "add_actor_role_to_film",
            SyncIntent::RemoveActorRoleFromFilm { .. } => "remove_actor_role_from_film",
            SyncIntent::AddDirectorRefToFilm { .. } => "add_director_ref_to_film",
            SyncIntent::RemoveDirectorRefFromFilm { .. } => "remove_director_ref_from_film",
        }
    }
}
