//! Actor and director operations
//!
//! Both kinds hold a `films` back-reference list and are linked from the film
//! side (roles for actors, `directors` for directors). The operations are
//! written once against [`Participant`].

use super::{check_id, not_found, Catalog, DeleteOutcome};
use crate::models::{
    Actor, Director, Entity, NewParticipant, ParticipantPatch, Role, DIRECTORS_FIELD,
    ROLES_FIELD, ROLE_ACTOR_KEY,
};
use crate::repository::{Repositories, Repository};
use crate::set_diff::{dedup, diff};
use crate::store::{Collection, Filter};
use crate::sync::SyncIntent;
use crate::Result;
use tracing::{debug, info};

/// A film participant kept in sync with the film side of the relationship
pub trait Participant: Entity + Clone {
    fn from_parts(name: String, films: Vec<String>) -> Self;
    fn name(&self) -> &str;
    fn films(&self) -> &[String];
    fn repository(repos: &Repositories) -> &Repository<Self>;
    /// Intent adding the participant to `film_id`
    fn link_to_film(participant_id: &str, film_id: String) -> SyncIntent;
    /// Intent removing the participant from `film_id`
    fn unlink_from_film(participant_id: &str, film_id: String) -> SyncIntent;
    /// Filter matching films that reference the participant
    fn referencing_films(participant_id: &str) -> Filter;
}

impl Participant for Actor {
    fn from_parts(name: String, films: Vec<String>) -> Self {
        Actor {
            id: String::new(),
            name,
            films,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn films(&self) -> &[String] {
        &self.films
    }

    fn repository(repos: &Repositories) -> &Repository<Self> {
        &repos.actors
    }

    fn link_to_film(participant_id: &str, film_id: String) -> SyncIntent {
        SyncIntent::AddActorRoleToFilm {
            film_id,
            roles: vec![Role::uncredited(participant_id)],
        }
    }

    fn unlink_from_film(participant_id: &str, film_id: String) -> SyncIntent {
        SyncIntent::RemoveActorRoleFromFilm {
            film_id,
            actor_ids: vec![participant_id.to_string()],
        }
    }

    fn referencing_films(participant_id: &str) -> Filter {
        Filter::eq(format!("{ROLES_FIELD}.{ROLE_ACTOR_KEY}"), participant_id)
    }
}

impl Participant for Director {
    fn from_parts(name: String, films: Vec<String>) -> Self {
        Director {
            id: String::new(),
            name,
            films,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn films(&self) -> &[String] {
        &self.films
    }

    fn repository(repos: &Repositories) -> &Repository<Self> {
        &repos.directors
    }

    fn link_to_film(participant_id: &str, film_id: String) -> SyncIntent {
        SyncIntent::AddDirectorRefToFilm {
            film_id,
            director_ids: vec![participant_id.to_string()],
        }
    }

    fn unlink_from_film(participant_id: &str, film_id: String) -> SyncIntent {
        SyncIntent::RemoveDirectorRefFromFilm {
            film_id,
            director_ids: vec![participant_id.to_string()],
        }
    }

    fn referencing_films(participant_id: &str) -> Filter {
        Filter::eq(DIRECTORS_FIELD, participant_id)
    }
}

impl Catalog {
    /// Participants sorted by name; `limit == None` returns all
    pub async fn list_participants<P: Participant>(&self, limit: Option<u64>) -> Result<Vec<P>> {
        P::repository(&self.repos).find_many(&Filter::All, limit).await
    }

    pub async fn get_participant<P: Participant>(&self, id: &str) -> Result<P> {
        check_id(id)?;
        P::repository(&self.repos)
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(P::COLLECTION))
    }

    /// Create a participant and link it from every listed film
    pub async fn create_participant<P: Participant>(&self, new: NewParticipant) -> Result<P> {
        new.check_required()?;
        self.validator.validate_ids(&new.films, Collection::Films).await?;
        let films = new.films();

        let mut participant = P::from_parts(new.name, films);
        let id = P::repository(&self.repos).insert(&mut participant).await?;
        info!(
            kind = P::COLLECTION.kind(),
            id = %id,
            name = participant.name(),
            "Created participant"
        );

        let intents = participant
            .films()
            .iter()
            .map(|film_id| P::link_to_film(&id, film_id.clone()))
            .collect();
        self.publish(intents).await?;

        Ok(participant)
    }

    /// Update name and/or film list; a new film list moves film-side links by diff
    pub async fn update_participant<P: Participant>(
        &self,
        id: &str,
        patch: ParticipantPatch,
    ) -> Result<()> {
        check_id(id)?;
        let update = patch.to_update()?;
        let new_films = patch.films();

        if self.validate_patch_references {
            if let Some(films) = &patch.films {
                self.validator.validate_ids(films, Collection::Films).await?;
            }
        }

        let repository = P::repository(&self.repos);
        let existing = repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(P::COLLECTION))?;

        if repository.update_by_id(id, &update).await?.matched == 0 {
            return Err(not_found(P::COLLECTION));
        }

        let Some(new_films) = new_films else {
            debug!(kind = P::COLLECTION.kind(), id, "Updated participant");
            return Ok(());
        };

        let changes = diff(existing.films(), &new_films);
        debug!(
            kind = P::COLLECTION.kind(),
            id,
            added = changes.added.len(),
            removed = changes.removed.len(),
            "Updated participant films"
        );

        let intents = changes
            .added
            .into_iter()
            .map(|film_id| P::link_to_film(id, film_id))
            .chain(
                changes
                    .removed
                    .into_iter()
                    .map(|film_id| P::unlink_from_film(id, film_id)),
            )
            .collect();
        self.publish(intents).await
    }

    /// Delete a participant and unlink it from every film that references it.
    ///
    /// Films are taken from the participant's own list and from a query on
    /// the film side, so a back-reference that was never synced is still
    /// cleaned up.
    pub async fn delete_participant<P: Participant>(&self, id: &str) -> Result<DeleteOutcome> {
        check_id(id)?;

        let repository = P::repository(&self.repos);
        let Some(existing) = repository.find_by_id(id).await? else {
            return Ok(DeleteOutcome::NothingDeleted);
        };
        if repository.delete_by_id(id).await? == 0 {
            return Ok(DeleteOutcome::NothingDeleted);
        }
        info!(
            kind = P::COLLECTION.kind(),
            id,
            name = existing.name(),
            "Deleted participant"
        );

        let referencing = self
            .repos
            .films
            .find_many(&P::referencing_films(id), None)
            .await?;
        let films = dedup(
            existing
                .films()
                .iter()
                .cloned()
                .chain(referencing.into_iter().map(|film| film.id)),
        );

        let intents = films
            .into_iter()
            .map(|film_id| P::unlink_from_film(id, film_id))
            .collect();
        self.publish(intents).await?;

        Ok(DeleteOutcome::Deleted)
    }
}
