use super::{check_id, not_found, Catalog, DeleteOutcome};
use crate::models::{actor_ids, DirectorsUpdate, Entity, Film, FilmPatch, NewFilm, RolesUpdate};
use crate::set_diff::{dedup, diff};
use crate::store::{Collection, Filter};
use crate::sync::SyncIntent;
use crate::Result;
use tracing::{debug, info};

impl Catalog {
    /// Films sorted by title; `limit == None` returns all
    pub async fn list_films(&self, limit: Option<u64>) -> Result<Vec<Film>> {
        self.repos.films.find_many(&Filter::All, limit).await
    }

    pub async fn get_film(&self, id: &str) -> Result<Film> {
        check_id(id)?;
        self.repos
            .films
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(Collection::Films))
    }

    /// Create a film and link it from every listed director and actor
    pub async fn create_film(&self, new: NewFilm) -> Result<Film> {
        new.check_required()?;
        self.validator
            .validate_ids(&new.directors, Collection::Directors)
            .await?;
        self.validator.validate_roles(&new.roles).await?;

        let mut film = new.into_film();

        let film_id = self.repos.films.insert(&mut film).await?;
        info!(film_id = %film_id, title = %film.title, "Created film");

        let intents = film
            .actor_ids()
            .into_iter()
            .map(|actor_id| SyncIntent::AddFilmRefToActor {
                actor_id,
                film_ids: vec![film_id.clone()],
            })
            .chain(film.directors.iter().map(|director_id| SyncIntent::AddFilmRefToDirector {
                director_id: director_id.clone(),
                film_ids: vec![film_id.clone()],
            }))
            .collect();
        self.publish(intents).await?;

        Ok(film)
    }

    /// Update scalar fields
    pub async fn update_film(&self, id: &str, patch: FilmPatch) -> Result<()> {
        check_id(id)?;
        let update = patch.into_update()?;

        let result = self.repos.films.update_by_id(id, &update).await?;
        if result.matched == 0 {
            return Err(not_found(Film::COLLECTION));
        }
        debug!(film_id = id, modified = result.modified, "Updated film");
        Ok(())
    }

    /// Replace or extend the role list, then move actor back-references by diff
    pub async fn update_film_roles(&self, id: &str, request: RolesUpdate) -> Result<()> {
        check_id(id)?;
        self.validator.validate_roles(&request.roles).await?;

        let existing = self
            .repos
            .films
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(Collection::Films))?;

        let old_actors = existing.actor_ids();
        let new_actors = if request.replace {
            actor_ids(&request.roles)
        } else {
            dedup(old_actors.iter().cloned().chain(actor_ids(&request.roles)))
        };

        let update = request.into_update()?;
        if self.repos.films.update_by_id(id, &update).await?.matched == 0 {
            return Err(not_found(Collection::Films));
        }

        let changes = diff(&old_actors, &new_actors);
        debug!(
            film_id = id,
            added = changes.added.len(),
            removed = changes.removed.len(),
            "Updated film roles"
        );

        let film_ids = vec![id.to_string()];
        let intents = changes
            .added
            .into_iter()
            .map(|actor_id| SyncIntent::AddFilmRefToActor {
                actor_id,
                film_ids: film_ids.clone(),
            })
            .chain(changes.removed.into_iter().map(|actor_id| SyncIntent::RemoveFilmRefFromActor {
                actor_id,
                film_ids: film_ids.clone(),
            }))
            .collect();
        self.publish(intents).await
    }

    /// Replace or extend the director list, then move director back-references by diff
    pub async fn update_film_directors(&self, id: &str, request: DirectorsUpdate) -> Result<()> {
        check_id(id)?;
        self.validator
            .validate_ids(&request.directors, Collection::Directors)
            .await?;

        let existing = self
            .repos
            .films
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(Collection::Films))?;

        let old_directors = existing.directors;
        let new_directors = if request.replace {
            dedup(request.directors.iter().cloned())
        } else {
            dedup(old_directors.iter().chain(&request.directors).cloned())
        };

        let update = request.into_update();
        if self.repos.films.update_by_id(id, &update).await?.matched == 0 {
            return Err(not_found(Collection::Films));
        }

        let changes = diff(&old_directors, &new_directors);
        debug!(
            film_id = id,
            added = changes.added.len(),
            removed = changes.removed.len(),
            "Updated film directors"
        );

        let film_ids = vec![id.to_string()];
        let intents = changes
            .added
            .into_iter()
            .map(|director_id| SyncIntent::AddFilmRefToDirector {
                director_id,
                film_ids: film_ids.clone(),
            })
            .chain(
                changes
                    .removed
                    .into_iter()
                    .map(|director_id| SyncIntent::RemoveFilmRefFromDirector {
                        director_id,
                        film_ids: film_ids.clone(),
                    }),
            )
            .collect();
        self.publish(intents).await
    }

    /// Delete a film and unlink it from its actors and directors
    pub async fn delete_film(&self, id: &str) -> Result<DeleteOutcome> {
        check_id(id)?;

        let Some(film) = self.repos.films.find_by_id(id).await? else {
            return Ok(DeleteOutcome::NothingDeleted);
        };
        if self.repos.films.delete_by_id(id).await? == 0 {
            return Ok(DeleteOutcome::NothingDeleted);
        }
        info!(film_id = id, title = %film.title, "Deleted film");

        let film_ids = vec![id.to_string()];
        let intents = film
            .actor_ids()
            .into_iter()
            .map(|actor_id| SyncIntent::RemoveFilmRefFromActor {
                actor_id,
                film_ids: film_ids.clone(),
            })
            .chain(film.directors.into_iter().map(|director_id| {
                SyncIntent::RemoveFilmRefFromDirector {
                    director_id,
                    film_ids: film_ids.clone(),
                }
            }))
            .collect();
        self.publish(intents).await?;

        Ok(DeleteOutcome::Deleted)
    }
}
