use super::{Entity, DIRECTORS_FIELD, ROLES_FIELD};
use crate::set_diff::dedup;
use crate::store::{Collection, Document, Update};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A role played by an actor in a film; owned by the film that embeds it
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub name: String,
    pub actor: String,
}

impl Role {
    pub fn new(name: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actor: actor.into(),
        }
    }

    /// Role with no name, used when the link originates from the actor side
    pub fn uncredited(actor: impl Into<String>) -> Self {
        Self::new(String::new(), actor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Film {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub original_title: String,
    pub description: String,
    pub directors: Vec<String>,
    pub poster: String,
    pub release_date: String,
    pub rt_score: String,
    pub roles: Vec<Role>,
}

impl Film {
    /// Distinct actor ids across all roles, in role order
    pub fn actor_ids(&self) -> Vec<String> {
        actor_ids(&self.roles)
    }
}

impl Entity for Film {
    const COLLECTION: Collection = Collection::Films;
    const SORT_FIELD: &'static str = "title";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Distinct actor ids of `roles`, in role order
pub(crate) fn actor_ids(roles: &[Role]) -> Vec<String> {
    dedup(roles.iter().map(|role| role.actor.clone()))
}

/// `POST /films` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewFilm {
    pub title: String,
    pub original_title: String,
    pub description: String,
    pub directors: Vec<String>,
    pub poster: String,
    pub release_date: String,
    pub rt_score: String,
    pub roles: Vec<Role>,
}

impl NewFilm {
    /// Title and release date are mandatory
    pub fn check_required(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.release_date.trim().is_empty() {
            return Err(Error::InvalidInput("Data is invalid".to_string()));
        }
        Ok(())
    }

    pub fn into_film(self) -> Film {
        Film {
            id: String::new(),
            title: self.title,
            original_title: self.original_title,
            description: self.description,
            directors: dedup(self.directors),
            poster: self.poster,
            release_date: self.release_date,
            rt_score: self.rt_score,
            roles: dedup(self.roles),
        }
    }
}

/// `PATCH /films/:id` body: scalar fields only.
///
/// Reference lists go through their own endpoints, so `roles`, `directors`
/// and `_id` are rejected as unknown fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilmPatch {
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub description: Option<String>,
    pub poster: Option<String>,
    pub release_date: Option<String>,
    pub rt_score: Option<String>,
}

impl FilmPatch {
    /// Build the `$set` update for the fields present
    pub fn into_update(self) -> Result<Update> {
        for required in [&self.title, &self.release_date].into_iter().flatten() {
            if required.trim().is_empty() {
                return Err(Error::InvalidInput("Data is invalid".to_string()));
            }
        }

        let fields: Document = [
            ("title", self.title),
            ("original_title", self.original_title),
            ("description", self.description),
            ("poster", self.poster),
            ("release_date", self.release_date),
            ("rt_score", self.rt_score),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), Value::String(v))))
        .collect();

        if fields.is_empty() {
            return Err(Error::InvalidInput("Nothing to update".to_string()));
        }
        Ok(Update::set(fields))
    }
}

fn default_replace() -> bool {
    true
}

/// `PATCH /films/:id/roles` body
#[derive(Debug, Clone, Deserialize)]
pub struct RolesUpdate {
    pub roles: Vec<Role>,
    /// Replace the whole list (default) or add the roles not already present
    #[serde(default = "default_replace")]
    pub replace: bool,
}

impl RolesUpdate {
    pub(crate) fn into_update(self) -> Result<Update> {
        let roles = dedup(self.roles)
            .into_iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(if self.replace {
            let mut fields = Document::new();
            fields.insert(ROLES_FIELD.to_string(), Value::Array(roles));
            Update::set(fields)
        } else {
            Update::add_to_set(ROLES_FIELD, roles)
        })
    }
}

/// `PATCH /films/:id/directors` body
#[derive(Debug, Clone, Deserialize)]
pub struct DirectorsUpdate {
    pub directors: Vec<String>,
    /// Replace the whole list (default) or add to it
    #[serde(default = "default_replace")]
    pub replace: bool,
}

impl DirectorsUpdate {
    pub(crate) fn into_update(self) -> Update {
        let directors: Vec<Value> = dedup(self.directors).into_iter().map(Value::String).collect();

        if self.replace {
            let mut fields = Document::new();
            fields.insert(DIRECTORS_FIELD.to_string(), Value::Array(directors));
            Update::set(fields)
        } else {
            Update::add_to_set(DIRECTORS_FIELD, directors)
        }
    }
}
