use super::{Entity, FILMS_FIELD};
use crate::set_diff::dedup;
use crate::store::{Collection, Document, Update};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Actor {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Films the actor appears in (back-references)
    pub films: Vec<String>,
}

impl Entity for Actor {
    const COLLECTION: Collection = Collection::Actors;
    const SORT_FIELD: &'static str = "name";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Director {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Films directed (back-references)
    pub films: Vec<String>,
}

impl Entity for Director {
    const COLLECTION: Collection = Collection::Directors;
    const SORT_FIELD: &'static str = "name";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// `POST /actors` and `POST /directors` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewParticipant {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub films: Vec<String>,
}

impl NewParticipant {
    pub fn check_required(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("Data is invalid".to_string()));
        }
        Ok(())
    }

    /// Normalized film list (duplicates collapsed)
    pub fn films(&self) -> Vec<String> {
        dedup(self.films.iter().cloned())
    }
}

/// `PATCH /actors/:id` and `PATCH /directors/:id` body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticipantPatch {
    pub name: Option<String>,
    pub films: Option<Vec<String>>,
}

impl ParticipantPatch {
    /// Normalized replacement film list, if the patch carries one
    pub fn films(&self) -> Option<Vec<String>> {
        self.films.as_ref().map(|films| dedup(films.iter().cloned()))
    }

    pub(crate) fn to_update(&self) -> Result<Update> {
        let mut fields = Document::new();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(Error::InvalidInput("Data is invalid".to_string()));
            }
            fields.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(films) = self.films() {
            fields.insert(
                FILMS_FIELD.to_string(),
                Value::Array(films.into_iter().map(Value::String).collect()),
            );
        }

        if fields.is_empty() {
            return Err(Error::InvalidInput("Nothing to update".to_string()));
        }
        Ok(Update::set(fields))
    }
}
