//! Document store abstraction
//!
//! Schemaless JSON documents grouped into named collections. Queries are
//! expressed with [`Filter`] (equality / set membership, dotted paths descend
//! into arrays) and mutations with [`Update`] (`$set`, `$push`, add-to-set,
//! `$pull`). Every mutation touches a single document and is atomic for that
//! document; nothing spans documents.

mod filter;
mod sqlite;
mod update;

pub use filter::Filter;
pub use sqlite::SqliteDocumentStore;
pub use update::{PullCondition, Update};

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// A stored document: a JSON object whose `_id` field holds its identifier
pub type Document = serde_json::Map<String, Value>;

/// Name of the identifier field on every document
pub const ID_FIELD: &str = "_id";

/// The catalog's collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Films,
    Actors,
    Directors,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Films, Collection::Actors, Collection::Directors];

    /// Collection (and backing table) name
    pub fn name(self) -> &'static str {
        match self {
            Collection::Films => "films",
            Collection::Actors => "actors",
            Collection::Directors => "directors",
        }
    }

    /// Singular lowercase noun used in validation messages
    pub fn kind(self) -> &'static str {
        match self {
            Collection::Films => "film",
            Collection::Actors => "actor",
            Collection::Directors => "director",
        }
    }

    /// Singular capitalized noun used in not-found messages
    pub fn label(self) -> &'static str {
        match self {
            Collection::Films => "Film",
            Collection::Actors => "Actor",
            Collection::Directors => "Director",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sort order for [`FindOptions`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

/// Options for [`DocumentStore::find`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Option<Sort>,
    /// Maximum number of documents; `None` means unbounded
    pub limit: Option<u64>,
}

impl FindOptions {
    /// Sort ascending by `field`
    pub fn sorted_by(field: impl Into<String>) -> Self {
        Self {
            sort: Some(Sort {
                field: field.into(),
                descending: false,
            }),
            limit: None,
        }
    }

    pub fn limit(mut self, limit: impl Into<Option<u64>>) -> Self {
        self.limit = limit.into();
        self
    }
}

/// Outcome of [`DocumentStore::update_one`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Documents matching the filter (0 or 1)
    pub matched: u64,
    /// Documents whose content actually changed (0 or 1)
    pub modified: u64,
}

/// Backend-agnostic document store
///
/// Implementations must be safe to share between request tasks and must
/// make each `update_one` / `delete_one` atomic with respect to the single
/// document it touches.
#[async_trait]
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Find documents matching `filter`, optionally sorted and limited
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>>;

    /// Find the first document matching `filter`
    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>> {
        let options = FindOptions::default().limit(1);
        Ok(self.find(collection, filter, &options).await?.into_iter().next())
    }

    /// Insert a document, generating an `_id` when absent. Returns the id.
    async fn insert_one(&self, collection: Collection, document: Document) -> Result<String>;

    /// Apply `update` to the first document matching `filter`
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult>;

    /// Delete the first document matching `filter`. Returns the deleted count.
    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64>;
}

/// Order two optional field values the way the store sorts them:
/// missing/null first, then booleans, numbers, strings, arrays, objects.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
