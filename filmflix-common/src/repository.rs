//! Typed access to one collection
//!
//! Thin layer over [`DocumentStore`] that converts between documents and
//! entity structs. Ordering is fixed per entity (`Entity::SORT_FIELD`).

use crate::models::{Actor, Director, Entity, Film};
use crate::store::{Document, DocumentStore, Filter, FindOptions, Update, UpdateResult};
use crate::{id_utils, Error, Result};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("store", &self.store)
            .finish()
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Matching entities sorted by the entity's sort field; `limit == None` is unbounded
    pub async fn find_many(&self, filter: &Filter, limit: Option<u64>) -> Result<Vec<T>> {
        let options = FindOptions::sorted_by(T::SORT_FIELD).limit(limit);
        self.store
            .find(T::COLLECTION, filter, &options)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<Option<T>> {
        self.store
            .find_one(T::COLLECTION, filter)
            .await?
            .map(from_document)
            .transpose()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        self.find_one(&Filter::by_id(id)).await
    }

    /// Insert `entity` under a fresh id. The id is written back and returned.
    pub async fn insert(&self, entity: &mut T) -> Result<String> {
        entity.set_id(id_utils::generate());
        let id = self
            .store
            .insert_one(T::COLLECTION, to_document(entity)?)
            .await?;
        entity.set_id(id.clone());
        Ok(id)
    }

    pub async fn update_by_id(&self, id: &str, update: &Update) -> Result<UpdateResult> {
        self.store
            .update_one(T::COLLECTION, &Filter::by_id(id), update)
            .await
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<u64> {
        self.store
            .delete_one(T::COLLECTION, &Filter::by_id(id))
            .await
    }
}

fn from_document<T: Entity>(document: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

fn to_document<T: Entity>(entity: &T) -> Result<Document> {
    match serde_json::to_value(entity)? {
        Value::Object(document) => Ok(document),
        other => Err(Error::Internal(format!(
            "{} did not serialize to an object: {other}",
            T::COLLECTION.kind()
        ))),
    }
}

/// One repository per collection, sharing a store
#[derive(Debug, Clone)]
pub struct Repositories {
    pub films: Repository<Film>,
    pub actors: Repository<Actor>,
    pub directors: Repository<Director>,
}

impl Repositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            films: Repository::new(Arc::clone(&store)),
            actors: Repository::new(Arc::clone(&store)),
            directors: Repository::new(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;
    use crate::models::Role;
    use crate::store::SqliteDocumentStore;

    async fn repos() -> Repositories {
        let pool = init_memory_database().await.unwrap();
        Repositories::new(Arc::new(SqliteDocumentStore::new(pool)))
    }

    #[tokio::test]
    async fn insert_assigns_canonical_id() {
        let repos = repos().await;
        let mut film = Film {
            title: "Nausicaa".to_string(),
            roles: vec![Role::new("Nausicaa", "a1")],
            ..Film::default()
        };

        let id = repos.films.insert(&mut film).await.unwrap();
        assert!(id_utils::is_valid(&id));
        assert_eq!(film.id, id);

        let loaded = repos.films.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(loaded, film);
    }

    #[tokio::test]
    async fn find_many_sorts_by_name() {
        let repos = repos().await;
        for name in ["Takahata", "Miyazaki", "Kondo"] {
            let mut director = Director {
                name: name.to_string(),
                ..Director::default()
            };
            repos.directors.insert(&mut director).await.unwrap();
        }

        let names: Vec<String> = repos
            .directors
            .find_many(&Filter::All, None)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, ["Kondo", "Miyazaki", "Takahata"]);

        let limited = repos.directors.find_many(&Filter::All, Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn missing_id_yields_none() {
        let repos = repos().await;
        let missing = id_utils::generate();
        assert!(repos.actors.find_by_id(&missing).await.unwrap().is_none());
        assert_eq!(repos.actors.delete_by_id(&missing).await.unwrap(), 0);
    }
}
