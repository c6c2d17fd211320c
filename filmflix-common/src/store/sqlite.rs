//! SQLite-backed document store
//!
//! Each collection is a table `(id TEXT PRIMARY KEY, body TEXT, ...)` holding
//! the JSON document without its `_id` (the `id` column is authoritative).
//! Filters on `_id` are pushed down to SQL; every other filter is evaluated
//! over the decoded documents.
//!
//! Updates and deletes take a process-wide write guard and run
//! read-modify-write inside one `BEGIN IMMEDIATE` transaction, so each
//! single-document mutation is atomic and waits out writers on other
//! connections instead of failing.

use super::{
    compare_values, Collection, Document, DocumentStore, Filter, FindOptions, Update,
    UpdateResult, ID_FIELD,
};
use crate::db::begin_immediate;
use crate::{id_utils, Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl SqliteDocumentStore {
    /// Wrap a pool whose schema was created by [`crate::db::initialize_schema`]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Load every document of `collection` matching `filter`, in insertion order
async fn load<'e, E>(executor: E, collection: Collection, filter: &Filter) -> Result<Vec<Document>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT id, body FROM {}", collection.name()));

    if let Some(ids) = filter.id_lookup() {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        query.push(" WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");
    }
    query.push(" ORDER BY rowid");

    let rows: Vec<(String, String)> = query.build_query_as().fetch_all(executor).await?;

    let mut documents = Vec::with_capacity(rows.len());
    for (id, body) in rows {
        let document = decode(id, &body)?;
        if filter.matches(&document) {
            documents.push(document);
        }
    }
    Ok(documents)
}

fn decode(id: String, body: &str) -> Result<Document> {
    let mut document: Document = serde_json::from_str(body)?;
    document.insert(ID_FIELD.to_string(), Value::String(id));
    Ok(document)
}

/// Serialize a document body, leaving `_id` to the id column
fn encode(document: &Document) -> Result<String> {
    let mut body = document.clone();
    body.remove(ID_FIELD);
    Ok(serde_json::to_string(&body)?)
}

fn document_id(document: &Document) -> Result<String> {
    match document.get(ID_FIELD) {
        Some(Value::String(id)) => Ok(id.clone()),
        _ => Err(Error::Internal("stored document without string _id".to_string())),
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>> {
        let mut documents = load(&self.pool, collection, filter).await?;

        if let Some(sort) = &options.sort {
            documents.sort_by(|a, b| {
                let ordering = compare_values(a.get(&sort.field), b.get(&sort.field));
                if sort.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        if let Some(limit) = options.limit {
            documents.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        Ok(documents)
    }

    async fn insert_one(&self, collection: Collection, mut document: Document) -> Result<String> {
        let id = match document.get(ID_FIELD) {
            None => id_utils::generate(),
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(Error::Store(format!("_id must be a string, got {other}")));
            }
        };
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        sqlx::query(&format!(
            "INSERT INTO {} (id, body) VALUES (?, ?)",
            collection.name()
        ))
        .bind(&id)
        .bind(encode(&document)?)
        .execute(&self.pool)
        .await?;

        debug!(collection = %collection, id = %id, "Inserted document");
        Ok(id)
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult> {
        let _guard = self.write_lock.lock().await;
        let mut tx = begin_immediate(&self.pool).await?;

        let Some(mut document) = load(&mut *tx, collection, filter).await?.into_iter().next() else {
            return Ok(UpdateResult::default());
        };
        let id = document_id(&document)?;

        let modified = update.apply(&mut document)?;
        if modified {
            sqlx::query(&format!(
                "UPDATE {} SET body = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
                collection.name()
            ))
            .bind(encode(&document)?)
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(UpdateResult {
            matched: 1,
            modified: u64::from(modified),
        })
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let mut tx = begin_immediate(&self.pool).await?;

        let Some(document) = load(&mut *tx, collection, filter).await?.into_iter().next() else {
            return Ok(0);
        };
        let id = document_id(&document)?;

        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", collection.name()))
            .bind(&id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }
}
