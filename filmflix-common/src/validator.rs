//! Reference validation
//!
//! Before any write that stores ids of another collection, every id must be
//! syntactically valid and must name an existing document.

use crate::models::Role;
use crate::set_diff::dedup;
use crate::store::{Collection, DocumentStore, Filter, FindOptions, ID_FIELD};
use crate::{id_utils, Result, ValidationError};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ReferenceValidator {
    store: Arc<dyn DocumentStore>,
}

impl ReferenceValidator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Check that every id in `ids` is well formed and exists in `collection`.
    ///
    /// Syntax is checked first and reports the 0-based position of the first
    /// bad id. Duplicates are collapsed before the existence check. An empty
    /// list is valid.
    pub async fn validate_ids<S: AsRef<str>>(
        &self,
        ids: &[S],
        collection: Collection,
    ) -> Result<()> {
        let kind = collection.kind();
        if let Some(index) = ids.iter().position(|id| !id_utils::is_valid(id.as_ref())) {
            return Err(ValidationError::InvalidId { kind, index }.into());
        }

        let unique = dedup(ids.iter().map(|id| id.as_ref().to_string()));
        if unique.is_empty() {
            return Ok(());
        }

        let expected = unique.len();
        let options = FindOptions::default().limit(expected as u64);
        let found = self
            .store
            .find(collection, &Filter::is_in(ID_FIELD, unique), &options)
            .await?
            .len();

        if found != expected {
            debug!(collection = %collection, expected, found, "Reference validation failed");
            return Err(ValidationError::Missing { kind }.into());
        }
        Ok(())
    }

    /// Validate the actor ids referenced by `roles`.
    ///
    /// A malformed id is reported by its role's position in `roles`.
    pub async fn validate_roles(&self, roles: &[Role]) -> Result<()> {
        let actors: Vec<&str> = roles.iter().map(|role| role.actor.as_str()).collect();
        self.validate_ids(&actors, Collection::Actors).await
    }
}
