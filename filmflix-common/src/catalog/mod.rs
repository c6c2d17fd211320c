//! Catalog service
//!
//! Entry point for every film, actor and director operation. Each mutation
//! validates references, writes the primary document, then records the
//! reverse-reference updates in the sync outbox. The response never waits
//! for the reverse side to be applied.

mod films;
mod participants;

pub use participants::Participant;

use crate::repository::Repositories;
use crate::store::{Collection, DocumentStore};
use crate::sync::{Outbox, SyncIntent};
use crate::validator::ReferenceValidator;
use crate::{id_utils, Error, Result};
use std::sync::Arc;
use tracing::error;

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// No document had the id; nothing changed
    NothingDeleted,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    repos: Repositories,
    validator: ReferenceValidator,
    outbox: Outbox,
    validate_patch_references: bool,
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>, outbox: Outbox) -> Self {
        Self {
            repos: Repositories::new(Arc::clone(&store)),
            validator: ReferenceValidator::new(store),
            outbox,
            validate_patch_references: false,
        }
    }

    /// Re-validate `films` ids on actor/director updates
    pub fn with_patch_validation(mut self, enabled: bool) -> Self {
        self.validate_patch_references = enabled;
        self
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Hand reverse-reference updates to the outbox.
    ///
    /// The primary write has already happened, so on failure the intents are
    /// logged in full for manual reconciliation.
    async fn publish(&self, intents: Vec<SyncIntent>) -> Result<()> {
        if let Err(e) = self.outbox.enqueue(&intents).await {
            for intent in &intents {
                let (collection, id) = intent.target();
                error!(
                    collection = %collection,
                    id,
                    operation = intent.operation(),
                    intent = ?intent,
                    "Failed to record sync intent: {}",
                    e
                );
            }
            return Err(e);
        }
        Ok(())
    }
}

/// Reject path ids that are not canonical identifiers
fn check_id(id: &str) -> Result<()> {
    if id_utils::is_valid(id) {
        Ok(())
    } else {
        Err(Error::InvalidInput("Id is invalid".to_string()))
    }
}

fn not_found(collection: Collection) -> Error {
    Error::NotFound(format!("{} not found", collection.label()))
}
