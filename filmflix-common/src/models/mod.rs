//! Catalog entities and request payloads
//!
//! Entities serialize to exactly the persisted document shape, so the same
//! structs travel between the store and the HTTP layer.

mod film;
mod participant;

pub use film::{DirectorsUpdate, Film, FilmPatch, NewFilm, Role, RolesUpdate};
pub use participant::{Actor, Director, NewParticipant, ParticipantPatch};

pub(crate) use film::actor_ids;

use crate::store::Collection;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Field holding a participant's back-referenced film ids
pub const FILMS_FIELD: &str = "films";
/// Field holding a film's roles
pub const ROLES_FIELD: &str = "roles";
/// Field holding a film's director ids
pub const DIRECTORS_FIELD: &str = "directors";
/// Key of the actor id inside a role
pub const ROLE_ACTOR_KEY: &str = "actor";

/// A document type owned by one collection
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;
    /// Field used to order `find_many` results
    const SORT_FIELD: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}
