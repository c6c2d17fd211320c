//! Integration tests for the catalog service
//!
//! Each test runs against a private in-memory database. Reverse references
//! are applied by draining the sync outbox explicitly, which stands in for
//! the background worker.

use filmflix_common::catalog::{Catalog, DeleteOutcome};
use filmflix_common::config::SyncConfig;
use filmflix_common::db::{init_database, init_memory_database};
use filmflix_common::id_utils;
use filmflix_common::models::{
    Actor, Director, DirectorsUpdate, Film, FilmPatch, NewFilm, NewParticipant,
    ParticipantPatch, Role, RolesUpdate,
};
use filmflix_common::store::{DocumentStore, SqliteDocumentStore};
use filmflix_common::sync::{Outbox, SyncWorker, Synchronizer};
use filmflix_common::{Error, ValidationError};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::task::JoinSet;

struct Harness {
    catalog: Catalog,
    worker: SyncWorker,
}

impl Harness {
    async fn new() -> Self {
        Self::with_pool(init_memory_database().await.unwrap())
    }

    /// Harness over a database file, with the production connection pool
    async fn on_disk(dir: &TempDir) -> Self {
        Self::with_pool(init_database(&dir.path().join("filmflix.db")).await.unwrap())
    }

    fn with_pool(pool: SqlitePool) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::new(pool.clone()));
        let outbox = Outbox::new(pool);
        let catalog = Catalog::new(store, outbox.clone());
        let worker = SyncWorker::new(
            Synchronizer::new(catalog.repositories().clone()),
            outbox,
            SyncConfig::default(),
        );
        Self { catalog, worker }
    }

    /// Apply every pending sync intent
    async fn settle(&self) {
        let report = self.worker.drain_once().await.unwrap();
        assert_eq!(report.retried + report.dead, 0, "sync failed: {:?}", report);
    }

    async fn actor(&self, name: &str) -> Actor {
        self.catalog
            .create_participant(NewParticipant {
                name: name.to_string(),
                films: vec![],
            })
            .await
            .unwrap()
    }

    async fn director(&self, name: &str) -> Director {
        self.catalog
            .create_participant(NewParticipant {
                name: name.to_string(),
                films: vec![],
            })
            .await
            .unwrap()
    }

    async fn film(&self, title: &str, directors: &[&Director], actors: &[&Actor]) -> Film {
        self.catalog
            .create_film(NewFilm {
                title: title.to_string(),
                release_date: "1988".to_string(),
                directors: directors.iter().map(|d| d.id.clone()).collect(),
                roles: actors.iter().map(|a| Role::new("Lead", a.id.clone())).collect(),
                ..NewFilm::default()
            })
            .await
            .unwrap()
    }

    async fn reload_film(&self, film: &Film) -> Film {
        self.catalog.get_film(&film.id).await.unwrap()
    }

    async fn reload_actor(&self, actor: &Actor) -> Actor {
        self.catalog.get_participant(&actor.id).await.unwrap()
    }

    async fn reload_director(&self, director: &Director) -> Director {
        self.catalog.get_participant(&director.id).await.unwrap()
    }
}

// ============================================================================
// Films
// ============================================================================

#[tokio::test]
async fn test_create_film_links_director_and_actor() {
    let h = Harness::new().await;
    let d1 = h.director("Hayao Miyazaki").await;
    let a1 = h.actor("Noriko Hidaka").await;

    let film = h.film("My Neighbor Totoro", &[&d1], &[&a1]).await;
    assert!(id_utils::is_valid(&film.id));
    h.settle().await;

    assert_eq!(h.reload_director(&d1).await.films, [film.id.clone()]);
    assert_eq!(h.reload_actor(&a1).await.films, [film.id.clone()]);
}

#[tokio::test]
async fn test_create_film_round_trip() {
    let h = Harness::new().await;
    let d1 = h.director("Isao Takahata").await;

    let created = h.film("Grave of the Fireflies", &[&d1], &[]).await;
    let fetched = h.reload_film(&created).await;

    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_create_film_requires_title_and_release_date() {
    let h = Harness::new().await;

    let err = h
        .catalog
        .create_film(NewFilm {
            title: "Untitled".to_string(),
            ..NewFilm::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput(ref m) if m == "Data is invalid"));
    assert!(h.catalog.list_films(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_film_with_unknown_actor_is_rejected() {
    let h = Harness::new().await;

    let err = h
        .catalog
        .create_film(NewFilm {
            title: "Kiki's Delivery Service".to_string(),
            release_date: "1989".to_string(),
            roles: vec![Role::new("Kiki", id_utils::generate())],
            ..NewFilm::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Validation(ValidationError::Missing { kind: "actor" })
    ));
    assert!(h.catalog.list_films(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_film_reports_malformed_director_index() {
    let h = Harness::new().await;
    let d1 = h.director("Goro Miyazaki").await;

    let err = h
        .catalog
        .create_film(NewFilm {
            title: "Tales from Earthsea".to_string(),
            release_date: "2006".to_string(),
            directors: vec![d1.id.clone(), "bogus".to_string()],
            ..NewFilm::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Id of director no. 1 is invalid");
}

#[tokio::test]
async fn test_create_film_reports_role_index_past_repeated_actor() {
    let h = Harness::new().await;
    let a1 = h.actor("Rumi Hiiragi").await;

    let err = h
        .catalog
        .create_film(NewFilm {
            title: "Spirited Away".to_string(),
            release_date: "2001".to_string(),
            roles: vec![
                Role::new("Chihiro", a1.id.clone()),
                Role::new("Chihiro", a1.id.clone()),
                Role::new("Haku", "bad"),
            ],
            ..NewFilm::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Id of actor no. 2 is invalid");
}

#[tokio::test]
async fn test_delete_film_clears_back_references() {
    let h = Harness::new().await;
    let d1 = h.director("Hayao Miyazaki").await;
    let a1 = h.actor("Rumi Hiiragi").await;
    let a2 = h.actor("Miyu Irino").await;
    let kept = h.film("Howl's Moving Castle", &[&d1], &[&a1]).await;
    let film = h.film("Spirited Away", &[&d1], &[&a1, &a2]).await;
    h.settle().await;

    let outcome = h.catalog.delete_film(&film.id).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    h.settle().await;

    assert_eq!(h.reload_director(&d1).await.films, [kept.id.clone()]);
    assert_eq!(h.reload_actor(&a1).await.films, [kept.id.clone()]);
    assert!(h.reload_actor(&a2).await.films.is_empty());
    assert!(matches!(
        h.catalog.get_film(&film.id).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_missing_film_is_nothing_deleted() {
    let h = Harness::new().await;
    let d1 = h.director("Hayao Miyazaki").await;
    let film = h.film("Ponyo", &[&d1], &[]).await;
    h.settle().await;

    let outcome = h.catalog.delete_film(&id_utils::generate()).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::NothingDeleted);

    let status = h.catalog.outbox().status().await.unwrap();
    assert_eq!(status.pending, 0);
    assert_eq!(h.reload_director(&d1).await.films, [film.id.clone()]);
}

#[tokio::test]
async fn test_malformed_film_id_is_rejected() {
    let h = Harness::new().await;

    for result in [
        h.catalog.get_film("123").await.map(|_| ()),
        h.catalog.delete_film("123").await.map(|_| ()),
        h.catalog.update_film("123", FilmPatch::default()).await,
    ] {
        assert!(matches!(result, Err(Error::InvalidInput(ref m)) if m == "Id is invalid"));
    }
}

#[tokio::test]
async fn test_update_film_scalar_fields() {
    let h = Harness::new().await;
    let film = h.film("The Wind Rises", &[], &[]).await;

    h.catalog
        .update_film(
            &film.id,
            FilmPatch {
                rt_score: Some("89".to_string()),
                ..FilmPatch::default()
            },
        )
        .await
        .unwrap();

    let stored = h.reload_film(&film).await;
    assert_eq!(stored.rt_score, "89");
    assert_eq!(stored.title, "The Wind Rises");
}

#[tokio::test]
async fn test_update_missing_film_is_not_found() {
    let h = Harness::new().await;
    let result = h
        .catalog
        .update_film(
            &id_utils::generate(),
            FilmPatch {
                title: Some("Ghost".to_string()),
                ..FilmPatch::default()
            },
        )
        .await;

    assert!(matches!(result, Err(Error::NotFound(ref m)) if m == "Film not found"));
}

#[tokio::test]
async fn test_update_film_directors_moves_references() {
    let h = Harness::new().await;
    let d1 = h.director("D1").await;
    let d2 = h.director("D2").await;
    let d3 = h.director("D3").await;
    let film = h.film("Only Yesterday", &[&d1, &d2], &[]).await;
    h.settle().await;

    h.catalog
        .update_film_directors(
            &film.id,
            DirectorsUpdate {
                directors: vec![d2.id.clone(), d3.id.clone()],
                replace: true,
            },
        )
        .await
        .unwrap();
    h.settle().await;

    assert!(h.reload_director(&d1).await.films.is_empty());
    assert_eq!(h.reload_director(&d2).await.films, [film.id.clone()]);
    assert_eq!(h.reload_director(&d3).await.films, [film.id.clone()]);
    assert_eq!(h.reload_film(&film).await.directors, [d2.id.clone(), d3.id.clone()]);
}

#[tokio::test]
async fn test_append_film_directors_keeps_existing() {
    let h = Harness::new().await;
    let d1 = h.director("D1").await;
    let d2 = h.director("D2").await;
    let film = h.film("The Cat Returns", &[&d1], &[]).await;
    h.settle().await;

    h.catalog
        .update_film_directors(
            &film.id,
            DirectorsUpdate {
                directors: vec![d1.id.clone(), d2.id.clone()],
                replace: false,
            },
        )
        .await
        .unwrap();
    h.settle().await;

    assert_eq!(h.reload_film(&film).await.directors, [d1.id.clone(), d2.id.clone()]);
    assert_eq!(h.reload_director(&d1).await.films, [film.id.clone()]);
    assert_eq!(h.reload_director(&d2).await.films, [film.id.clone()]);
}

#[tokio::test]
async fn test_update_film_roles_replace_and_append() {
    let h = Harness::new().await;
    let a1 = h.actor("A1").await;
    let a2 = h.actor("A2").await;
    let a3 = h.actor("A3").await;
    let film = h.film("Princess Mononoke", &[], &[&a1, &a2]).await;
    h.settle().await;

    h.catalog
        .update_film_roles(
            &film.id,
            RolesUpdate {
                roles: vec![Role::new("Ashitaka", a2.id.clone())],
                replace: true,
            },
        )
        .await
        .unwrap();
    h.settle().await;

    assert!(h.reload_actor(&a1).await.films.is_empty());
    assert_eq!(h.reload_actor(&a2).await.films, [film.id.clone()]);

    h.catalog
        .update_film_roles(
            &film.id,
            RolesUpdate {
                roles: vec![Role::new("San", a3.id.clone())],
                replace: false,
            },
        )
        .await
        .unwrap();
    h.settle().await;

    assert_eq!(
        h.reload_film(&film).await.roles,
        vec![
            Role::new("Ashitaka", a2.id.clone()),
            Role::new("San", a3.id.clone())
        ]
    );
    assert_eq!(h.reload_actor(&a3).await.films, [film.id.clone()]);
}

#[tokio::test]
async fn test_append_existing_role_is_not_duplicated() {
    let h = Harness::new().await;
    let a1 = h.actor("A1").await;
    let film = h.film("Spirited Away", &[], &[&a1]).await;
    h.settle().await;

    h.catalog
        .update_film_roles(
            &film.id,
            RolesUpdate {
                roles: vec![Role::new("Lead", a1.id.clone())],
                replace: false,
            },
        )
        .await
        .unwrap();
    h.settle().await;

    assert_eq!(h.reload_film(&film).await.roles, vec![Role::new("Lead", a1.id.clone())]);
    assert_eq!(h.reload_actor(&a1).await.films, [film.id.clone()]);
}

#[tokio::test]
async fn test_concurrent_films_with_same_actor() {
    let h = Harness::new().await;
    let a1 = h.actor("Shared Actor").await;

    let actors = [&a1];
    let (first, second) = tokio::join!(
        h.film("Film One", &[], &actors),
        h.film("Film Two", &[], &actors)
    );
    h.settle().await;

    let films = h.reload_actor(&a1).await.films;
    assert_eq!(films.len(), 2);
    assert!(films.contains(&first.id));
    assert!(films.contains(&second.id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_concurrent_writes_on_database_file() {
    let dir = TempDir::new().unwrap();
    let h = Harness::on_disk(&dir).await;
    let a1 = h.actor("A1").await;
    let a2 = h.actor("A2").await;
    let target = h.film("Target", &[], &[&a1]).await;

    let mut tasks = JoinSet::new();
    for i in 0..200 {
        let catalog = h.catalog.clone();
        let (a1, a2, target) = (a1.id.clone(), a2.id.clone(), target.id.clone());
        tasks.spawn(async move {
            if i % 2 == 0 {
                catalog
                    .create_film(NewFilm {
                        title: format!("Film {i}"),
                        release_date: "2000".to_string(),
                        roles: vec![Role::new("Lead", a1)],
                        ..NewFilm::default()
                    })
                    .await
                    .map(|film| Some(film.id))
            } else {
                catalog
                    .update_film_roles(
                        &target,
                        RolesUpdate {
                            roles: vec![Role::new("Lead", a2)],
                            replace: false,
                        },
                    )
                    .await
                    .map(|()| None)
            }
        });
    }

    let mut created = vec![target.id.clone()];
    while let Some(joined) = tasks.join_next().await {
        if let Some(id) = joined.unwrap().unwrap() {
            created.push(id);
        }
    }
    h.settle().await;

    assert_eq!(created.len(), 101);
    assert_eq!(
        h.reload_film(&target).await.roles,
        vec![Role::new("Lead", a1.id.clone()), Role::new("Lead", a2.id.clone())]
    );
    assert_eq!(h.reload_actor(&a2).await.films, [target.id.clone()]);

    let mut linked = h.reload_actor(&a1).await.films;
    linked.sort();
    created.sort();
    assert_eq!(linked, created);
}

#[tokio::test]
async fn test_list_films_sorted_and_limited() {
    let h = Harness::new().await;
    for title in ["Porco Rosso", "Arrietty", "Mononoke"] {
        h.film(title, &[], &[]).await;
    }

    let titles: Vec<String> = h
        .catalog
        .list_films(None)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.title)
        .collect();
    assert_eq!(titles, ["Arrietty", "Mononoke", "Porco Rosso"]);
    assert_eq!(h.catalog.list_films(Some(2)).await.unwrap().len(), 2);
}

// ============================================================================
// Actors and directors
// ============================================================================

#[tokio::test]
async fn test_create_actor_with_films_adds_uncredited_roles() {
    let h = Harness::new().await;
    let film = h.film("Castle in the Sky", &[], &[]).await;

    let actor: Actor = h
        .catalog
        .create_participant(NewParticipant {
            name: "Keiko Yokozawa".to_string(),
            films: vec![film.id.clone()],
        })
        .await
        .unwrap();
    h.settle().await;

    assert_eq!(actor.films, [film.id.clone()]);
    assert_eq!(h.reload_film(&film).await.roles, vec![Role::uncredited(actor.id.clone())]);
}

#[tokio::test]
async fn test_create_participant_requires_name() {
    let h = Harness::new().await;
    let result = h
        .catalog
        .create_participant::<Director>(NewParticipant::default())
        .await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_create_director_with_unknown_film_is_rejected() {
    let h = Harness::new().await;
    let result = h
        .catalog
        .create_participant::<Director>(NewParticipant {
            name: "Nobody".to_string(),
            films: vec![id_utils::generate()],
        })
        .await;
    assert!(matches!(
        result,
        Err(Error::Validation(ValidationError::Missing { kind: "film" }))
    ));
    assert!(h
        .catalog
        .list_participants::<Director>(None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_update_director_films_diffs_film_side() {
    let h = Harness::new().await;
    let f1 = h.film("F1", &[], &[]).await;
    let f2 = h.film("F2", &[], &[]).await;
    let f3 = h.film("F3", &[], &[]).await;
    let director: Director = h
        .catalog
        .create_participant(NewParticipant {
            name: "Hiromasa Yonebayashi".to_string(),
            films: vec![f1.id.clone(), f2.id.clone()],
        })
        .await
        .unwrap();
    h.settle().await;

    h.catalog
        .update_participant::<Director>(
            &director.id,
            ParticipantPatch {
                name: None,
                films: Some(vec![f2.id.clone(), f3.id.clone()]),
            },
        )
        .await
        .unwrap();
    h.settle().await;

    assert!(h.reload_film(&f1).await.directors.is_empty());
    assert_eq!(h.reload_film(&f2).await.directors, [director.id.clone()]);
    assert_eq!(h.reload_film(&f3).await.directors, [director.id.clone()]);
}

#[tokio::test]
async fn test_update_actor_name_only_enqueues_nothing() {
    let h = Harness::new().await;
    let actor = h.actor("Old Name").await;

    h.catalog
        .update_participant::<Actor>(
            &actor.id,
            ParticipantPatch {
                name: Some("New Name".to_string()),
                films: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(h.reload_actor(&actor).await.name, "New Name");
    assert_eq!(h.catalog.outbox().status().await.unwrap().pending, 0);
}

#[tokio::test]
async fn test_patch_validation_switch() {
    let h = Harness::new().await;
    let actor = h.actor("Anyone").await;
    let patch = ParticipantPatch {
        name: None,
        films: Some(vec![id_utils::generate()]),
    };

    // Off by default: unknown film ids are accepted
    h.catalog
        .update_participant::<Actor>(&actor.id, patch.clone())
        .await
        .unwrap();

    let strict = h.catalog.clone().with_patch_validation(true);
    let result = strict.update_participant::<Actor>(&actor.id, patch).await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_delete_actor_removes_roles_everywhere() {
    let h = Harness::new().await;
    let a1 = h.actor("A1").await;
    let a2 = h.actor("A2").await;
    let film = h.film("Nausicaa", &[], &[&a1, &a2]).await;
    h.settle().await;

    let outcome = h.catalog.delete_participant::<Actor>(&a1.id).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    h.settle().await;

    assert_eq!(h.reload_film(&film).await.actor_ids(), [a2.id.clone()]);
}

#[tokio::test]
async fn test_delete_director_cleans_unsynced_reference() {
    let h = Harness::new().await;
    let d1 = h.director("D1").await;
    // Not settled: d1.films never received the film id
    let film = h.film("Earwig", &[&d1], &[]).await;

    h.catalog.delete_participant::<Director>(&d1.id).await.unwrap();
    h.settle().await;

    assert!(h.reload_film(&film).await.directors.is_empty());
}

#[tokio::test]
async fn test_delete_missing_participant() {
    let h = Harness::new().await;
    let outcome = h
        .catalog
        .delete_participant::<Actor>(&id_utils::generate())
        .await
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::NothingDeleted);

    let missing = h
        .catalog
        .get_participant::<Director>(&id_utils::generate())
        .await;
    assert!(matches!(missing, Err(Error::NotFound(ref m)) if m == "Director not found"));
}
