//! Sync Merger Integration Tests
//!
//! Tests for merging fetched catalog records into stored state, including
//! the async sync entry point against a fake catalog client.

use std::sync::Mutex;

use async_trait::async_trait;
use backlog::adapters::{CatalogClient, RawCatalogRecord};
use backlog::core::{merge, sync_library};
use backlog::domain::{GameEntry, GameId, ManualStatus};
use backlog::library::{Collection, FileStore, MemoryStore, StateStore, StoreState};
use backlog::{LibraryError, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Catalog client returning a canned response
struct FakeCatalog {
    response: Mutex<Option<Result<Vec<RawCatalogRecord>>>>,
}

impl FakeCatalog {
    fn returning(records: Vec<RawCatalogRecord>) -> Self {
        Self {
            response: Mutex::new(Some(Ok(records))),
        }
    }

    fn failing(err: LibraryError) -> Self {
        Self {
            response: Mutex::new(Some(Err(err))),
        }
    }
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch_library(&self, _api_key: &str, _steam_id: &str) -> Result<Vec<RawCatalogRecord>> {
        self.response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn lookup_app_name(&self, _app_id: u64) -> Result<Option<String>> {
        Ok(None)
    }
}

fn existing_state() -> StoreState {
    let mut state = StoreState::new();
    state
        .games
        .insert(GameId::App(20), GameEntry::catalog(20, "Celeste").with_playtime(600));
    state
        .games
        .insert(GameId::App(30), GameEntry::catalog(30, "Hidden Title").with_playtime(15));
    state
        .manual
        .push(GameEntry::manual(GameId::Local(1), "Hades", "Switch").with_playtime(45));
    state
        .tags
        .insert(GameId::App(20), ["platformer".to_string()].into_iter().collect());
    state.statuses.insert(GameId::Local(1), ManualStatus::Hold);
    state
}

#[test]
fn test_merge_preserves_local_data_and_never_lowers_playtime() {
    let before = existing_state();
    let fetched = vec![
        RawCatalogRecord::new(20, "Celeste").with_playtime(300),
        RawCatalogRecord::new(40, "Tunic").with_playtime(10),
    ];

    let outcome = merge(before.clone(), fetched);
    let after = outcome.state;

    assert_eq!(after.manual, before.manual);
    assert_eq!(after.tags, before.tags);
    assert_eq!(after.statuses, before.statuses);

    for (id, old) in &before.games {
        assert!(after.games[id].playtime_minutes >= old.playtime_minutes);
    }
    assert_eq!(after.games[&GameId::App(30)], before.games[&GameId::App(30)]);
    assert_eq!(outcome.report.added, 1);
    assert_eq!(outcome.report.retained, 1);
    assert_eq!(outcome.report.anomalies.len(), 1);
}

#[test]
fn test_merge_updates_recency_even_with_anomaly() {
    let played = now() - Duration::days(2);
    let outcome = merge(
        existing_state(),
        vec![RawCatalogRecord::new(20, "Celeste")
            .with_playtime(1)
            .with_last_played(played)],
    );

    let celeste = &outcome.state.games[&GameId::App(20)];
    assert_eq!(celeste.playtime_minutes, 600);
    assert_eq!(celeste.last_played_at, Some(played));
}

#[tokio::test]
async fn test_sync_library_saves_only_games() {
    let store = MemoryStore::with_state(existing_state());
    let client = FakeCatalog::returning(vec![RawCatalogRecord::new(40, "Tunic")]);

    let report = sync_library(&store, &client, "key", "id", now()).await.unwrap();

    assert_eq!(report.added, 1);
    assert_eq!(store.saved(), vec![Collection::Games]);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.last_synced, Some(now()));
    assert!(snapshot.games.contains_key(&GameId::App(40)));
}

#[tokio::test]
async fn test_sync_library_tolerates_corrupt_side_tables() {
    let store = MemoryStore::with_state(existing_state());
    store.mark_corrupt(Collection::Tags);
    let client = FakeCatalog::returning(vec![RawCatalogRecord::new(40, "Tunic")]);

    sync_library(&store, &client, "key", "id", now()).await.unwrap();
    assert_eq!(store.saved(), vec![Collection::Games]);
}

#[tokio::test]
async fn test_sync_library_fails_on_corrupt_games() {
    let store = MemoryStore::with_state(existing_state());
    store.mark_corrupt(Collection::Games);
    let client = FakeCatalog::returning(vec![]);

    let result = sync_library(&store, &client, "key", "id", now()).await;
    assert!(matches!(result, Err(LibraryError::CorruptStore { .. })));
    assert!(store.saved().is_empty());
}

#[tokio::test]
async fn test_remote_errors_propagate_and_leave_store_untouched() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(temp.path());
    store.save(&existing_state()).unwrap();
    let before = store.load().unwrap();

    let client = FakeCatalog::failing(LibraryError::Privacy("private profile".to_string()));
    let result = sync_library(&store, &client, "key", "id", now()).await;
    assert!(matches!(result, Err(LibraryError::Privacy(_))));

    let client = FakeCatalog::failing(LibraryError::RemoteUnavailable("timeout".to_string()));
    let result = sync_library(&store, &client, "key", "id", now()).await;
    assert!(result.unwrap_err().is_remote());

    assert_eq!(store.load().unwrap(), before);
}

#[tokio::test]
async fn test_sync_round_trips_through_file_store() {
    let temp = TempDir::new().unwrap();
    let store = FileStore::new(temp.path());
    let client = FakeCatalog::returning(vec![
        RawCatalogRecord::new(10, "Portal 2"),
        RawCatalogRecord::new(20, "Celeste").with_playtime(600),
    ]);

    sync_library(&store, &client, "key", "id", now()).await.unwrap();

    let state = store.load().unwrap();
    assert_eq!(state.games.len(), 2);
    assert_eq!(state.last_synced, Some(now()));
}
