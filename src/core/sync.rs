//! Reconciling a fetched catalog list with the stored library.
//!
//! Sync never deletes: catalog entries missing from the fetch are kept, and
//! manual entries, tags and status overrides are never touched.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::adapters::{CatalogClient, RawCatalogRecord};
use crate::domain::{GameEntry, GameId};
use crate::error::Result;
use crate::library::{Collection, StateStore, StoreState};

/// A fetched playtime lower than the recorded one; flagged, not applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaytimeAnomaly {
    pub id: GameId,
    pub name: String,
    pub recorded_minutes: u64,
    pub reported_minutes: u64,
}

/// What a merge did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records received from the catalog
    pub fetched: usize,

    /// New catalog entries
    pub added: usize,

    /// Existing entries with at least one changed field
    pub updated: usize,

    /// Existing entries left identical
    pub unchanged: usize,

    /// Stored catalog entries absent from the fetch, kept as they were
    pub retained: usize,

    pub anomalies: Vec<PlaytimeAnomaly>,

    /// Fetched ids already used by a manual entry, skipped
    pub shadowed: Vec<GameId>,
}

/// Merged state plus its report; the caller persists the state
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub state: StoreState,
    pub report: SyncReport,
}

/// Merge fetched catalog records into the existing state
pub fn merge(existing: StoreState, fetched: Vec<RawCatalogRecord>) -> SyncOutcome {
    let mut state = existing;
    let mut report = SyncReport {
        fetched: fetched.len(),
        ..Default::default()
    };

    let mut seen = std::collections::HashSet::new();

    for record in fetched {
        let id = GameId::App(record.catalog_id);

        if state.manual.iter().any(|g| g.id == id) {
            warn!(
                "Skipping catalog record {} ({}): id is held by a manual entry",
                id, record.name
            );
            report.shadowed.push(id);
            continue;
        }
        seen.insert(id);

        match state.games.get_mut(&id) {
            Some(entry) => {
                let before = entry.clone();
                apply_record(entry, &record, &mut report);
                if *entry == before {
                    report.unchanged += 1;
                } else {
                    report.updated += 1;
                }
            }
            None => {
                let name = if record.name.trim().is_empty() {
                    format!("App {}", record.catalog_id)
                } else {
                    record.name
                };
                let mut entry = GameEntry::catalog(record.catalog_id, name)
                    .with_playtime(record.total_playtime_minutes);
                entry.platform = record.platform_hint;
                entry.last_played_at = record.last_played_at;
                state.games.insert(id, entry);
                report.added += 1;
            }
        }
    }

    report.retained = state.games.keys().filter(|id| !seen.contains(*id)).count();

    SyncOutcome { state, report }
}

fn apply_record(entry: &mut GameEntry, record: &RawCatalogRecord, report: &mut SyncReport) {
    // A blank name never replaces a known one
    if !record.name.trim().is_empty() {
        entry.name = record.name.clone();
    }
    entry.platform = record.platform_hint.clone();
    entry.last_played_at = record.last_played_at;

    if record.total_playtime_minutes >= entry.playtime_minutes {
        entry.playtime_minutes = record.total_playtime_minutes;
    } else {
        warn!(
            "Playtime regression for {} ({}): recorded {} min, catalog reports {} min; keeping recorded value",
            entry.id, entry.name, entry.playtime_minutes, record.total_playtime_minutes
        );
        report.anomalies.push(PlaytimeAnomaly {
            id: entry.id,
            name: entry.name.clone(),
            recorded_minutes: entry.playtime_minutes,
            reported_minutes: record.total_playtime_minutes,
        });
    }
}

/// Fetch the remote library, merge it and persist the games collection.
///
/// The store is loaded before the fetch so an unreadable games document
/// fails fast. Remote failures are returned as-is, without retry; on any
/// failure the stored state is left untouched.
pub async fn sync_library(
    store: &dyn StateStore,
    client: &dyn CatalogClient,
    api_key: &str,
    steam_id: &str,
    now: DateTime<Utc>,
) -> Result<SyncReport> {
    let existing = store.load_for(&[Collection::Games, Collection::ManualGames])?;

    info!("Syncing game library from {}", client.name());
    let fetched = client.fetch_library(api_key, steam_id).await?;

    let SyncOutcome { mut state, report } = merge(existing, fetched);
    state.last_synced = Some(now);
    store.save_collections(&state, &[Collection::Games])?;

    info!(
        "Sync complete: {} fetched, {} added, {} updated, {} unchanged, {} retained, {} anomalies",
        report.fetched,
        report.added,
        report.updated,
        report.unchanged,
        report.retained,
        report.anomalies.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_merge_into_empty_state() {
        let fetched = vec![
            RawCatalogRecord::new(10, "Portal 2"),
            RawCatalogRecord::new(20, "Celeste")
                .with_playtime(600)
                .with_last_played(now() - Duration::days(3)),
        ];

        let outcome = merge(StoreState::new(), fetched);
        assert_eq!(outcome.report.added, 2);
        assert_eq!(outcome.state.games.len(), 2);
        assert_eq!(outcome.state.games[&GameId::App(20)].playtime_minutes, 600);
    }

    #[test]
    fn test_playtime_regression_is_flagged_not_applied() {
        let mut state = StoreState::new();
        state
            .games
            .insert(GameId::App(20), GameEntry::catalog(20, "Celeste").with_playtime(600));

        let outcome = merge(state, vec![RawCatalogRecord::new(20, "Celeste").with_playtime(500)]);

        assert_eq!(outcome.state.games[&GameId::App(20)].playtime_minutes, 600);
        assert_eq!(
            outcome.report.anomalies,
            vec![PlaytimeAnomaly {
                id: GameId::App(20),
                name: "Celeste".to_string(),
                recorded_minutes: 600,
                reported_minutes: 500,
            }]
        );
    }

    #[test]
    fn test_missing_records_are_retained() {
        let mut state = StoreState::new();
        state.games.insert(GameId::App(1), GameEntry::catalog(1, "Hidden Game").with_playtime(42));

        let outcome = merge(state, vec![RawCatalogRecord::new(2, "New Game")]);

        assert_eq!(outcome.report.retained, 1);
        assert_eq!(outcome.state.games[&GameId::App(1)].playtime_minutes, 42);
    }

    #[test]
    fn test_update_counts() {
        let mut state = StoreState::new();
        state.games.insert(GameId::App(1), GameEntry::catalog(1, "Same").with_playtime(5));
        state.games.insert(GameId::App(2), GameEntry::catalog(2, "Old Name"));

        let outcome = merge(
            state,
            vec![
                RawCatalogRecord::new(1, "Same").with_playtime(5),
                RawCatalogRecord::new(2, "New Name"),
            ],
        );

        assert_eq!(outcome.report.unchanged, 1);
        assert_eq!(outcome.report.updated, 1);
        assert_eq!(outcome.state.games[&GameId::App(2)].name, "New Name");
    }

    #[test]
    fn test_blank_fetched_name_never_stored() {
        let mut state = StoreState::new();
        state.games.insert(GameId::App(1), GameEntry::catalog(1, "Known"));

        let outcome = merge(
            state,
            vec![RawCatalogRecord::new(1, ""), RawCatalogRecord::new(2, "  ")],
        );

        assert_eq!(outcome.state.games[&GameId::App(1)].name, "Known");
        assert_eq!(outcome.state.games[&GameId::App(2)].name, "App 2");
    }

    #[test]
    fn test_manual_id_shadows_fetched_record() {
        let mut state = StoreState::new();
        let manual = GameEntry::manual(GameId::App(620), "Portal 2", "Switch").with_playtime(30);
        state.manual.push(manual.clone());

        let outcome = merge(state, vec![RawCatalogRecord::new(620, "Portal 2").with_playtime(900)]);

        assert_eq!(outcome.report.shadowed, vec![GameId::App(620)]);
        assert!(outcome.state.games.is_empty());
        assert_eq!(outcome.state.manual, vec![manual]);
    }
}
