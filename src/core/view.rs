//! The merged view: catalog and manual entries joined with their tags and
//! resolved status.
//!
//! Side-table rows for ids that no longer have a game are simply never
//! joined, so orphaned tags or statuses never show up in results.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{resolve, GameEntry, GameId, ManualStatus, Status, StatusResolution};
use crate::library::StoreState;

/// One entry of the merged view
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryEntry {
    pub game: GameEntry,

    /// Normalized tags, sorted
    pub tags: BTreeSet<String>,

    pub manual_status: Option<ManualStatus>,

    pub resolution: StatusResolution,
}

impl LibraryEntry {
    pub fn new(
        game: GameEntry,
        tags: BTreeSet<String>,
        manual_status: Option<ManualStatus>,
        as_of: DateTime<Utc>,
    ) -> Self {
        let resolution = resolve(&game, manual_status, as_of);
        Self {
            game,
            tags,
            manual_status,
            resolution,
        }
    }

    pub fn id(&self) -> GameId {
        self.game.id
    }

    pub fn name(&self) -> &str {
        &self.game.name
    }

    pub fn status(&self) -> Status {
        self.resolution.status()
    }
}

/// Iterate the games of the merged view in view order: catalog entries by
/// id, then manual entries in insertion order.
///
/// A catalog entry whose id is also held by a manual entry is hidden; the
/// manual entry wins.
pub fn merged_games(state: &StoreState) -> impl Iterator<Item = &GameEntry> {
    let manual_ids: HashSet<GameId> = state.manual.iter().map(|g| g.id).collect();

    state
        .games
        .values()
        .filter(move |g| {
            let shadowed = manual_ids.contains(&g.id);
            if shadowed {
                debug!("Catalog entry {} is shadowed by a manual entry", g.id);
            }
            !shadowed
        })
        .chain(state.manual.iter())
}

/// Snapshot of the merged, classified library at one instant
#[derive(Debug, Clone)]
pub struct LibraryView {
    /// Instant used for status classification and recency
    pub as_of: DateTime<Utc>,

    pub entries: Vec<LibraryEntry>,

    pub last_synced: Option<DateTime<Utc>>,
}

impl LibraryView {
    /// Build the merged view of a store state
    pub fn build(state: &StoreState, as_of: DateTime<Utc>) -> Self {
        let entries = merged_games(state)
            .map(|game| {
                LibraryEntry::new(
                    game.clone(),
                    state.tags.get(&game.id).cloned().unwrap_or_default(),
                    state.statuses.get(&game.id).copied(),
                    as_of,
                )
            })
            .collect();

        Self {
            as_of,
            entries,
            last_synced: state.last_synced,
        }
    }

    /// Wrap already-joined entries (e.g. a previous query result)
    pub fn from_entries(entries: Vec<LibraryEntry>, as_of: DateTime<Utc>) -> Self {
        Self {
            as_of,
            entries,
            last_synced: None,
        }
    }

    pub fn get(&self, id: &GameId) -> Option<&LibraryEntry> {
        self.entries.iter().find(|e| &e.game.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_view_joins_side_tables() {
        let mut state = StoreState::new();
        state.games.insert(GameId::App(20), GameEntry::catalog(20, "Celeste").with_playtime(600));
        state.manual.push(GameEntry::manual(GameId::Local(1), "Hades", "Switch"));
        state.tags.insert(GameId::Local(1), BTreeSet::from(["roguelike".to_string()]));
        state.statuses.insert(GameId::App(20), ManualStatus::Completed);

        let view = LibraryView::build(&state, as_of());
        assert_eq!(view.len(), 2);
        assert_eq!(view.entries[0].id(), GameId::App(20));
        assert_eq!(view.entries[0].status(), Status::Completed);
        assert!(view.entries[1].tags.contains("roguelike"));
        assert_eq!(view.entries[1].status(), Status::Backlog);
    }

    #[test]
    fn test_orphaned_side_tables_are_not_joined() {
        let mut state = StoreState::new();
        state.tags.insert(GameId::Local(9), BTreeSet::from(["gone".to_string()]));
        state.statuses.insert(GameId::App(5), ManualStatus::Hold);

        let view = LibraryView::build(&state, as_of());
        assert!(view.is_empty());
    }

    #[test]
    fn test_manual_entry_shadows_catalog_entry_with_same_id() {
        let mut state = StoreState::new();
        state.games.insert(GameId::App(620), GameEntry::catalog(620, "Portal 2"));
        state.manual.push(GameEntry::manual(GameId::App(620), "Portal 2 (Switch)", "Switch"));

        let view = LibraryView::build(&state, as_of());
        assert_eq!(view.len(), 1);
        assert_eq!(view.entries[0].name(), "Portal 2 (Switch)");
    }
}
