//! In-memory store state: four independent collections.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{GameEntry, GameId, ManualStatus};

/// One persisted collection (one document on disk)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    /// Catalog-sourced games plus the last sync timestamp
    Games,

    /// Tags by game id
    Tags,

    /// Manual status overrides by game id
    Statuses,

    /// Manually added games
    ManualGames,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Games,
        Collection::Tags,
        Collection::Statuses,
        Collection::ManualGames,
    ];

    /// Document file name under the store directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Collection::Games => "games.json",
            Collection::Tags => "tags.json",
            Collection::Statuses => "status.json",
            Collection::ManualGames => "manual_games.json",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Games => "games",
            Collection::Tags => "tags",
            Collection::Statuses => "status",
            Collection::ManualGames => "manual games",
        };
        f.write_str(name)
    }
}

/// On-disk shape of the games document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GamesDocument {
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,

    #[serde(default)]
    pub games: BTreeMap<GameId, GameEntry>,
}

/// Complete library state.
///
/// Passed explicitly into and out of every operation; nothing reads the
/// store behind the caller's back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    /// Catalog-sourced entries, keyed by id
    pub games: BTreeMap<GameId, GameEntry>,

    /// When the catalog was last synced
    pub last_synced: Option<DateTime<Utc>>,

    /// Normalized tags by id (may reference removed games)
    pub tags: BTreeMap<GameId, BTreeSet<String>>,

    /// Manual status overrides by id (may reference removed games)
    pub statuses: BTreeMap<GameId, ManualStatus>,

    /// Manual entries in insertion order
    pub manual: Vec<GameEntry>,
}

impl StoreState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any catalog or manual entry uses this id
    pub fn contains_id(&self, id: &GameId) -> bool {
        self.games.contains_key(id) || self.manual.iter().any(|g| &g.id == id)
    }

    /// Look up a catalog or manual entry by id
    pub fn entry(&self, id: &GameId) -> Option<&GameEntry> {
        self.games
            .get(id)
            .or_else(|| self.manual.iter().find(|g| &g.id == id))
    }

    pub fn manual_entry_mut(&mut self, id: &GameId) -> Option<&mut GameEntry> {
        self.manual.iter_mut().find(|g| &g.id == id)
    }

    /// Next free locally generated id (`manual_<max + 1>`).
    ///
    /// Ids still keyed in the tag and status tables count as taken, so a
    /// removed entry's leftover rows never attach to a new game.
    pub fn next_local_id(&self) -> GameId {
        let max = self
            .manual
            .iter()
            .map(|g| &g.id)
            .chain(self.tags.keys())
            .chain(self.statuses.keys())
            .filter_map(|id| match id {
                GameId::Local(n) => Some(*n),
                GameId::App(_) => None,
            })
            .max()
            .unwrap_or(0);
        GameId::Local(max + 1)
    }

    /// Total number of entries in the merged view
    pub fn len(&self) -> usize {
        self.games.len() + self.manual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty() && self.manual.is_empty()
    }

    pub(crate) fn games_document(&self) -> GamesDocument {
        GamesDocument {
            last_updated: self.last_synced,
            games: self.games.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_local_id_skips_app_ids() {
        let mut state = StoreState::new();
        assert_eq!(state.next_local_id(), GameId::Local(1));

        state.manual.push(GameEntry::manual(GameId::Local(4), "Hades", "Switch"));
        state.manual.push(GameEntry::manual(GameId::App(999_999), "Tunic", "Xbox"));
        assert_eq!(state.next_local_id(), GameId::Local(5));
    }

    #[test]
    fn test_next_local_id_skips_orphaned_rows() {
        let mut state = StoreState::new();
        state.manual.push(GameEntry::manual(GameId::Local(1), "Hades", "Switch"));
        state
            .tags
            .insert(GameId::Local(3), BTreeSet::from(["roguelike".to_string()]));
        assert_eq!(state.next_local_id(), GameId::Local(4));

        state.statuses.insert(GameId::Local(7), ManualStatus::Completed);
        assert_eq!(state.next_local_id(), GameId::Local(8));
    }

    #[test]
    fn test_contains_id_covers_both_collections() {
        let mut state = StoreState::new();
        state.games.insert(GameId::App(10), GameEntry::catalog(10, "Portal 2"));
        state.manual.push(GameEntry::manual(GameId::Local(1), "Hades", "Switch"));

        assert!(state.contains_id(&GameId::App(10)));
        assert!(state.contains_id(&GameId::Local(1)));
        assert!(!state.contains_id(&GameId::App(11)));
        assert_eq!(state.entry(&GameId::Local(1)).unwrap().name, "Hades");
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_games_document_keys_are_strings() {
        let mut state = StoreState::new();
        state.games.insert(GameId::App(10), GameEntry::catalog(10, "Portal 2"));

        let json = serde_json::to_value(state.games_document()).unwrap();
        assert!(json["games"].get("10").is_some());
        assert!(json["last_updated"].is_null());
    }
}
