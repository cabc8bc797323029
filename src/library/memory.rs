//! In-memory store, used to exercise operations without touching the disk.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::PathBuf;

use super::state::{Collection, StoreState};
use super::store::{PartialLoad, StateStore};
use crate::error::{LibraryError, Result};

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<StoreState>,
    corrupt: RefCell<BTreeSet<Collection>>,
    saves: RefCell<Vec<Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: StoreState) -> Self {
        Self {
            state: RefCell::new(state),
            ..Self::default()
        }
    }

    /// Make a collection behave like an unparseable document
    pub fn mark_corrupt(&self, collection: Collection) {
        self.corrupt.borrow_mut().insert(collection);
    }

    /// Current persisted state
    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Collections saved so far, in order
    pub fn saved(&self) -> Vec<Collection> {
        self.saves.borrow().clone()
    }
}

impl StateStore for MemoryStore {
    fn load_partial(&self) -> Result<PartialLoad> {
        let mut state = self.state.borrow().clone();
        let mut corrupt = Vec::new();

        for collection in self.corrupt.borrow().iter().copied() {
            match collection {
                Collection::Games => {
                    state.games.clear();
                    state.last_synced = None;
                }
                Collection::Tags => state.tags.clear(),
                Collection::Statuses => state.statuses.clear(),
                Collection::ManualGames => state.manual.clear(),
            }
            corrupt.push((
                collection,
                LibraryError::CorruptStore {
                    path: PathBuf::from(collection.file_name()),
                    message: "simulated corruption".to_string(),
                },
            ));
        }

        Ok(PartialLoad { state, corrupt })
    }

    fn save_collections(&self, state: &StoreState, collections: &[Collection]) -> Result<()> {
        let mut stored = self.state.borrow_mut();

        for collection in collections {
            match collection {
                Collection::Games => {
                    stored.games = state.games.clone();
                    stored.last_synced = state.last_synced;
                }
                Collection::Tags => stored.tags = state.tags.clone(),
                Collection::Statuses => stored.statuses = state.statuses.clone(),
                Collection::ManualGames => stored.manual = state.manual.clone(),
            }
            self.corrupt.borrow_mut().remove(collection);
            self.saves.borrow_mut().push(*collection);
        }

        Ok(())
    }
}
