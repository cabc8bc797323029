//! Persistence for the library state.
//!
//! Each collection is its own JSON document, read and written independently,
//! so a corrupt document only blocks the operations that need it. Writes go
//! to a temporary file in the same directory which is then renamed over the
//! target: a crash mid-save leaves the previous document intact.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::state::{Collection, GamesDocument, StoreState};
use crate::domain::{normalize_tags, GameEntry, GameId, ManualStatus};
use crate::error::{LibraryError, Result};

/// Result of loading every collection that could be loaded
#[derive(Debug)]
pub struct PartialLoad {
    /// Loaded state; corrupt collections are left empty
    pub state: StoreState,

    /// Collections whose documents could not be parsed
    pub corrupt: Vec<(Collection, LibraryError)>,
}

impl PartialLoad {
    pub fn is_complete(&self) -> bool {
        self.corrupt.is_empty()
    }

    /// Return the state if none of the needed collections is corrupt.
    ///
    /// Corrupt collections that are not needed are logged and left empty;
    /// callers must not save them.
    pub fn require(self, needed: &[Collection]) -> Result<StoreState> {
        for (collection, error) in self.corrupt {
            if needed.contains(&collection) {
                return Err(error);
            }
            warn!("Ignoring unreadable {} document: {}", collection, error);
        }
        Ok(self.state)
    }
}

/// Storage backend for [`StoreState`]
pub trait StateStore {
    /// Load every collection, collecting corrupt documents instead of failing
    fn load_partial(&self) -> Result<PartialLoad>;

    /// Persist the given collections of `state`, leaving the others untouched
    fn save_collections(&self, state: &StoreState, collections: &[Collection]) -> Result<()>;

    /// Load the full state; any corrupt document fails the load
    fn load(&self) -> Result<StoreState> {
        self.load_partial()?.require(&Collection::ALL)
    }

    /// Load, requiring only the given collections to be readable
    fn load_for(&self, needed: &[Collection]) -> Result<StoreState> {
        self.load_partial()?.require(needed)
    }

    /// Persist every collection
    fn save(&self, state: &StoreState) -> Result<()> {
        self.save_collections(state, &Collection::ALL)
    }
}

/// JSON-document store rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a collection's document
    pub fn path(&self, collection: Collection) -> PathBuf {
        crate::config::paths::document(&self.dir, collection)
    }

    fn save_collection(&self, state: &StoreState, collection: Collection) -> Result<()> {
        let path = self.path(collection);
        match collection {
            Collection::Games => write_json(&path, &state.games_document()),
            Collection::Tags => {
                let tags: BTreeMap<&GameId, &BTreeSet<String>> = state
                    .tags
                    .iter()
                    .filter(|(_, tags)| !tags.is_empty())
                    .collect();
                write_json(&path, &tags)
            }
            Collection::Statuses => write_json(&path, &state.statuses),
            Collection::ManualGames => write_json(&path, &state.manual),
        }
    }
}

impl StateStore for FileStore {
    fn load_partial(&self) -> Result<PartialLoad> {
        let mut state = StoreState::new();
        let mut corrupt = Vec::new();

        for collection in Collection::ALL {
            let path = self.path(collection);
            let loaded = match collection {
                Collection::Games => read_json::<GamesDocument>(&path).map(|doc| {
                    state.games = doc.games;
                    state.last_synced = doc.last_updated;
                }),
                Collection::Tags => {
                    read_json::<BTreeMap<GameId, BTreeSet<String>>>(&path).map(|tags| {
                        state.tags = tags
                            .iter()
                            .map(|(id, raw)| (*id, normalize_tags(raw)))
                            .filter(|(_, tags)| !tags.is_empty())
                            .collect();
                    })
                }
                Collection::Statuses => {
                    read_json::<BTreeMap<GameId, ManualStatus>>(&path).map(|statuses| {
                        state.statuses = statuses;
                    })
                }
                Collection::ManualGames => read_json::<Vec<GameEntry>>(&path).map(|manual| {
                    state.manual = manual;
                }),
            };

            match loaded {
                Ok(()) => debug!("Loaded {} from {}", collection, path.display()),
                Err(err @ LibraryError::CorruptStore { .. }) => {
                    warn!("{}", err);
                    corrupt.push((collection, err));
                }
                Err(err) => return Err(err),
            }
        }

        Ok(PartialLoad { state, corrupt })
    }

    fn save_collections(&self, state: &StoreState, collections: &[Collection]) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| LibraryError::io(&self.dir, e))?;

        for collection in collections {
            self.save_collection(state, *collection)?;
            debug!("Saved {} to {}", collection, self.path(*collection).display());
        }

        Ok(())
    }
}

/// Read a JSON document; missing or blank documents yield the default value
fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(LibraryError::io(path, e)),
    };

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&content).map_err(|e| LibraryError::CorruptStore {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| {
        LibraryError::io(path, std::io::Error::new(ErrorKind::InvalidData, e))
    })?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}

/// Write bytes to `path` through a temporary file in the same directory
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut temp = NamedTempFile::new_in(&dir).map_err(|e| LibraryError::io(&dir, e))?;
    temp.write_all(bytes)
        .map_err(|e| LibraryError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| LibraryError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| LibraryError::io(path, e.error))?;

    Ok(())
}
