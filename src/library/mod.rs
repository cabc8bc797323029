//! Entity store for the game library.
//!
//! The library state is four independent collections, each persisted as its
//! own JSON document so that one unreadable file does not block the others.
//!
//! # Storage Layout
//!
//! ```text
//! ~/.backlog/
//! ├── games.json          # {"last_updated": ..., "games": {"<id>": GameEntry}}
//! ├── tags.json           # {"<id>": ["tag", ...]}
//! ├── status.json         # {"<id>": "completed" | "hold"}
//! └── manual_games.json   # [GameEntry, ...] with source = manual
//! ```

pub mod memory;
pub mod state;
pub mod store;

pub use memory::MemoryStore;
pub use state::{Collection, StoreState};
pub use store::{write_atomic, FileStore, PartialLoad, StateStore};
