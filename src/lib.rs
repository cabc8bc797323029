//! backlog - Game library state and status engine
//!
//! Keeps a local, queryable snapshot of a Steam library plus manually added
//! games, classifies every game's activity status, and answers filter, sort
//! and export queries against the snapshot.
//!
//! # Architecture
//!
//! The library state is an explicit value:
//! - The store loads it once and saves only the collections an operation touched
//! - Sync merges a fetched catalog into it without ever deleting
//! - Every read goes through the merged view (catalog + manual entries,
//!   joined with tags and resolved status)
//!
//! # Modules
//!
//! - `adapters`: Remote catalog client (Steam Web API)
//! - `core`: Sync, view, query, export, editing, stats
//! - `domain`: Data structures (GameEntry, GameId, Status)
//! - `library`: Entity store (FileStore, MemoryStore)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Fetch the Steam library
//! backlog sync
//!
//! # Games played for under two hours, most played first
//! backlog list --started --sort playtime
//!
//! # Export the backlog
//! backlog export csv --status backlog
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod library;

// Re-export main types at crate root for convenience
pub use crate::core::{
    export, merge, query, ExportFormat, FilterSpec, LibraryEntry, LibraryView, PlaytimeRange,
    SortKey, SyncReport,
};
pub use domain::{classify, GameEntry, GameId, ManualStatus, Source, Status};
pub use error::{LibraryError, Result};
pub use library::{FileStore, MemoryStore, StateStore, StoreState};
