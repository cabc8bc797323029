//! Core library logic.
//!
//! This module contains:
//! - Sync: merging a fetched catalog into the stored state
//! - View: the merged, classified library
//! - Query: filter, sort and limit over the view
//! - Export: CSV/JSON serialization of query results
//! - Editor: tag, status and manual-entry operations
//! - Stats: library statistics and tag summary

pub mod editor;
pub mod export;
pub mod query;
pub mod stats;
pub mod sync;
pub mod view;

// Re-export commonly used types
pub use editor::{
    add_manual_game, add_tag, bulk_status, bulk_tag, bulk_untag, clear_status,
    log_playtime, lookup_manual_game, remove_manual_game, remove_tag, resolve_game, set_status,
    BulkReport, NewManualGame,
};
pub use export::{export, write_export, ExportFormat};
pub use query::{query, FilterSpec, PlaytimeRange, Query, SortKey};
pub use stats::{tag_summary, LibraryStats, PlaytimeBracket};
pub use sync::{merge, sync_library, PlaytimeAnomaly, SyncOutcome, SyncReport};
pub use view::{LibraryEntry, LibraryView};
