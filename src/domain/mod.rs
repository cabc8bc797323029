//! Domain types for the game library.
//!
//! - Game: persisted entries, identifiers, tag normalization
//! - Status: activity status and its classification

pub mod game;
pub mod status;

pub use game::{
    normalize_tag, normalize_tags, parse_tag, GameEntry, GameId, ManualStatus, Source,
    CATALOG_PLATFORM, DEFAULT_MANUAL_PLATFORM, TAG_SEPARATOR,
};
pub use status::{classify, is_recent, resolve, AutoReason, Status, StatusResolution};
