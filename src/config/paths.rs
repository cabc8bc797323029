//! Canonical paths for the backlog store and exports.
//!
//! Single source of truth - use these instead of joining file names by hand.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use backlog::config::{paths, ResolvedConfig};
//!
//! let config = ResolvedConfig::resolve()?;
//! let games = paths::games_file(&config.home);
//! ```
//!
//! ## Layout
//!
//! | Location | Owner | Purpose |
//! |----------|-------|---------|
//! | `<home>/games.json` | sync | Catalog entries + last sync time |
//! | `<home>/tags.json` | tag commands | Tags by game id |
//! | `<home>/status.json` | status commands | Manual status overrides |
//! | `<home>/manual_games.json` | add/remove/log | Manual entries |
//! | `<export_dir>/backlog.{csv,json}` | export | Default export target |

use std::path::{Path, PathBuf};

use crate::core::ExportFormat;
use crate::library::Collection;

/// Path of one store document under `home`
pub fn document(home: &Path, collection: Collection) -> PathBuf {
    home.join(collection.file_name())
}

pub fn games_file(home: &Path) -> PathBuf {
    document(home, Collection::Games)
}

pub fn tags_file(home: &Path) -> PathBuf {
    document(home, Collection::Tags)
}

pub fn status_file(home: &Path) -> PathBuf {
    document(home, Collection::Statuses)
}

pub fn manual_games_file(home: &Path) -> PathBuf {
    document(home, Collection::ManualGames)
}

/// Export target used when no output path is given
pub fn default_export_file(export_dir: &Path, format: ExportFormat) -> PathBuf {
    export_dir.join(format.default_file_name())
}
