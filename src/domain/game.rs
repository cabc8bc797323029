//! Game entries, identifiers and tag normalization.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LibraryError;

/// Platform label carried by every catalog-sourced entry
pub const CATALOG_PLATFORM: &str = "Steam";

/// Platform used for manual entries when the caller gives none
pub const DEFAULT_MANUAL_PLATFORM: &str = "Other";

/// Joins tags in flat exports, so it cannot appear inside a tag
pub const TAG_SEPARATOR: &str = ";";

const LOCAL_ID_PREFIX: &str = "manual_";

/// Stable game identifier.
///
/// Catalog app ids and locally generated ids live in disjoint variants, so a
/// generated id can never collide with a catalog id. Ordering puts app ids
/// first, each variant ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GameId {
    /// Numeric identifier assigned by the remote catalog
    App(u64),

    /// Identifier generated for a manual entry (`manual_<n>`)
    Local(u32),
}

impl GameId {
    pub fn is_local(&self) -> bool {
        matches!(self, GameId::Local(_))
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameId::App(id) => write!(f, "{}", id),
            GameId::Local(n) => write!(f, "{}{}", LOCAL_ID_PREFIX, n),
        }
    }
}

impl FromStr for GameId {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(n) = s.strip_prefix(LOCAL_ID_PREFIX) {
            return n
                .parse()
                .map(GameId::Local)
                .map_err(|_| LibraryError::InvalidQuery(format!("Invalid game id: {}", s)));
        }
        s.parse()
            .map(GameId::App)
            .map_err(|_| LibraryError::InvalidQuery(format!("Invalid game id: {}", s)))
    }
}

impl TryFrom<String> for GameId {
    type Error = LibraryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GameId> for String {
    fn from(id: GameId) -> Self {
        id.to_string()
    }
}

/// Where an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Fetched from the remote library API
    Catalog,

    /// Added by hand
    Manual,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Catalog => write!(f, "catalog"),
            Source::Manual => write!(f, "manual"),
        }
    }
}

impl FromStr for Source {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "catalog" | "steam" => Ok(Source::Catalog),
            "manual" => Ok(Source::Manual),
            _ => Err(LibraryError::InvalidQuery(format!("Unknown source: {}", s))),
        }
    }
}

/// Status a user may pin on an entry, overriding auto-detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualStatus {
    Completed,
    Hold,
}

impl fmt::Display for ManualStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManualStatus::Completed => write!(f, "completed"),
            ManualStatus::Hold => write!(f, "hold"),
        }
    }
}

impl FromStr for ManualStatus {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "completed" => Ok(ManualStatus::Completed),
            "hold" => Ok(ManualStatus::Hold),
            other => Err(LibraryError::InvalidQuery(format!(
                "Manual status must be 'completed' or 'hold', got '{}' \
                 (playing, backlog, inactive and dropped are auto-detected)",
                other
            ))),
        }
    }
}

/// A persisted game record.
///
/// Tags and manual status are kept in their own documents and joined in at
/// view time (see [`crate::core::view`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEntry {
    pub id: GameId,

    /// Display name, never empty
    pub name: String,

    pub source: Source,

    /// Free-text platform label
    pub platform: String,

    /// Cumulative playtime
    #[serde(default)]
    pub playtime_minutes: u64,

    /// Absent means never played (or unknown)
    #[serde(default)]
    pub last_played_at: Option<DateTime<Utc>>,
}

impl GameEntry {
    /// Create a catalog-sourced entry
    pub fn catalog(app_id: u64, name: impl Into<String>) -> Self {
        Self {
            id: GameId::App(app_id),
            name: name.into(),
            source: Source::Catalog,
            platform: CATALOG_PLATFORM.to_string(),
            playtime_minutes: 0,
            last_played_at: None,
        }
    }

    /// Create a manual entry with zero playtime
    pub fn manual(id: GameId, name: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            source: Source::Manual,
            platform: platform.into(),
            playtime_minutes: 0,
            last_played_at: None,
        }
    }

    pub fn with_playtime(mut self, minutes: u64) -> Self {
        self.playtime_minutes = minutes;
        self
    }

    pub fn with_last_played(mut self, at: DateTime<Utc>) -> Self {
        self.last_played_at = Some(at);
        self
    }

    pub fn playtime_hours(&self) -> f64 {
        self.playtime_minutes as f64 / 60.0
    }
}

/// Normalize a tag: trimmed and lowercased. Returns `None` for blank input.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().to_lowercase();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

/// Normalize a user-supplied tag, rejecting blank tags and the separator
pub fn parse_tag(raw: &str) -> Result<String, LibraryError> {
    let tag = normalize_tag(raw)
        .ok_or_else(|| LibraryError::InvalidQuery("Tag is empty".to_string()))?;
    if tag.contains(TAG_SEPARATOR) {
        return Err(LibraryError::InvalidQuery(format!(
            "Tag '{}' contains '{}'",
            tag, TAG_SEPARATOR
        )));
    }
    Ok(tag)
}

/// Normalize stored tags: separator-joined values are split, blanks dropped
/// and duplicates merged.
pub fn normalize_tags<'a, I>(raw: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    raw.into_iter()
        .flat_map(|tag| tag.split(TAG_SEPARATOR))
        .filter_map(normalize_tag)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_id_round_trip_through_string() {
        assert_eq!("440".parse::<GameId>().unwrap(), GameId::App(440));
        assert_eq!("manual_3".parse::<GameId>().unwrap(), GameId::Local(3));
        assert_eq!(GameId::Local(3).to_string(), "manual_3");
        assert!("manual_x".parse::<GameId>().is_err());
        assert!("portal".parse::<GameId>().is_err());
    }

    #[test]
    fn test_game_id_serializes_as_string() {
        let json = serde_json::to_string(&GameId::App(620)).unwrap();
        assert_eq!(json, "\"620\"");

        let parsed: GameId = serde_json::from_str("\"manual_12\"").unwrap();
        assert_eq!(parsed, GameId::Local(12));
    }

    #[test]
    fn test_game_id_ordering() {
        let mut ids = vec![GameId::Local(1), GameId::App(20), GameId::App(3)];
        ids.sort();
        assert_eq!(ids, vec![GameId::App(3), GameId::App(20), GameId::Local(1)]);
    }

    #[test]
    fn test_manual_status_rejects_auto_statuses() {
        assert_eq!("Completed".parse::<ManualStatus>().unwrap(), ManualStatus::Completed);
        assert_eq!("hold".parse::<ManualStatus>().unwrap(), ManualStatus::Hold);
        assert!(matches!(
            "playing".parse::<ManualStatus>(),
            Err(LibraryError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_source_aliases() {
        assert_eq!("steam".parse::<Source>().unwrap(), Source::Catalog);
        assert_eq!("MANUAL".parse::<Source>().unwrap(), Source::Manual);
        assert!("gog".parse::<Source>().is_err());
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("  Co-Op "), Some("co-op".to_string()));
        assert_eq!(normalize_tag("   "), None);
    }

    #[test]
    fn test_parse_tag_rejects_separator() {
        assert_eq!(parse_tag(" RPG ").unwrap(), "rpg");
        assert!(matches!(parse_tag(" "), Err(LibraryError::InvalidQuery(_))));
        assert!(matches!(parse_tag("a;b"), Err(LibraryError::InvalidQuery(_))));
    }

    #[test]
    fn test_normalize_tags_merges_duplicates() {
        let raw = vec![
            "Co-Op".to_string(),
            "co-op".to_string(),
            " Indie ".to_string(),
            "  ".to_string(),
            "rpg;Story".to_string(),
        ];
        let tags: Vec<String> = normalize_tags(&raw).into_iter().collect();
        assert_eq!(tags, vec!["co-op", "indie", "rpg", "story"]);
    }

    #[test]
    fn test_entry_builders() {
        let entry = GameEntry::catalog(10, "Portal 2").with_playtime(90);
        assert_eq!(entry.source, Source::Catalog);
        assert_eq!(entry.platform, CATALOG_PLATFORM);
        assert_eq!(entry.playtime_hours(), 1.5);
    }
}
