//! Activity status classification.
//!
//! Status is derived state: a manual override always wins, otherwise the
//! status is auto-detected from playtime and recency. The two origins are
//! kept apart in [`StatusResolution`] and collapsed to a plain [`Status`]
//! at the query boundary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::game::{GameEntry, ManualStatus};
use crate::error::LibraryError;

/// Window in which a game counts as recently played
pub const RECENT_WINDOW_DAYS: i64 = 14;

/// Age after which a played game counts as dropped (six months)
pub const STALE_AFTER_DAYS: i64 = 180;

/// Activity status of a library entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Playing,
    Backlog,
    Inactive,
    Dropped,
    Completed,
    Hold,
}

impl Status {
    /// All statuses in display order
    pub const ALL: [Status; 6] = [
        Status::Playing,
        Status::Backlog,
        Status::Inactive,
        Status::Dropped,
        Status::Completed,
        Status::Hold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Playing => "playing",
            Status::Backlog => "backlog",
            Status::Inactive => "inactive",
            Status::Dropped => "dropped",
            Status::Completed => "completed",
            Status::Hold => "hold",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| LibraryError::InvalidQuery(format!("Unknown status: {}", s)))
    }
}

impl From<ManualStatus> for Status {
    fn from(status: ManualStatus) -> Self {
        match status {
            ManualStatus::Completed => Status::Completed,
            ManualStatus::Hold => Status::Hold,
        }
    }
}

/// Why auto-detection picked a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoReason {
    /// Zero playtime
    NeverPlayed,

    /// Last played inside the recent window
    PlayedRecently,

    /// Nonzero playtime but no last-played timestamp; treated as stale
    NoRecordedActivity,

    /// Last played more than six months ago
    Stale,

    /// Played, but neither recently nor long ago
    Idle,
}

impl AutoReason {
    pub fn status(&self) -> Status {
        match self {
            AutoReason::NeverPlayed => Status::Backlog,
            AutoReason::PlayedRecently => Status::Playing,
            AutoReason::NoRecordedActivity | AutoReason::Stale => Status::Dropped,
            AutoReason::Idle => Status::Inactive,
        }
    }
}

/// Status together with where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusResolution {
    Auto(AutoReason),
    Manual(ManualStatus),
}

impl StatusResolution {
    pub fn status(&self) -> Status {
        match self {
            StatusResolution::Auto(reason) => reason.status(),
            StatusResolution::Manual(status) => (*status).into(),
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, StatusResolution::Manual(_))
    }
}

/// Whether a last-played timestamp falls inside the recent window.
///
/// Timestamps in the future (clock skew) count as recent.
pub fn is_recent(last_played: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_played {
        Some(at) => at >= now - Duration::days(RECENT_WINDOW_DAYS),
        None => false,
    }
}

/// Resolve an entry's status, keeping track of its origin
pub fn resolve(
    game: &GameEntry,
    manual: Option<ManualStatus>,
    now: DateTime<Utc>,
) -> StatusResolution {
    if let Some(status) = manual {
        return StatusResolution::Manual(status);
    }

    let reason = if game.playtime_minutes == 0 {
        AutoReason::NeverPlayed
    } else if is_recent(game.last_played_at, now) {
        AutoReason::PlayedRecently
    } else {
        match game.last_played_at {
            None => AutoReason::NoRecordedActivity,
            Some(at) if at < now - Duration::days(STALE_AFTER_DAYS) => AutoReason::Stale,
            Some(_) => AutoReason::Idle,
        }
    };

    StatusResolution::Auto(reason)
}

/// Classify an entry into exactly one status
pub fn classify(game: &GameEntry, manual: Option<ManualStatus>, now: DateTime<Utc>) -> Status {
    resolve(game, manual, now).status()
}
