//! Library statistics and tag summary over the merged view.

use std::collections::BTreeMap;

use super::view::LibraryEntry;
use crate::domain::Status;

/// Playtime distribution bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlaytimeBracket {
    Never,
    UnderOneHour,
    OneToTen,
    TenToFifty,
    FiftyToHundred,
    HundredPlus,
}

impl PlaytimeBracket {
    pub const ALL: [PlaytimeBracket; 6] = [
        PlaytimeBracket::Never,
        PlaytimeBracket::UnderOneHour,
        PlaytimeBracket::OneToTen,
        PlaytimeBracket::TenToFifty,
        PlaytimeBracket::FiftyToHundred,
        PlaytimeBracket::HundredPlus,
    ];

    pub fn of(playtime_minutes: u64) -> Self {
        match playtime_minutes {
            0 => PlaytimeBracket::Never,
            1..=59 => PlaytimeBracket::UnderOneHour,
            60..=599 => PlaytimeBracket::OneToTen,
            600..=2999 => PlaytimeBracket::TenToFifty,
            3000..=5999 => PlaytimeBracket::FiftyToHundred,
            _ => PlaytimeBracket::HundredPlus,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlaytimeBracket::Never => "Never played",
            PlaytimeBracket::UnderOneHour => "< 1 hour",
            PlaytimeBracket::OneToTen => "1-10 hours",
            PlaytimeBracket::TenToFifty => "10-50 hours",
            PlaytimeBracket::FiftyToHundred => "50-100 hours",
            PlaytimeBracket::HundredPlus => "100+ hours",
        }
    }
}

/// Name and playtime of a notable entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub name: String,
    pub playtime_minutes: u64,
}

impl Highlight {
    fn of(entry: &LibraryEntry) -> Self {
        Self {
            name: entry.game.name.clone(),
            playtime_minutes: entry.game.playtime_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryStats {
    pub total_games: usize,
    pub total_minutes: u64,
    pub not_played: usize,
    pub played: usize,

    /// Average playtime over played entries only
    pub average_played_minutes: f64,

    pub most_played: Option<Highlight>,

    /// Least played among entries with nonzero playtime
    pub least_played: Option<Highlight>,

    /// Counts in [`PlaytimeBracket::ALL`] order
    pub brackets: Vec<(PlaytimeBracket, usize)>,

    /// Counts in [`Status::ALL`] order
    pub statuses: Vec<(Status, usize)>,
}

impl LibraryStats {
    pub fn compute(entries: &[LibraryEntry]) -> Self {
        let total_minutes: u64 = entries.iter().map(|e| e.game.playtime_minutes).sum();
        let played: Vec<&LibraryEntry> = entries
            .iter()
            .filter(|e| e.game.playtime_minutes > 0)
            .collect();

        let average_played_minutes = if played.is_empty() {
            0.0
        } else {
            total_minutes as f64 / played.len() as f64
        };

        // First entry in view order wins ties
        let most_played = played
            .iter()
            .copied()
            .reduce(|best, e| {
                if e.game.playtime_minutes > best.game.playtime_minutes {
                    e
                } else {
                    best
                }
            })
            .map(Highlight::of);
        let least_played = played
            .iter()
            .copied()
            .reduce(|best, e| {
                if e.game.playtime_minutes < best.game.playtime_minutes {
                    e
                } else {
                    best
                }
            })
            .map(Highlight::of);

        let brackets = PlaytimeBracket::ALL
            .into_iter()
            .map(|bracket| {
                let count = entries
                    .iter()
                    .filter(|e| PlaytimeBracket::of(e.game.playtime_minutes) == bracket)
                    .count();
                (bracket, count)
            })
            .collect();

        let statuses = Status::ALL
            .into_iter()
            .map(|status| (status, entries.iter().filter(|e| e.status() == status).count()))
            .collect();

        Self {
            total_games: entries.len(),
            total_minutes,
            not_played: entries.len() - played.len(),
            played: played.len(),
            average_played_minutes,
            most_played,
            least_played,
            brackets,
            statuses,
        }
    }

    /// Share of entries never played, in percent
    pub fn not_played_percent(&self) -> f64 {
        if self.total_games == 0 {
            0.0
        } else {
            self.not_played as f64 * 100.0 / self.total_games as f64
        }
    }

    pub fn status_count(&self, status: Status) -> usize {
        self.statuses
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Every tag in the view with the names of the entries carrying it.
///
/// Tags are sorted; names follow view order.
pub fn tag_summary(entries: &[LibraryEntry]) -> BTreeMap<String, Vec<String>> {
    let mut summary: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in entries {
        for tag in &entry.tags {
            summary
                .entry(tag.clone())
                .or_default()
                .push(entry.game.name.clone());
        }
    }
    summary
}
