//! Filter, sort and limit over the merged view.
//!
//! Filters are applied first, then the sort, then the limit. The input is
//! never mutated; every call returns a fresh sequence.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::view::{LibraryEntry, LibraryView};
use crate::domain::{is_recent, normalize_tag, Source, Status, TAG_SEPARATOR};
use crate::error::{LibraryError, Result};

/// Playtime at or below which a game counts as barely started
pub const STARTED_MAX_MINUTES: f64 = 120.0;

/// Playtime interval in minutes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaytimeRange {
    lower: Bound<f64>,
    upper: Bound<f64>,
}

impl PlaytimeRange {
    /// Exactly zero minutes
    pub fn not_played() -> Self {
        Self {
            lower: Bound::Included(0.0),
            upper: Bound::Included(0.0),
        }
    }

    /// More than zero and at most two hours
    pub fn started() -> Self {
        Self {
            lower: Bound::Excluded(0.0),
            upper: Bound::Included(STARTED_MAX_MINUTES),
        }
    }

    /// Strictly less than `hours`
    pub fn under(hours: f64) -> Result<Self> {
        Ok(Self {
            lower: Bound::Included(0.0),
            upper: Bound::Excluded(minutes(hours)?),
        })
    }

    /// Strictly more than `hours`
    pub fn over(hours: f64) -> Result<Self> {
        Ok(Self {
            lower: Bound::Excluded(minutes(hours)?),
            upper: Bound::Unbounded,
        })
    }

    /// From `min_hours` to `max_hours`, both inclusive
    pub fn between(min_hours: f64, max_hours: f64) -> Result<Self> {
        let (min, max) = (minutes(min_hours)?, minutes(max_hours)?);
        if min > max {
            return Err(LibraryError::InvalidQuery(format!(
                "Playtime range minimum ({} h) is greater than maximum ({} h)",
                min_hours, max_hours
            )));
        }
        Ok(Self {
            lower: Bound::Included(min),
            upper: Bound::Included(max),
        })
    }

    pub fn contains(&self, playtime_minutes: u64) -> bool {
        let value = playtime_minutes as f64;
        let above = match self.lower {
            Bound::Included(min) => value >= min,
            Bound::Excluded(min) => value > min,
            Bound::Unbounded => true,
        };
        let below = match self.upper {
            Bound::Included(max) => value <= max,
            Bound::Excluded(max) => value < max,
            Bound::Unbounded => true,
        };
        above && below
    }
}

fn minutes(hours: f64) -> Result<f64> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(LibraryError::InvalidQuery(format!(
            "Hours must be a non-negative number, got {}",
            hours
        )));
    }
    Ok(hours * 60.0)
}

/// Predicate over one view entry
pub type Predicate<'a> = Box<dyn Fn(&LibraryEntry) -> bool + 'a>;

pub fn by_playtime(range: PlaytimeRange) -> impl Fn(&LibraryEntry) -> bool {
    move |entry| range.contains(entry.game.playtime_minutes)
}

pub fn by_recency(as_of: DateTime<Utc>) -> impl Fn(&LibraryEntry) -> bool {
    move |entry| is_recent(entry.game.last_played_at, as_of)
}

pub fn by_status(status: Status) -> impl Fn(&LibraryEntry) -> bool {
    move |entry| entry.status() == status
}

pub fn by_tag(tag: &str) -> impl Fn(&LibraryEntry) -> bool + '_ {
    move |entry| entry.tags.contains(tag)
}

pub fn by_source(source: Source) -> impl Fn(&LibraryEntry) -> bool {
    move |entry| entry.game.source == source
}

/// Case-insensitive substring match on the name
pub fn by_name(needle: &str) -> impl Fn(&LibraryEntry) -> bool {
    let needle = needle.to_lowercase();
    move |entry| entry.game.name.to_lowercase().contains(&needle)
}

/// Optional filters, combined with logical AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub playtime: Option<PlaytimeRange>,

    /// Last played within the recent window
    pub recent: bool,

    pub status: Option<Status>,

    /// Normalized tag
    pub tag: Option<String>,

    pub source: Option<Source>,

    /// Name substring
    pub search: Option<String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playtime(mut self, range: PlaytimeRange) -> Self {
        self.playtime = Some(range);
        self
    }

    pub fn recent(mut self) -> Self {
        self.recent = true;
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter by tag; the tag is normalized like stored tags
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(normalize_tag(tag).unwrap_or_default());
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        match &self.tag {
            Some(tag) if tag.is_empty() => {
                Err(LibraryError::InvalidQuery("Tag filter is empty".to_string()))
            }
            Some(tag) if tag.contains(TAG_SEPARATOR) => Err(LibraryError::InvalidQuery(format!(
                "Tag filter '{}' contains '{}'",
                tag, TAG_SEPARATOR
            ))),
            _ => Ok(()),
        }
    }

    /// One predicate per set field
    pub fn predicates(&self, as_of: DateTime<Utc>) -> Vec<Predicate<'_>> {
        let mut predicates: Vec<Predicate<'_>> = Vec::new();

        if let Some(range) = self.playtime {
            predicates.push(Box::new(by_playtime(range)));
        }
        if self.recent {
            predicates.push(Box::new(by_recency(as_of)));
        }
        if let Some(status) = self.status {
            predicates.push(Box::new(by_status(status)));
        }
        if let Some(tag) = &self.tag {
            predicates.push(Box::new(by_tag(tag)));
        }
        if let Some(source) = self.source {
            predicates.push(Box::new(by_source(source)));
        }
        if let Some(needle) = &self.search {
            predicates.push(Box::new(by_name(needle)));
        }

        predicates
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Sort key; every key ends with deterministic tie-breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Name ascending (case-insensitive), then id
    Name,

    /// Playtime descending, then name
    Playtime,

    /// Playtime ascending, then name
    PlaytimeAsc,

    /// Most recently played first; never-played entries last
    Recent,
}

impl SortKey {
    pub fn compare(&self, a: &LibraryEntry, b: &LibraryEntry) -> Ordering {
        let primary = match self {
            SortKey::Name => Ordering::Equal,
            SortKey::Playtime => b.game.playtime_minutes.cmp(&a.game.playtime_minutes),
            SortKey::PlaytimeAsc => a.game.playtime_minutes.cmp(&b.game.playtime_minutes),
            SortKey::Recent => match (a.game.last_played_at, b.game.last_played_at) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };

        primary
            .then_with(|| a.game.name.to_lowercase().cmp(&b.game.name.to_lowercase()))
            .then_with(|| a.game.id.cmp(&b.game.id))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Name => "name",
            SortKey::Playtime => "playtime",
            SortKey::PlaytimeAsc => "playtime-asc",
            SortKey::Recent => "recent",
        };
        f.write_str(name)
    }
}

impl FromStr for SortKey {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "playtime" => Ok(SortKey::Playtime),
            "playtime-asc" => Ok(SortKey::PlaytimeAsc),
            "recent" => Ok(SortKey::Recent),
            _ => Err(LibraryError::InvalidQuery(format!("Unknown sort key: {}", s))),
        }
    }
}

/// Validate a raw limit; non-positive limits are rejected
pub fn validate_limit(limit: Option<i64>) -> Result<Option<usize>> {
    match limit {
        None => Ok(None),
        Some(n) if n <= 0 => Err(LibraryError::InvalidQuery(format!(
            "Limit must be positive, got {}",
            n
        ))),
        Some(n) => Ok(Some(usize::try_from(n).unwrap_or(usize::MAX))),
    }
}

/// Run filters, then sort, then limit over `entries`.
///
/// Without a sort key the view order is kept.
pub fn query(
    entries: &[LibraryEntry],
    filters: &FilterSpec,
    sort: Option<SortKey>,
    limit: Option<i64>,
    as_of: DateTime<Utc>,
) -> Result<Vec<LibraryEntry>> {
    filters.validate()?;
    let limit = validate_limit(limit)?;

    let predicates = filters.predicates(as_of);
    let mut results: Vec<LibraryEntry> = entries
        .iter()
        .filter(|entry| predicates.iter().all(|p| p(entry)))
        .cloned()
        .collect();

    if let Some(key) = sort {
        results.sort_by(|a, b| key.compare(a, b));
    }

    if let Some(n) = limit {
        results.truncate(n);
    }

    Ok(results)
}

/// A complete query against a [`LibraryView`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: FilterSpec,
    pub sort: Option<SortKey>,
    pub limit: Option<i64>,
}

impl Query {
    pub fn new(filters: FilterSpec) -> Self {
        Self {
            filters,
            ..Default::default()
        }
    }

    pub fn sorted_by(mut self, key: SortKey) -> Self {
        self.sort = Some(key);
        self
    }

    pub fn limited_to(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check filters and limit without running against a view
    pub fn validate(&self) -> Result<()> {
        self.filters.validate()?;
        validate_limit(self.limit)?;
        Ok(())
    }

    pub fn run(&self, view: &LibraryView) -> Result<Vec<LibraryEntry>> {
        query(&view.entries, &self.filters, self.sort, self.limit, view.as_of)
    }
}
