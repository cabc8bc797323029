//! Editing operations: tags, status overrides and manual entries.
//!
//! Every operation takes the state explicitly and either mutates it
//! completely or leaves it untouched and returns an error. Persisting the
//! touched collection is the caller's job.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::view::merged_games;
use crate::adapters::CatalogClient;
use crate::domain::{parse_tag, GameEntry, GameId, ManualStatus, DEFAULT_MANUAL_PLATFORM};
use crate::error::{LibraryError, Result};
use crate::library::StoreState;

/// Find the merged-view entry a user-supplied string refers to.
///
/// Tried in order: exact id (`440`, `manual_3`), exact case-insensitive
/// name, unique case-insensitive name substring.
pub fn resolve_game(state: &StoreState, query: &str) -> Result<GameId> {
    let query = query.trim();
    if query.is_empty() {
        return Err(LibraryError::UnknownEntity(query.to_string()));
    }

    if let Ok(id) = query.parse::<GameId>() {
        if merged_games(state).any(|g| g.id == id) {
            return Ok(id);
        }
    }

    let needle = query.to_lowercase();

    let exact: Vec<&GameEntry> = merged_games(state)
        .filter(|g| g.name.to_lowercase() == needle)
        .collect();
    if let Some(found) = single(query, &exact)? {
        return Ok(found);
    }

    let partial: Vec<&GameEntry> = merged_games(state)
        .filter(|g| g.name.to_lowercase().contains(&needle))
        .collect();
    single(query, &partial)?.ok_or_else(|| LibraryError::UnknownEntity(query.to_string()))
}

fn single(query: &str, matches: &[&GameEntry]) -> Result<Option<GameId>> {
    match matches {
        [] => Ok(None),
        [only] => Ok(Some(only.id)),
        many => Err(LibraryError::AmbiguousEntity {
            query: query.to_string(),
            candidates: many.iter().map(|g| g.name.clone()).collect(),
        }),
    }
}

fn display_name(state: &StoreState, id: &GameId) -> String {
    state
        .entry(id)
        .map(|g| g.name.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Add a tag; returns false when the entry already had it
pub fn add_tag(state: &mut StoreState, query: &str, tag: &str) -> Result<bool> {
    let tag = parse_tag(tag)?;
    let id = resolve_game(state, query)?;

    let added = state.tags.entry(id).or_default().insert(tag.clone());
    if added {
        info!("Tagged {} with '{}'", display_name(state, &id), tag);
    }
    Ok(added)
}

/// Remove a tag; returns false when the entry did not have it
pub fn remove_tag(state: &mut StoreState, query: &str, tag: &str) -> Result<bool> {
    let tag = parse_tag(tag)?;
    let id = resolve_game(state, query)?;

    let Some(tags) = state.tags.get_mut(&id) else {
        return Ok(false);
    };
    let removed = tags.remove(&tag);
    if tags.is_empty() {
        state.tags.remove(&id);
    }
    if removed {
        info!("Removed tag '{}' from {}", tag, display_name(state, &id));
    }
    Ok(removed)
}

/// Pin a manual status; returns false when it was already set to `status`
pub fn set_status(state: &mut StoreState, query: &str, status: ManualStatus) -> Result<bool> {
    let id = resolve_game(state, query)?;
    let previous = state.statuses.insert(id, status);
    info!("Set status of {} to {}", display_name(state, &id), status);
    Ok(previous != Some(status))
}

/// Remove a manual status; returns false when none was set
pub fn clear_status(state: &mut StoreState, query: &str) -> Result<bool> {
    let id = resolve_game(state, query)?;
    let cleared = state.statuses.remove(&id).is_some();
    if cleared {
        info!("Cleared status of {}", display_name(state, &id));
    }
    Ok(cleared)
}

/// Input for a new manual entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewManualGame {
    pub name: String,

    /// Defaults to [`DEFAULT_MANUAL_PLATFORM`]
    pub platform: Option<String>,

    /// Catalog app id to reuse as the entry's id
    pub app_id: Option<u64>,
}

impl NewManualGame {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platform: None,
            app_id: None,
        }
    }

    pub fn on(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_app_id(mut self, app_id: u64) -> Self {
        self.app_id = Some(app_id);
        self
    }
}

/// Build a manual entry request for a catalog app, looking its name up
/// through the catalog client
pub async fn lookup_manual_game(
    client: &dyn CatalogClient,
    app_id: u64,
    platform: Option<String>,
) -> Result<NewManualGame> {
    let name = client
        .lookup_app_name(app_id)
        .await?
        .ok_or_else(|| LibraryError::UnknownEntity(format!("app {}", app_id)))?;
    debug!("Resolved app {} to '{}'", app_id, name);

    Ok(NewManualGame {
        name,
        platform,
        app_id: Some(app_id),
    })
}

/// Add a manual entry and return its id.
///
/// Fails with `DuplicateId` when the id is already used by any entry or the
/// name matches an existing manual entry; the state is unchanged then.
pub fn add_manual_game(state: &mut StoreState, new: NewManualGame) -> Result<GameId> {
    let name = new.name.trim().to_string();
    if name.is_empty() {
        return Err(LibraryError::InvalidQuery("Game name is empty".to_string()));
    }

    let id = match new.app_id {
        Some(app_id) => GameId::App(app_id),
        None => state.next_local_id(),
    };

    if let Some(existing) = state.entry(&id) {
        return Err(LibraryError::DuplicateId {
            id,
            name: existing.name.clone(),
        });
    }

    let lowered = name.to_lowercase();
    if let Some(existing) = state.manual.iter().find(|g| g.name.to_lowercase() == lowered) {
        return Err(LibraryError::DuplicateId {
            id: existing.id,
            name: existing.name.clone(),
        });
    }

    let platform = new
        .platform
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_MANUAL_PLATFORM.to_string());

    info!("Added manual game {} ({}) on {}", name, id, platform);
    state.manual.push(GameEntry::manual(id, name, platform));
    Ok(id)
}

/// Remove a manual entry; tags and status stay behind as orphans
pub fn remove_manual_game(state: &mut StoreState, query: &str) -> Result<GameEntry> {
    let id = resolve_game(state, query)?;
    let position = state
        .manual
        .iter()
        .position(|g| g.id == id)
        .ok_or_else(|| {
            LibraryError::UnknownEntity(format!("{} (only manual entries can be removed)", query))
        })?;

    let removed = state.manual.remove(position);
    info!("Removed manual game {} ({})", removed.name, removed.id);
    Ok(removed)
}

/// Add played hours to a manual entry and mark it played at `now`
pub fn log_playtime(
    state: &mut StoreState,
    query: &str,
    hours: f64,
    now: DateTime<Utc>,
) -> Result<GameEntry> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(LibraryError::InvalidQuery(format!(
            "Hours must be a positive number, got {}",
            hours
        )));
    }

    let id = resolve_game(state, query)?;
    let entry = state.manual_entry_mut(&id).ok_or_else(|| {
        LibraryError::UnknownEntity(format!(
            "{} (playtime of catalog games is tracked by sync)",
            query
        ))
    })?;

    let minutes = (hours * 60.0).floor() as u64;
    entry.playtime_minutes = entry.playtime_minutes.saturating_add(minutes);
    entry.last_played_at = Some(now);
    info!(
        "Logged {} min for {}; total {} min",
        minutes, entry.name, entry.playtime_minutes
    );

    Ok(entry.clone())
}

/// Outcome of an operation applied to several names
#[derive(Debug, Default)]
pub struct BulkReport {
    /// Entries that changed
    pub applied: Vec<GameId>,

    /// Entries already in the requested state
    pub unchanged: Vec<GameId>,

    /// Names that could not be applied, with the reason
    pub failed: Vec<(String, LibraryError)>,
}

impl BulkReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, state: &StoreState, query: &str, outcome: Result<bool>) {
        match outcome {
            Ok(changed) => {
                // The operation already resolved once, so this cannot miss
                if let Ok(id) = resolve_game(state, query) {
                    if changed {
                        self.applied.push(id);
                    } else {
                        self.unchanged.push(id);
                    }
                }
            }
            Err(err) => self.failed.push((query.to_string(), err)),
        }
    }
}

fn bulk<F>(state: &mut StoreState, queries: &[String], mut op: F) -> BulkReport
where
    F: FnMut(&mut StoreState, &str) -> Result<bool>,
{
    let mut report = BulkReport::default();
    for query in queries {
        let outcome = op(state, query);
        report.record(state, query, outcome);
    }
    report
}

/// Tag several entries; names that fail are reported, not fatal
pub fn bulk_tag(state: &mut StoreState, queries: &[String], tag: &str) -> Result<BulkReport> {
    parse_tag(tag)?;
    Ok(bulk(state, queries, |s, q| add_tag(s, q, tag)))
}

pub fn bulk_untag(state: &mut StoreState, queries: &[String], tag: &str) -> Result<BulkReport> {
    parse_tag(tag)?;
    Ok(bulk(state, queries, |s, q| remove_tag(s, q, tag)))
}

pub fn bulk_status(state: &mut StoreState, queries: &[String], status: ManualStatus) -> BulkReport {
    bulk(state, queries, |s, q| set_status(s, q, status))
}
