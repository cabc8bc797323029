//! Adapter interfaces for the remote game catalog.
//!
//! The catalog client is a thin fetch: it returns the complete owned-games
//! list or fails outright. Retry policy, if any, belongs here and not in
//! the library core.

pub mod steam;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use steam::SteamClient;

/// One game as reported by the remote catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCatalogRecord {
    /// Catalog app id
    pub catalog_id: u64,

    pub name: String,

    /// Platform label suggested by the catalog
    pub platform_hint: String,

    /// Cumulative playtime reported by the catalog
    pub total_playtime_minutes: u64,

    pub last_played_at: Option<DateTime<Utc>>,
}

impl RawCatalogRecord {
    pub fn new(catalog_id: u64, name: impl Into<String>) -> Self {
        Self {
            catalog_id,
            name: name.into(),
            platform_hint: crate::domain::CATALOG_PLATFORM.to_string(),
            total_playtime_minutes: 0,
            last_played_at: None,
        }
    }

    pub fn with_playtime(mut self, minutes: u64) -> Self {
        self.total_playtime_minutes = minutes;
        self
    }

    pub fn with_last_played(mut self, at: DateTime<Utc>) -> Self {
        self.last_played_at = Some(at);
        self
    }
}

/// Remote library API
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Human-readable client name
    fn name(&self) -> &str;

    /// Fetch the full owned-games list for a profile.
    ///
    /// Fails with `RemoteUnavailable` on network/HTTP failure and with
    /// `Privacy` when the profile's library is not public.
    async fn fetch_library(&self, api_key: &str, steam_id: &str) -> Result<Vec<RawCatalogRecord>>;

    /// Look up an app's display name by catalog id
    async fn lookup_app_name(&self, app_id: u64) -> Result<Option<String>>;
}
