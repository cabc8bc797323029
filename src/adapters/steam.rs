//! Steam Web API client.
//!
//! Owned games come from `IPlayerService/GetOwnedGames`; app names for
//! manual entries come from the store's `appdetails` endpoint.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{CatalogClient, RawCatalogRecord};
use crate::domain::CATALOG_PLATFORM;
use crate::error::{LibraryError, Result};

const DEFAULT_API_BASE: &str = "https://api.steampowered.com";
const DEFAULT_STORE_BASE: &str = "https://store.steampowered.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Steam Web API client
pub struct SteamClient {
    api_base: String,
    store_base: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct OwnedGamesEnvelope {
    #[serde(default)]
    response: OwnedGamesResponse,
}

#[derive(Debug, Default, Deserialize)]
struct OwnedGamesResponse {
    game_count: Option<u64>,
    games: Option<Vec<OwnedGame>>,
}

#[derive(Debug, Deserialize)]
struct OwnedGame {
    appid: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    playtime_forever: u64,
    /// Unix seconds; 0 when never played
    #[serde(default)]
    rtime_last_played: i64,
}

#[derive(Debug, Deserialize)]
struct AppDetails {
    #[serde(default)]
    success: bool,
    data: Option<AppData>,
}

#[derive(Debug, Deserialize)]
struct AppData {
    name: Option<String>,
}

impl Default for SteamClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SteamClient {
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_API_BASE, DEFAULT_STORE_BASE)
    }

    /// Create a client against custom endpoints
    pub fn with_base_urls(api_base: impl Into<String>, store_base: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            store_base: store_base.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn owned_games_url(&self) -> String {
        format!("{}/IPlayerService/GetOwnedGames/v0001/", self.api_base)
    }

    fn app_details_url(&self) -> String {
        format!("{}/api/appdetails", self.store_base)
    }
}

#[async_trait]
impl CatalogClient for SteamClient {
    fn name(&self) -> &str {
        "steam"
    }

    async fn fetch_library(&self, api_key: &str, steam_id: &str) -> Result<Vec<RawCatalogRecord>> {
        let response = self
            .client
            .get(self.owned_games_url())
            .query(&[
                ("key", api_key),
                ("steamid", steam_id),
                ("format", "json"),
                ("include_appinfo", "1"),
            ])
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => {
                return Err(LibraryError::RemoteUnavailable(
                    "Invalid Steam API key (HTTP 401)".to_string(),
                ))
            }
            StatusCode::FORBIDDEN => {
                return Err(LibraryError::Privacy(
                    "Steam API request forbidden; check the profile's privacy settings".to_string(),
                ))
            }
            status => {
                return Err(LibraryError::RemoteUnavailable(format!(
                    "Steam API request failed with status {}",
                    status
                )))
            }
        }

        let body = response.text().await.map_err(request_error)?;
        let records = parse_owned_games(&body)?;
        debug!("Fetched {} games from Steam", records.len());

        Ok(records)
    }

    async fn lookup_app_name(&self, app_id: u64) -> Result<Option<String>> {
        let response = self
            .client
            .get(self.app_details_url())
            .query(&[("appids", app_id.to_string())])
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(LibraryError::RemoteUnavailable(format!(
                "Steam store lookup failed with status {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(request_error)?;
        parse_app_details(app_id, &body)
    }
}

fn request_error(err: reqwest::Error) -> LibraryError {
    if err.is_timeout() {
        LibraryError::RemoteUnavailable("Steam API request timed out".to_string())
    } else if err.is_connect() {
        LibraryError::RemoteUnavailable("Could not connect to Steam API".to_string())
    } else {
        LibraryError::RemoteUnavailable(err.to_string())
    }
}

/// Parse a `GetOwnedGames` response body.
///
/// A private profile answers with an empty `response` object; a public
/// profile with no games reports `game_count: 0`.
pub fn parse_owned_games(body: &str) -> Result<Vec<RawCatalogRecord>> {
    let envelope: OwnedGamesEnvelope = serde_json::from_str(body).map_err(|e| {
        LibraryError::RemoteUnavailable(format!("Invalid response from Steam API: {}", e))
    })?;

    let games = match (envelope.response.games, envelope.response.game_count) {
        (Some(games), _) => games,
        (None, Some(0)) => Vec::new(),
        (None, _) => {
            return Err(LibraryError::Privacy(
                "Steam returned no game list; the profile's game details may be private"
                    .to_string(),
            ))
        }
    };

    Ok(games.into_iter().map(RawCatalogRecord::from).collect())
}

/// Parse an `appdetails` response body for one app
pub fn parse_app_details(app_id: u64, body: &str) -> Result<Option<String>> {
    let details: HashMap<String, AppDetails> = serde_json::from_str(body).map_err(|e| {
        LibraryError::RemoteUnavailable(format!("Invalid response from Steam store: {}", e))
    })?;

    Ok(details
        .get(&app_id.to_string())
        .filter(|d| d.success)
        .and_then(|d| d.data.as_ref())
        .and_then(|d| non_blank(d.name.clone())))
}

fn non_blank(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

impl From<OwnedGame> for RawCatalogRecord {
    fn from(game: OwnedGame) -> Self {
        let last_played_at = if game.rtime_last_played > 0 {
            Utc.timestamp_opt(game.rtime_last_played, 0).single()
        } else {
            None
        };

        Self {
            catalog_id: game.appid,
            name: non_blank(game.name).unwrap_or_else(|| format!("App {}", game.appid)),
            platform_hint: CATALOG_PLATFORM.to_string(),
            total_playtime_minutes: game.playtime_forever,
            last_played_at,
        }
    }
}
