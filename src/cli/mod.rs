//! Command-line interface for backlog.
//!
//! Provides commands for syncing the Steam library, listing, filtering and
//! exporting games, editing tags and statuses, and managing manual entries.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::adapters::SteamClient;
use crate::config::{paths, ResolvedConfig};
use crate::core::{
    self, export, tag_summary, write_export, ExportFormat, FilterSpec, LibraryStats,
    LibraryView, NewManualGame, PlaytimeRange, Query, SortKey,
};
use crate::domain::{ManualStatus, Source, Status};
use crate::error::LibraryError;
use crate::library::{Collection, FileStore, StateStore, StoreState};

pub mod render;

/// backlog - Track, classify and query your game library
#[derive(Parser, Debug)]
#[command(name = "backlog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the Steam library and merge it into the local store
    Sync,

    /// List games, with optional filters
    List {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Export games as CSV or JSON
    Export {
        /// Output format (csv or json)
        format: ExportFormat,

        /// Output file (defaults to backlog.<format> in the export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Show library statistics
    Stats,

    /// Show every tag with the games carrying it
    Tags,

    /// Add a tag to a game
    Tag {
        /// Game name or id
        game: String,

        /// Tag to add
        tag: String,
    },

    /// Remove a tag from a game
    Untag {
        /// Game name or id
        game: String,

        /// Tag to remove
        tag: String,
    },

    /// Add a tag to several games
    BulkTag {
        /// Tag to add
        tag: String,

        /// Game names or ids
        #[arg(required = true)]
        games: Vec<String>,
    },

    /// Remove a tag from several games
    BulkUntag {
        /// Tag to remove
        tag: String,

        /// Game names or ids
        #[arg(required = true)]
        games: Vec<String>,
    },

    /// Pin a status on a game (completed or hold)
    SetStatus {
        /// Game name or id
        game: String,

        /// Status to set
        status: ManualStatus,
    },

    /// Remove a pinned status so auto-detection applies again
    ClearStatus {
        /// Game name or id
        game: String,
    },

    /// Pin a status on several games
    BulkStatus {
        /// Status to set
        status: ManualStatus,

        /// Game names or ids
        #[arg(required = true)]
        games: Vec<String>,
    },

    /// Add a game that is not in the Steam library
    #[command(group(ArgGroup::new("game").required(true).args(["name", "app_id"])))]
    Add {
        /// Game name
        name: Option<String>,

        /// Steam app id; the name is looked up in the Steam store
        #[arg(long)]
        app_id: Option<u64>,

        /// Platform label (defaults to "Other")
        #[arg(short, long)]
        platform: Option<String>,
    },

    /// Remove a manually added game
    Remove {
        /// Game name or id
        game: String,
    },

    /// Log hours played on a manually added game
    Log {
        /// Game name or id
        game: String,

        /// Hours played
        #[arg(allow_negative_numbers = true)]
        hours: f64,
    },

    /// Show resolved configuration
    Config,
}

/// Filter, sort and limit options shared by `list` and `export`
#[derive(Args, Debug, Clone)]
#[command(group(
    ArgGroup::new("preset")
        .args(["notplayed", "started", "recent", "under", "over", "between"])
        .multiple(false)
))]
pub struct QueryArgs {
    /// Games never played
    #[arg(long)]
    pub notplayed: bool,

    /// Games played for two hours or less
    #[arg(long)]
    pub started: bool,

    /// Games played in the last 14 days
    #[arg(long)]
    pub recent: bool,

    /// Games played for less than HOURS
    #[arg(long, value_name = "HOURS", allow_negative_numbers = true)]
    pub under: Option<f64>,

    /// Games played for more than HOURS
    #[arg(long, value_name = "HOURS", allow_negative_numbers = true)]
    pub over: Option<f64>,

    /// Games played between MIN and MAX hours (inclusive)
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
    pub between: Option<Vec<f64>>,

    /// Only games with this status
    #[arg(long)]
    pub status: Option<Status>,

    /// Only games with this tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Only catalog or manual games
    #[arg(long)]
    pub source: Option<Source>,

    /// Only games whose name contains this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Sort order: name, playtime, playtime-asc or recent
    #[arg(long, default_value = "name")]
    pub sort: SortKey,

    /// Maximum number of games
    #[arg(short, long, allow_negative_numbers = true)]
    pub limit: Option<i64>,
}

impl QueryArgs {
    /// Build the query these options describe
    pub fn to_query(&self) -> Result<Query, LibraryError> {
        let mut filters = FilterSpec::new();

        let range = if self.notplayed {
            Some(PlaytimeRange::not_played())
        } else if self.started {
            Some(PlaytimeRange::started())
        } else if let Some(hours) = self.under {
            Some(PlaytimeRange::under(hours)?)
        } else if let Some(hours) = self.over {
            Some(PlaytimeRange::over(hours)?)
        } else if let Some(bounds) = &self.between {
            match bounds.as_slice() {
                [min, max] => Some(PlaytimeRange::between(*min, *max)?),
                _ => {
                    return Err(LibraryError::InvalidQuery(
                        "--between takes exactly two values".to_string(),
                    ))
                }
            }
        } else {
            None
        };

        if let Some(range) = range {
            filters = filters.playtime(range);
        }
        if self.recent {
            filters = filters.recent();
        }
        if let Some(status) = self.status {
            filters = filters.status(status);
        }
        if let Some(tag) = &self.tag {
            filters = filters.tag(tag);
        }
        if let Some(source) = self.source {
            filters = filters.source(source);
        }
        if let Some(needle) = &self.search {
            filters = filters.search(needle.clone());
        }

        let query = Query {
            filters,
            sort: Some(self.sort),
            limit: self.limit,
        };
        query.validate()?;
        Ok(query)
    }
}

/// Collections needed to resolve game names
const LOOKUP: [Collection; 2] = [Collection::Games, Collection::ManualGames];

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = ResolvedConfig::resolve()?;
        let store = FileStore::new(&config.home);
        let now = Utc::now();

        match self.command {
            Commands::Sync => sync(&config, &store, now).await,
            Commands::List { query } => list(&store, &query, now),
            Commands::Export {
                format,
                output,
                query,
            } => export_games(&config, &store, format, output, &query, now),
            Commands::Stats => stats(&store, now),
            Commands::Tags => tags(&store, now),
            Commands::Tag { game, tag } => edit(&store, Collection::Tags, |state| {
                if core::add_tag(state, &game, &tag)? {
                    println!("Tagged '{}' with '{}'", game, tag.trim().to_lowercase());
                } else {
                    println!("'{}' already has tag '{}'", game, tag.trim().to_lowercase());
                }
                Ok(())
            }),
            Commands::Untag { game, tag } => edit(&store, Collection::Tags, |state| {
                if core::remove_tag(state, &game, &tag)? {
                    println!("Removed tag '{}' from '{}'", tag.trim().to_lowercase(), game);
                } else {
                    println!("'{}' does not have tag '{}'", game, tag.trim().to_lowercase());
                }
                Ok(())
            }),
            Commands::BulkTag { tag, games } => edit(&store, Collection::Tags, |state| {
                let report = core::bulk_tag(state, &games, &tag)?;
                render::print_bulk_report(&format!("Tagged with '{}'", tag), &report, state);
                Ok(())
            }),
            Commands::BulkUntag { tag, games } => edit(&store, Collection::Tags, |state| {
                let report = core::bulk_untag(state, &games, &tag)?;
                render::print_bulk_report(&format!("Removed tag '{}'", tag), &report, state);
                Ok(())
            }),
            Commands::SetStatus { game, status } => edit(&store, Collection::Statuses, |state| {
                core::set_status(state, &game, status)?;
                println!("Set status of '{}' to {}", game, status);
                Ok(())
            }),
            Commands::ClearStatus { game } => edit(&store, Collection::Statuses, |state| {
                if core::clear_status(state, &game)? {
                    println!("Cleared status of '{}'; auto-detection applies", game);
                } else {
                    println!("'{}' has no manual status", game);
                }
                Ok(())
            }),
            Commands::BulkStatus { status, games } => {
                edit(&store, Collection::Statuses, |state| {
                    let report = core::bulk_status(state, &games, status);
                    render::print_bulk_report(&format!("Set status {}", status), &report, state);
                    Ok(())
                })
            }
            Commands::Add {
                name,
                app_id,
                platform,
            } => add(&store, name, app_id, platform).await,
            Commands::Remove { game } => edit(&store, Collection::ManualGames, |state| {
                let removed = core::remove_manual_game(state, &game)?;
                println!("Removed '{}' ({})", removed.name, removed.id);
                Ok(())
            }),
            Commands::Log { game, hours } => edit(&store, Collection::ManualGames, |state| {
                let entry = core::log_playtime(state, &game, hours, now)?;
                println!(
                    "Logged {:.1}h on '{}'; total {}",
                    hours,
                    entry.name,
                    render::format_hours(entry.playtime_minutes)
                );
                Ok(())
            }),
            Commands::Config => {
                show_config(&config);
                Ok(())
            }
        }
    }
}

/// Load what an edit needs, apply it, then save only the edited collection
fn edit<F>(store: &FileStore, collection: Collection, op: F) -> Result<()>
where
    F: FnOnce(&mut StoreState) -> Result<(), LibraryError>,
{
    let mut needed = LOOKUP.to_vec();
    needed.push(collection);

    let mut state = store.load_for(&needed).context("Failed to load library")?;
    op(&mut state)?;
    store
        .save_collections(&state, &[collection])
        .with_context(|| format!("Failed to save {}", collection))?;

    Ok(())
}

/// Build the merged view; every collection must be readable
fn load_view(store: &FileStore, now: DateTime<Utc>) -> Result<LibraryView> {
    let state = store.load().context("Failed to load library")?;
    Ok(LibraryView::build(&state, now))
}

async fn sync(config: &ResolvedConfig, store: &FileStore, now: DateTime<Utc>) -> Result<()> {
    let (api_key, steam_id) = config.steam.require()?;
    let client = SteamClient::new();

    println!("Syncing Steam library...");
    let report = core::sync_library(store, &client, api_key, steam_id, now)
        .await
        .context("Sync failed")?;

    render::print_sync_report(&report);
    Ok(())
}

fn list(store: &FileStore, args: &QueryArgs, now: DateTime<Utc>) -> Result<()> {
    let query = args.to_query()?;
    let view = load_view(store, now)?;

    if view.is_empty() {
        println!("Library is empty. Use 'backlog sync' or 'backlog add <name>' to add games.");
        return Ok(());
    }

    let results = query.run(&view)?;
    render::print_entries(&results, view.len(), view.last_synced);

    Ok(())
}

fn export_games(
    config: &ResolvedConfig,
    store: &FileStore,
    format: ExportFormat,
    output: Option<PathBuf>,
    args: &QueryArgs,
    now: DateTime<Utc>,
) -> Result<()> {
    let view = load_view(store, now)?;
    let results = args.to_query()?.run(&view)?;
    let bytes = export(&results, format)?;

    let path = output.unwrap_or_else(|| paths::default_export_file(&config.export_dir, format));
    write_export(&path, &bytes)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;

    println!("Exported {} games to {}", results.len(), path.display());
    Ok(())
}

fn stats(store: &FileStore, now: DateTime<Utc>) -> Result<()> {
    let view = load_view(store, now)?;
    let stats = LibraryStats::compute(&view.entries);
    render::print_stats(&stats);
    Ok(())
}

fn tags(store: &FileStore, now: DateTime<Utc>) -> Result<()> {
    let view = load_view(store, now)?;
    let summary = tag_summary(&view.entries);

    if summary.is_empty() {
        println!("No tags yet. Use 'backlog tag <game> <tag>' to add one.");
        return Ok(());
    }

    render::print_tag_summary(&summary);
    Ok(())
}

async fn add(
    store: &FileStore,
    name: Option<String>,
    app_id: Option<u64>,
    platform: Option<String>,
) -> Result<()> {
    // Id allocation must see leftover tag and status rows
    let mut state = store
        .load_for(&Collection::ALL)
        .context("Failed to load library")?;

    let new = match (app_id, name) {
        (Some(app_id), _) => {
            let client = SteamClient::new();
            core::lookup_manual_game(&client, app_id, platform)
                .await
                .with_context(|| format!("Failed to look up Steam app {}", app_id))?
        }
        (None, Some(name)) => NewManualGame {
            name,
            platform,
            app_id: None,
        },
        (None, None) => anyhow::bail!("Give a game name or --app-id"),
    };

    let id = core::add_manual_game(&mut state, new)?;
    store
        .save_collections(&state, &[Collection::ManualGames])
        .context("Failed to save manual games")?;

    if let Some(entry) = state.entry(&id) {
        println!("Added '{}' ({}) on {}", entry.name, entry.id, entry.platform);
    }
    Ok(())
}

fn show_config(config: &ResolvedConfig) {
    println!("backlog configuration");
    println!("{}", "=".repeat(40));
    println!();
    println!(
        "Config file: {}",
        config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:          {}", config.home.display());
    println!("  Games:         {}", paths::games_file(&config.home).display());
    println!("  Tags:          {}", paths::tags_file(&config.home).display());
    println!("  Status:        {}", paths::status_file(&config.home).display());
    println!("  Manual games:  {}", paths::manual_games_file(&config.home).display());
    println!("  Exports:       {}", config.export_dir.display());
    println!();
    println!("Steam:");
    println!(
        "  API key:  {}",
        config
            .steam
            .masked_api_key()
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!(
        "  Steam ID: {}",
        config.steam.steam_id.as_deref().unwrap_or("(not set)")
    );
}
