//! Configuration for backlog.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (BACKLOG_HOME, STEAM_API_KEY, STEAM_ID)
//! 2. Config file (.backlog/config.yaml)
//! 3. Defaults (~/.backlog, exports in the current directory)
//!
//! Config file discovery:
//! - Searches the start directory and its parents for .backlog/config.yaml
//! - `paths.home` is relative to the .backlog/ directory
//! - `export.directory` is relative to the project root (parent of .backlog/)

pub mod paths;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const CONFIG_DIR: &str = ".backlog";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub steam: Option<SteamConfig>,
    #[serde(default)]
    pub export: Option<ExportConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Store directory (relative to .backlog/)
    pub home: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SteamConfig {
    pub api_key: Option<String>,
    pub steam_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Default export directory (relative to project root)
    pub directory: Option<String>,
}

/// Environment overrides, read once
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub home: Option<String>,
    pub api_key: Option<String>,
    pub steam_id: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            home: var("BACKLOG_HOME"),
            api_key: var("STEAM_API_KEY"),
            steam_id: var("STEAM_ID"),
        }
    }
}

/// Remote catalog credentials; either may be missing until `sync` needs them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SteamCredentials {
    pub api_key: Option<String>,
    pub steam_id: Option<String>,
}

impl SteamCredentials {
    /// Both credentials, or an error naming what is missing
    pub fn require(&self) -> Result<(&str, &str)> {
        match (self.api_key.as_deref(), self.steam_id.as_deref()) {
            (Some(key), Some(id)) => Ok((key, id)),
            (key, id) => {
                let missing: Vec<&str> = [
                    key.is_none().then_some("STEAM_API_KEY"),
                    id.is_none().then_some("STEAM_ID"),
                ]
                .into_iter()
                .flatten()
                .collect();
                anyhow::bail!(
                    "Missing Steam credentials: set {} or add them to {}/{}",
                    missing.join(" and "),
                    CONFIG_DIR,
                    CONFIG_FILE
                )
            }
        }
    }

    /// API key with all but the last four characters hidden
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_ref().map(|key| {
            let chars: Vec<char> = key.chars().collect();
            let visible = chars.len().min(4);
            let hidden = chars.len() - visible;
            let tail: String = chars[hidden..].iter().collect();
            format!("{}{}", "*".repeat(hidden), tail)
        })
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Directory holding the four store documents
    pub home: PathBuf,
    /// Default directory for export files
    pub export_dir: PathBuf,
    pub steam: SteamCredentials,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

impl ResolvedConfig {
    /// Resolve from the current directory and process environment
    pub fn resolve() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        Self::resolve_from(&cwd, &EnvOverrides::from_env())
    }

    /// Resolve starting the config file search at `start`
    pub fn resolve_from(start: &Path, env: &EnvOverrides) -> Result<Self> {
        let config_file = find_config_file(start);

        let (home, export_dir, steam) = if let Some(ref config_path) = config_file {
            let config = load_config_file(config_path)?;

            // .backlog/ and its parent, the project root
            let backlog_dir = config_path.parent().unwrap_or(Path::new("."));
            let base_dir = backlog_dir.parent().unwrap_or(Path::new("."));

            let home = match (&env.home, &config.paths.home) {
                (Some(env_home), _) => PathBuf::from(env_home),
                (None, Some(home_path)) => resolve_path(backlog_dir, home_path),
                (None, None) => default_home()?,
            };

            let export_dir = config
                .export
                .as_ref()
                .and_then(|e| e.directory.as_deref())
                .map(|dir| resolve_path(base_dir, dir))
                .unwrap_or_else(|| start.to_path_buf());

            let file_steam = config.steam.unwrap_or(SteamConfig {
                api_key: None,
                steam_id: None,
            });
            let steam = SteamCredentials {
                api_key: env.api_key.clone().or(file_steam.api_key),
                steam_id: env.steam_id.clone().or(file_steam.steam_id),
            };

            (home, export_dir, steam)
        } else {
            // No config file - use env vars or defaults
            let home = match &env.home {
                Some(env_home) => PathBuf::from(env_home),
                None => default_home()?,
            };
            let steam = SteamCredentials {
                api_key: env.api_key.clone(),
                steam_id: env.steam_id.clone(),
            };

            (home, start.to_path_buf(), steam)
        };

        Ok(Self {
            home,
            export_dir,
            steam,
            config_file,
        })
    }
}

fn default_home() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR))
}
