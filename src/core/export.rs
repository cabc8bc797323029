//! Export of query results as CSV or JSON.
//!
//! Output is deterministic: the same entries always produce the same bytes.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use super::view::LibraryEntry;
use crate::domain::TAG_SEPARATOR;
use crate::error::{LibraryError, Result};
use crate::library::write_atomic;

/// Fixed column order of the tabular form
pub const COLUMNS: [&str; 8] = [
    "id",
    "name",
    "source",
    "platform",
    "playtime_minutes",
    "last_played_at",
    "status",
    "tags",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// File name used when the caller gives no output path
    pub fn default_file_name(&self) -> String {
        format!("backlog.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(LibraryError::InvalidQuery(format!(
                "Unknown export format: {} (expected csv or json)",
                s
            ))),
        }
    }
}

/// One exported row; field order is the column order
#[derive(Debug, Serialize)]
struct ExportRecord<'a> {
    id: String,
    name: &'a str,
    source: String,
    platform: &'a str,
    playtime_minutes: u64,
    last_played_at: Option<String>,
    status: &'static str,
    tags: Vec<&'a str>,
}

impl<'a> From<&'a LibraryEntry> for ExportRecord<'a> {
    fn from(entry: &'a LibraryEntry) -> Self {
        Self {
            id: entry.game.id.to_string(),
            name: &entry.game.name,
            source: entry.game.source.to_string(),
            platform: &entry.game.platform,
            playtime_minutes: entry.game.playtime_minutes,
            last_played_at: entry.game.last_played_at.map(format_timestamp),
            status: entry.status().as_str(),
            // BTreeSet iteration is already sorted
            tags: entry.tags.iter().map(String::as_str).collect(),
        }
    }
}

/// ISO-8601 with second precision and a `Z` suffix
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Serialize entries in input order
pub fn export(entries: &[LibraryEntry], format: ExportFormat) -> Result<Vec<u8>> {
    let records: Vec<ExportRecord<'_>> = entries.iter().map(ExportRecord::from).collect();

    match format {
        ExportFormat::Csv => Ok(to_csv(&records).into_bytes()),
        ExportFormat::Json => {
            let mut bytes = serde_json::to_vec_pretty(&records)?;
            bytes.push(b'\n');
            Ok(bytes)
        }
    }
}

fn to_csv(records: &[ExportRecord<'_>]) -> String {
    let mut out = COLUMNS.join(",");
    out.push('\n');

    for record in records {
        let fields = [
            record.id.clone(),
            record.name.to_string(),
            record.source.clone(),
            record.platform.to_string(),
            record.playtime_minutes.to_string(),
            record.last_played_at.clone().unwrap_or_default(),
            record.status.to_string(),
            record.tags.join(TAG_SEPARATOR),
        ];
        let row: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Quote a field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write an export to `path`, creating its directory if needed
pub fn write_export(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| LibraryError::io(parent, e))?;
    }
    write_atomic(path, bytes)?;
    info!("Exported {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
