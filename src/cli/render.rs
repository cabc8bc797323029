//! Plain fixed-width text output for the CLI.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::core::{BulkReport, LibraryEntry, LibraryStats, SyncReport};
use crate::domain::GameId;
use crate::library::StoreState;

const NAME_WIDTH: usize = 40;

/// Playtime as hours with one decimal
pub fn format_hours(minutes: u64) -> String {
    format!("{:.1}h", minutes as f64 / 60.0)
}

fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "never".to_string())
}

/// Truncate to `width` characters, marking the cut with "..."
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

pub fn print_entries(entries: &[LibraryEntry], total: usize, last_synced: Option<DateTime<Utc>>) {
    if entries.is_empty() {
        println!("No games match the given filters.");
        return;
    }

    println!(
        "{:<12} {:<40} {:>9} {:<10} {:<11} {:<10} {}",
        "ID", "NAME", "PLAYTIME", "STATUS", "LAST PLAYED", "PLATFORM", "TAGS"
    );
    println!("{}", "-".repeat(110));

    for entry in entries {
        let tags: Vec<&str> = entry.tags.iter().map(String::as_str).collect();
        println!(
            "{:<12} {:<40} {:>9} {:<10} {:<11} {:<10} {}",
            entry.id().to_string(),
            truncate(entry.name(), NAME_WIDTH),
            format_hours(entry.game.playtime_minutes),
            entry.status().to_string(),
            format_date(entry.game.last_played_at),
            truncate(&entry.game.platform, 10),
            tags.join(", ")
        );
    }

    println!("\nShowing {} of {} games", entries.len(), total);
    match last_synced {
        Some(at) => println!("Last synced: {}", at.format("%Y-%m-%d %H:%M UTC")),
        None => println!("Never synced"),
    }
}

pub fn print_sync_report(report: &SyncReport) {
    println!(
        "Synced {} games: {} added, {} updated, {} unchanged",
        report.fetched, report.added, report.updated, report.unchanged
    );
    if report.retained > 0 {
        println!(
            "{} stored games were not in this fetch and were kept",
            report.retained
        );
    }
    for id in &report.shadowed {
        println!("Skipped {}: a manual entry uses this id", id);
    }
    for anomaly in &report.anomalies {
        println!(
            "Playtime anomaly: {} ({}) recorded {} min, Steam reports {} min; kept recorded value",
            anomaly.name, anomaly.id, anomaly.recorded_minutes, anomaly.reported_minutes
        );
    }
}

pub fn print_stats(stats: &LibraryStats) {
    println!("Library statistics");
    println!("{}", "=".repeat(40));
    println!("Total games:        {}", stats.total_games);
    println!("Total playtime:     {}", format_hours(stats.total_minutes));
    println!(
        "Never played:       {} ({:.1}%)",
        stats.not_played,
        stats.not_played_percent()
    );
    println!("Played:             {}", stats.played);
    println!(
        "Average (played):   {}",
        format_hours(stats.average_played_minutes.round() as u64)
    );
    if let Some(most) = &stats.most_played {
        println!(
            "Most played:        {} ({})",
            most.name,
            format_hours(most.playtime_minutes)
        );
    }
    if let Some(least) = &stats.least_played {
        println!(
            "Least played:       {} ({})",
            least.name,
            format_hours(least.playtime_minutes)
        );
    }

    println!("\nPlaytime distribution:");
    for (bracket, count) in &stats.brackets {
        println!("  {:<14} {}", bracket.label(), count);
    }

    println!("\nBy status:");
    for (status, count) in &stats.statuses {
        println!("  {:<14} {}", status.to_string(), count);
    }
}

pub fn print_tag_summary(summary: &BTreeMap<String, Vec<String>>) {
    for (tag, games) in summary {
        println!("{} ({})", tag, games.len());
        for name in games {
            println!("  - {}", name);
        }
    }
}

pub fn print_bulk_report(action: &str, report: &BulkReport, state: &StoreState) {
    let name = |id: &GameId| {
        state
            .entry(id)
            .map(|g| g.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    for id in &report.applied {
        println!("{}: {}", action, name(id));
    }
    for id in &report.unchanged {
        println!("Unchanged: {}", name(id));
    }
    for (query, err) in &report.failed {
        println!("Failed: {} ({})", query, err);
    }

    let total = report.applied.len() + report.unchanged.len() + report.failed.len();
    println!(
        "\n{} of {} games changed, {} failed",
        report.applied.len(),
        total,
        report.failed.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hours() {
        assert_eq!(format_hours(0), "0.0h");
        assert_eq!(format_hours(90), "1.5h");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ÖÖÖÖÖÖÖÖÖÖÖÖ", 6), "ÖÖÖ...");
    }
}
