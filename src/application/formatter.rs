//! Output formatting for quotes, categories and sync results.
//!
//! Supports multiple output formats: plain text, JSON, and table view.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{CategorySelector, Quote, SyncReport, SyncState};

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// One quote per line.
    #[default]
    Plain,
    /// JSON format for programmatic use.
    Json,
    /// Compact table listing.
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            _ => Err(format!("Unknown format: {s}. Use: plain, json, table")),
        }
    }
}

/// Formats a single quote for display, or the empty-view message.
pub fn format_quote(quote: Option<&Quote>) -> String {
    quote.map_or_else(
        || "No quotes available.".dimmed().to_string(),
        |q| format!("\"{}\" — {}", q.text.italic(), q.category.cyan()),
    )
}

/// Formats a list of quotes in the requested format.
///
/// # Errors
/// Returns error if JSON serialization fails.
pub fn format_quotes(quotes: &[&Quote], format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Plain => Ok(quotes
            .iter()
            .map(|q| q.to_string())
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => serde_json::to_string_pretty(quotes),
        OutputFormat::Table => Ok(format_quotes_table(quotes)),
    }
}

/// Formats a table listing of quotes.
pub fn format_quotes_table(quotes: &[&Quote]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Category", "Quote"]);

    for (i, quote) in quotes.iter().enumerate() {
        table.add_row(vec![
            &(i + 1).to_string(),
            &truncate(&quote.category, 18),
            &truncate(&quote.text, 60),
        ]);
    }

    table.to_string()
}

/// Formats the category index, marking the selected entry.
pub fn format_categories(categories: &[CategorySelector], selected: &CategorySelector) -> String {
    categories
        .iter()
        .map(|c| {
            if c == selected {
                format!("{} {}", "*".green().bold(), c.to_string().green())
            } else {
                format!("  {c}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats the result of a sync cycle.
pub fn format_sync_report(report: &SyncReport) -> String {
    format!(
        "{} Quotes synced with server: {} new, {} already present ({} total)",
        "✓".green().bold(),
        report.added.to_string().cyan(),
        report.skipped.to_string().yellow(),
        report.total
    )
}

/// Formats the daemon's lifetime totals.
pub fn format_sync_state(state: &SyncState) -> String {
    let last_sync = state.last_sync.map_or_else(
        || "never".to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );

    let mut out = format!(
        "{}\n  Last sync: {}\n  Cycles completed: {}\n  Cycles failed: {}\n  Quotes added: {}",
        "🔄 Sync summary".bold(),
        last_sync,
        state.cycles_completed.to_string().green(),
        state.cycles_failed.to_string().red(),
        state.quotes_added.to_string().cyan()
    );

    if let Some(ref err) = state.last_error {
        out.push_str(&format!("\n  Last error: {err}"));
    }

    out
}

/// Truncates a string to max length with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{cut}...")
    }
}
