//! Output formatting for CLI commands.
//!
//! This module renders stored records as tables and summary lines for
//! human consumption.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::spec::ResolvedSpec;
use crate::store::StoredRecord;

/// Timestamp format used in table output.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Record row for table display.
#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Last Modified")]
    modified: String,
}

/// Sort order for record listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Alphabetical by name.
    Name,
    /// Most recently modified first.
    Modified,
    /// Highest version first.
    Version,
}

/// Formats records as a table plus a summary line.
#[must_use]
pub fn format_record_table(spec: &ResolvedSpec, records: &[StoredRecord], order: SortOrder) -> String {
    if records.is_empty() {
        return format!(
            "No records deployed. service = {}, stage = {}, region = {}\n",
            spec.service, spec.stage, spec.region
        );
    }

    let mut sorted: Vec<&StoredRecord> = records.iter().collect();
    match order {
        SortOrder::Name => sorted.sort_by(|a, b| a.name.cmp(&b.name)),
        SortOrder::Modified => sorted.sort_by(|a, b| b.modified.cmp(&a.modified)),
        SortOrder::Version => sorted.sort_by(|a, b| {
            let av = a.version.parse::<u64>().unwrap_or(0);
            let bv = b.version.parse::<u64>().unwrap_or(0);
            bv.cmp(&av)
        }),
    }

    let rows: Vec<RecordRow> = sorted
        .iter()
        .map(|r| RecordRow {
            name: r.name.clone(),
            value: truncate(&r.value, 40),
            kind: r.kind.label().to_string(),
            version: r.version.clone(),
            modified: r.modified.format(TIME_FORMAT).to_string(),
        })
        .collect();

    let mut output = Table::new(rows).to_string();
    output.push('\n');
    let _ = write!(
        output,
        "\nTotal records = {}. service = {}, stage = {}, region = {}\n",
        sorted.len().to_string().green(),
        spec.service,
        spec.stage,
        spec.region
    );
    output
}

/// Truncates long values for table display.
fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let kept: String = value.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
