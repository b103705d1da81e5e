//! Response parsing: vision-model reply text → tables.
//!
//! ## Reply grammar
//!
//! ```text
//! reply   := [fence-line] block (blank-line+ block)* [closing-fence]
//! block   := csv-line+
//! ```
//!
//! The prompt asks for bare CSV, but models regularly wrap the answer in a
//! ```` ```csv ```` fence anyway, so an opening fence line (with or without a
//! language tag) is dropped, and a closing fence line is dropped when it is
//! the last line. Anything else is treated as CSV.

use crate::table::{Row, Table};
use csv::ReaderBuilder;
use tracing::{debug, warn};

const FENCE: &str = "```";

/// Split a model reply into tables.
///
/// Blocks that contain no non-empty rows are skipped rather than emitted as
/// empty tables.
pub fn parse_csv_response(text: &str) -> Vec<Table> {
    let body = strip_fences(text);

    let tables: Vec<Table> = split_blocks(&body)
        .into_iter()
        .filter_map(|block| {
            let rows = parse_block(&block);
            (!rows.is_empty()).then(|| Table::new(rows))
        })
        .collect();

    debug!("Parsed {} table(s) from model reply", tables.len());
    tables
}

fn strip_fences(text: &str) -> String {
    let text = text.trim();
    if !text.starts_with(FENCE) {
        return text.to_string();
    }

    let mut lines: Vec<&str> = text.lines().skip(1).collect();
    if lines.last().is_some_and(|l| l.trim() == FENCE) {
        lines.pop();
    }
    lines.join("\n")
}

/// Runs of non-blank lines, split at one or more blank lines.
fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_block(lines: &[&str]) -> Vec<Row> {
    let joined = lines.join("\n");
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(joined.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => {
                let row: Row = record.iter().map(str::to_string).collect();
                if !is_empty_row(&row) {
                    rows.push(row);
                }
            }
            Err(e) => warn!("Skipping unreadable CSV record in model reply: {e}"),
        }
    }
    rows
}

/// No fields at all, or one empty field (what `""` on its own line reads as).
fn is_empty_row(row: &[String]) -> bool {
    match row {
        [] => true,
        [only] => only.is_empty(),
        _ => false,
    }
}
