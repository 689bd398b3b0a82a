//! Input ingestion: plain URL lists are handed to the core as raw text; CSV
//! files are parsed here, with the data-row index becoming the item identity
//! so interrupted runs can resume.

use anyhow::{bail, Result};
use feeder_core::QueuedItem;
use feeder_logging::feeder_warn;

/// Parses CSV text with a header row into keyed items.
///
/// The URL column is matched by `column` (case-insensitive); when that name
/// is not present, the first header containing "url" is used instead.
pub fn parse_csv(text: &str, column: &str) -> Result<Vec<QueuedItem>> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header = match lines.next() {
        Some(line) => split_csv_line(line),
        None => bail!("CSV input is empty"),
    };

    let column_index = match find_url_column(&header, column) {
        Some(index) => index,
        None => bail!(
            "no column named '{column}' and no header containing 'url' (headers: {})",
            header.join(", ")
        ),
    };

    let mut items = Vec::new();
    for (row, line) in lines.enumerate() {
        let fields = split_csv_line(line);
        let Some(url) = fields.get(column_index) else {
            feeder_warn!("Row {} has no column {}; skipped", row, column_index);
            continue;
        };
        let url = url.trim();
        if url.is_empty() {
            continue;
        }
        items.push(QueuedItem {
            key: Some(row as u64),
            url: url.to_string(),
        });
    }
    Ok(items)
}

fn find_url_column(header: &[String], wanted: &str) -> Option<usize> {
    if let Some(index) = header
        .iter()
        .position(|name| name.trim().eq_ignore_ascii_case(wanted))
    {
        return Some(index);
    }
    header
        .iter()
        .position(|name| name.to_ascii_lowercase().contains("url"))
}

/// Minimal CSV field splitter: commas separate fields, double quotes group,
/// doubled quotes escape inside a quoted field.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
