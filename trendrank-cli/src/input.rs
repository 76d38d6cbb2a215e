/// Item list loading: one identifier per row of a headerless CSV, with an
/// optional row cap.
use std::path::Path;

use crate::bail;

/// Read item identifiers from the first column of `path`.
///
/// Blank rows are skipped; `limit` caps how many rows are taken.
pub fn read_items(path: &Path, limit: Option<usize>) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .unwrap_or_else(|e| bail(format!("Failed to open items file {}: {e}", path.display())));

    let mut items = Vec::new();
    for record in reader.records() {
        let record = record
            .unwrap_or_else(|e| bail(format!("Failed to read {}: {e}", path.display())));
        let Some(field) = record.get(0) else { continue };
        let item = field.trim();
        if item.is_empty() {
            continue;
        }
        items.push(item.to_string());

        if let Some(cap) = limit {
            if items.len() >= cap {
                break;
            }
        }
    }
    items
}
