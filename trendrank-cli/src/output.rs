/// Output writing: wide CSV (one row per time point, one column per item),
/// the reshaped four-column long format, and the dropped-items list.
use std::path::Path;

use trendrank_core::Series;

use crate::bail;

/// Write the series as a wide table: `date` column then one column per item.
pub fn write_wide_csv(series: &Series, path: &Path) {
    let mut writer = csv::Writer::from_path(path)
        .unwrap_or_else(|e| bail(format!("Failed to create {}: {e}", path.display())));

    let mut header = vec!["date".to_string()];
    header.extend(series.items.iter().cloned());
    writer
        .write_record(&header)
        .unwrap_or_else(|e| bail(format!("Failed to write {}: {e}", path.display())));

    for (row, timestamp) in series.timestamps.iter().enumerate() {
        let mut record = vec![timestamp.clone()];
        for column in &series.values {
            record.push(format!("{}", column[row]));
        }
        writer
            .write_record(&record)
            .unwrap_or_else(|e| bail(format!("Failed to write {}: {e}", path.display())));
    }

    writer
        .flush()
        .unwrap_or_else(|e| bail(format!("Failed to flush {}: {e}", path.display())));
}

/// Split an `EXCHANGE:TICKER` label. Items without a `:` keep an empty
/// exchange field.
fn split_symbol(item: &str) -> (&str, &str) {
    match item.split_once(':') {
        Some((exchange, ticker)) => (exchange, ticker),
        None => ("", item),
    }
}

/// Write the series reshaped long: one row per (time point, item) pair,
/// columns `exchange, ticker, date, score`.
pub fn write_long_csv(series: &Series, path: &Path) {
    let mut writer = csv::Writer::from_path(path)
        .unwrap_or_else(|e| bail(format!("Failed to create {}: {e}", path.display())));

    writer
        .write_record(["exchange", "ticker", "date", "score"])
        .unwrap_or_else(|e| bail(format!("Failed to write {}: {e}", path.display())));

    for (col, item) in series.items.iter().enumerate() {
        let (exchange, ticker) = split_symbol(item);
        for (row, timestamp) in series.timestamps.iter().enumerate() {
            let score = format!("{}", series.values[col][row]);
            writer
                .write_record([exchange, ticker, timestamp.as_str(), score.as_str()])
                .unwrap_or_else(|e| bail(format!("Failed to write {}: {e}", path.display())));
        }
    }

    writer
        .flush()
        .unwrap_or_else(|e| bail(format!("Failed to flush {}: {e}", path.display())));
}

/// Write the dropped-items list, one identifier per row.
pub fn write_empty_items(items: &[String], path: &Path) {
    let mut writer = csv::Writer::from_path(path)
        .unwrap_or_else(|e| bail(format!("Failed to create {}: {e}", path.display())));

    for item in items {
        writer
            .write_record([item.as_str()])
            .unwrap_or_else(|e| bail(format!("Failed to write {}: {e}", path.display())));
    }

    writer
        .flush()
        .unwrap_or_else(|e| bail(format!("Failed to flush {}: {e}", path.display())));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_series() -> Series {
        let mut series = Series::new();
        let axis: Vec<String> = vec!["2020-01".into(), "2020-02".into()];
        series.push_column("NYSE:GME", &axis, vec![1.5, 3.0]);
        series.push_column("TSLA", &axis, vec![10.0, 20.0]);
        series
    }

    #[test]
    fn test_split_symbol() {
        assert_eq!(split_symbol("NYSE:GME"), ("NYSE", "GME"));
        assert_eq!(split_symbol("TSLA"), ("", "TSLA"));
    }

    #[test]
    fn test_wide_csv_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_wide_csv(&sample_series(), &path);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "date,NYSE:GME,TSLA");
        assert_eq!(lines[1], "2020-01,1.5,10");
        assert_eq!(lines[2], "2020-02,3,20");
    }

    #[test]
    fn test_long_csv_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_long_csv(&sample_series(), &path);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "exchange,ticker,date,score");
        assert_eq!(lines.len(), 1 + 2 * 2, "one row per (time point, item) pair");
        assert_eq!(lines[1], "NYSE,GME,2020-01,1.5");
        assert_eq!(lines[3], ",TSLA,2020-01,10");
    }
}
