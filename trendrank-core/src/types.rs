use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An unordered set of items submitted together in one oracle call.
///
/// Canonical form: members sorted and deduplicated, so `{A,B}` and `{B,A}`
/// hash and compare as the same key. The oracle caps how many items fit in
/// one call — see [`crate::constants::DEFAULT_BATCH_SIZE`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Build a key from any collection of item names. Order and duplicates
    /// in the input are irrelevant.
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut members: Vec<String> = items.into_iter().map(Into::into).collect();
        members.sort();
        members.dedup();
        QueryKey(members)
    }

    /// Single-item key, used for reconstruction anchors.
    pub fn single(item: &str) -> Self {
        QueryKey(vec![item.to_string()])
    }

    /// Pairwise key, used by the sort and the reconstruction chain.
    pub fn pair(a: &str, b: &str) -> Self {
        QueryKey::new([a, b])
    }

    pub fn items(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.join(", "))
    }
}

/// Time-indexed relative magnitudes for one query key.
///
/// One column per item, values normalized by the oracle to [0, 100] within
/// this profile. Absolute scale is meaningless in isolation; only ratios
/// between columns of the same profile carry information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeProfile {
    /// Opaque time labels, as reported by the oracle.
    pub timestamps: Vec<String>,
    /// Item name -> per-timestamp values. Same length as `timestamps`.
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl MagnitudeProfile {
    /// A profile with no rows — the oracle's "no data" shape.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn column(&self, item: &str) -> Option<&[f64]> {
        self.columns.get(item).map(Vec::as_slice)
    }

    /// Maximum value of an item's column. Items the oracle did not report a
    /// column for read as 0.0 — indistinguishable from a flat-zero column,
    /// which is how the filter treats both.
    pub fn column_max(&self, item: &str) -> f64 {
        self.columns
            .get(item)
            .map(|col| col.iter().copied().fold(0.0_f64, f64::max))
            .unwrap_or(0.0)
    }
}

/// The run's fixed oracle request parameters.
///
/// Passed through to the transport verbatim for the whole run, and
/// fingerprinted so a persisted cache built under different parameters is
/// discarded instead of silently mixed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Time window, e.g. "all" or "today 5-y".
    pub timeframe: String,
    /// Category filter id (0 = all categories).
    pub category: u32,
    /// Content source filter, e.g. "news". Empty = web search.
    pub gprop: String,
    /// Geography filter, e.g. "US". Empty = worldwide.
    pub geo: String,
}

impl RequestConfig {
    /// Stable identity string for cache compatibility checks.
    pub fn fingerprint(&self) -> String {
        format!(
            "timeframe={};category={};gprop={};geo={}",
            self.timeframe, self.category, self.gprop, self.geo
        )
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        RequestConfig {
            timeframe: "all".to_string(),
            category: 0,
            gprop: String::new(),
            geo: String::new(),
        }
    }
}

/// The reconstructed single-scale magnitude table.
///
/// One column per ranked item, all on one common (unitless) scale, indexed
/// by the time axis of the first non-empty column appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub timestamps: Vec<String>,
    /// Column order — the order columns were appended in.
    pub items: Vec<String>,
    /// values[c] is the column for items[c], same length as `timestamps`.
    pub values: Vec<Vec<f64>>,
}

impl Series {
    pub fn new() -> Self {
        Series::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    /// Append a column. The first column with a non-empty time axis fixes
    /// the series axis; later columns are truncated or zero-padded to match
    /// it, and any all-zero placeholders appended before the axis was known
    /// are padded out retroactively.
    pub fn push_column(&mut self, item: &str, timestamps: &[String], mut column: Vec<f64>) {
        if self.timestamps.is_empty() && !timestamps.is_empty() {
            self.timestamps = timestamps.to_vec();
            for earlier in &mut self.values {
                earlier.resize(self.timestamps.len(), 0.0);
            }
        }
        column.resize(self.timestamps.len(), 0.0);
        self.items.push(item.to_string());
        self.values.push(column);
    }

    /// Multiply every value appended so far by `factor`. This is how the
    /// reconstruction chain retroactively re-anchors earlier columns.
    pub fn rescale(&mut self, factor: f64) {
        for column in &mut self.values {
            for v in column.iter_mut() {
                *v *= factor;
            }
        }
    }

    pub fn column(&self, item: &str) -> Option<&[f64]> {
        self.items
            .iter()
            .position(|i| i == item)
            .map(|c| self.values[c].as_slice())
    }
}
