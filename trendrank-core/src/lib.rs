/// trendrank-core: ranking engine over a relative-magnitude comparison oracle.
///
/// The oracle only ever compares small bounded groups of items and
/// normalizes each answer so the group's maximum is 100 — it never reveals
/// absolute scale, and every call is expensive. This crate turns that into
/// a global ranking and one continuous absolute-magnitude series:
/// a deduplicating cache keeps each unique query to at most one external
/// call, the empty-set filter discards items with no signal, the
/// bucket-partition sort orders the rest from pairwise diffs, and the
/// reconstructor chains pairwise scale ratios into a single table.
///
/// No HTTP, no filesystem — the oracle transport ([`Oracle`]) and the
/// cache's durable backing ([`CacheStore`]) are traits implemented by the
/// caller.
///
/// # Quick start
///
/// ```rust,ignore
/// use trendrank_core::{ComparisonCache, RankOptions, RequestConfig, run_ranking};
///
/// let config = RequestConfig::default();
/// let mut cache = ComparisonCache::open(my_oracle, my_store, &config, 25)?;
///
/// let outcome = run_ranking(&mut cache, &items, &RankOptions::default()).await?;
/// cache.flush()?;
///
/// for item in &outcome.ranked {
///     println!("{item}");
/// }
/// ```

pub mod cache;
pub mod constants;
pub mod filter;
pub mod oracle;
pub mod pipeline;
pub mod reconstruct;
pub mod sort;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod stub;

// Re-export primary public API at crate root.
pub use cache::ComparisonCache;
pub use filter::{eliminate_empty, FilterOptions, FilterOutcome};
pub use oracle::{Oracle, OracleError};
pub use pipeline::{run_ranking, RankOptions, RankOutcome, RunError};
pub use reconstruct::reconstruct;
pub use sort::{bucket_sort, SortOptions};
pub use store::{CacheEntry, CacheSnapshot, CacheStore, MemoryStore, StoreError};
pub use types::{MagnitudeProfile, QueryKey, RequestConfig, Series};
