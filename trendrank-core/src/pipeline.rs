/// The full ranking run: filter -> sort -> reconstruct.
///
/// Stages run sequentially because each stage's oracle calls depend on the
/// previous stage's output. All three share one comparison cache, so a key
/// queried during filtering is free during sorting and reconstruction.
use tracing::info;

use crate::cache::ComparisonCache;
use crate::filter::{eliminate_empty, FilterOptions};
use crate::oracle::{Oracle, OracleError};
use crate::reconstruct::reconstruct;
use crate::sort::{bucket_sort, SortOptions};
use crate::store::CacheStore;
use crate::types::Series;

/// Top-level failures of a ranking run.
///
/// NoData answers and zero-value re-queueing never surface here — they are
/// consumed inside the stages. What does surface changes what the operator
/// must do next.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RunError {
    /// The oracle transport gave up (sustained throttling or unretried
    /// transient failure). Cached results from before the abort are kept.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// The input item list was empty.
    #[error("no items to rank")]
    EmptyInput,

    /// Every batch came back without data; there is nothing to sort or
    /// reconstruct. A clean no-output termination, not a crash.
    #[error("all items were dropped by the signal filter")]
    AllItemsFiltered,
}

#[derive(Debug, Clone, Default)]
pub struct RankOptions {
    pub filter: FilterOptions,
    pub sort: SortOptions,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RankOutcome {
    /// The reconstructed single-scale series, columns in ranked order.
    pub series: Series,
    /// The ordered item sequence, descending inferred magnitude.
    pub ranked: Vec<String>,
    /// Items dropped by the filter.
    pub empty: Vec<String>,
    /// External oracle calls spent across all three stages.
    pub oracle_calls: u64,
}

/// Run the whole pipeline over `items`.
pub async fn run_ranking<O, S>(
    cache: &mut ComparisonCache<O, S>,
    items: &[String],
    options: &RankOptions,
) -> Result<RankOutcome, RunError>
where
    O: Oracle + Send,
    S: CacheStore + Send,
{
    if items.is_empty() {
        return Err(RunError::EmptyInput);
    }

    info!(items = items.len(), "filtering items without signal");
    let filtered = eliminate_empty(cache, items, &options.filter).await?;
    info!(
        signal = filtered.signal.len(),
        empty = filtered.empty.len(),
        calls = cache.oracle_calls(),
        "filter done"
    );

    if filtered.signal.is_empty() {
        return Err(RunError::AllItemsFiltered);
    }

    let ranked = bucket_sort(cache, filtered.signal, &options.sort).await?;
    info!(calls = cache.oracle_calls(), "sort done");

    let series = reconstruct(cache, &ranked).await?;
    info!(calls = cache.oracle_calls(), "reconstruction done");

    Ok(RankOutcome {
        series,
        ranked,
        empty: filtered.empty,
        oracle_calls: cache.oracle_calls(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::stub::StubOracle;
    use crate::types::{QueryKey, RequestConfig};

    fn open_with(
        oracle: StubOracle,
        store: MemoryStore,
    ) -> ComparisonCache<StubOracle, MemoryStore> {
        ComparisonCache::open(oracle, store, &RequestConfig::default(), 1000).unwrap()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_input_terminates_cleanly() {
        let mut cache = open_with(StubOracle::new(), MemoryStore::new());
        let err = run_ranking(&mut cache, &[], &RankOptions::default()).await.unwrap_err();
        assert_eq!(err, RunError::EmptyInput);
        assert_eq!(cache.oracle_calls(), 0);
    }

    #[tokio::test]
    async fn test_all_items_filtered_terminates_cleanly() {
        let mut oracle = StubOracle::new();
        oracle.respond_no_data(&["x", "y"]);

        let mut cache = open_with(oracle, MemoryStore::new());
        let err = run_ranking(&mut cache, &names(&["x", "y"]), &RankOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, RunError::AllItemsFiltered);
    }

    #[tokio::test]
    async fn test_end_to_end_over_shared_cache() {
        let mut oracle = StubOracle::new();
        // Filter batch (3 items in one key).
        oracle.respond(&["a", "b", "c"], &[100.0, 50.0, 25.0]);
        // Pairwise keys for sort and reconstruction, plus anchors.
        oracle.respond_from_truth(&[("a", 80.0), ("b", 40.0), ("c", 20.0)]);

        let mut cache = open_with(oracle, MemoryStore::new());
        let outcome = run_ranking(&mut cache, &names(&["a", "b", "c"]), &RankOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.ranked, names(&["a", "b", "c"]));
        assert!(outcome.empty.is_empty());
        assert_eq!(outcome.series.items, outcome.ranked);
        assert_eq!(outcome.series.num_items(), 3);

        // Filter: 1 call. Sort (pivot b): {a,b}, {b,c} = 2. Reconstruction
        // reuses {a,b} and {b,c} from the cache and only adds the {c}
        // anchor. 4 total — dedup across stages is the whole point.
        assert_eq!(outcome.oracle_calls, 4);
    }

    #[tokio::test]
    async fn test_throttle_aborts_but_cache_survives() {
        let store = MemoryStore::new();

        // First run resolves one key, then hits a permanent throttle.
        {
            let mut oracle = StubOracle::new();
            oracle.respond(&["a", "b", "c", "d", "e"], &[100.0, 9.0, 8.0, 7.0, 6.0]);
            let mut cache = open_with(oracle, store.clone());
            cache
                .resolve(&QueryKey::new(["a", "b", "c", "d", "e"]))
                .await
                .unwrap();
            cache.flush().unwrap();
        }

        let oracle = StubOracle::always_failing(OracleError::Throttled("sustained 429".into()));
        let mut cache = open_with(oracle, store.clone());
        let err = run_ranking(
            &mut cache,
            &names(&["a", "b", "c", "d", "e"]),
            &RankOptions::default(),
        )
        .await
        .unwrap_err();

        // The filter batch was served from the persisted snapshot; the
        // first novel key (a sort pair) surfaced the throttle and aborted.
        assert_eq!(err, RunError::Oracle(OracleError::Throttled("sustained 429".into())));
        assert_eq!(cache.oracle_calls(), 0, "only successful external calls are counted");

        // Previously cached entries remain retrievable in a fresh run.
        let mut fresh = open_with(
            StubOracle::always_failing(OracleError::Throttled("still banned".into())),
            store,
        );
        let profile = fresh
            .resolve(&QueryKey::new(["a", "b", "c", "d", "e"]))
            .await
            .unwrap();
        assert!(profile.is_some());
        assert_eq!(fresh.oracle_calls(), 0);
    }
}
