/// Chained magnitude reconstruction.
///
/// No single oracle call ever compares more than a handful of items, yet
/// the output must put every item on one common scale. The trick: walk the
/// sorted sequence pairwise, append each item's column, and rescale the
/// whole accumulated table by that pair's max ratio so everything stays
/// correct relative to the *next* item. The last item's single-item profile
/// anchors the final absolute scale. Drift accumulates along the chain of
/// independently queried ratios; no correction is applied.
use tracing::debug;

use crate::cache::ComparisonCache;
use crate::oracle::Oracle;
use crate::pipeline::RunError;
use crate::store::CacheStore;
use crate::types::{QueryKey, Series};

/// Build the single-scale series for `items`, in the given order.
///
/// `items` must be non-empty; an empty input is a caller bug surfaced as
/// [`RunError::EmptyInput`].
pub async fn reconstruct<O: Oracle, S: CacheStore>(
    cache: &mut ComparisonCache<O, S>,
    items: &[String],
) -> Result<Series, RunError> {
    if items.is_empty() {
        return Err(RunError::EmptyInput);
    }

    let mut series = Series::new();

    for (i, item) in items.iter().enumerate() {
        if i == items.len() - 1 {
            // Anchor: the final item's own profile is appended unscaled and
            // fixes the absolute scale of everything chained before it.
            let profile = cache.resolve(&QueryKey::single(item)).await?;
            match profile {
                Some(p) if !p.is_empty() => {
                    let column = p.column(item).map(|col| col.to_vec()).unwrap_or_default();
                    series.push_column(item, &p.timestamps, column);
                }
                _ => {
                    debug!(item = %item, "anchor profile missing; appending zero column");
                    series.push_column(item, &[], Vec::new());
                }
            }
            continue;
        }

        let next = &items[i + 1];
        let profile = cache.resolve(&QueryKey::pair(item, next)).await?;
        match profile {
            Some(p) if !p.is_empty() => {
                let column = p.column(item).map(|col| col.to_vec()).unwrap_or_default();
                series.push_column(item, &p.timestamps, column);

                let next_max = p.column_max(next);
                if next_max > 0.0 {
                    series.rescale(p.column_max(item) / next_max);
                } else {
                    // A zero next-max would blow up the chain; leave the
                    // scale as-is rather than divide by zero.
                    debug!(item = %item, next = %next, "zero next-max; skipping rescale");
                }
            }
            _ => {
                debug!(item = %item, next = %next, "pair profile missing; appending zero column");
                series.push_column(item, &[], Vec::new());
            }
        }
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::stub::StubOracle;
    use crate::types::RequestConfig;

    fn open(oracle: StubOracle) -> ComparisonCache<StubOracle, MemoryStore> {
        ComparisonCache::open(oracle, MemoryStore::new(), &RequestConfig::default(), 1000)
            .unwrap()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_input_is_an_error() {
        let mut cache = open(StubOracle::new());
        let err = reconstruct(&mut cache, &[]).await.unwrap_err();
        assert!(matches!(err, RunError::EmptyInput));
    }

    #[tokio::test]
    async fn test_single_item_anchors_its_own_profile() {
        let mut oracle = StubOracle::new();
        oracle.respond(&["solo"], &[64.0]); // column [32, 64]

        let mut cache = open(oracle);
        let series = reconstruct(&mut cache, &names(&["solo"])).await.unwrap();

        assert_eq!(series.num_items(), 1);
        assert_eq!(series.column("solo"), Some(&[32.0, 64.0][..]), "column is unmodified");
        assert_eq!(cache.oracle_calls(), 1);
    }

    #[tokio::test]
    async fn test_three_item_chain_scales_forward() {
        // Chain [a, b, c]:
        //   {a,b}: max(a)=80, max(b)=40  -> table rescaled by 80/40 = 2
        //   {b,c}: max(b)=40, max(c)=100 -> table rescaled by 40/100 = 0.4
        //   {c} anchor: max(c)=50, appended unscaled
        // Net factor on a's raw column: 2 * 0.4 = 0.8 = 40/50 — the (80,40)
        // ratio carried forward once c's anchor fixes the scale.
        let mut oracle = StubOracle::new();
        oracle.respond(&["a", "b"], &[80.0, 40.0]);
        oracle.respond(&["b", "c"], &[40.0, 100.0]);
        oracle.respond(&["c"], &[50.0]);

        let mut cache = open(oracle);
        let series = reconstruct(&mut cache, &names(&["a", "b", "c"])).await.unwrap();

        assert_eq!(series.items, names(&["a", "b", "c"]));

        // raw a = [40, 80] from the {a,b} profile; final = raw * 0.8.
        assert_eq!(series.column("a"), Some(&[32.0, 64.0][..]));
        // raw b = [20, 40] from the {b,c} profile; only the 0.4 factor
        // lands on it (it was appended after the first rescale).
        assert_eq!(series.column("b"), Some(&[8.0, 16.0][..]));
        // c's anchor column appended unscaled.
        assert_eq!(series.column("c"), Some(&[25.0, 50.0][..]));

        // Exactly one call per window plus the anchor.
        assert_eq!(cache.oracle_calls(), 3);
    }

    #[tokio::test]
    async fn test_two_item_chain() {
        let mut oracle = StubOracle::new();
        oracle.respond(&["big", "small"], &[100.0, 25.0]);
        oracle.respond(&["small"], &[20.0]);

        let mut cache = open(oracle);
        let series = reconstruct(&mut cache, &names(&["big", "small"])).await.unwrap();

        // big's pair column [50, 100] rescaled once by 100/25 = 4; the
        // anchor column is appended as-is.
        assert_eq!(series.column("big"), Some(&[200.0, 400.0][..]));
        assert_eq!(series.column("small"), Some(&[10.0, 20.0][..]));
        assert_eq!(cache.oracle_calls(), 2);
    }

    #[tokio::test]
    async fn test_leading_no_data_window_keeps_later_columns() {
        // The first window has no data, so the series axis is unknown until
        // {b, c} answers. a's placeholder must pad out to that axis instead
        // of pinning the whole table at zero rows.
        let mut oracle = StubOracle::new();
        oracle.respond_no_data(&["a", "b"]);
        oracle.respond(&["b", "c"], &[40.0, 100.0]);
        oracle.respond(&["c"], &[50.0]);

        let mut cache = open(oracle);
        let series = reconstruct(&mut cache, &names(&["a", "b", "c"])).await.unwrap();

        assert_eq!(series.timestamps.len(), 2);
        assert_eq!(series.items, names(&["a", "b", "c"]));
        assert_eq!(series.column("a"), Some(&[0.0, 0.0][..]));
        // raw b = [20, 40], rescaled once by 40/100.
        assert_eq!(series.column("b"), Some(&[8.0, 16.0][..]));
        assert_eq!(series.column("c"), Some(&[25.0, 50.0][..]));
    }

    #[tokio::test]
    async fn test_zero_next_max_skips_rescale() {
        let mut oracle = StubOracle::new();
        oracle.respond(&["a", "b"], &[60.0, 0.0]);
        oracle.respond(&["b"], &[0.0]);

        let mut cache = open(oracle);
        let series = reconstruct(&mut cache, &names(&["a", "b"])).await.unwrap();

        // No division by zero; a's column passes through unscaled.
        assert_eq!(series.column("a"), Some(&[30.0, 60.0][..]));
    }
}
