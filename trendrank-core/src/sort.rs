/// Bucket-partition partial sort over pairwise oracle comparisons.
///
/// Not a total order: the oracle's diffs need not be transitive, and only
/// buckets at the normalization extremes are refined recursively. What it
/// does guarantee is a reproducible, call-minimizing approximation —
/// deterministic pivot, exact-integer buckets, descending concatenation.
use std::collections::BTreeMap;

use futures::future::BoxFuture;
use tracing::debug;

use crate::cache::ComparisonCache;
use crate::constants::DEFAULT_REFINE_THRESHOLD;
use crate::oracle::{Oracle, OracleError};
use crate::store::CacheStore;
use crate::types::QueryKey;

#[derive(Debug, Clone)]
pub struct SortOptions {
    /// Buckets with |diff-to-pivot| above this are recursively re-sorted.
    /// Items there tied with the pivot at the oracle's ceiling, so their
    /// internal order is still unknown.
    pub refine_threshold: i32,
    /// Whether the 0-bucket (exact ties with the pivot) is also refined.
    /// Off by default: ties in the middle of the field rarely matter
    /// downstream and refining them costs a full recursion of calls.
    pub refine_zero_bucket: bool,
}

impl Default for SortOptions {
    fn default() -> Self {
        SortOptions {
            refine_threshold: DEFAULT_REFINE_THRESHOLD,
            refine_zero_bucket: false,
        }
    }
}

/// Order `items` by descending inferred magnitude.
///
/// Returns a permutation of the input. The pivot is the middle-index item;
/// every other item is bucketed by the exact integer difference of column
/// maxima in its pairwise profile against the pivot, in [-100, 100].
pub fn bucket_sort<'a, O, S>(
    cache: &'a mut ComparisonCache<O, S>,
    items: Vec<String>,
    options: &'a SortOptions,
) -> BoxFuture<'a, Result<Vec<String>, OracleError>>
where
    O: Oracle + Send,
    S: CacheStore + Send,
{
    Box::pin(async move {
        if items.len() < 2 {
            return Ok(items);
        }

        let pivot_idx = items.len() / 2;
        let pivot = items[pivot_idx].clone();
        debug!(pivot = %pivot, n = items.len(), "partitioning");

        let mut buckets: BTreeMap<i32, Vec<String>> = BTreeMap::new();

        for (i, item) in items.iter().enumerate() {
            if i == pivot_idx {
                continue;
            }

            let profile = cache.resolve(&QueryKey::pair(&pivot, item)).await?;
            let diff = match profile {
                Some(p) if !p.is_empty() => {
                    let d = p.column_max(item).round() as i32 - p.column_max(&pivot).round() as i32;
                    d.clamp(-100, 100)
                }
                // An item whose pair query lost its signal ties with the
                // pivot rather than vanishing from the output.
                _ => {
                    debug!(item = %item, "no pair data against pivot; binning at 0");
                    0
                }
            };

            buckets.entry(diff).or_default().push(item.clone());
        }

        for (&diff, bucket) in buckets.iter_mut() {
            let refine = diff.abs() > options.refine_threshold
                || (diff == 0 && options.refine_zero_bucket);
            if refine && bucket.len() > 1 {
                let members = std::mem::take(bucket);
                *bucket = bucket_sort(&mut *cache, members, options).await?;
            }
        }

        // The pivot ties with itself: appended to bucket 0 after any
        // refinement of that bucket's own members.
        buckets.entry(0).or_default().push(pivot);

        Ok(buckets
            .into_iter()
            .rev()
            .flat_map(|(_, bucket)| bucket)
            .collect())
    })
}
