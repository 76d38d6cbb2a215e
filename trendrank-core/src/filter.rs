/// Empty-set filter: batch items through the oracle and keep the ones with
/// signal.
///
/// Items are consumed FIFO in batches of at most `batch_size`. A batch the
/// oracle has no data for drops every member at once — the group-level
/// answer is trusted, no per-item re-test. An item that reads as zero
/// inside a batch with data is re-queued instead of dropped: the oracle
/// rounds against the batch maximum, so sharing a batch with a dominant
/// peer can round a real signal down to 0. Re-queueing is capped per item
/// so a perpetually dominated item terminates as truly empty.
use std::collections::VecDeque;

use tracing::debug;

use crate::cache::ComparisonCache;
use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_REQUEUE};
use crate::oracle::{Oracle, OracleError};
use crate::store::CacheStore;
use crate::types::QueryKey;

#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// Maximum items per oracle query. Bounded by the oracle, default 5.
    pub batch_size: usize,
    /// Re-queue cap per item before it is classified empty.
    pub max_requeue: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        FilterOptions {
            batch_size: DEFAULT_BATCH_SIZE,
            max_requeue: DEFAULT_MAX_REQUEUE,
        }
    }
}

/// Disjoint partition of the classified input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Items with signal, in first-acceptance order.
    pub signal: Vec<String>,
    /// Items dropped, in batch-drop order.
    pub empty: Vec<String>,
}

/// Classify `items` into signal-bearing and empty via batched oracle calls.
pub async fn eliminate_empty<O: Oracle, S: CacheStore>(
    cache: &mut ComparisonCache<O, S>,
    items: &[String],
    options: &FilterOptions,
) -> Result<FilterOutcome, OracleError> {
    let batch_size = options.batch_size.max(1);
    let mut queue: VecDeque<(String, usize)> =
        items.iter().map(|item| (item.clone(), 0)).collect();
    let mut outcome = FilterOutcome::default();

    while !queue.is_empty() {
        let take = batch_size.min(queue.len());
        let batch: Vec<(String, usize)> = queue.drain(..take).collect();
        let key = QueryKey::new(batch.iter().map(|(item, _)| item.clone()));

        let profile = cache.resolve(&key).await?;
        let profile = match profile {
            Some(p) if !p.is_empty() => p,
            // No data for the whole group: every member is dropped, no
            // individual re-test.
            _ => {
                debug!(%key, "no data for batch; dropping all members");
                outcome.empty.extend(batch.into_iter().map(|(item, _)| item));
                continue;
            }
        };

        for (item, attempts) in batch {
            if profile.column_max(&item) > 0.0 {
                outcome.signal.push(item);
            } else if attempts >= options.max_requeue {
                debug!(item = %item, attempts, "re-queue cap reached; classifying as empty");
                outcome.empty.push(item);
            } else {
                queue.push_back((item, attempts + 1));
            }
        }
    }

    Ok(outcome)
}
