/// Maximum number of items per filter batch.
///
/// An upper bound imposed by the oracle (it compares at most five terms in
/// one request), not a semantic constant of the algorithm.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// How many times a zero-valued item is re-queued by the filter before it
/// is classified as truly empty.
///
/// An item can read as zero only because it shared a batch with a
/// disproportionately large peer: the oracle normalizes the batch maximum
/// to 100 and rounds everything else, so a small-but-real signal can round
/// to 0. Re-batching the item with different peers usually reveals the
/// signal. Without a cap, an item that is always batched with a dominant
/// peer would circulate forever.
pub const DEFAULT_MAX_REQUEUE: usize = 3;

/// Absolute diff-to-pivot above which a bucket is recursively re-sorted.
///
/// Items whose diff against the pivot lands at the extremes (|diff| > 95)
/// tied or nearly tied with it at the oracle's normalization ceiling, so
/// their relative order is unresolved and worth more calls. Buckets closer
/// to the pivot are left in discovery order — a deliberate call-volume
/// trade-off, not a bug. Tunable via `SortOptions`.
pub const DEFAULT_REFINE_THRESHOLD: i32 = 95;

/// Save the cache snapshot after this many newly resolved keys.
///
/// A crash or interrupt loses at most this many external calls.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 25;
