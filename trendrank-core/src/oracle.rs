/// The comparison oracle abstraction.
///
/// The external service only reports *relative* magnitude between the items
/// of one query, normalized so the query's maximum is pinned to 100. The
/// core never talks to a transport directly — implementations live with the
/// caller (HTTP client in the CLI, scripted stubs in tests) and are always
/// driven through [`crate::cache::ComparisonCache`].
use async_trait::async_trait;

use crate::types::{MagnitudeProfile, QueryKey};

/// Failures the oracle transport can surface.
///
/// "No data for this query" is not a failure — it comes back as `Ok(None)`
/// from [`Oracle::fetch`] and is consumed by the filter.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum OracleError {
    /// Network error, timeout, or intermittent throttling. The transport is
    /// expected to retry these itself with backoff; one that reaches the
    /// core means retries were not attempted for a reason.
    #[error("transient oracle failure: {0}")]
    Transient(String),

    /// Sustained throttling or a ban signal. Continuing to call the oracle
    /// makes the block worse, so this aborts the run. Already-cached
    /// results are not lost.
    #[error("oracle throttled: {0}")]
    Throttled(String),
}

/// A bounded-size relative-magnitude comparison service.
#[async_trait]
pub trait Oracle {
    /// Fetch the magnitude profile for one query key.
    ///
    /// `Ok(None)` means the oracle has no data for this set of items.
    /// Implementations must apply the run's fixed request configuration to
    /// every call; the core passes it through untouched.
    async fn fetch(&mut self, key: &QueryKey) -> Result<Option<MagnitudeProfile>, OracleError>;
}
