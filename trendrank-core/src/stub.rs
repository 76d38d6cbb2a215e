/// Scripted oracle for tests.
///
/// Responds from a fixed table of profiles; call volume is asserted via the
/// cache's own counter. Unscripted keys come back as NoData unless a
/// blanket failure is armed.
use std::collections::HashMap;

use async_trait::async_trait;

use crate::oracle::{Oracle, OracleError};
use crate::types::{MagnitudeProfile, QueryKey};

#[derive(Debug, Default)]
pub(crate) struct StubOracle {
    responses: HashMap<QueryKey, Option<MagnitudeProfile>>,
    /// When set, every fetch fails with this error instead of answering.
    fail_with: Option<OracleError>,
}

impl StubOracle {
    pub(crate) fn new() -> Self {
        StubOracle::default()
    }

    pub(crate) fn always_failing(err: OracleError) -> Self {
        StubOracle { fail_with: Some(err), ..StubOracle::default() }
    }

    /// Script a profile for a key: each (item, max) pair becomes a two-row
    /// column `[max/2, max]` so column maxima are exactly the given values.
    pub(crate) fn respond(&mut self, items: &[&str], maxima: &[f64]) {
        assert_eq!(items.len(), maxima.len());
        let mut profile = MagnitudeProfile {
            timestamps: vec!["2020-01".to_string(), "2020-02".to_string()],
            columns: Default::default(),
        };
        for (item, &max) in items.iter().zip(maxima) {
            profile.columns.insert(item.to_string(), vec![max / 2.0, max]);
        }
        self.responses.insert(QueryKey::new(items.iter().copied()), Some(profile));
    }

    /// Script an explicit NoData answer for a key.
    pub(crate) fn respond_no_data(&mut self, items: &[&str]) {
        self.responses.insert(QueryKey::new(items.iter().copied()), None);
    }

    /// Script every pairwise and single-item key consistent with fixed
    /// per-item "true" magnitudes: within each pair the larger item is
    /// normalized to 100 and the smaller scaled proportionally, which is
    /// exactly the oracle's normalization rule.
    pub(crate) fn respond_from_truth(&mut self, truth: &[(&str, f64)]) {
        for (item, max) in truth {
            self.respond(&[item], &[max.min(100.0)]);
        }
        for (i, &(a, ta)) in truth.iter().enumerate() {
            for &(b, tb) in &truth[i + 1..] {
                let ceil = ta.max(tb);
                if ceil <= 0.0 {
                    self.respond(&[a, b], &[0.0, 0.0]);
                } else {
                    self.respond(
                        &[a, b],
                        &[(ta / ceil * 100.0).round(), (tb / ceil * 100.0).round()],
                    );
                }
            }
        }
    }
}

#[async_trait]
impl Oracle for StubOracle {
    async fn fetch(&mut self, key: &QueryKey) -> Result<Option<MagnitudeProfile>, OracleError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(self.responses.get(key).cloned().flatten())
    }
}
