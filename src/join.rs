use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::error::{PipelineError, Result};

/// Keys that found no partner in a left join, grouped by join name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinReport {
    missing: BTreeMap<&'static str, Vec<u64>>,
}

impl JoinReport {
    pub fn record_missing(&mut self, join: &'static str, key: u64) {
        let keys = self.missing.entry(join).or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    pub fn missing(&self, join: &str) -> &[u64] {
        self.missing.get(join).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_clean(&self) -> bool {
        self.missing.values().all(Vec::is_empty)
    }

    pub fn issue_count(&self) -> usize {
        self.missing.values().map(Vec::len).sum()
    }

    pub fn merge(&mut self, other: JoinReport) {
        for (join, keys) in other.missing {
            for key in keys {
                self.record_missing(join, key);
            }
        }
    }

    /// Log every unmatched join. In strict mode the first one becomes an error.
    pub fn check(&self, strict: bool) -> Result<()> {
        for (join, keys) in &self.missing {
            if keys.is_empty() {
                continue;
            }
            warn!(join = *join, unmatched = keys.len(), sample = ?&keys[..keys.len().min(8)], "left join has unmatched keys");
            if strict {
                return Err(PipelineError::JoinInvariant {
                    join: *join,
                    missing: keys.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_and_fails_when_strict() {
        let mut report = JoinReport::default();
        report.record_missing("a -> b", 7);
        report.record_missing("a -> b", 7);
        report.record_missing("a -> b", 9);
        assert_eq!(report.missing("a -> b"), &[7, 9]);
        assert_eq!(report.issue_count(), 2);
        assert!(report.check(false).is_ok());
        assert!(matches!(
            report.check(true),
            Err(PipelineError::JoinInvariant { join: "a -> b", .. })
        ));
    }
}
