// src/engine/summary.rs

use crate::engine::RunResult;

/// Aggregate counts over one orchestrator invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    /// Failures that were not caused by cancellation.
    pub failed: usize,
    pub interrupted: usize,
}

impl RunSummary {
    pub fn from_results(results: &[RunResult]) -> Self {
        let mut summary = RunSummary {
            total: results.len(),
            ..Default::default()
        };
        for r in results {
            match (r.succeeded, r.interrupted) {
                (true, _) => summary.succeeded += 1,
                (false, true) => summary.interrupted += 1,
                (false, false) => summary.failed += 1,
            }
        }
        summary
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }

    /// Hosts counted in `failed`, in result order.
    pub fn failed_hosts<'r>(&self, results: &'r [RunResult]) -> Vec<&'r str> {
        results
            .iter()
            .filter(|r| !r.succeeded && !r.interrupted)
            .map(|r| r.host.as_str())
            .collect()
    }
}
