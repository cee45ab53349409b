use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// What the orchestrator does when one worker's session fails.
///
/// - `Continue`: log the failure for that host and let every other session
///   run to completion (default behaviour).
/// - `FailFast`: on the first failure, request termination of every other
///   in-flight session through the cancellation controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    Continue,
    FailFast,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Continue
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "fail-fast" | "failfast" => Ok(FailurePolicy::FailFast),
            other => Err(format!(
                "invalid failure_policy: {other} (expected \"continue\" or \"fail-fast\")"
            )),
        }
    }
}

/// When a transfer directive runs relative to the main payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOrder {
    /// Before the payload is shipped and executed.
    Immediate,
    /// After the remote invocation returns, whatever its outcome.
    Deferred,
}

impl fmt::Display for ExecutionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionOrder::Immediate => f.write_str("immediate"),
            ExecutionOrder::Deferred => f.write_str("deferred"),
        }
    }
}
