use crate::RequestOutcome;
use std::panic::AssertUnwindSafe;

/// A named boolean assertion evaluated against a request outcome.
///
/// Predicates only read the outcome. A predicate that panics counts as a failed evaluation
/// and is logged; it never aborts the VU loop or the run.
#[derive(Debug, Clone)]
pub struct Check {
    pub name: String,
    pub predicate: fn(&RequestOutcome) -> bool,
}

impl Check {
    pub fn new(name: &str, predicate: fn(&RequestOutcome) -> bool) -> Self {
        Self {
            name: name.to_string(),
            predicate,
        }
    }
}

/// The result of evaluating one check against one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
}

/// Evaluate the configured checks against one outcome, in order.
pub fn evaluate_checks(outcome: &RequestOutcome, checks: &[Check]) -> Vec<CheckResult> {
    checks
        .iter()
        .map(|check| {
            let passed = std::panic::catch_unwind(AssertUnwindSafe(|| (check.predicate)(outcome)))
                .unwrap_or_else(|_| {
                    log::warn!(
                        "Check [{}] panicked while evaluating, counting it as failed",
                        check.name
                    );
                    false
                });
            CheckResult {
                name: check.name.clone(),
                passed,
            }
        })
        .collect()
}
