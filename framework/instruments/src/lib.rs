mod aggregate;
mod check;
mod collector;
mod outcome;
pub mod report;

pub use aggregate::{aggregate, RunInfo};
pub use check::{evaluate_checks, Check, CheckResult};
pub use collector::MetricsCollector;
pub use outcome::RequestOutcome;
pub use report::{ReportConfig, ReportRenderer, Reporter};

/// One completed VU iteration: the request outcome and the checks that were evaluated
/// against it.
///
/// Records are append-only. Exactly one record exists per completed iteration; an iteration
/// interrupted by shutdown before its request completed produces no record.
#[derive(Debug, Clone)]
pub struct MetricRecord {
    /// Name of the scenario the iteration belonged to.
    pub scenario: String,
    pub outcome: RequestOutcome,
    /// Check results in the order the checks were configured.
    pub checks: Vec<CheckResult>,
}
