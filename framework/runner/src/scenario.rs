use crate::cli::{GustCli, ReporterOpt};
use crate::config::TargetConfig;
use crate::context::VuContext;
use crate::executor::Executor;
use gust_instruments::{Check, RequestOutcome};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// The iteration body of a scenario: issue a request through the context and hand back its
/// outcome. The VU loop evaluates the scenario's checks against the outcome and records it.
pub type VuBehaviour = fn(&mut VuContext) -> anyhow::Result<RequestOutcome>;

/// A named scenario: an executor shape bound to an iteration behaviour and its checks.
///
/// Immutable once the test starts.
#[derive(Debug)]
pub struct Scenario {
    pub(crate) name: String,
    pub(crate) executor: Executor,
    pub(crate) behaviour: VuBehaviour,
    pub(crate) checks: Vec<Check>,
    pub(crate) pace: Duration,
}

impl Scenario {
    /// Create a scenario with the default one second inter-iteration pause.
    pub fn new(name: &str, executor: Executor, behaviour: VuBehaviour) -> Self {
        Self {
            name: name.to_string(),
            executor,
            behaviour,
            checks: Vec::new(),
            pace: Duration::from_secs(1),
        }
    }

    /// Add a named check that is evaluated against every iteration's outcome.
    ///
    /// Checks run in the order they were added.
    pub fn with_check(mut self, name: &str, predicate: fn(&RequestOutcome) -> bool) -> Self {
        self.checks.push(Check::new(name, predicate));
        self
    }

    /// Override the pause between iterations.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }
}

/// The builder for a test plan.
///
/// This must be used at the start of a test binary to declare the scenarios to run.
pub struct TestPlanBuilder {
    /// The name of the plan, which should be unique within the test suite.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    cli: GustCli,
    scenarios: Vec<Scenario>,
}

impl TestPlanBuilder {
    pub fn new(name: &str, cli: GustCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            scenarios: Vec::new(),
        }
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Validate the whole configuration.
    ///
    /// Any error here is a configuration error: it is fatal and is raised before any
    /// scenario starts, so there is never a partially started run.
    pub(crate) fn build(self) -> anyhow::Result<TestPlan> {
        if self.scenarios.is_empty() {
            anyhow::bail!("Test plan [{}] declares no scenarios", self.name);
        }

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if !seen.insert(scenario.name.clone()) {
                anyhow::bail!("Scenario [{}] is declared more than once", scenario.name);
            }
            scenario.executor.validate(&scenario.name)?;
        }

        let config = TargetConfig::resolve(&self.cli)?;

        Ok(TestPlan {
            name: self.name,
            config,
            reporter: self.cli.reporter,
            no_progress: self.cli.no_progress,
            run_id: self.cli.run_id,
            duration_cap: self.cli.duration.map(Duration::from_secs),
            scenarios: self.scenarios.into_iter().map(Arc::new).collect(),
        })
    }
}

#[derive(Debug)]
pub(crate) struct TestPlan {
    pub(crate) name: String,
    pub(crate) config: TargetConfig,
    pub(crate) reporter: ReporterOpt,
    pub(crate) no_progress: bool,
    pub(crate) run_id: Option<String>,
    pub(crate) duration_cap: Option<Duration>,
    pub(crate) scenarios: Vec<Arc<Scenario>>,
}

impl TestPlan {
    /// Effective total duration of one scenario, after the CLI duration cap.
    pub(crate) fn scenario_duration(&self, scenario: &Scenario) -> Duration {
        let total = scenario.executor.total_duration();
        match self.duration_cap {
            Some(cap) => total.min(cap),
            None => total,
        }
    }

    /// Planned wall-clock duration of the whole run: scenarios run concurrently, so this is
    /// the longest of them.
    pub(crate) fn planned_duration(&self) -> Duration {
        self.scenarios
            .iter()
            .map(|scenario| self.scenario_duration(scenario))
            .max()
            .unwrap_or_default()
    }

    pub(crate) fn scenario_shapes(&self) -> BTreeMap<String, String> {
        self.scenarios
            .iter()
            .map(|scenario| (scenario.name.clone(), scenario.executor.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_cli() -> GustCli {
        GustCli {
            host: Some("localhost".to_string()),
            port: Some(8080),
            out_dir: None,
            request_timeout: 30,
            duration: None,
            no_progress: true,
            reporter: ReporterOpt::Noop,
            run_id: None,
        }
    }

    fn noop_behaviour(_ctx: &mut VuContext) -> anyhow::Result<RequestOutcome> {
        unreachable!("behaviour is never run in these tests")
    }

    fn constant(name: &str, vus: u32, secs: u64) -> Scenario {
        Scenario::new(
            name,
            Executor::ConstantVus {
                vus,
                duration: Duration::from_secs(secs),
            },
            noop_behaviour,
        )
    }

    #[test]
    fn empty_plan_is_a_configuration_error() {
        let result = TestPlanBuilder::new("empty", sample_cli()).build();
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_scenario_names_are_a_configuration_error() {
        let result = TestPlanBuilder::new("dup", sample_cli())
            .with_scenario(constant("loadTest", 5, 10))
            .with_scenario(constant("loadTest", 1, 5))
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("declared more than once"));
    }

    #[test]
    fn invalid_executor_is_rejected_before_the_run() {
        let result = TestPlanBuilder::new("invalid", sample_cli())
            .with_scenario(constant("loadTest", 0, 10))
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn planned_duration_is_the_longest_scenario() {
        let plan = TestPlanBuilder::new("multi", sample_cli())
            .with_scenario(constant("smokeTest", 1, 5))
            .with_scenario(constant("loadTest", 5, 15))
            .build()
            .unwrap();

        assert_eq!(Duration::from_secs(15), plan.planned_duration());
    }

    #[test]
    fn cli_duration_caps_every_scenario() {
        let mut cli = sample_cli();
        cli.duration = Some(3);
        let plan = TestPlanBuilder::new("capped", cli)
            .with_scenario(constant("smokeTest", 1, 5))
            .with_scenario(constant("loadTest", 5, 15))
            .build()
            .unwrap();

        assert_eq!(Duration::from_secs(3), plan.planned_duration());
        assert_eq!(
            Duration::from_secs(3),
            plan.scenario_duration(&plan.scenarios[0])
        );
    }

    #[test]
    fn shapes_are_recorded_per_scenario() {
        let plan = TestPlanBuilder::new("shapes", sample_cli())
            .with_scenario(constant("loadTest", 5, 15))
            .build()
            .unwrap();

        assert_eq!(
            Some(&"constant-vus(5, 15s)".to_string()),
            plan.scenario_shapes().get("loadTest")
        );
    }
}
