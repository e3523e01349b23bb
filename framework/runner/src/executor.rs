use std::fmt;
use std::time::Duration;

/// One leg of a ramping executor: ramp linearly to `target` VUs over `duration`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: u32,
}

impl Stage {
    pub fn new(duration: Duration, target: u32) -> Self {
        Self { duration, target }
    }
}

/// The policy governing how many VUs a scenario should have active over time.
///
/// The scheduler polls [Executor::target_at] on its reconciliation tick and adjusts the
/// live VU population to match. The policy itself holds no state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Executor {
    /// A fixed number of VUs for a fixed duration.
    ConstantVus { vus: u32, duration: Duration },
    /// Piecewise-linear ramping between stage targets, starting from `start_vus`.
    ///
    /// A zero-duration stage jumps straight to its target, which makes spikes and offset
    /// starting points expressible in the same shape.
    RampingVus { start_vus: u32, stages: Vec<Stage> },
}

impl Executor {
    /// Reject degenerate shapes before any scenario starts.
    ///
    /// Negative VU counts and durations are unrepresentable by construction; this guards
    /// the zero cases that would make a scenario a no-op.
    pub(crate) fn validate(&self, scenario: &str) -> anyhow::Result<()> {
        match self {
            Executor::ConstantVus { vus, duration } => {
                if *vus == 0 {
                    anyhow::bail!("Scenario [{scenario}]: constant-vus requires at least one VU");
                }
                if duration.is_zero() {
                    anyhow::bail!(
                        "Scenario [{scenario}]: constant-vus requires a non-zero duration"
                    );
                }
            }
            Executor::RampingVus { stages, .. } => {
                if stages.is_empty() {
                    anyhow::bail!("Scenario [{scenario}]: ramping-vus requires at least one stage");
                }
                if self.total_duration().is_zero() {
                    anyhow::bail!(
                        "Scenario [{scenario}]: ramping-vus requires a non-zero total duration"
                    );
                }
            }
        }
        Ok(())
    }

    pub fn total_duration(&self) -> Duration {
        match self {
            Executor::ConstantVus { duration, .. } => *duration,
            Executor::RampingVus { stages, .. } => stages.iter().map(|stage| stage.duration).sum(),
        }
    }

    /// The desired active VU count at `elapsed` since scenario start.
    ///
    /// Constant executors hold `vus` throughout `[0, duration)`. Ramping executors
    /// interpolate linearly within each stage from the previous breakpoint (initially
    /// `start_vus`), so the count at a stage boundary is exactly the prior stage's target.
    /// Zero once the executor's total duration has elapsed.
    pub fn target_at(&self, elapsed: Duration) -> u32 {
        match self {
            Executor::ConstantVus { vus, duration } => {
                if elapsed < *duration {
                    *vus
                } else {
                    0
                }
            }
            Executor::RampingVus { start_vus, stages } => {
                let mut offset = Duration::ZERO;
                let mut previous = *start_vus as f64;
                for stage in stages {
                    let end = offset + stage.duration;
                    if elapsed < end {
                        let t = (elapsed - offset).as_secs_f64() / stage.duration.as_secs_f64();
                        let interpolated = previous + (stage.target as f64 - previous) * t;
                        return interpolated.round() as u32;
                    }
                    previous = stage.target as f64;
                    offset = end;
                }
                0
            }
        }
    }
}

impl fmt::Display for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Executor::ConstantVus { vus, duration } => {
                write!(f, "constant-vus({vus}, {duration:?})")
            }
            Executor::RampingVus { start_vus, stages } => {
                let stages = stages
                    .iter()
                    .map(|stage| format!("{:?}:{}", stage.duration, stage.target))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "ramping-vus({start_vus}, [{stages}])")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn constant_holds_through_duration_and_drops_to_zero() {
        let executor = Executor::ConstantVus {
            vus: 5,
            duration: secs(10),
        };

        assert_eq!(5, executor.target_at(Duration::ZERO));
        assert_eq!(5, executor.target_at(secs(5)));
        assert_eq!(5, executor.target_at(secs(10) - Duration::from_millis(1)));
        assert_eq!(0, executor.target_at(secs(10)));
        assert_eq!(0, executor.target_at(secs(60)));
        assert_eq!(secs(10), executor.total_duration());
    }

    #[test]
    fn ramping_interpolates_linearly_within_a_stage() {
        let executor = Executor::RampingVus {
            start_vus: 1,
            stages: vec![Stage::new(secs(10), 11)],
        };

        assert_eq!(1, executor.target_at(Duration::ZERO));
        assert_eq!(6, executor.target_at(secs(5)));
        assert_eq!(11, executor.target_at(secs(10) - Duration::from_millis(1)));
        assert_eq!(0, executor.target_at(secs(10)));
    }

    #[test]
    fn ramping_is_continuous_at_stage_boundaries() {
        // The stress shape from the original scripts.
        let executor = Executor::RampingVus {
            start_vus: 1,
            stages: vec![
                Stage::new(secs(10), 10),
                Stage::new(secs(10), 20),
                Stage::new(secs(10), 5),
            ],
        };

        // At each boundary the count equals the prior stage's target exactly.
        assert_eq!(10, executor.target_at(secs(10)));
        assert_eq!(20, executor.target_at(secs(20)));
        assert_eq!(0, executor.target_at(secs(30)));
        assert_eq!(secs(30), executor.total_duration());
    }

    #[test]
    fn spike_rises_then_falls() {
        let executor = Executor::RampingVus {
            start_vus: 1,
            stages: vec![Stage::new(secs(5), 20), Stage::new(secs(10), 1)],
        };

        assert_eq!(1, executor.target_at(Duration::ZERO));
        let peak = executor.target_at(secs(5));
        assert_eq!(20, peak);
        assert!(executor.target_at(secs(3)) > executor.target_at(secs(1)));
        assert!(executor.target_at(secs(10)) < peak);
        assert_eq!(1, executor.target_at(secs(15) - Duration::from_millis(10)));
        assert_eq!(0, executor.target_at(secs(15)));
    }

    #[test]
    fn zero_duration_stage_jumps_to_its_target() {
        let executor = Executor::RampingVus {
            start_vus: 1,
            stages: vec![Stage::new(Duration::ZERO, 50), Stage::new(secs(10), 50)],
        };

        assert_eq!(50, executor.target_at(Duration::ZERO));
        assert_eq!(50, executor.target_at(secs(9)));
    }

    #[test]
    fn degenerate_shapes_are_rejected() {
        assert!(Executor::ConstantVus {
            vus: 0,
            duration: secs(10),
        }
        .validate("test")
        .is_err());

        assert!(Executor::ConstantVus {
            vus: 1,
            duration: Duration::ZERO,
        }
        .validate("test")
        .is_err());

        assert!(Executor::RampingVus {
            start_vus: 1,
            stages: vec![],
        }
        .validate("test")
        .is_err());

        assert!(Executor::RampingVus {
            start_vus: 1,
            stages: vec![Stage::new(Duration::ZERO, 10)],
        }
        .validate("test")
        .is_err());

        assert!(Executor::ConstantVus {
            vus: 5,
            duration: secs(10),
        }
        .validate("test")
        .is_ok());
    }

    #[test]
    fn display_matches_the_configuration_shape() {
        let constant = Executor::ConstantVus {
            vus: 5,
            duration: secs(15),
        };
        assert_eq!("constant-vus(5, 15s)", constant.to_string());

        let ramping = Executor::RampingVus {
            start_vus: 1,
            stages: vec![Stage::new(secs(5), 20), Stage::new(secs(10), 1)],
        };
        assert_eq!("ramping-vus(1, [5s:20, 10s:1])", ramping.to_string());
    }
}
