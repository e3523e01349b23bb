use crate::context::RunnerContext;
use crate::scenario::{Scenario, TestPlan};
use crate::vu::{spawn_vu, VuHandle};
use std::sync::Arc;
use std::time::{Duration, Instant};

const RECONCILE_TICK: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScenarioState {
    Pending,
    Running,
    Draining,
    Completed,
}

/// Bookkeeping for one scenario while the run is in flight.
///
/// Owned exclusively by the scheduler's coordinating thread. VU threads never touch it, so
/// spawn/retire decisions cannot race.
struct ScenarioRun {
    scenario: Arc<Scenario>,
    state: ScenarioState,
    started: Instant,
    deadline: Instant,
    /// VUs that are running and have not been asked to stop.
    active: Vec<VuHandle>,
    /// VUs asked to stop that may still be finishing their current iteration.
    retiring: Vec<VuHandle>,
    spawned_total: u64,
}

/// Drive every scenario from `Pending` through `Running` and `Draining` to `Completed`.
///
/// A single coordinating thread (the caller's) polls each scenario's executor on a fixed
/// tick and reconciles the live VU population against the returned target. Scenarios run
/// concurrently and independently: one scenario failing every request never halts another.
/// The run is over when every scenario has completed; a global shutdown drains everything
/// early.
pub(crate) fn run_scenarios(runner: &Arc<RunnerContext>, plan: &TestPlan) -> anyhow::Result<()> {
    let clock = runner.clock().clone();
    let mut shutdown = runner.shutdown_handle().new_listener();

    let now = clock.now();
    let mut runs = plan
        .scenarios
        .iter()
        .map(|scenario| ScenarioRun {
            scenario: scenario.clone(),
            state: ScenarioState::Pending,
            started: now,
            deadline: now + plan.scenario_duration(scenario),
            active: Vec::new(),
            retiring: Vec::new(),
            spawned_total: 0,
        })
        .collect::<Vec<_>>();

    loop {
        let aborting = shutdown.should_shutdown();
        let now = clock.now();

        let mut all_completed = true;
        for run in &mut runs {
            step_scenario(run, runner, now, aborting)?;
            if run.state != ScenarioState::Completed {
                all_completed = false;
            }
        }
        if all_completed {
            break;
        }

        clock.sleep(RECONCILE_TICK);
    }

    Ok(())
}

fn step_scenario(
    run: &mut ScenarioRun,
    runner: &Arc<RunnerContext>,
    now: Instant,
    aborting: bool,
) -> anyhow::Result<()> {
    reap_finished(&mut run.active);
    reap_finished(&mut run.retiring);

    match run.state {
        ScenarioState::Pending => {
            if aborting {
                run.state = ScenarioState::Completed;
                return Ok(());
            }
            log::info!(
                "Scenario [{}] starting: {}",
                run.scenario.name,
                run.scenario.executor
            );
            run.state = ScenarioState::Running;
            reconcile(run, runner, now)?;
        }
        ScenarioState::Running => {
            if aborting || now >= run.deadline {
                log::info!("Scenario [{}] draining", run.scenario.name);
                retire_all(run);
                run.state = ScenarioState::Draining;
            } else {
                reconcile(run, runner, now)?;
            }
        }
        ScenarioState::Draining => {
            if run.active.is_empty() && run.retiring.is_empty() {
                log::info!(
                    "Scenario [{}] completed after {} VUs",
                    run.scenario.name,
                    run.spawned_total
                );
                run.state = ScenarioState::Completed;
            }
        }
        ScenarioState::Completed => {}
    }

    Ok(())
}

/// Reconcile the live VU population against the executor's current target.
///
/// Spawns never exceed the target. Surplus VUs are retired gracefully and keep running
/// until their current iteration finishes, at which point the reap on the next tick
/// collects them.
fn reconcile(run: &mut ScenarioRun, runner: &Arc<RunnerContext>, now: Instant) -> anyhow::Result<()> {
    let elapsed = now.duration_since(run.started);
    let target = run.scenario.executor.target_at(elapsed) as usize;

    let active = run.active.len();
    if active < target {
        for _ in active..target {
            run.spawned_total += 1;
            let handle = spawn_vu(
                run.scenario.clone(),
                run.spawned_total,
                runner.clone(),
                run.deadline,
            )?;
            run.active.push(handle);
        }
        log::debug!("Scenario [{}] scaled up to {} VUs", run.scenario.name, target);
    } else if active > target {
        for vu in run.active.drain(target..) {
            vu.retire();
            run.retiring.push(vu);
        }
        log::debug!(
            "Scenario [{}] scaling down to {} VUs",
            run.scenario.name,
            target
        );
    }

    Ok(())
}

fn retire_all(run: &mut ScenarioRun) {
    for vu in run.active.drain(..) {
        vu.retire();
        run.retiring.push(vu);
    }
}

fn reap_finished(handles: &mut Vec<VuHandle>) {
    let mut index = 0;
    while index < handles.len() {
        if handles[index].is_finished() {
            handles.swap_remove(index).join();
        } else {
            index += 1;
        }
    }
}
