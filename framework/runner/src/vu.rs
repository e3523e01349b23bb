use crate::context::{RunnerContext, VuContext};
use crate::scenario::Scenario;
use anyhow::Context as _;
use gust_core::prelude::{ShutdownSignalError, VuBailError};
use gust_instruments::{evaluate_checks, MetricRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Handle the scheduler keeps for one live VU.
pub(crate) struct VuHandle {
    retire: Arc<AtomicBool>,
    thread: std::thread::JoinHandle<()>,
}

impl VuHandle {
    /// Ask the VU to stop at its next iteration boundary. Graceful: an in-flight iteration
    /// finishes first.
    pub(crate) fn retire(&self) {
        self.retire.store(true, Ordering::Release);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub(crate) fn join(self) {
        if self.thread.join().is_err() {
            log::error!("VU thread panicked");
        }
    }
}

/// Spawn one VU loop on its own named thread.
///
/// Each iteration runs the scenario behaviour, evaluates the scenario's checks against the
/// outcome and records exactly one metric record, then pauses for the scenario's pace.
/// Stop conditions (retirement, the scenario deadline, global shutdown) are checked only at
/// iteration boundaries, so an in-flight request is never interrupted and worst-case
/// shutdown latency is bounded by one request timeout.
pub(crate) fn spawn_vu(
    scenario: Arc<Scenario>,
    vu_seq: u64,
    runner: Arc<RunnerContext>,
    deadline: Instant,
) -> anyhow::Result<VuHandle> {
    let retire = Arc::new(AtomicBool::new(false));
    let retire_flag = retire.clone();
    let vu_id = format!("{}-vu-{}", scenario.name, vu_seq);

    let thread = std::thread::Builder::new()
        .name(vu_id.clone())
        .spawn(move || {
            let mut loop_shutdown = runner.shutdown_handle().new_listener();
            let behaviour_shutdown = runner.shutdown_handle().new_listener();
            let clock = runner.clock().clone();
            let mut ctx = VuContext::new(
                vu_id.clone(),
                scenario.name.clone(),
                runner.clone(),
                behaviour_shutdown,
            );

            log::debug!("Starting VU [{vu_id}]");
            loop {
                if retire_flag.load(Ordering::Acquire)
                    || loop_shutdown.should_shutdown()
                    || clock.now() >= deadline
                {
                    break;
                }

                match (scenario.behaviour)(&mut ctx) {
                    Ok(outcome) => {
                        let checks = evaluate_checks(&outcome, &scenario.checks);
                        runner.reporter().record(MetricRecord {
                            scenario: scenario.name.clone(),
                            outcome,
                            checks,
                        });
                    }
                    Err(e) if e.is::<ShutdownSignalError>() => {
                        // Expected when the run is aborted mid-request. The interrupted
                        // iteration produces no record; the check at the top of the loop
                        // will break.
                    }
                    Err(e) if e.is::<VuBailError>() => {
                        log::debug!("VU [{vu_id}] is bailing");
                        break;
                    }
                    Err(e) => {
                        log::error!("VU [{vu_id}] iteration failed: {e:?}");
                    }
                }

                // Pace the next iteration, without sleeping past the scenario deadline.
                if retire_flag.load(Ordering::Acquire) || loop_shutdown.should_shutdown() {
                    break;
                }
                let now = clock.now();
                if now >= deadline {
                    break;
                }
                let wake = (now + scenario.pace).min(deadline);
                clock.sleep(wake - now);
            }
            log::debug!("VU [{vu_id}] stopped");
        })
        .context("Failed to spawn VU thread")?;

    Ok(VuHandle { retire, thread })
}
