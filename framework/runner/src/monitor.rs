use gust_core::prelude::ShutdownListener;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use sysinfo::{Pid, ProcessRefreshKind, System};

/// Usage above this fraction of all cores means the generator itself may be skewing the
/// latency numbers.
const SATURATION_PCT: f64 = 10.0;

/// Watches the load generator's own CPU usage while scenarios run.
///
/// A saturated generator produces misleading latency numbers. The monitor never stops the
/// test for it; it warns while the run is in flight and keeps the peak usage so the runner
/// can fold it into the run summary.
///
/// Usage is sampled every [sysinfo::MINIMUM_CPU_UPDATE_INTERVAL] and normalised against the
/// number of cores.
pub(crate) struct ResourceMonitor {
    peak_centi_pct: Arc<AtomicU32>,
}

impl ResourceMonitor {
    pub(crate) fn start(mut shutdown_listener: ShutdownListener) -> Self {
        let peak_centi_pct = Arc::new(AtomicU32::new(0));

        let peak = peak_centi_pct.clone();
        std::thread::Builder::new()
            .name("monitor".to_string())
            .spawn(move || {
                let this_process_pid = Pid::from_u32(std::process::id());
                let mut sys = System::new();

                sys.refresh_cpu();
                let cpu_count = sys.cpus().len().max(1);

                while !shutdown_listener.should_shutdown() {
                    sys.refresh_process_specifics(
                        this_process_pid,
                        ProcessRefreshKind::new().with_cpu(),
                    );

                    let Some(process) = sys.process(this_process_pid) else {
                        break;
                    };

                    let usage = (process.cpu_usage() / cpu_count as f32) as f64;
                    record_peak(&peak, usage);
                    if usage > SATURATION_PCT {
                        log::warn!(
                            "The load generator is using {usage:.2}% of the CPU, with {cpu_count} available cores. Latency numbers may be affected"
                        );
                    }

                    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
                }
            })
            .expect("Failed to start monitor thread");

        Self { peak_centi_pct }
    }

    /// Highest process CPU usage observed so far, as a percentage of all cores.
    pub(crate) fn peak_cpu_pct(&self) -> f64 {
        self.peak_centi_pct.load(Ordering::Relaxed) as f64 / 100.0
    }

    pub(crate) fn saturated(&self) -> bool {
        self.peak_cpu_pct() > SATURATION_PCT
    }
}

fn record_peak(peak: &AtomicU32, usage_pct: f64) {
    peak.fetch_max((usage_pct * 100.0) as u32, Ordering::Relaxed);
}
