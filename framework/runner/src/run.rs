use crate::cli::ReporterOpt;
use crate::context::RunnerContext;
use crate::monitor::ResourceMonitor;
use crate::progress::start_progress;
use crate::scenario::{TestPlan, TestPlanBuilder};
use crate::scheduler::run_scenarios;
use anyhow::Context as _;
use gust_client::Dispatcher;
use gust_core::prelude::{ShutdownHandle, SystemClock};
use gust_instruments::{ReportConfig, RunInfo};
use gust_summary_model::RunSummary;
use std::sync::Arc;

/// Run a test plan to completion and produce its summary.
///
/// Configuration errors surface here, before any scenario starts. Once scheduling has
/// begun, failures during the run are captured as data in the metric records: the summary
/// is still produced even when every request failed, and only the operator's abort signal
/// can end the run early.
pub fn run(builder: TestPlanBuilder) -> anyhow::Result<RunSummary> {
    let plan = builder.build()?;

    log::info!("Running test plan: {}", plan.name);

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = start_shutdown_listener(&runtime);

    let dispatcher = Dispatcher::new(&plan.config.base_url(), plan.config.request_timeout)?;
    let reporter = Arc::new(report_config(&plan).init());

    let runner = Arc::new(RunnerContext::new(
        runtime,
        shutdown_handle.clone(),
        dispatcher,
        reporter.clone(),
        Arc::new(SystemClock),
        plan.config.clone(),
    ));

    let planned = plan.planned_duration();
    if !plan.no_progress {
        start_progress(planned, reporter.clone(), shutdown_handle.new_listener());
    }
    let monitor = ResourceMonitor::start(shutdown_handle.new_listener());

    let run_id = plan.run_id.clone().unwrap_or_else(|| nanoid::nanoid!());
    let started_at = chrono::Utc::now().timestamp();

    let scheduling = run_scenarios(&runner, &plan);

    // Wake the progress bar and monitor threads so the process can exit promptly.
    shutdown_handle.shutdown();

    if let Err(e) = &scheduling {
        log::error!("Scheduling failed, reporting what was collected: {e:?}");
    }
    if monitor.saturated() {
        log::warn!(
            "Generator CPU peaked at {:.1}% during the run. Latency numbers may be affected",
            monitor.peak_cpu_pct()
        );
    }

    let info = RunInfo {
        run_id,
        plan_name: plan.name.clone(),
        started_at,
        run_duration: planned.as_secs(),
        scenario_shapes: plan.scenario_shapes(),
        env: plan.config.as_env(),
        peak_cpu_pct: monitor.peak_cpu_pct(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let summary = reporter.finalize(&info)?;

    scheduling?;

    Ok(summary)
}

fn report_config(plan: &TestPlan) -> ReportConfig {
    let config = ReportConfig::new(plan.config.out_dir.clone());
    match plan.reporter {
        ReporterOpt::Table => config.enable_summary_table().enable_jsonl(),
        ReporterOpt::Html => config.enable_summary_table().enable_html().enable_jsonl(),
        ReporterOpt::Noop => config,
    }
}

fn start_shutdown_listener(runtime: &tokio::runtime::Runtime) -> ShutdownHandle {
    let handle = ShutdownHandle::default();

    let listener_handle = handle.clone();
    runtime.spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Failed to listen for Ctrl-C: {e}");
            return;
        }
        println!("Received shutdown signal, shutting down...");
        listener_handle.shutdown();
    });

    handle
}
