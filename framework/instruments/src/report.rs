mod html_renderer;
mod table_renderer;

pub use html_renderer::HtmlRenderer;
pub use table_renderer::TableRenderer;

use crate::{aggregate, MetricRecord, MetricsCollector, RunInfo};
use gust_summary_model::{append_run_summary, RunSummary};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Consumes the final summary (and the raw record stream) and produces output somewhere.
///
/// The engine does not dictate the report's format, only that each configured renderer
/// receives the complete, final summary exactly once per run.
pub trait ReportRenderer {
    fn render(&self, summary: &RunSummary, records: &[MetricRecord]) -> anyhow::Result<()>;
}

/// Configuration for what reporting a run should produce.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    out_dir: PathBuf,
    summary_table: bool,
    html: bool,
    jsonl: bool,
}

impl ReportConfig {
    /// Start with everything disabled. Useful for tests, where no output is wanted.
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            out_dir,
            summary_table: false,
            html: false,
            jsonl: false,
        }
    }

    /// Print a table digest of the summary to stdout at the end of the run.
    pub fn enable_summary_table(mut self) -> Self {
        self.summary_table = true;
        self
    }

    /// Write a self-contained HTML report to `<out_dir>/<run_id>.html`.
    pub fn enable_html(mut self) -> Self {
        self.html = true;
        self
    }

    /// Append the machine-readable summary to `<out_dir>/runs.jsonl`.
    pub fn enable_jsonl(mut self) -> Self {
        self.jsonl = true;
        self
    }

    pub fn init(self) -> Reporter {
        Reporter {
            config: self,
            collector: MetricsCollector::new(),
            finalized: AtomicBool::new(false),
        }
    }
}

/// Owns the metrics collector for a run and renders the summary when the run completes.
#[derive(Debug)]
pub struct Reporter {
    config: ReportConfig,
    collector: MetricsCollector,
    finalized: AtomicBool,
}

impl Reporter {
    /// Append one record. Called concurrently from every VU loop.
    pub fn record(&self, record: MetricRecord) {
        self.collector.record(record);
    }

    pub fn record_count(&self) -> usize {
        self.collector.len()
    }

    /// Aggregate everything collected and run each configured renderer.
    ///
    /// Must be called exactly once, after all scenarios have stopped. Rendering is best
    /// effort: a broken renderer is logged and must not lose the run's summary.
    pub fn finalize(&self, info: &RunInfo) -> anyhow::Result<RunSummary> {
        if self.finalized.swap(true, Ordering::SeqCst) {
            anyhow::bail!("Reporter has already been finalized");
        }

        let records = self.collector.snapshot();
        let summary = aggregate(info, &records);

        if self.config.summary_table {
            if let Err(e) = TableRenderer.render(&summary, &records) {
                log::error!("Failed to render summary table: {e:?}");
            }
        }
        if self.config.html {
            let renderer = HtmlRenderer::new(self.config.out_dir.clone());
            if let Err(e) = renderer.render(&summary, &records) {
                log::error!("Failed to write HTML report: {e:?}");
            }
        }
        if self.config.jsonl {
            if let Err(e) = self.append_jsonl(&summary) {
                log::error!("Failed to append run summary: {e:?}");
            }
        }

        Ok(summary)
    }

    fn append_jsonl(&self, summary: &RunSummary) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.config.out_dir)?;
        append_run_summary(summary, self.config.out_dir.join("runs.jsonl"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CheckResult, RequestOutcome};
    use bytes::Bytes;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn sample_info() -> RunInfo {
        RunInfo {
            run_id: "run-report-test".to_string(),
            plan_name: "test".to_string(),
            started_at: 1_700_000_000,
            run_duration: 5,
            scenario_shapes: BTreeMap::new(),
            env: BTreeMap::new(),
            peak_cpu_pct: 0.0,
            engine_version: "0.1.0".to_string(),
        }
    }

    fn sample_record() -> MetricRecord {
        MetricRecord {
            scenario: "smokeTest".to_string(),
            outcome: RequestOutcome::new(
                200,
                Duration::from_millis(12),
                Bytes::from_static(b"ok"),
                chrono::Utc::now(),
            ),
            checks: vec![CheckResult {
                name: "status is 200".to_string(),
                passed: true,
            }],
        }
    }

    #[test]
    fn finalize_runs_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = ReportConfig::new(dir.path().to_path_buf()).init();
        reporter.record(sample_record());

        let summary = reporter.finalize(&sample_info()).unwrap();
        assert_eq!(1, summary.total_iterations);

        assert!(reporter.finalize(&sample_info()).is_err());
    }

    #[test]
    fn noop_configuration_writes_no_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = ReportConfig::new(dir.path().to_path_buf()).init();
        reporter.record(sample_record());
        reporter.finalize(&sample_info()).unwrap();

        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn jsonl_and_html_artifacts_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let reporter = ReportConfig::new(dir.path().to_path_buf())
            .enable_html()
            .enable_jsonl()
            .init();
        reporter.record(sample_record());
        let summary = reporter.finalize(&sample_info()).unwrap();

        let loaded =
            gust_summary_model::load_run_summaries(dir.path().join("runs.jsonl")).unwrap();
        assert_eq!(vec![summary], loaded);

        let html = std::fs::read_to_string(dir.path().join("run-report-test.html")).unwrap();
        assert!(html.contains("smokeTest"));
        assert!(html.contains("status is 200"));
    }
}
