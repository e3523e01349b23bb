use crate::report::ReportRenderer;
use crate::MetricRecord;
use gust_summary_model::RunSummary;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Writes a self-contained HTML report to `<out_dir>/<run_id>.html`.
pub struct HtmlRenderer {
    out_dir: PathBuf,
}

impl HtmlRenderer {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl ReportRenderer for HtmlRenderer {
    fn render(&self, summary: &RunSummary, _records: &[MetricRecord]) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(format!("{}.html", summary.run_id));
        std::fs::write(&path, render_html(summary))?;
        log::info!("Wrote HTML report to {}", path.display());
        Ok(())
    }
}

fn render_html(summary: &RunSummary) -> String {
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Gust report: {plan}</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; margin: 2em; }}\n\
         table {{ border-collapse: collapse; margin-bottom: 2em; }}\n\
         th, td {{ border: 1px solid #ccc; padding: 0.4em 0.8em; text-align: right; }}\n\
         th {{ background: #f0f0f0; }}\n\
         td:first-child, th:first-child {{ text-align: left; }}\n\
         .fail {{ color: #b00; }}\n\
         </style>\n</head>\n<body>\n\
         <h1>{plan}</h1>\n\
         <p>Run <code>{run_id}</code>, started at {started_at} (unix), planned duration {duration}s, \
         engine version {version}.</p>\n\
         <p>Total iterations: <strong>{iterations}</strong>, \
         generator peak CPU {peak_cpu:.1}%</p>\n",
        plan = escape(&summary.plan_name),
        run_id = escape(&summary.run_id),
        started_at = summary.started_at,
        duration = summary.run_duration,
        version = escape(&summary.engine_version),
        iterations = summary.total_iterations,
        peak_cpu = summary.peak_cpu_pct,
    );

    html.push_str("<h2>Scenarios</h2>\n<table>\n<tr><th>Scenario</th><th>Executor</th><th>Iterations</th><th>Min (ms)</th><th>Median (ms)</th><th>p90 (ms)</th><th>p95 (ms)</th><th>Max (ms)</th></tr>\n");
    for stats in &summary.scenarios {
        let shape = summary
            .scenario_shapes
            .get(&stats.name)
            .map(String::as_str)
            .unwrap_or("-");
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
            escape(&stats.name),
            escape(shape),
            stats.iterations,
            stats.latency.min_ms,
            stats.latency.median_ms,
            stats.latency.p90_ms,
            stats.latency.p95_ms,
            stats.latency.max_ms,
        );
    }
    html.push_str("</table>\n");

    if !summary.checks.is_empty() {
        html.push_str(
            "<h2>Checks</h2>\n<table>\n<tr><th>Check</th><th>Passes</th><th>Fails</th><th>Pass rate</th></tr>\n",
        );
        for check in &summary.checks {
            let class = if check.fails > 0 { " class=\"fail\"" } else { "" };
            let _ = write!(
                html,
                "<tr{}><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
                class,
                escape(&check.name),
                check.passes,
                check.fails,
                check.pass_rate() * 100.0,
            );
        }
        html.push_str("</table>\n");
    }

    html.push_str("<h2>Status codes</h2>\n<table>\n<tr><th>Status</th><th>Count</th></tr>\n");
    for (status, count) in &summary.status_counts {
        let label = if *status == 0 {
            "dispatch failure".to_string()
        } else {
            status.to_string()
        };
        let _ = write!(html, "<tr><td>{}</td><td>{}</td></tr>\n", label, count);
    }
    html.push_str("</table>\n</body>\n</html>\n");

    html
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gust_summary_model::{CheckStats, LatencyStats, ScenarioStats};
    use std::collections::BTreeMap;

    #[test]
    fn renders_all_sections() {
        let summary = RunSummary {
            run_id: "run-1".to_string(),
            plan_name: "braille_detect_image".to_string(),
            started_at: 1_700_000_000,
            run_duration: 35,
            scenario_shapes: BTreeMap::from([(
                "spikeTest".to_string(),
                "ramping-vus(1, [5s:20, 10s:1])".to_string(),
            )]),
            env: BTreeMap::new(),
            scenarios: vec![ScenarioStats {
                name: "spikeTest".to_string(),
                iterations: 40,
                latency: LatencyStats {
                    count: 40,
                    min_ms: 10.0,
                    mean_ms: 20.0,
                    median_ms: 18.0,
                    p90_ms: 30.0,
                    p95_ms: 32.0,
                    max_ms: 50.0,
                },
                status_counts: BTreeMap::from([(200, 38), (0, 2)]),
                checks: vec![CheckStats {
                    name: "status is 200".to_string(),
                    passes: 38,
                    fails: 2,
                }],
            }],
            overall: LatencyStats::zero(),
            status_counts: BTreeMap::from([(200, 38), (0, 2)]),
            checks: vec![CheckStats {
                name: "status is 200".to_string(),
                passes: 38,
                fails: 2,
            }],
            total_iterations: 40,
            peak_cpu_pct: 3.5,
            engine_version: "0.1.0".to_string(),
        };

        let html = render_html(&summary);

        assert!(html.contains("spikeTest"));
        assert!(html.contains("ramping-vus(1, [5s:20, 10s:1])"));
        assert!(html.contains("status is 200"));
        assert!(html.contains("dispatch failure"));
    }

    #[test]
    fn escapes_markup_in_names() {
        assert_eq!("a &lt;b&gt; &amp; c", escape("a <b> & c"));
    }
}
