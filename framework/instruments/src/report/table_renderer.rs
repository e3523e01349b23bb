use crate::report::ReportRenderer;
use crate::MetricRecord;
use gust_summary_model::RunSummary;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Prints a digest of the run to stdout: one table of latency statistics per scenario and
/// one table of check outcomes.
pub struct TableRenderer;

#[derive(Tabled)]
struct ScenarioRow {
    scenario: String,
    iterations: u64,
    #[tabled(display_with = "float2")]
    min_ms: f64,
    #[tabled(display_with = "float2")]
    median_ms: f64,
    #[tabled(display_with = "float2")]
    p90_ms: f64,
    #[tabled(display_with = "float2")]
    p95_ms: f64,
    #[tabled(display_with = "float2")]
    max_ms: f64,
    failed_dispatches: u64,
}

#[derive(Tabled)]
struct CheckRow {
    scenario: String,
    check: String,
    passes: u64,
    fails: u64,
    #[tabled(display_with = "percent")]
    pass_rate: f64,
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}

fn percent(n: &f64) -> String {
    format!("{:.1}%", n * 100.0)
}

impl ReportRenderer for TableRenderer {
    fn render(&self, summary: &RunSummary, _records: &[MetricRecord]) -> anyhow::Result<()> {
        println!(
            "\nRun {} ({}) finished: {} iterations over {}s",
            summary.run_id, summary.plan_name, summary.total_iterations, summary.run_duration
        );
        if summary.peak_cpu_pct > 0.0 {
            println!("Generator peak CPU: {:.1}%", summary.peak_cpu_pct);
        }

        println!("\nSummary of scenarios");
        let scenario_rows = summary
            .scenarios
            .iter()
            .map(|stats| ScenarioRow {
                scenario: stats.name.clone(),
                iterations: stats.iterations,
                min_ms: stats.latency.min_ms,
                median_ms: stats.latency.median_ms,
                p90_ms: stats.latency.p90_ms,
                p95_ms: stats.latency.p95_ms,
                max_ms: stats.latency.max_ms,
                failed_dispatches: stats.status_counts.get(&0).copied().unwrap_or(0),
            })
            .collect::<Vec<_>>();
        let mut table = Table::new(&scenario_rows);
        table.with(Style::modern());
        println!("{}", table);

        let check_rows = summary
            .scenarios
            .iter()
            .flat_map(|stats| {
                stats.checks.iter().map(|check| CheckRow {
                    scenario: stats.name.clone(),
                    check: check.name.clone(),
                    passes: check.passes,
                    fails: check.fails,
                    pass_rate: check.pass_rate(),
                })
            })
            .collect::<Vec<_>>();
        if !check_rows.is_empty() {
            println!("\nSummary of checks");
            let mut table = Table::new(&check_rows);
            table.with(Style::modern());
            println!("{}", table);
        }

        let statuses = summary
            .status_counts
            .iter()
            .map(|(status, count)| format!("{status}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        if !statuses.is_empty() {
            println!("\nStatus codes: {{ {} }}", statuses);
        }

        Ok(())
    }
}
