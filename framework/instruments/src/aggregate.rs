use crate::MetricRecord;
use gust_summary_model::{CheckStats, LatencyStats, RunSummary, ScenarioStats};
use std::collections::BTreeMap;

/// Identity and configuration of a run, fixed before scheduling begins.
///
/// The aggregator combines this with the collected records to produce the final summary.
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub run_id: String,
    pub plan_name: String,
    /// Unix timestamp in seconds.
    pub started_at: i64,
    /// Planned run duration in seconds.
    pub run_duration: u64,
    pub scenario_shapes: BTreeMap<String, String>,
    pub env: BTreeMap<String, String>,
    /// Peak CPU usage of the generator process, as a percentage of all cores.
    pub peak_cpu_pct: f64,
    pub engine_version: String,
}

/// Reduce the collected records into the final run summary.
///
/// This is a pure function of the record set and is invariant under permutation of the
/// input: records are grouped and counted, and percentiles are taken from the sorted
/// latency sequence using the nearest-rank method. An empty record set produces a summary
/// full of zeros rather than an error.
pub fn aggregate(info: &RunInfo, records: &[MetricRecord]) -> RunSummary {
    let mut by_scenario: BTreeMap<&str, Vec<&MetricRecord>> = BTreeMap::new();
    for record in records {
        by_scenario
            .entry(record.scenario.as_str())
            .or_default()
            .push(record);
    }
    // Scenarios that never completed an iteration still appear in the summary.
    for name in info.scenario_shapes.keys() {
        by_scenario.entry(name.as_str()).or_default();
    }

    let scenarios = by_scenario
        .iter()
        .map(|(name, records)| ScenarioStats {
            name: name.to_string(),
            iterations: records.len() as u64,
            latency: latency_stats(records.iter().copied()),
            status_counts: status_counts(records.iter().copied()),
            checks: check_stats(records.iter().copied()),
        })
        .collect();

    RunSummary {
        run_id: info.run_id.clone(),
        plan_name: info.plan_name.clone(),
        started_at: info.started_at,
        run_duration: info.run_duration,
        scenario_shapes: info.scenario_shapes.clone(),
        env: info.env.clone(),
        scenarios,
        overall: latency_stats(records.iter()),
        status_counts: status_counts(records.iter()),
        checks: check_stats(records.iter()),
        total_iterations: records.len() as u64,
        peak_cpu_pct: info.peak_cpu_pct,
        engine_version: info.engine_version.clone(),
    }
}

fn latency_stats<'a>(records: impl Iterator<Item = &'a MetricRecord>) -> LatencyStats {
    let mut latencies_ms = records
        .map(|record| record.outcome.latency.as_secs_f64() * 1000.0)
        .collect::<Vec<_>>();
    if latencies_ms.is_empty() {
        return LatencyStats::zero();
    }
    latencies_ms.sort_by(f64::total_cmp);

    let count = latencies_ms.len();
    LatencyStats {
        count: count as u64,
        min_ms: latencies_ms[0],
        mean_ms: latencies_ms.iter().sum::<f64>() / count as f64,
        median_ms: nearest_rank(&latencies_ms, 50.0),
        p90_ms: nearest_rank(&latencies_ms, 90.0),
        p95_ms: nearest_rank(&latencies_ms, 95.0),
        max_ms: latencies_ms[count - 1],
    }
}

/// Nearest-rank percentile: the value at rank `ceil(p/100 * n)` of the sorted sequence.
///
/// `sorted` must be non-empty and sorted ascending.
fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    let rank = ((percentile / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.max(1) - 1]
}

fn status_counts<'a>(records: impl Iterator<Item = &'a MetricRecord>) -> BTreeMap<u16, u64> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.outcome.status).or_insert(0) += 1;
    }
    counts
}

fn check_stats<'a>(records: impl Iterator<Item = &'a MetricRecord>) -> Vec<CheckStats> {
    let mut by_name: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for record in records {
        for check in &record.checks {
            let entry = by_name.entry(check.name.as_str()).or_default();
            if check.passed {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
    }
    by_name
        .into_iter()
        .map(|(name, (passes, fails))| CheckStats {
            name: name.to_string(),
            passes,
            fails,
        })
        .collect()
}
