use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::collections::BTreeMap;
use std::io::{BufRead, Read, Write};
use std::path::PathBuf;

/// Latency distribution over one set of requests, in milliseconds.
///
/// Percentiles are computed by the aggregator using the nearest-rank method on the sorted
/// latency sequence, so identical record sets always produce identical stats regardless of
/// the order the records arrived in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatencyStats {
    pub count: u64,
    pub min_ms: f64,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p90_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
}

impl LatencyStats {
    /// Stats for an empty record set. An empty run reports zeros rather than failing.
    pub fn zero() -> Self {
        Self {
            count: 0,
            min_ms: 0.0,
            mean_ms: 0.0,
            median_ms: 0.0,
            p90_ms: 0.0,
            p95_ms: 0.0,
            max_ms: 0.0,
        }
    }
}

/// Pass/fail counts for one named check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckStats {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

impl CheckStats {
    /// Fraction of evaluations that passed, or 0 when the check was never evaluated.
    pub fn pass_rate(&self) -> f64 {
        let total = self.passes + self.fails;
        if total == 0 {
            return 0.0;
        }
        self.passes as f64 / total as f64
    }
}

/// Aggregate statistics for one scenario within a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioStats {
    pub name: String,
    /// Completed VU iterations, which is also the number of metric records for the scenario.
    pub iterations: u64,
    pub latency: LatencyStats,
    /// Response counts keyed by status code. Dispatch failures (timeout, connection error)
    /// are counted under the sentinel status `0`.
    pub status_counts: BTreeMap<u16, u64>,
    pub checks: Vec<CheckStats>,
}

/// Summary of a run
///
/// Computed exactly once, after every scenario has completed, and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// The unique run id
    ///
    /// Chosen by the runner. Unique for each run.
    pub run_id: String,
    /// The name of the test plan that was run
    pub plan_name: String,
    /// The time the run started
    ///
    /// This is a Unix timestamp in seconds.
    pub started_at: i64,
    /// The planned duration of the run, in seconds
    ///
    /// The run may have finished sooner if it was aborted by the operator.
    pub run_duration: u64,
    /// The executor shape of each scenario, keyed by scenario name
    ///
    /// For example `constant-vus(5, 15s)` or `ramping-vus(1, [10s:10, 10s:20, 10s:5])`.
    pub scenario_shapes: BTreeMap<String, String>,
    /// Environment configuration the run resolved before scheduling began
    ///
    /// This won't capture all environment variables. Just the ones that the runner resolved,
    /// such as the target host and port.
    pub env: BTreeMap<String, String>,
    /// Per-scenario statistics, sorted by scenario name
    pub scenarios: Vec<ScenarioStats>,
    /// Latency distribution across every scenario
    pub overall: LatencyStats,
    /// Status-code histogram across every scenario
    pub status_counts: BTreeMap<u16, u64>,
    /// Check outcomes across every scenario, sorted by check name
    pub checks: Vec<CheckStats>,
    /// Total completed VU iterations across every scenario
    pub total_iterations: u64,
    /// Peak CPU usage of the load generator process during the run, as a percentage of all
    /// cores
    ///
    /// When this is high the generator itself was saturated and the latency numbers should
    /// be treated with suspicion.
    pub peak_cpu_pct: f64,
    /// The version of Gust that produced this summary
    pub engine_version: String,
}

impl RunSummary {
    /// Compute a fingerprint for this run summary
    ///
    /// The fingerprint is intended to uniquely identify the configuration used for the run,
    /// so that summaries from repeated runs of the same plan can be grouped. It uses the
    ///     - Plan name
    ///     - Planned duration
    ///     - Scenario shapes
    ///     - Resolved environment configuration
    ///     - Engine version
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.plan_name.as_bytes());
        Digest::update(&mut hasher, self.run_duration.to_le_bytes());
        self.scenario_shapes
            .iter()
            .sorted_by_key(|(k, _)| k.to_owned())
            .for_each(|(k, v)| {
                Digest::update(&mut hasher, k.as_bytes());
                Digest::update(&mut hasher, v.as_bytes());
            });
        self.env
            .iter()
            .sorted_by_key(|(k, _)| k.to_owned())
            .for_each(|(k, v)| {
                Digest::update(&mut hasher, k.as_bytes());
                Digest::update(&mut hasher, v.as_bytes());
            });
        Digest::update(&mut hasher, self.engine_version.as_bytes());

        format!("{:x}", hasher.finalize())
    }
}

/// Append the run summary to a file
///
/// The summary will be serialized to JSON and output as a single line followed by a newline.
/// The recommended file extension is `.jsonl`.
pub fn append_run_summary(run_summary: &RunSummary, path: PathBuf) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_summary(run_summary, &mut file)?;
    let _ = file.write("\n".as_bytes())?;
    Ok(())
}

/// Serialize the run summary to a writer
pub fn store_run_summary<W: Write>(run_summary: &RunSummary, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, run_summary)?;
    Ok(())
}

/// Load a run summary from a reader
pub fn load_run_summary<R: Read>(reader: R) -> anyhow::Result<RunSummary> {
    let reader = std::io::BufReader::new(reader);
    let run_summary: RunSummary = serde_json::from_reader(reader)?;
    Ok(run_summary)
}

/// Load run summaries from a file
///
/// The file should contain one JSON object per line. This is the format produced by
/// [append_run_summary].
pub fn load_run_summaries(path: PathBuf) -> anyhow::Result<Vec<RunSummary>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let run: RunSummary = serde_json::from_str(&line)?;
        runs.push(run);
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_summary() -> RunSummary {
        RunSummary {
            run_id: "run-1".to_string(),
            plan_name: "api_smoke".to_string(),
            started_at: 1_700_000_000,
            run_duration: 5,
            scenario_shapes: BTreeMap::from([(
                "smokeTest".to_string(),
                "constant-vus(1, 5s)".to_string(),
            )]),
            env: BTreeMap::from([
                ("HOST".to_string(), "localhost".to_string()),
                ("PORT".to_string(), "8080".to_string()),
            ]),
            scenarios: vec![ScenarioStats {
                name: "smokeTest".to_string(),
                iterations: 5,
                latency: LatencyStats {
                    count: 5,
                    min_ms: 10.0,
                    mean_ms: 12.0,
                    median_ms: 11.0,
                    p90_ms: 15.0,
                    p95_ms: 15.0,
                    max_ms: 15.0,
                },
                status_counts: BTreeMap::from([(200, 5)]),
                checks: vec![CheckStats {
                    name: "status is 200".to_string(),
                    passes: 5,
                    fails: 0,
                }],
            }],
            overall: LatencyStats {
                count: 5,
                min_ms: 10.0,
                mean_ms: 12.0,
                median_ms: 11.0,
                p90_ms: 15.0,
                p95_ms: 15.0,
                max_ms: 15.0,
            },
            status_counts: BTreeMap::from([(200, 5)]),
            checks: vec![CheckStats {
                name: "status is 200".to_string(),
                passes: 5,
                fails: 0,
            }],
            total_iterations: 5,
            peak_cpu_pct: 2.5,
            engine_version: "0.1.0".to_string(),
        }
    }

    #[test]
    fn round_trip_through_jsonl_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.jsonl");

        let summary = sample_summary();
        append_run_summary(&summary, path.clone()).unwrap();
        append_run_summary(&summary, path.clone()).unwrap();

        let loaded = load_run_summaries(path).unwrap();
        assert_eq!(vec![summary.clone(), summary], loaded);
    }

    #[test]
    fn fingerprint_is_stable_for_identical_configuration() {
        assert_eq!(sample_summary().fingerprint(), sample_summary().fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_configuration() {
        let summary = sample_summary();

        let mut longer = summary.clone();
        longer.run_duration = 60;
        assert_ne!(summary.fingerprint(), longer.fingerprint());

        let mut other_target = summary.clone();
        other_target
            .env
            .insert("PORT".to_string(), "9090".to_string());
        assert_ne!(summary.fingerprint(), other_target.fingerprint());
    }

    #[test]
    fn fingerprint_ignores_collected_results() {
        let summary = sample_summary();

        let mut more_iterations = summary.clone();
        more_iterations.total_iterations = 100;
        more_iterations.overall.count = 100;
        more_iterations.peak_cpu_pct = 85.0;
        assert_eq!(summary.fingerprint(), more_iterations.fingerprint());
    }

    #[test]
    fn pass_rate_handles_empty_check() {
        let stats = CheckStats {
            name: "status is 200".to_string(),
            passes: 0,
            fails: 0,
        };
        assert_eq!(0.0, stats.pass_rate());

        let stats = CheckStats {
            name: "status is 200".to_string(),
            passes: 3,
            fails: 1,
        };
        assert_eq!(0.75, stats.pass_rate());
    }
}
