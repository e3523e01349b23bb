use crate::MetricRecord;
use parking_lot::Mutex;

/// Thread-safe sink for metric records, shared by every VU loop in a run.
///
/// Appends from different VUs are commutative, the aggregator is order-independent, so a
/// single mutex-guarded vector is enough: no record is lost or duplicated under concurrent
/// writers, and the critical section is one push.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    records: Mutex<Vec<MetricRecord>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: MetricRecord) {
        self.records.lock().push(record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Consistent point-in-time read of everything recorded so far.
    ///
    /// Used after all scenarios have stopped, and as a best-effort flush when the run is
    /// aborted.
    pub fn snapshot(&self) -> Vec<MetricRecord> {
        self.records.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RequestOutcome;
    use bytes::Bytes;
    use std::sync::Arc;
    use std::time::Duration;

    fn sample_record(scenario: &str) -> MetricRecord {
        MetricRecord {
            scenario: scenario.to_string(),
            outcome: RequestOutcome::new(
                200,
                Duration::from_millis(10),
                Bytes::new(),
                chrono::Utc::now(),
            ),
            checks: vec![],
        }
    }

    #[test]
    fn concurrent_writers_lose_nothing() {
        let collector = Arc::new(MetricsCollector::new());

        let writers = 8;
        let per_writer = 1_000;
        let handles = (0..writers)
            .map(|i| {
                let collector = collector.clone();
                std::thread::spawn(move || {
                    for _ in 0..per_writer {
                        collector.record(sample_record(&format!("scenario-{i}")));
                    }
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(writers * per_writer, collector.len());
    }

    #[test]
    fn snapshot_matches_recorded_content() {
        let collector = MetricsCollector::new();
        collector.record(sample_record("a"));
        collector.record(sample_record("b"));

        let snapshot = collector.snapshot();
        assert_eq!(2, snapshot.len());
        assert_eq!("a", snapshot[0].scenario);
        assert_eq!("b", snapshot[1].scenario);

        // A snapshot is a read, not a drain.
        assert_eq!(2, collector.len());
    }
}
