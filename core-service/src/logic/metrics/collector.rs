//! Metrics Collector
//!
//! All counters live behind one `parking_lot::Mutex`, so an update and a
//! snapshot never interleave: a snapshot is always a state that existed
//! between two complete updates.
//!
//! Latency is a simple cumulative average over every recorded request,
//! failures included: `avg = cumulative_latency_ms / total_requests`.

use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::logic::model::{ClassLabel, CLASS_COUNT};

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Default)]
struct Counters {
    total_requests: u64,
    total_errors: u64,
    cumulative_latency_ms: f64,
    min_latency_ms: Option<f64>,
    max_latency_ms: f64,
    predictions_by_class: [u64; CLASS_COUNT],
    model_loaded: bool,
}

impl Counters {
    fn record(&mut self, duration_ms: f64, success: bool) {
        let duration_ms = if duration_ms.is_finite() { duration_ms.max(0.0) } else { 0.0 };

        self.total_requests += 1;
        if !success {
            self.total_errors += 1;
        }
        self.cumulative_latency_ms += duration_ms;
        self.min_latency_ms = Some(self.min_latency_ms.map_or(duration_ms, |m| m.min(duration_ms)));
        self.max_latency_ms = self.max_latency_ms.max(duration_ms);
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub successful_requests: u64,
    pub avg_latency_ms: f64,
    pub cumulative_latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    pub predictions_by_class: Vec<ClassCount>,
    pub model_loaded: bool,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassCount {
    pub class: ClassLabel,
    pub count: u64,
}

// ============================================================================
// COLLECTOR
// ============================================================================

/// One per process; starts at zero and is never reset
#[derive(Debug)]
pub struct MetricsCollector {
    counters: Mutex<Counters>,
    started: Instant,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            started: Instant::now(),
        }
    }

    /// Count one request; errors are counted iff `!success`
    pub fn record_request(&self, duration_ms: f64, success: bool) {
        self.counters.lock().record(duration_ms, success);
    }

    /// Count one successful prediction together with its class
    pub fn record_prediction(&self, duration_ms: f64, class: ClassLabel) {
        let mut counters = self.counters.lock();
        counters.record(duration_ms, true);
        counters.predictions_by_class[class.index()] += 1;
    }

    pub fn set_model_loaded(&self, loaded: bool) {
        self.counters.lock().model_loaded = loaded;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self.counters.lock();

        let avg_latency_ms = if counters.total_requests > 0 {
            counters.cumulative_latency_ms / counters.total_requests as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            total_requests: counters.total_requests,
            total_errors: counters.total_errors,
            successful_requests: counters.total_requests - counters.total_errors,
            avg_latency_ms,
            cumulative_latency_ms: counters.cumulative_latency_ms,
            min_latency_ms: counters.min_latency_ms.unwrap_or(0.0),
            max_latency_ms: counters.max_latency_ms,
            predictions_by_class: ClassLabel::ALL
                .iter()
                .map(|&class| ClassCount {
                    class,
                    count: counters.predictions_by_class[class.index()],
                })
                .collect(),
            model_loaded: counters.model_loaded,
            uptime_seconds: self.started.elapsed().as_secs(),
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// PROMETHEUS EXPORT
// ============================================================================

impl MetricsSnapshot {
    /// Render in Prometheus text exposition format
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "# HELP iris_requests_total Total prediction requests\n\
             # TYPE iris_requests_total counter\n\
             iris_requests_total {}\n\n",
            self.total_requests
        ));

        output.push_str(&format!(
            "# HELP iris_request_errors_total Failed prediction requests\n\
             # TYPE iris_request_errors_total counter\n\
             iris_request_errors_total {}\n\n",
            self.total_errors
        ));

        output.push_str(
            "# HELP iris_predictions_by_class Successful predictions by class\n\
             # TYPE iris_predictions_by_class counter\n",
        );
        for entry in &self.predictions_by_class {
            output.push_str(&format!(
                "iris_predictions_by_class{{class=\"{}\"}} {}\n",
                entry.class, entry.count
            ));
        }

        output.push_str(&format!(
            "\n# HELP iris_latency_avg_ms Average request latency\n\
             # TYPE iris_latency_avg_ms gauge\n\
             iris_latency_avg_ms {:.4}\n\n",
            self.avg_latency_ms
        ));

        output.push_str(&format!(
            "# HELP iris_model_loaded Whether the model is ready\n\
             # TYPE iris_model_loaded gauge\n\
             iris_model_loaded {}\n\n",
            u8::from(self.model_loaded)
        ));

        output.push_str(&format!(
            "# HELP iris_uptime_seconds Process uptime\n\
             # TYPE iris_uptime_seconds gauge\n\
             iris_uptime_seconds {}\n",
            self.uptime_seconds
        ));

        output
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_starts_at_zero() {
        let metrics = MetricsCollector::new();
        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 0);
        assert_eq!(snap.total_errors, 0);
        assert_eq!(snap.avg_latency_ms, 0.0);
        assert_eq!(snap.min_latency_ms, 0.0);
        assert!(!snap.model_loaded);
    }

    #[test]
    fn test_record_counts_and_average() {
        let metrics = MetricsCollector::new();
        metrics.record_request(2.0, true);
        metrics.record_request(4.0, false);
        metrics.record_prediction(6.0, ClassLabel::Virginica);

        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 3);
        assert_eq!(snap.total_errors, 1);
        assert_eq!(snap.successful_requests, 2);
        assert_eq!(snap.avg_latency_ms, 4.0);
        assert_eq!(snap.min_latency_ms, 2.0);
        assert_eq!(snap.max_latency_ms, 6.0);
        assert_eq!(snap.predictions_by_class[2].count, 1);
        assert_eq!(snap.predictions_by_class[0].count, 0);
    }

    #[test]
    fn test_bad_durations_are_clamped() {
        let metrics = MetricsCollector::new();
        metrics.record_request(f64::NAN, true);
        metrics.record_request(-3.0, true);
        let snap = metrics.snapshot();
        assert_eq!(snap.cumulative_latency_ms, 0.0);
        assert_eq!(snap.total_requests, 2);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let metrics = Arc::new(MetricsCollector::new());
        let threads = 8;
        let per_thread = 500;

        std::thread::scope(|scope| {
            for t in 0..threads {
                let metrics = Arc::clone(&metrics);
                scope.spawn(move || {
                    for i in 0..per_thread {
                        // Every third request from odd threads fails
                        let success = t % 2 == 0 || i % 3 != 0;
                        metrics.record_request(1.0, success);
                    }
                });
            }
        });

        let failures_per_odd_thread = (0..per_thread).filter(|i| i % 3 == 0).count() as u64;
        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, (threads * per_thread) as u64);
        assert_eq!(snap.total_errors, failures_per_odd_thread * (threads / 2) as u64);
        assert_eq!(snap.avg_latency_ms, 1.0);
    }

    #[test]
    fn test_snapshot_never_sees_partial_update() {
        let metrics = Arc::new(MetricsCollector::new());

        std::thread::scope(|scope| {
            let writer = Arc::clone(&metrics);
            scope.spawn(move || {
                for _ in 0..2000 {
                    writer.record_request(1.0, false);
                }
            });

            for _ in 0..200 {
                let snap = metrics.snapshot();
                // Every request here fails, so the two counters move together
                assert_eq!(snap.total_requests, snap.total_errors);
                assert_eq!(snap.cumulative_latency_ms, snap.total_requests as f64);
            }
        });
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = MetricsCollector::new();
        metrics.set_model_loaded(true);
        metrics.record_prediction(1.5, ClassLabel::Setosa);
        metrics.record_request(0.5, false);

        let text = metrics.snapshot().to_prometheus();
        assert!(text.contains("# TYPE iris_requests_total counter"));
        assert!(text.contains("iris_requests_total 2\n"));
        assert!(text.contains("iris_request_errors_total 1\n"));
        assert!(text.contains("iris_predictions_by_class{class=\"Setosa\"} 1\n"));
        assert!(text.contains("iris_latency_avg_ms 1.0000"));
        assert!(text.contains("iris_model_loaded 1\n"));
    }
}
