//! Benchmark observability.
//!
//! With the `metrics` feature, statement and trial timings are recorded as
//! OpenTelemetry instruments exported through a Prometheus registry; call
//! [`BenchMetrics::encode`] to render the text exposition format. With the
//! `tracing` feature, [`tracing_helpers`] provides the spans used around
//! connections, transactions and statements.

#[cfg(feature = "metrics")]
pub use self::prometheus_metrics::{BenchMetrics, METRICS};

#[cfg(feature = "metrics")]
mod prometheus_metrics {
    use once_cell::sync::Lazy;
    use opentelemetry::metrics::{Counter, Histogram, MeterProvider as _};
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Encoder, Registry, TextEncoder};
    use std::time::Duration;

    pub static METRICS: Lazy<BenchMetrics> = Lazy::new(BenchMetrics::init);

    pub struct BenchMetrics {
        registry: Registry,
        _provider: SdkMeterProvider,
        pub statements_total: Counter<u64>,
        pub statement_errors_total: Counter<u64>,
        pub statement_duration: Histogram<f64>,
        pub trial_duration: Histogram<f64>,
    }

    impl BenchMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let exporter = opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
                .expect("failed to build prometheus exporter");
            let provider = SdkMeterProvider::builder().with_reader(exporter).build();
            let meter = provider.meter("pgworkload");

            let statements_total = meter
                .u64_counter("pgworkload_statements_total")
                .with_description("Total workload statements executed")
                .build();

            let statement_errors_total = meter
                .u64_counter("pgworkload_statement_errors_total")
                .with_description("Workload statements rejected by the target")
                .build();

            let statement_duration = meter
                .f64_histogram("pgworkload_statement_duration_seconds")
                .with_description("Round-trip duration of a single statement")
                .build();

            let trial_duration = meter
                .f64_histogram("pgworkload_trial_duration_seconds")
                .with_description("Wall-clock duration of one trial against one target")
                .build();

            Self {
                registry,
                _provider: provider,
                statements_total,
                statement_errors_total,
                statement_duration,
                trial_duration,
            }
        }

        /// Record one workload statement's round trip. Transaction control
        /// statements are not observed.
        pub fn observe_statement(&self, elapsed: Duration, succeeded: bool) {
            self.statements_total.add(1, &[]);
            self.statement_duration.record(elapsed.as_secs_f64(), &[]);
            if !succeeded {
                self.statement_errors_total.add(1, &[]);
            }
        }

        pub fn record_trial(&self, target: &str, tables: usize, entries: usize, elapsed: Duration) {
            self.trial_duration.record(
                elapsed.as_secs_f64(),
                &[
                    KeyValue::new("target", target.to_string()),
                    KeyValue::new("tables", tables as i64),
                    KeyValue::new("entries", entries as i64),
                ],
            );
        }

        /// Render everything recorded so far in the Prometheus text format.
        pub fn encode(&self) -> Result<String, prometheus::Error> {
            let mut buffer = Vec::new();
            TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
            String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_trial_recorded_in_exposition() {
            let metrics = BenchMetrics::init();
            metrics.observe_statement(Duration::from_millis(3), true);
            metrics.record_trial("local", 4, 300, Duration::from_millis(1500));
            let text = metrics.encode().unwrap();
            assert!(text.contains("pgworkload_trial_duration_seconds"));
            assert!(text.contains("pgworkload_statements_total"));
        }
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{debug_span, info_span, Span};

    pub fn connect_span() -> Span {
        debug_span!("connect")
    }

    pub fn trial_span(target: &str, trial: usize, tables: usize, entries: usize) -> Span {
        info_span!("trial", db = target, trial, tables, entries)
    }

    pub fn run_workload_span(statements: usize) -> Span {
        debug_span!("run_workload", statements)
    }

    pub fn execute_statement_span(sql: &str) -> Span {
        let verb = sql.split_whitespace().next().unwrap_or_default();
        debug_span!("execute_statement", verb, len = sql.len())
    }

    pub fn begin_transaction_span() -> Span {
        debug_span!("begin_transaction")
    }

    pub fn commit_transaction_span() -> Span {
        debug_span!("commit_transaction")
    }

    pub fn rollback_transaction_span() -> Span {
        debug_span!("rollback_transaction")
    }
}
