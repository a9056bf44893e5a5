//! Trial orchestration.
//!
//! For every sweep point the runner performs `trials` trials. A trial generates
//! one workload and replays it against every target in turn, each over a fresh
//! connection. The recorded duration covers connecting and executing the full
//! statement sequence.

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::{BenchConfig, SweepPoint, TargetConfig};
use crate::connection::Connector;
use crate::error::BenchError;
use crate::executor::run_workload;
use crate::results::{prepare_output_dir, ResultSink, TrialRecord};
use crate::workload::generate_workload;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Every measurement taken during a run, in execution order.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub records: Vec<(String, TrialRecord)>,
}

impl RunSummary {
    /// Mean trial duration per (target, sweep point).
    pub fn mean_durations(&self) -> BTreeMap<(String, SweepPoint), Duration> {
        let mut sums: BTreeMap<(String, SweepPoint), (Duration, u32)> = BTreeMap::new();
        for (target, record) in &self.records {
            let point = SweepPoint {
                tables: record.tables,
                entries: record.entries,
            };
            let entry = sums.entry((target.clone(), point)).or_default();
            entry.0 += record.elapsed;
            entry.1 += 1;
        }
        sums.into_iter()
            .map(|(key, (total, count))| (key, total / count))
            .collect()
    }
}

pub struct TrialRunner<C: Connector> {
    config: BenchConfig,
    connector: C,
    rng: StdRng,
}

impl<C: Connector> TrialRunner<C> {
    /// Seeds the RNG from `bench.seed` when set, from OS entropy otherwise.
    pub fn new(config: BenchConfig, connector: C) -> Self {
        let rng = match config.bench.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            connector,
            rng,
        }
    }

    /// Health-check every target, stopping at the first that fails.
    pub fn check_targets(&self) -> Result<(), BenchError> {
        for (name, target) in &self.config.targets {
            self.connector
                .check(name, target)
                .map_err(|source| BenchError::Connection {
                    target: name.clone(),
                    source,
                })?;
            info!("target {name} is healthy");
        }
        Ok(())
    }

    /// Run every sweep point and write one result line per (trial, target).
    pub fn run(&mut self) -> Result<RunSummary, BenchError> {
        let outdir = Path::new(&self.config.bench.outdir).to_path_buf();
        prepare_output_dir(&outdir)?;
        let mut sink = ResultSink::create(&outdir, self.config.targets.keys().map(String::as_str))?;

        let mut summary = RunSummary::default();
        let sweep = self.config.bench.sweep.clone();
        for point in sweep {
            for trial in 0..self.config.bench.trials {
                info!(
                    "trial {trial}: generating {} queries over {} tables with {} rows each",
                    self.config.bench.query_count, point.tables, point.entries
                );
                let statements = generate_workload(
                    &mut self.rng,
                    self.config.bench.query_count,
                    point.tables,
                    point.entries,
                );

                for (name, target) in &self.config.targets {
                    info!("trial {trial}: running {} statements against {name}", statements.len());
                    let elapsed = self.time_trial(name, target, trial, point, &statements)?;
                    info!("trial {trial}: {name} finished in {:.4}s", elapsed.as_secs_f64());

                    let record = TrialRecord {
                        tables: point.tables,
                        entries: point.entries,
                        elapsed,
                    };
                    sink.record(name, &record)?;
                    summary.records.push((name.clone(), record));
                }
            }
        }
        Ok(summary)
    }

    fn time_trial(
        &self,
        name: &str,
        target: &TargetConfig,
        trial: usize,
        point: SweepPoint,
        statements: &[String],
    ) -> Result<Duration, BenchError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::trial_span(name, trial, point.tables, point.entries).entered();
        #[cfg(not(feature = "tracing"))]
        let _ = trial;

        let start = Instant::now();
        let executor =
            self.connector
                .connect(name, target)
                .map_err(|source| BenchError::Connection {
                    target: name.to_string(),
                    source,
                })?;
        run_workload(&executor, statements).map_err(|source| BenchError::Execution {
            target: name.to_string(),
            source,
        })?;
        let elapsed = start.elapsed();

        #[cfg(feature = "metrics")]
        METRICS.record_trial(name, point.tables, point.entries, elapsed);

        Ok(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BenchSettings;
    use crate::connection::ConnectionError;
    use crate::executor::{ExecutorError, StatementExecutor};
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    type Journal = Rc<RefCell<BTreeMap<String, Vec<String>>>>;

    struct MemoryExecutor {
        target: String,
        journal: Journal,
    }

    impl StatementExecutor for MemoryExecutor {
        fn execute(&self, sql: &str) -> Result<u64, ExecutorError> {
            self.journal
                .borrow_mut()
                .entry(self.target.clone())
                .or_default()
                .push(sql.to_string());
            Ok(0)
        }
    }

    #[derive(Default)]
    struct MemoryConnector {
        journal: Journal,
        unreachable: Option<&'static str>,
    }

    impl Connector for MemoryConnector {
        type Executor = MemoryExecutor;

        fn connect(&self, name: &str, _target: &TargetConfig) -> Result<MemoryExecutor, ConnectionError> {
            if self.unreachable == Some(name) {
                return Err(ConnectionError::Unhealthy("refused".to_string()));
            }
            Ok(MemoryExecutor {
                target: name.to_string(),
                journal: Rc::clone(&self.journal),
            })
        }
    }

    fn config(outdir: &Path) -> BenchConfig {
        let target = TargetConfig {
            host: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            database: "bench".to_string(),
        };
        BenchConfig {
            bench: BenchSettings {
                outdir: outdir.to_string_lossy().into_owned(),
                trials: 2,
                query_count: 5,
                seed: Some(17),
                sweep: vec![
                    SweepPoint { tables: 1, entries: 2 },
                    SweepPoint { tables: 2, entries: 1 },
                ],
            },
            targets: [("primary", target.clone()), ("replica", target)]
                .into_iter()
                .map(|(name, t)| (name.to_string(), t))
                .collect(),
        }
    }

    #[test]
    fn test_run_writes_one_line_per_trial_and_target() {
        let root = tempfile::tempdir().unwrap();
        let outdir = root.path().join("out");
        let connector = MemoryConnector::default();
        let journal = Rc::clone(&connector.journal);

        let mut runner = TrialRunner::new(config(&outdir), connector);
        let summary = runner.run().unwrap();
        assert_eq!(summary.records.len(), 2 * 2 * 2);

        for target in ["primary", "replica"] {
            let text = fs::read_to_string(outdir.join(target)).unwrap();
            let lines: Vec<&str> = text.lines().collect();
            assert_eq!(lines.len(), 4);
            assert!(lines[0].starts_with("1,2,"));
            assert!(lines[3].starts_with("2,1,"));
            let seconds = lines[0].rsplit(',').next().unwrap();
            assert_eq!(seconds.split('.').nth(1).map(str::len), Some(4));
        }

        // Both targets replay the exact same workloads, each statement in its own transaction.
        let journal = journal.borrow();
        assert_eq!(journal["primary"], journal["replica"]);
        let statements: Vec<&String> = journal["primary"]
            .iter()
            .filter(|s| *s != "BEGIN" && *s != "COMMIT")
            .collect();
        assert_eq!(journal["primary"].len(), statements.len() * 3);
        // (1 create + 2 seed + 5 random + 1 drop) * 2 trials + (2 + 2 + 5 + 2) * 2 trials
        assert_eq!(statements.len(), 9 * 2 + 11 * 2);

        let means = summary.mean_durations();
        assert_eq!(means.len(), 4);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let root = tempfile::tempdir().unwrap();
        let mut journals = Vec::new();
        for attempt in 0..2 {
            let connector = MemoryConnector::default();
            let journal = Rc::clone(&connector.journal);
            let outdir = root.path().join(format!("out{attempt}"));
            TrialRunner::new(config(&outdir), connector).run().unwrap();
            let statements = journal.borrow()["primary"].clone();
            journals.push(statements);
        }
        assert_eq!(journals[0], journals[1]);
    }

    #[test]
    fn test_check_targets_reports_unreachable_target() {
        let root = tempfile::tempdir().unwrap();
        let healthy = TrialRunner::new(config(&root.path().join("a")), MemoryConnector::default());
        assert!(healthy.check_targets().is_ok());

        let connector = MemoryConnector {
            unreachable: Some("replica"),
            ..Default::default()
        };
        let runner = TrialRunner::new(config(&root.path().join("b")), connector);
        match runner.check_targets().unwrap_err() {
            BenchError::Connection { target, .. } => assert_eq!(target, "replica"),
            other => panic!("unexpected error: {other}"),
        }
        // Checking never touches the output directory.
        assert!(!root.path().join("b").exists());
    }

    #[test]
    fn test_connection_failure_aborts_run() {
        let root = tempfile::tempdir().unwrap();
        let connector = MemoryConnector {
            unreachable: Some("replica"),
            ..Default::default()
        };
        let err = TrialRunner::new(config(&root.path().join("out")), connector)
            .run()
            .unwrap_err();
        match err {
            BenchError::Connection { target, .. } => assert_eq!(target, "replica"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
