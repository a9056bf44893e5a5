//! # pgworkload
//!
//! Randomized SQL workload generation and end-to-end latency benchmarking for
//! PostgreSQL targets.
//!
//! [`workload::generate_workload`] synthesizes a schema and a consistent
//! sequence of CRUD statements against it. [`runner::TrialRunner`] replays
//! those workloads against every configured target, committing after each
//! statement, and writes one timing line per trial to a per-target file.

pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod results;
pub mod runner;
pub mod transaction;
pub mod workload;

pub use config::{BenchConfig, SweepPoint, TargetConfig};
pub use connection::{connect, Connector, PostgresConnector};
pub use error::BenchError;
pub use executor::{run_workload, ExecutorError, PostgresExecutor, StatementExecutor};
pub use runner::{RunSummary, TrialRunner};
pub use workload::{build_workload, generate_workload, Workload};
