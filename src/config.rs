//! Benchmark configuration.
//!
//! Settings are read from an optional config file (`pgworkload.toml` by
//! default, any format the `config` crate recognises) and overridden by
//! environment variables prefixed `PGWORKLOAD`, with `__` separating nested
//! keys, e.g. `PGWORKLOAD__BENCH__TRIALS=3` or
//! `PGWORKLOAD__TARGETS__LOCAL__PASSWORD=secret`.

use config::{Config, ConfigError, Environment, File};
use log::warn;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "pgworkload.toml";
const ENV_PREFIX: &str = "PGWORKLOAD";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BenchConfig {
    #[serde(default)]
    pub bench: BenchSettings,
    /// Benchmarked databases, keyed by name. Results land in one file per key.
    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BenchSettings {
    /// Directory that receives the per-target result files. Recreated per run.
    #[serde(default = "default_outdir")]
    pub outdir: String,
    /// Trials per sweep point.
    #[serde(default = "default_trials")]
    pub trials: usize,
    /// Random CRUD statements per trial.
    #[serde(default = "default_query_count")]
    pub query_count: usize,
    /// Fixed RNG seed. Without one every run draws fresh workloads.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_sweep")]
    pub sweep: Vec<SweepPoint>,
}

impl Default for BenchSettings {
    fn default() -> Self {
        Self {
            outdir: default_outdir(),
            trials: default_trials(),
            query_count: default_query_count(),
            seed: None,
            sweep: default_sweep(),
        }
    }
}

/// One (table count, seed rows per table) combination to benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub struct SweepPoint {
    pub tables: usize,
    pub entries: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
}

impl TargetConfig {
    /// URI-format connection string for this target.
    pub fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}

fn default_outdir() -> String {
    "results".to_string()
}

fn default_trials() -> usize {
    1
}

fn default_query_count() -> usize {
    1000
}

fn default_port() -> u16 {
    5432
}

fn default_sweep() -> Vec<SweepPoint> {
    [(4, 300), (4, 1000), (5, 3000), (5, 10000)]
        .into_iter()
        .map(|(tables, entries)| SweepPoint { tables, entries })
        .collect()
}

impl BenchConfig {
    /// Load from [`DEFAULT_CONFIG_FILE`] (optional) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from `path` (optional) layered under environment variables.
    ///
    /// A missing file is skipped; a file that exists but does not parse is an
    /// error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("config file {} not found, using environment only", path.display());
        }
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(env_source())
            .build()
            .map_err(|err| {
                ConfigError::Message(format!(
                    "failed to load configuration from {}: {}",
                    path.display(),
                    err
                ))
            })?;

        let bench_config: BenchConfig = settings.try_deserialize()?;
        bench_config.validate()?;
        Ok(bench_config)
    }

    /// Reject configurations that cannot produce a single measurement.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::Message(
                "no targets configured; add at least one [targets.<name>] section".to_string(),
            ));
        }
        if self.bench.trials == 0 {
            return Err(ConfigError::Message("bench.trials must be at least 1".to_string()));
        }
        if self.bench.sweep.is_empty() {
            return Err(ConfigError::Message("bench.sweep must not be empty".to_string()));
        }
        if let Some(point) = self.bench.sweep.iter().find(|p| p.tables == 0) {
            return Err(ConfigError::Message(format!(
                "sweep point with {} entries has zero tables",
                point.entries
            )));
        }
        if let Some(name) = self.targets.keys().find(|name| !is_valid_target_name(name)) {
            return Err(ConfigError::Message(format!(
                "target name {name:?} cannot be used as a result file name"
            )));
        }
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

fn is_valid_target_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}
