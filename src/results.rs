//! Per-target result files.
//!
//! Each benchmarked target gets one headerless CSV file in the output
//! directory, named after the target. Every trial appends one line:
//!
//! ```text
//! <table_count>,<entry_count>,<elapsed_seconds>
//! ```
//!
//! with the elapsed time in seconds at four decimal places.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug)]
pub enum ResultsError {
    Io(io::Error),
    Csv(csv::Error),
    /// The output path exists but is not a directory.
    NotADirectory(PathBuf),
    /// A record was written for a target the sink was not opened with.
    UnknownTarget(String),
}

impl fmt::Display for ResultsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultsError::Io(e) => write!(f, "I/O error: {e}"),
            ResultsError::Csv(e) => write!(f, "CSV error: {e}"),
            ResultsError::NotADirectory(p) => {
                write!(f, "expected {} to be a directory, but it is not", p.display())
            }
            ResultsError::UnknownTarget(t) => write!(f, "no result file open for target {t:?}"),
        }
    }
}

impl std::error::Error for ResultsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResultsError::Io(e) => Some(e),
            ResultsError::Csv(e) => Some(e),
            ResultsError::NotADirectory(_) | ResultsError::UnknownTarget(_) => None,
        }
    }
}

impl From<io::Error> for ResultsError {
    fn from(err: io::Error) -> Self {
        ResultsError::Io(err)
    }
}

impl From<csv::Error> for ResultsError {
    fn from(err: csv::Error) -> Self {
        ResultsError::Csv(err)
    }
}

/// One timing measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialRecord {
    pub tables: usize,
    pub entries: usize,
    pub elapsed: Duration,
}

impl TrialRecord {
    /// Elapsed wall-clock seconds, four decimal places.
    pub fn seconds(&self) -> String {
        format!("{:.4}", self.elapsed.as_secs_f64())
    }

    fn fields(&self) -> [String; 3] {
        [self.tables.to_string(), self.entries.to_string(), self.seconds()]
    }
}

/// Make `dir` an empty directory.
///
/// An existing directory is removed with everything in it. A non-directory at
/// that path is an error and is left untouched.
pub fn prepare_output_dir(dir: &Path) -> Result<(), ResultsError> {
    if dir.is_dir() {
        fs::remove_dir_all(dir)?;
    } else if dir.exists() {
        return Err(ResultsError::NotADirectory(dir.to_path_buf()));
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Open result files, one per target.
pub struct ResultSink {
    writers: BTreeMap<String, csv::Writer<File>>,
}

impl ResultSink {
    /// Create (truncating) `<dir>/<target>` for every target name.
    pub fn create<'a, I>(dir: &Path, targets: I) -> Result<Self, ResultsError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut writers = BTreeMap::new();
        for target in targets {
            let writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(dir.join(target))?;
            writers.insert(target.to_string(), writer);
        }
        Ok(Self { writers })
    }

    /// Append one line for `target` and flush it to disk.
    pub fn record(&mut self, target: &str, record: &TrialRecord) -> Result<(), ResultsError> {
        let writer = self
            .writers
            .get_mut(target)
            .ok_or_else(|| ResultsError::UnknownTarget(target.to_string()))?;
        writer.write_record(record.fields())?;
        writer.flush()?;
        Ok(())
    }
}
