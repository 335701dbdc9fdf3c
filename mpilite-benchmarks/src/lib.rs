use clap::Parser;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod matmul;
pub use matmul::MatMulOptions;
pub mod metrics;
pub use metrics::{Record, Timing};
pub mod partition;
pub use partition::RowPartition;
pub mod pingpong;
pub use pingpong::PingPongOptions;
pub mod report;
pub use report::{Report, ReportKind};
#[cfg(feature = "rsmpi")]
pub mod rsmpi;
pub mod sweep;
pub use sweep::sweep;

/// Rank that owns the global buffers and emits results.
pub const COORDINATOR: i32 = 0;

#[derive(Debug, Error)]
pub enum Error {
    /// The message-passing substrate failed.
    #[error(transparent)]
    Comm(#[from] mpilite::Error),

    /// Not enough participants for the benchmark.
    #[error("this program requires at least {required} processes, got {actual}")]
    InsufficientParticipants { required: i32, actual: i32 },

    /// The results file could not be opened or written.
    #[error("error writing results to {}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The options file could not be read or parsed.
    #[error("failed to load options from {}: {message}", path.display())]
    Options { path: PathBuf, message: String },

    /// Options were read but make no sense.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

impl Error {
    /// Whether this error was raised on every rank before any
    /// communication, so that the run can simply stop.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Error::InsufficientParticipants { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Benchmark args for the in-process runtime.
#[derive(Parser)]
pub struct BenchmarkArgs {
    /// Number of participants to run.
    #[arg(short, long, default_value_t = 4)]
    pub ranks: usize,

    /// Path for benchmark options file.
    #[arg(short, long)]
    pub options_path: Option<PathBuf>,

    /// Directory the results file is written to.
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,
}

/// RSMPI specific args.
///
/// The participant count comes from the MPI launcher.
#[derive(Parser)]
pub struct RsmpiArgs {
    /// Path for benchmark options file.
    #[arg(short, long)]
    pub options_path: Option<PathBuf>,

    /// Directory the results file is written to.
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,
}

/// Load benchmark options from a file path.
pub fn load_options<P, T>(path: P) -> Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let options_error = |message: String| Error::Options {
        path: path.to_path_buf(),
        message,
    };
    let fp = std::fs::File::open(path).map_err(|err| options_error(err.to_string()))?;
    serde_yaml::from_reader(fp).map_err(|err| options_error(err.to_string()))
}

/// Load options from `path` if one was given, otherwise use the built-in
/// constants.
pub fn options_or_default<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match path {
        Some(path) => load_options(path),
        None => Ok(T::default()),
    }
}
