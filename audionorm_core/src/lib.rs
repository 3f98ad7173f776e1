//! Concurrent batch peak normalization.
//!
//! The dispatcher enumerates eligible audio files in a directory, feeds
//! them through a fixed pool of worker threads, and writes each file back
//! as 32-bit float WAV with its peak magnitude scaled to a target value.

use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

pub mod buffer;
pub mod codec;
pub mod logger;
pub mod pipeline;
pub mod pool;
pub mod queue;

pub use buffer::{AudioBuffer, NormalizeOutcome, Statistics};
pub use logger::SharedLogger;
pub use pool::{WorkerCounts, WorkerPool};
pub use queue::{Task, TaskQueue};

/// Peak value files are normalized to when the caller does not choose one.
pub const DEFAULT_TARGET_PEAK: f32 = 1.0;

/// Worker thread count used when the caller does not choose one.
pub const DEFAULT_WORKERS: usize = 4;

/// Extension allow-list applied during enumeration. A match only means the
/// file is handed to the codec; decodability is decided there.
pub const DEFAULT_EXTENSIONS: [&str; 5] = ["wav", "flac", "ogg", "aiff", "mp3"];

/// Prefix prepended to every output file name.
pub const OUTPUT_PREFIX: &str = "normalised_";

/// Default name of the shared batch log, created inside the output
/// directory.
pub const DEFAULT_LOG_FILE: &str = "log.txt";

/// Errors that can occur while normalizing a batch of audio files.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The input path is missing or not a directory.
    #[error("input path '{0}' is not a valid directory")]
    InvalidInputDir(PathBuf),

    /// The output directory could not be created.
    #[error("could not create output directory '{path}'")]
    OutputDirUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The requested target peak is not a positive, finite number.
    #[error("target peak must be positive and finite, got {0}")]
    InvalidTargetPeak(f32),

    /// A worker thread could not be started.
    #[error("could not start worker threads")]
    WorkerSpawn(#[source] io::Error),

    /// Wrapper around errors produced by the Symphonia decoding library.
    #[error(transparent)]
    Symphonia(#[from] SymphoniaError),

    /// Wrapper around errors produced while writing WAV output.
    #[error(transparent)]
    Wav(#[from] hound::Error),

    /// Wrapper around IO errors encountered while reading or writing files.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Error returned when the container does not expose any default track.
    #[error("input stream does not provide a default track")]
    MissingDefaultTrack,

    /// Error returned when the codec of the track cannot be handled.
    #[error("unsupported codec")]
    UnsupportedCodec,

    /// Error returned when the decoder track lacks a sample rate.
    #[error("input stream does not advertise a sample rate")]
    MissingSampleRate,

    /// Error returned when neither the container nor the decoded packets
    /// reveal a channel layout.
    #[error("input stream does not advertise a channel layout")]
    MissingChannelLayout,
}

/// Configuration for one batch run.
#[derive(Clone, Debug)]
pub struct Config {
    /// Canonicalized directory enumerated (non-recursively) for input files.
    pub input_dir: PathBuf,
    /// Directory the normalized copies are written to; created on demand.
    pub output_dir: PathBuf,
    /// Desired peak magnitude after normalization.
    pub target_peak: f32,
    /// Number of worker threads.
    pub workers: NonZeroUsize,
    /// Location of the shared batch log file.
    pub log_path: PathBuf,
    /// Lower-cased extension allow-list without leading dots.
    pub extensions: Vec<String>,
}

impl Config {
    /// Construct a [`Config`] with defaults for everything but the target
    /// peak, validating the provided paths.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        input_dir: P,
        output_dir: Q,
        target_peak: f32,
    ) -> Result<Self, NormalizeError> {
        Self::builder(input_dir, output_dir)
            .target_peak(target_peak)
            .build()
    }

    pub fn builder<P: AsRef<Path>, Q: AsRef<Path>>(input_dir: P, output_dir: Q) -> ConfigBuilder {
        ConfigBuilder {
            input_dir: input_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            target_peak: DEFAULT_TARGET_PEAK,
            workers: None,
            log_path: None,
            extensions: None,
        }
    }
}

/// Builder for [`Config`]; validation happens in [`ConfigBuilder::build`].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    input_dir: PathBuf,
    output_dir: PathBuf,
    target_peak: f32,
    workers: Option<NonZeroUsize>,
    log_path: Option<PathBuf>,
    extensions: Option<Vec<String>>,
}

impl ConfigBuilder {
    pub fn target_peak(mut self, target_peak: f32) -> Self {
        self.target_peak = target_peak;
        self
    }

    pub fn workers(mut self, workers: NonZeroUsize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn log_path<P: AsRef<Path>>(mut self, log_path: P) -> Self {
        self.log_path = Some(log_path.as_ref().to_path_buf());
        self
    }

    /// Replace the extension allow-list. Entries are matched
    /// case-insensitively; leading dots are stripped.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> Result<Config, NormalizeError> {
        if !self.target_peak.is_finite() || self.target_peak <= 0.0 {
            return Err(NormalizeError::InvalidTargetPeak(self.target_peak));
        }

        if !self.input_dir.is_dir() {
            return Err(NormalizeError::InvalidInputDir(self.input_dir));
        }
        let input_dir = fs::canonicalize(&self.input_dir)?;

        let extensions: Vec<String> = self
            .extensions
            .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_owned()).collect())
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        let workers = self
            .workers
            .or_else(|| NonZeroUsize::new(DEFAULT_WORKERS))
            .unwrap_or(NonZeroUsize::MIN);

        let log_path = self
            .log_path
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_LOG_FILE));

        Ok(Config {
            input_dir,
            output_dir: self.output_dir,
            target_peak: self.target_peak,
            workers,
            log_path,
            extensions,
        })
    }
}

/// Progress notifications emitted while a batch runs. `Advance` is invoked
/// from worker threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    Start { total: usize },
    Advance { completed: usize, total: usize },
    Finish,
}

/// Outcome of a batch run. `succeeded` and `failed` are accumulated at the
/// worker boundary with their own counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of eligible files enumerated.
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Enumerate eligible files in the input directory, in name order.
pub fn collect_tasks(config: &Config) -> Result<Vec<Task>, NormalizeError> {
    let mut tasks = Vec::new();

    for entry in fs::read_dir(&config.input_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let path = entry.path();
        if !has_allowed_extension(&path, &config.extensions) {
            continue;
        }

        let display_name = entry.file_name().to_string_lossy().into_owned();
        tasks.push(Task {
            output_path: config
                .output_dir
                .join(format!("{OUTPUT_PREFIX}{display_name}")),
            input_path: path,
            display_name,
            target_peak: config.target_peak,
        });
    }

    // Directory iteration order is platform-dependent; sort for stable
    // plans and logs. Assignment order across workers stays unordered.
    tasks.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(tasks)
}

/// Preview the output paths a run would produce, without processing.
pub fn plan_outputs(config: &Config) -> Result<Vec<PathBuf>, NormalizeError> {
    Ok(collect_tasks(config)?
        .into_iter()
        .map(|task| task.output_path)
        .collect())
}

fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| extensions.iter().any(|allowed| *allowed == ext))
}

/// Run a batch without progress reporting.
pub fn run(config: Config) -> Result<BatchReport, NormalizeError> {
    run_with_progress(config, |_event| {})
}

/// Run a batch, invoking `progress` as work is scheduled and completed.
///
/// Startup failures (invalid directories, worker spawn) are returned as
/// errors before any task runs; per-file failures are recorded in the
/// returned [`BatchReport`] and in the shared log instead.
pub fn run_with_progress<F>(config: Config, progress: F) -> Result<BatchReport, NormalizeError>
where
    F: Fn(ProgressEvent) + Send + Sync + 'static,
{
    let tasks = collect_tasks(&config)?;
    let total = tasks.len();
    if tasks.is_empty() {
        log::info!(
            "no eligible audio files found in {}",
            config.input_dir.display()
        );
        return Ok(BatchReport::default());
    }

    fs::create_dir_all(&config.output_dir).map_err(|source| {
        NormalizeError::OutputDirUnavailable {
            path: config.output_dir.clone(),
            source,
        }
    })?;

    let logger = Arc::new(SharedLogger::open(&config.log_path)?);
    let queue = Arc::new(TaskQueue::new());
    let progress: Arc<dyn Fn(ProgressEvent) + Send + Sync> = Arc::new(progress);

    progress(ProgressEvent::Start { total });

    // Workers start against the still-empty queue so that a spawn failure
    // aborts before any task runs; threads that did start are woken by
    // request_stop and exit on the empty FIFO.
    let pool = match WorkerPool::start(
        Arc::clone(&queue),
        Arc::clone(&logger),
        config.workers,
        total,
        Arc::clone(&progress),
    ) {
        Ok(pool) => pool,
        Err(err) => {
            queue.request_stop();
            return Err(NormalizeError::WorkerSpawn(err));
        }
    };

    for task in tasks {
        queue.enqueue(task);
    }

    queue.await_drain();
    queue.request_stop();
    let counts = pool.join_all();
    logger.close();

    progress(ProgressEvent::Finish);

    Ok(BatchReport {
        total,
        succeeded: counts.succeeded,
        failed: counts.failed,
    })
}
