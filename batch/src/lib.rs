//! Whole-file parallelism for the stats pipeline.
//!
//! Files are embarrassingly parallel: each worker owns a complete pipeline
//! instance (parse, reconstruct, detect) for one file at a time, with no
//! shared mutable state. Rows flow back over a channel into one aggregated
//! report; row order across files is unspecified and callers must not rely
//! on it.
//!
//! A corrupt file never halts the run - its failure is collected alongside
//! everyone else's rows. Cancellation is cooperative at file granularity:
//! a cancelled worker finishes nothing partially, it just stops picking up
//! new files.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use slippi_replay::{Game, Log, ReplayError};
use slippi_stats::{StatsError, StatsReport};
use thiserror::Error;

pub mod logging;

/// Why one file produced no rows.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// A per-file failure, reported alongside the aggregate rows.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: PipelineError,
}

/// Aggregated output of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub techs: Vec<slippi_stats::TechRow>,
    pub combos: Vec<slippi_stats::ComboRow>,
    pub failures: Vec<FileFailure>,
    /// Files that produced rows (or legitimately produced none).
    pub files_processed: usize,
    /// Files left untouched because the run was cancelled.
    pub files_skipped: usize,
}

/// A handle for requesting that an in-flight batch stop after the files
/// currently being processed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Runs whole replay files across a fixed pool of worker threads.
#[derive(Debug)]
pub struct BatchRunner {
    workers: usize,
    cancel: CancelToken,
}

impl Default for BatchRunner {
    fn default() -> Self {
        let workers = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self::new(workers)
    }
}

impl BatchRunner {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            cancel: CancelToken::new(),
        }
    }

    /// A token that can stop this runner's next `run` call mid-batch.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Processes every path and aggregates the results.
    ///
    /// Blocks until all workers drain the queue (or cancellation empties
    /// it). Failures are per-file and never abort the batch.
    pub fn run(&self, paths: Vec<PathBuf>) -> BatchReport {
        let total = paths.len();
        let queue = Arc::new(Mutex::new(paths.into_iter().collect::<VecDeque<_>>()));
        let (sender, receiver) = mpsc::channel();

        tracing::info!(target: Log::Batch, "processing {total} file(s) on {} worker(s)", self.workers);

        thread::scope(|scope| {
            for worker in 0..self.workers {
                let queue = Arc::clone(&queue);
                let sender = sender.clone();
                let cancel = self.cancel.clone();

                thread::Builder::new()
                    .name(format!("SlippiStatsWorker-{worker}"))
                    .spawn_scoped(scope, move || {
                        while !cancel.is_cancelled() {
                            let path = match queue.lock() {
                                Ok(mut queue) => queue.pop_front(),
                                Err(_) => None,
                            };
                            let Some(path) = path else { break };

                            let result = process_file(&path);
                            if sender.send((path, result)).is_err() {
                                break;
                            }
                        }
                    })
                    .expect("failed to spawn batch worker thread");
            }

            // The workers hold the only other senders; dropping ours lets the
            // receive loop end when they finish.
            drop(sender);

            let mut report = BatchReport::default();
            for (path, result) in receiver {
                match result {
                    Ok(stats) => {
                        report.files_processed += 1;
                        report.techs.extend(stats.techs);
                        report.combos.extend(stats.combos);
                    },
                    Err(error) => {
                        tracing::warn!(target: Log::Batch, "skipping {}: {error}", path.display());
                        report.failures.push(FileFailure { path, error });
                    },
                }
            }

            report.files_skipped = total - report.files_processed - report.failures.len();
            report
        })
    }
}

/// One worker's whole pipeline for one file.
fn process_file(path: &Path) -> Result<StatsReport, PipelineError> {
    let game = Game::open(path)?;
    let report = slippi_stats::compute(&game)?;
    Ok(report)
}

/// Collects the `.slp` files directly inside `dir`, sorted by name so batch
/// output is reproducible run to run.
pub fn scan_replays(dir: impl AsRef<Path>) -> std::io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("slp")))
        .collect();

    paths.sort();
    Ok(paths)
}
