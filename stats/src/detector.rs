//! The detector capability interface and registry.
//!
//! A detector is a pure function of the shared game context: it owns its
//! per-run scan state, never mutates frames, and can therefore run
//! concurrently with every other detector over the same borrowed slice.

use slippi_replay::Log;

use crate::combo::ComboDetector;
use crate::context::GameContext;
use crate::records::StatRecord;
use crate::tech::TechDetector;

pub trait StatDetector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs one full pass over the frame sequence, emitting records in
    /// frame order per player.
    fn run(&self, ctx: &GameContext<'_>) -> Vec<StatRecord>;
}

/// The detectors that ship with the pipeline. Registration is this explicit
/// list; there is no runtime discovery.
pub fn default_detectors() -> Vec<Box<dyn StatDetector>> {
    vec![
        Box::new(TechDetector::default()),
        Box::new(ComboDetector::default()),
    ]
}

/// Runs every detector over the context, each on its own scoped thread.
///
/// Results come back in registry order regardless of completion order, so
/// output stays deterministic. A detector that panics is treated the same
/// as one that found nothing: logged, file kept.
pub fn run_detectors(ctx: &GameContext<'_>, detectors: &[Box<dyn StatDetector>]) -> Vec<StatRecord> {
    let nested: Vec<Vec<StatRecord>> = std::thread::scope(|scope| {
        let handles: Vec<_> = detectors
            .iter()
            .map(|detector| {
                let name = detector.name();
                (name, scope.spawn(move || detector.run(ctx)))
            })
            .collect();

        handles
            .into_iter()
            .map(|(name, handle)| match handle.join() {
                Ok(records) => records,
                Err(_) => {
                    tracing::error!(target: Log::Stats, "detector '{name}' panicked; emitting no records for it");
                    Vec::new()
                },
            })
            .collect()
    });

    nested.into_iter().flatten().collect()
}
