//! Stat extraction over parsed replays.
//!
//! The pipeline here is the second half of the system: `slippi-replay`
//! produces the frame sequence, and this crate runs the registered
//! detectors over it and projects their records into flat output rows.
//! Detection is per-file and shares nothing across invocations, so callers
//! can run as many games in parallel as they like.

pub mod combo;
pub mod context;
pub mod detector;
pub mod errors;
pub mod helpers;
pub mod records;
pub mod tech;

pub use combo::ComboDetector;
pub use context::{GameContext, GameResult, PlayerInfo};
pub use detector::{default_detectors, run_detectors, StatDetector};
pub use errors::StatsError;
pub use records::{ComboEvent, ComboRow, MoveLanded, StatRecord, TechEvent, TechRow};
pub use tech::TechDetector;

use slippi_replay::{Game, Log};

/// Every row the registered detectors produced for one game.
#[derive(Debug, Default)]
pub struct StatsReport {
    pub techs: Vec<TechRow>,
    pub combos: Vec<ComboRow>,
}

impl StatsReport {
    pub fn is_empty(&self) -> bool {
        self.techs.is_empty() && self.combos.is_empty()
    }

    pub fn len(&self) -> usize {
        self.techs.len() + self.combos.len()
    }
}

/// Runs the default detector registry over a parsed game and builds the
/// output rows.
pub fn compute(game: &Game) -> Result<StatsReport, StatsError> {
    compute_with(game, &default_detectors())
}

/// Like [`compute`], but with a caller-supplied detector list.
pub fn compute_with(game: &Game, detectors: &[Box<dyn StatDetector>]) -> Result<StatsReport, StatsError> {
    let ctx = GameContext::new(game)?;

    let records = run_detectors(&ctx, detectors);
    tracing::debug!(target: Log::Stats, "{} detection record(s) across {} detector(s)", records.len(), detectors.len());

    let mut report = StatsReport::default();
    for record in records {
        match record {
            StatRecord::Tech(event) => report.techs.push(TechRow::build(&ctx, &event)),
            StatRecord::Combo(event) => report.combos.push(ComboRow::build(&ctx, &event)),
        }
    }

    Ok(report)
}
