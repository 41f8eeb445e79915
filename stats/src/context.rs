//! The shared, read-only view of one parsed game that every detector runs
//! against.

use chrono::{DateTime, Utc};
use slippi_replay::enums::Stage;
use slippi_replay::events::MatchType;
use slippi_replay::{EndMethod, Frame, Game, Port, SlippiVersion};
use strum::Display;

use crate::errors::StatsError;

/// A player's outcome for one game.
#[derive(Debug, Display, PartialEq, Eq, Copy, Clone)]
#[strum(serialize_all = "kebab-case")]
pub enum GameResult {
    Win,
    Loss,
    NoContest,
    Unknown,
}

/// Identity and outcome for one of the two players under analysis.
#[derive(Debug, Clone)]
pub struct PlayerInfo {
    pub port: Port,
    /// Raw character-select-screen character id.
    pub character: u8,
    pub costume: u8,
    pub connect_code: Option<String>,
    pub display_name: Option<String>,
    pub result: GameResult,
}

impl PlayerInfo {
    /// The player's stable identity: connect code when known, port label
    /// otherwise.
    pub fn identity(&self) -> String {
        self.connect_code.clone().unwrap_or_else(|| self.port.to_string())
    }
}

/// Everything a detector may read: the game-level header fields and the
/// frame sequence. Detectors never get mutable access.
#[derive(Debug)]
pub struct GameContext<'a> {
    pub date_time: Option<DateTime<Utc>>,
    pub slippi_version: SlippiVersion,
    pub match_id: Option<String>,
    pub match_type: MatchType,
    pub game_number: Option<u32>,
    /// Raw stage id from the Game Start payload.
    pub stage_id: u16,
    /// The stage, when the id maps to a known one.
    pub stage: Option<Stage>,
    /// Total game duration in milliseconds at 60 fps.
    pub duration_ms: Option<i64>,
    pub players: [PlayerInfo; 2],
    pub frames: &'a [Frame],
}

impl<'a> GameContext<'a> {
    /// Builds the detector view from a parsed game.
    ///
    /// Stat detection is defined for singles only: any other number of
    /// occupied ports is refused here, before any detector runs.
    pub fn new(game: &'a Game) -> Result<Self, StatsError> {
        let setups: Vec<_> = game.start.players.iter().flatten().collect();
        if setups.len() != 2 {
            return Err(StatsError::PlayerCount(setups.len()));
        }

        let mut players = Vec::with_capacity(2);
        for setup in &setups {
            let port_meta = game.metadata.players[setup.port.index()].as_ref();

            let result = match &game.end {
                Some(end) if end.method == EndMethod::NoContest => GameResult::NoContest,
                Some(end) => match end.player_placements {
                    Some(placements) if placements[setup.port.index()] == 0 => GameResult::Win,
                    Some(_) => GameResult::Loss,
                    None => GameResult::Unknown,
                },
                None => GameResult::Unknown,
            };

            players.push(PlayerInfo {
                port: setup.port,
                character: setup.character,
                costume: setup.costume,
                connect_code: port_meta.and_then(|p| p.connect_code.clone()),
                display_name: port_meta.and_then(|p| p.display_name.clone()),
                result,
            });
        }

        let duration_frames = game
            .metadata
            .duration_frames
            .or_else(|| game.frames.len().try_into().ok());

        Ok(Self {
            date_time: game.metadata.date,
            slippi_version: game.start.slippi_version,
            match_id: game.start.match_id.clone(),
            match_type: game.start.match_type,
            game_number: game.start.game_number,
            stage_id: game.start.stage,
            stage: Stage::try_from(game.start.stage).ok(),
            duration_ms: duration_frames.map(|frames| frames as i64 * 1000 / 60),
            players: players
                .try_into()
                .expect("player count was checked to be exactly 2"),
            frames: &game.frames,
        })
    }

    /// The other player's slot.
    pub fn opponent_of(&self, player: usize) -> &PlayerInfo {
        &self.players[1 - player]
    }

    /// Resolves a port to the identity of whichever of the two players owns
    /// it; ports outside the match fall back to their label.
    pub fn identity_for_port(&self, port: Port) -> String {
        self.players
            .iter()
            .find(|info| info.port == port)
            .map(PlayerInfo::identity)
            .unwrap_or_else(|| port.to_string())
    }
}
