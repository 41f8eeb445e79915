//! Detection records and their flat output rows.
//!
//! Detectors emit [`StatRecord`]s that reference players by slot; the row
//! builders then merge the shared header fields in. Building a row is pure
//! field projection - nothing here computes anything new.

use serde::Serialize;
use slippi_replay::enums::attack::attack_name;
use slippi_replay::enums::character::{character_name, costume_name, CSSCharacter};
use slippi_replay::enums::stage::stage_name;
use slippi_replay::{Port, Position};

use crate::context::GameContext;
use crate::helpers::TechKind;

/// One detection produced by any detector.
#[derive(Debug, Clone)]
pub enum StatRecord {
    Tech(TechEvent),
    Combo(ComboEvent),
}

/// A resolved tech situation for one player. Immutable once emitted.
#[derive(Debug, Clone)]
pub struct TechEvent {
    /// Index into [`GameContext::players`] of the player who teched.
    pub player: usize,
    /// Frame at which the final classification was observed.
    pub frame_index: i32,
    pub stocks_remaining: u8,
    pub kind: TechKind,
    pub was_punished: bool,
    /// Position sampled when the tech animation began.
    pub position: Position,
    pub ground_id: Option<u16>,
    pub is_on_platform: bool,
    pub is_missed_tech: bool,
    /// Roll variants only; `None` for everything else.
    pub towards_center: Option<bool>,
    pub towards_opponent: Option<bool>,
    pub jab_reset: bool,
    /// Port of the last player to hit the teching player.
    pub last_hit_by: Option<Port>,
}

/// One move that connected during a combo.
#[derive(Debug, Clone)]
pub struct MoveLanded {
    pub frame: i32,
    /// Raw attack id.
    pub move_id: u8,
    pub hit_count: u32,
    pub damage: f32,
}

/// A closed combo from one attacker's perspective.
#[derive(Debug, Clone)]
pub struct ComboEvent {
    /// Index into [`GameContext::players`] of the attacker.
    pub player: usize,
    pub start_frame: i32,
    pub end_frame: i32,
    pub start_percent: f32,
    pub end_percent: f32,
    pub moves: Vec<MoveLanded>,
    pub did_kill: bool,
    pub did_end_game: bool,
    pub death_direction: Option<&'static str>,
    pub player_stocks: u8,
    pub opponent_stocks: u8,
}

impl ComboEvent {
    pub fn total_damage(&self) -> f32 {
        self.end_percent - self.start_percent
    }
}

/// The shared header columns every output row carries.
#[derive(Debug, Clone, Serialize)]
struct RowHeader {
    date_time: Option<chrono::DateTime<chrono::Utc>>,
    slippi_version: String,
    match_id: Option<String>,
    match_type: String,
    game_number: Option<u32>,
    stage: String,
    duration: Option<i64>,
    result: String,
    port: String,
    connect_code: Option<String>,
    character: String,
    costume: String,
    opnt_character: String,
}

impl RowHeader {
    fn build(ctx: &GameContext<'_>, player: usize) -> Self {
        let info = &ctx.players[player];
        let opponent = ctx.opponent_of(player);

        let costume = CSSCharacter::try_from(info.character)
            .ok()
            .and_then(|character| costume_name(character, info.costume))
            .map(str::to_string)
            .unwrap_or_else(|| info.costume.to_string());

        Self {
            date_time: ctx.date_time,
            slippi_version: ctx.slippi_version.to_string(),
            match_id: ctx.match_id.clone(),
            match_type: ctx.match_type.to_string(),
            game_number: ctx.game_number,
            stage: stage_name(ctx.stage_id),
            duration: ctx.duration_ms,
            result: info.result.to_string(),
            port: info.port.to_string(),
            connect_code: info.connect_code.clone(),
            character: character_name(info.character),
            costume,
            opnt_character: character_name(opponent.character),
        }
    }
}

/// One flat tech row, ready for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct TechRow {
    #[serde(flatten)]
    header: RowHeader,

    pub frame_index: i32,
    pub stocks_remaining: u8,
    pub tech_type: String,
    pub was_punished: bool,
    /// Legacy roll-direction alias (true = rightward); superseded by the
    /// towards fields and only populated for roll variants.
    pub direction: Option<bool>,
    pub position: (f32, f32),
    pub ground_id: Option<u16>,
    pub is_on_platform: bool,
    pub is_missed_tech: bool,
    pub towards_center: Option<bool>,
    pub towards_opponent: Option<bool>,
    pub jab_reset: bool,
    pub last_hit_by: Option<String>,
}

impl TechRow {
    pub fn build(ctx: &GameContext<'_>, event: &TechEvent) -> Self {
        Self {
            header: RowHeader::build(ctx, event.player),
            frame_index: event.frame_index,
            stocks_remaining: event.stocks_remaining,
            tech_type: event.kind.to_string(),
            was_punished: event.was_punished,
            direction: event.kind.roll_direction(),
            position: (event.position.x, event.position.y),
            ground_id: event.ground_id,
            is_on_platform: event.is_on_platform,
            is_missed_tech: event.is_missed_tech,
            towards_center: event.towards_center,
            towards_opponent: event.towards_opponent,
            jab_reset: event.jab_reset,
            last_hit_by: event.last_hit_by.map(|port| ctx.identity_for_port(port)),
        }
    }

    pub fn port(&self) -> &str {
        &self.header.port
    }

    pub fn connect_code(&self) -> Option<&str> {
        self.header.connect_code.as_deref()
    }

    pub fn character(&self) -> &str {
        &self.header.character
    }

    pub fn stage(&self) -> &str {
        &self.header.stage
    }

    pub fn result(&self) -> &str {
        &self.header.result
    }
}

/// One flat combo row, ready for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct ComboRow {
    #[serde(flatten)]
    header: RowHeader,

    pub start_frame: i32,
    pub end_frame: i32,
    pub start_percent: f32,
    pub end_percent: f32,
    pub total_damage: f32,
    pub move_count: usize,
    /// Move names in landing order.
    pub moves: Vec<String>,
    pub did_kill: bool,
    pub did_end_game: bool,
    pub death_direction: Option<String>,
    pub stocks_remaining: u8,
    pub opnt_stocks_remaining: u8,
}

impl ComboRow {
    pub fn build(ctx: &GameContext<'_>, event: &ComboEvent) -> Self {
        Self {
            header: RowHeader::build(ctx, event.player),
            start_frame: event.start_frame,
            end_frame: event.end_frame,
            start_percent: event.start_percent,
            end_percent: event.end_percent,
            total_damage: event.total_damage(),
            move_count: event.moves.len(),
            moves: event.moves.iter().map(|m| attack_name(m.move_id)).collect(),
            did_kill: event.did_kill,
            did_end_game: event.did_end_game,
            death_direction: event.death_direction.map(str::to_string),
            stocks_remaining: event.player_stocks,
            opnt_stocks_remaining: event.opponent_stocks,
        }
    }

    pub fn port(&self) -> &str {
        &self.header.port
    }

    pub fn character(&self) -> &str {
        &self.header.character
    }
}
