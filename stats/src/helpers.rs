//! Action-state family predicates and classification tables.
//!
//! Everything here works on raw action-state ids so that ids outside the
//! enumerated set (character-specific states, future engine revisions) fall
//! through as no-ops instead of failing a pass.

use slippi_replay::enums::action_state::ranges;
use slippi_replay::enums::{ActionState, Stage};
use slippi_replay::{Frame, Position, StateFlags};
use strum::Display;

/// Percent values wobble by float error across rollbacks; anything below
/// this threshold is "no change".
const DAMAGE_EPSILON: f32 = 1e-3;

pub fn just_took_damage(percent: f32, prev_percent: f32) -> bool {
    percent > prev_percent + DAMAGE_EPSILON
}

pub fn damage_taken(percent: f32, prev_percent: f32) -> f32 {
    let delta = percent - prev_percent;
    if delta > DAMAGE_EPSILON {
        delta
    } else {
        0.0
    }
}

/// Generic damage animations, plus the jab-reset states so combo counting
/// doesn't drop them when hitstun flags are unavailable.
pub fn is_damaged(state: u16) -> bool {
    (ranges::DAMAGE_START..=ranges::DAMAGE_END).contains(&state)
        || state == ActionState::DownDamageU as u16
        || state == ActionState::DownDamageD as u16
}

pub fn in_hitstun(flags: Option<StateFlags>) -> bool {
    // Replays predating the state flags never report hitstun.
    flags.is_some_and(|f| f.in_hitstun())
}

pub fn in_hitlag(flags: Option<StateFlags>) -> bool {
    flags.is_some_and(|f| f.in_hitlag())
}

pub fn is_grabbed(state: u16) -> bool {
    (ranges::CAPTURE_START..=ranges::CAPTURE_END).contains(&state)
}

/// Command grabs: Falcon up B, Kirby swallow, cargo carry, bury, sing, and
/// friends.
pub fn is_cmd_grabbed(state: u16) -> bool {
    ((ranges::COMMAND_GRAB_RANGE1_START..=ranges::COMMAND_GRAB_RANGE1_END).contains(&state)
        || (ranges::COMMAND_GRAB_RANGE2_START..=ranges::COMMAND_GRAB_RANGE2_END).contains(&state))
        && state != ActionState::BarrelWait as u16
}

/// The tech-family states: every ground/wall/ceiling tech animation plus the
/// downed states and the untechable wall/ceiling rebounds.
pub fn is_teching(state: u16) -> bool {
    (ranges::TECH_START..=ranges::TECH_END).contains(&state)
        || (ranges::DOWN_START..=ranges::DOWN_END).contains(&state)
        || state == ActionState::FlyReflectCeil as u16
        || state == ActionState::FlyReflectWall as u16
}

pub fn is_downed(state: u16) -> bool {
    (ranges::DOWN_START..=ranges::DOWN_END).contains(&state)
}

pub fn is_dying(state: u16) -> bool {
    (ranges::DYING_START..=ranges::DYING_END).contains(&state)
}

pub fn is_shielding(state: u16) -> bool {
    (ranges::GUARD_START..=ranges::GUARD_END).contains(&state)
}

pub fn is_shield_broken(state: u16) -> bool {
    (ranges::GUARD_BREAK_START..=ranges::GUARD_BREAK_END).contains(&state)
}

/// Shielded escape options: rolls, spot dodge, airdodge.
pub fn is_dodging(state: u16) -> bool {
    (ranges::DODGE_START..=ranges::DODGE_END).contains(&state)
}

pub fn is_ledge_action(state: u16) -> bool {
    (ranges::LEDGE_ACTION_START..=ranges::LEDGE_ACTION_END).contains(&state)
}

pub fn is_special_fall(state: u16) -> bool {
    (ranges::FALL_SPECIAL_START..=ranges::FALL_SPECIAL_END).contains(&state)
}

pub fn is_upb_lag(state: u16, prev_state: u16) -> bool {
    state == ActionState::LandFallSpecial as u16
        && prev_state != ActionState::LandFallSpecial as u16
        && prev_state != ActionState::KneeBend as u16
        && prev_state != ActionState::EscapeAir as u16
        && (prev_state <= ranges::CONTROLLED_JUMP_START || prev_state >= ranges::CONTROLLED_JUMP_END)
}

pub fn did_lose_stock(stocks: u8, prev_stocks: u8) -> bool {
    prev_stocks > stocks
}

/// An airdodge that's actually the tail of a wavedash: `EscapeAir` with a
/// special landing within the last few frames.
pub fn is_wavedashing(state: u16, port: usize, index: usize, frames: &[Frame]) -> bool {
    if state != ActionState::EscapeAir as u16 {
        return false;
    }
    for back in 1..4 {
        let Some(prior) = index.checked_sub(back).and_then(|i| frames.get(i)) else {
            break;
        };
        if prior
            .post(port)
            .is_some_and(|post| post.state == ActionState::LandFallSpecial as u16)
        {
            return true;
        }
    }
    false
}

/// Whether the player is beyond the stage's on-stage x bounds (or below the
/// stage lip). Bounds are pinned for tournament stages only; anywhere else
/// this stays false.
pub fn is_offstage(position: Position, stage: Option<Stage>) -> bool {
    if position.y < -5.0 {
        return true;
    }

    let half_width = match stage {
        Some(Stage::FountainOfDreams) => 64.0,
        Some(Stage::YoshisStory) => 56.0,
        Some(Stage::DreamLandN64) => 73.0,
        Some(Stage::PokemonStadium) => 88.0,
        Some(Stage::Battlefield) => 67.0,
        Some(Stage::FinalDestination) => 89.0,
        _ => return false,
    };

    position.x < -half_width || position.x > half_width
}

/// Above the stage's top-platform height while airborne: probably getting
/// juggled.
pub fn is_maybe_juggled(position: Position, is_airborne: Option<bool>, stage: Option<Stage>) -> bool {
    if !is_airborne.unwrap_or(false) {
        return false;
    }

    let ceiling = match stage {
        Some(Stage::FountainOfDreams) => 42.0,
        Some(Stage::YoshisStory) => 42.0,
        Some(Stage::DreamLandN64) => 51.0,
        Some(Stage::PokemonStadium) => 42.0,
        Some(Stage::Battlefield) => 54.0,
        Some(Stage::FinalDestination) => 35.0,
        _ => return false,
    };

    position.y >= ceiling
}

pub fn death_direction(state: u16) -> Option<&'static str> {
    match state {
        0 => Some("BOTTOM"),
        1 => Some("LEFT"),
        2 => Some("RIGHT"),
        3..=10 => Some("TOP"),
        _ => None,
    }
}

/// Closed classification of how a tech situation resolved.
#[derive(Debug, Display, PartialEq, Eq, Copy, Clone)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TechKind {
    TechInPlace,
    TechLeft,
    TechRight,
    GetUpAttack,
    MissedTech,
    WallTech,
    WallJumpTech,
    CeilingTech,
    MissedWallTech,
    MissedCeilingTech,
    JabReset,
    MissedTechGetUp,
    MissedTechRollLeft,
    MissedTechRollRight,
}

impl TechKind {
    pub fn is_missed(self) -> bool {
        matches!(self, Self::MissedTech | Self::MissedWallTech | Self::MissedCeilingTech)
    }

    /// `Some(rolled_right)` for the four roll variants, `None` otherwise.
    pub fn roll_direction(self) -> Option<bool> {
        match self {
            Self::TechRight | Self::MissedTechRollRight => Some(true),
            Self::TechLeft | Self::MissedTechRollLeft => Some(false),
            _ => None,
        }
    }
}

/// The fixed action-state id to tech classification table. Directional
/// animations are recorded relative to facing, so the facing sign picks
/// between left and right.
pub fn tech_kind(state: u16, facing: f32) -> Option<TechKind> {
    let state = ActionState::try_from(state).ok()?;
    let facing_right = facing > 0.0;

    match state {
        ActionState::Passive => Some(TechKind::TechInPlace),
        ActionState::DownStandU | ActionState::DownStandD => Some(TechKind::MissedTechGetUp),

        // "Stand forward" techs roll in the facing direction.
        ActionState::PassiveStandF => Some(if facing_right { TechKind::TechRight } else { TechKind::TechLeft }),
        ActionState::DownFowardU | ActionState::DownFowardD => Some(if facing_right {
            TechKind::MissedTechRollRight
        } else {
            TechKind::MissedTechRollLeft
        }),

        ActionState::PassiveStandB => Some(if facing_right { TechKind::TechLeft } else { TechKind::TechRight }),
        ActionState::DownBackU | ActionState::DownBackD => Some(if facing_right {
            TechKind::MissedTechRollLeft
        } else {
            TechKind::MissedTechRollRight
        }),

        ActionState::DownAttackU | ActionState::DownAttackD => Some(TechKind::GetUpAttack),

        ActionState::DownBoundU | ActionState::DownBoundD | ActionState::DownWaitU | ActionState::DownWaitD => {
            Some(TechKind::MissedTech)
        },

        ActionState::DownDamageU | ActionState::DownDamageD => Some(TechKind::JabReset),

        ActionState::PassiveWall => Some(TechKind::WallTech),
        ActionState::PassiveWallJump => Some(TechKind::WallJumpTech),
        ActionState::PassiveCeil => Some(TechKind::CeilingTech),
        ActionState::FlyReflectWall => Some(TechKind::MissedWallTech),
        ActionState::FlyReflectCeil => Some(TechKind::MissedCeilingTech),

        _ => None,
    }
}
