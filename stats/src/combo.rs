//! Combo detection.
//!
//! Per attacker, an open combo accumulates moves while the defender stays in
//! any extending situation (hitstun, hitlag, grabs, teching, shield
//! pressure, offstage, juggled...); otherwise a leniency counter ticks up
//! and the combo closes when it lapses, or immediately when either player
//! loses a stock. Move boundaries come from the attacker's animation
//! changing between hits, not just the attack id - two identical fast jabs
//! are two moves.

use crate::context::GameContext;
use crate::detector::StatDetector;
use crate::helpers::{
    damage_taken, death_direction, did_lose_stock, in_hitlag, in_hitstun, is_cmd_grabbed, is_damaged, is_dodging,
    is_dying, is_grabbed, is_ledge_action, is_maybe_juggled, is_offstage, is_shield_broken, is_shielding,
    is_special_fall, is_teching, is_upb_lag, is_wavedashing,
};
use crate::records::{ComboEvent, MoveLanded, StatRecord};

/// Frames the defender can be fully actionable before an open combo closes.
pub const COMBO_LENIENCY: i32 = 45;

/// Combos shorter than this many moves aren't worth a record.
pub const DEFAULT_MIN_MOVES: usize = 2;

#[derive(Debug)]
pub struct ComboDetector {
    min_moves: usize,
}

impl Default for ComboDetector {
    fn default() -> Self {
        Self {
            min_moves: DEFAULT_MIN_MOVES,
        }
    }
}

impl ComboDetector {
    pub fn with_min_moves(min_moves: usize) -> Self {
        Self { min_moves }
    }
}

impl StatDetector for ComboDetector {
    fn name(&self) -> &'static str {
        "combo"
    }

    fn run(&self, ctx: &GameContext<'_>) -> Vec<StatRecord> {
        let mut records = Vec::new();
        for player in 0..2 {
            self.scan_attacker(ctx, player, &mut records);
        }
        records
    }
}

impl ComboDetector {
    fn scan_attacker(&self, ctx: &GameContext<'_>, player: usize, records: &mut Vec<StatRecord>) {
        let port = ctx.players[player].port.index();
        let defender_port = ctx.opponent_of(player).port.index();

        let mut combo: Option<ComboEvent> = None;
        let mut reset_counter: i32 = 0;
        // The attacker animation that landed the last hit; cleared when the
        // animation changes or restarts so the next hit opens a new move.
        let mut last_hit_animation: Option<u16> = None;

        for i in 1..ctx.frames.len() {
            let frame = &ctx.frames[i];
            let prev = &ctx.frames[i - 1];

            let (Some(post), Some(prev_post)) = (frame.post(port), prev.post(port)) else {
                continue;
            };
            let (Some(defender), Some(prev_defender)) = (frame.post(defender_port), prev.post(defender_port)) else {
                continue;
            };

            let defender_state = defender.state;
            let defender_damaged = is_damaged(defender_state);
            let defender_in_hitstun = in_hitstun(defender.flags);
            let defender_grabbed = is_grabbed(defender_state);
            let defender_cmd_grabbed = is_cmd_grabbed(defender_state);
            let defender_damage_taken = damage_taken(defender.percent, prev_defender.percent);

            // Track whether the attacker's action changed since the last
            // hit; the state-age counter catches same-move restarts that a
            // bare state comparison misses.
            let action_changed = Some(post.state) != last_hit_animation;
            let action_restarted = match (post.state_age, prev_post.state_age) {
                (Some(age), Some(prev_age)) => age < prev_age,
                _ => false,
            };
            if action_changed || action_restarted {
                last_hit_animation = None;
            }

            if defender_damaged || defender_grabbed || defender_cmd_grabbed || defender_in_hitstun {
                if combo.is_none() {
                    combo = Some(ComboEvent {
                        player,
                        start_frame: frame.index,
                        end_frame: frame.index,
                        start_percent: prev_defender.percent,
                        end_percent: defender.percent,
                        moves: Vec::new(),
                        did_kill: false,
                        did_end_game: false,
                        death_direction: None,
                        player_stocks: post.stocks,
                        opponent_stocks: defender.stocks,
                    });
                }

                if defender_damage_taken > 0.0 {
                    let current = combo.as_mut().expect("combo opened above");

                    if last_hit_animation.is_none() {
                        current.moves.push(MoveLanded {
                            frame: frame.index,
                            move_id: post.last_attack_landed,
                            hit_count: 0,
                            damage: 0.0,
                        });
                    }
                    if let Some(landed) = current.moves.last_mut() {
                        landed.hit_count += 1;
                        landed.damage += defender_damage_taken;
                    }

                    last_hit_animation = Some(prev_post.state);
                }
            }

            let Some(current) = combo.as_mut() else { continue };

            let defender_lost_stock = did_lose_stock(defender.stocks, prev_defender.stocks);
            if !defender_lost_stock {
                current.end_percent = defender.percent;
            }

            // The extension conditions, broadened past raw hitstun so shield
            // pressure and edgeguards stay part of one combo.
            let extending = defender_damaged
                || defender_grabbed
                || defender_cmd_grabbed
                || in_hitlag(defender.flags)
                || defender_in_hitstun
                || is_shielding(defender_state)
                || is_offstage(defender.position, ctx.stage)
                || (is_dodging(defender_state) && !is_wavedashing(defender_state, defender_port, i, ctx.frames))
                || is_dying(defender_state)
                || is_teching(defender_state)
                || is_ledge_action(defender_state)
                || is_shield_broken(defender_state)
                || is_maybe_juggled(defender.position, defender.is_airborne, ctx.stage)
                || is_special_fall(defender_state)
                || is_upb_lag(defender_state, prev_defender.state);

            if extending {
                reset_counter = 0;
            } else {
                reset_counter += 1;
            }

            let mut should_terminate = false;

            if is_dying(defender_state) {
                current.death_direction = death_direction(defender_state);
            }

            if defender_lost_stock {
                current.did_kill = true;
                if defender.stocks == 0 {
                    current.did_end_game = true;
                }
                should_terminate = true;
            }

            if reset_counter > COMBO_LENIENCY || did_lose_stock(post.stocks, prev_post.stocks) {
                should_terminate = true;
            }

            if should_terminate {
                let mut done = combo.take().expect("combo checked above");
                done.end_frame = frame.index;
                // The defender's percent one frame back, so a kill's reset
                // to zero doesn't zero the combo's damage.
                done.end_percent = prev_defender.percent;

                self.emit(done, records);
                reset_counter = 0;
                last_hit_animation = None;
            }
        }

        // Recording stopped mid-combo: close it at the final frame.
        if let Some(mut done) = combo.take() {
            if let Some(last) = ctx.frames.last() {
                done.end_frame = last.index;
            }
            self.emit(done, records);
        }
    }

    fn emit(&self, combo: ComboEvent, records: &mut Vec<StatRecord>) {
        if combo.moves.len() >= self.min_moves {
            records.push(StatRecord::Combo(combo));
        }
    }
}
