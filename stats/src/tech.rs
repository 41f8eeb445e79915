//! Tech detection.
//!
//! Per player, the scan is a small state machine over the frame sequence:
//! neutral until a tech-family animation starts, then one pending record per
//! contiguous teching period that's reclassified as the animation chain
//! progresses (bounce, lie-down, getup roll, jab reset...), then a short
//! punish watch once the period ends. A knockdown the player dies out of
//! before any tech-family state produces nothing.

use slippi_replay::enums::ground::is_platform;
use slippi_replay::PostFrame;

use crate::context::GameContext;
use crate::detector::StatDetector;
use crate::helpers::{in_hitstun, is_teching, just_took_damage, tech_kind, TechKind};
use crate::records::{StatRecord, TechEvent};

/// How many frames after a tech resolves an opponent's hit still counts as
/// a punish. Half a second covers standard reactions.
pub const DEFAULT_PUNISH_WINDOW: i32 = 30;

#[derive(Debug)]
pub struct TechDetector {
    punish_window: i32,
}

impl Default for TechDetector {
    fn default() -> Self {
        Self {
            punish_window: DEFAULT_PUNISH_WINDOW,
        }
    }
}

impl TechDetector {
    pub fn with_punish_window(window: i32) -> Self {
        Self { punish_window: window }
    }
}

impl StatDetector for TechDetector {
    fn name(&self) -> &'static str {
        "tech"
    }

    fn run(&self, ctx: &GameContext<'_>) -> Vec<StatRecord> {
        let mut records = Vec::new();
        for player in 0..2 {
            self.scan_player(ctx, player, &mut records);
        }
        records
    }
}

/// A pending record for the teching period currently in progress. `kind`
/// stays `None` until a classifiable state shows up; if it never does, the
/// period is dropped without a record.
#[derive(Debug)]
struct PendingTech {
    event: TechEvent,
    kind: Option<TechKind>,
    last_state: Option<u16>,
}

/// A finished record waiting out the punish window before emission.
#[derive(Debug)]
struct PunishWatch {
    event: TechEvent,
    deadline: i32,
}

impl TechDetector {
    fn scan_player(&self, ctx: &GameContext<'_>, player: usize, records: &mut Vec<StatRecord>) {
        let port = ctx.players[player].port.index();
        let opponent_port = ctx.opponent_of(player).port.index();

        let mut pending: Option<PendingTech> = None;
        let mut watch: Option<PunishWatch> = None;

        for i in 1..ctx.frames.len() {
            let frame = &ctx.frames[i];
            let (Some(post), Some(prev_post)) = (frame.post(port), ctx.frames[i - 1].post(port)) else {
                continue;
            };

            if let Some(current) = watch.take() {
                watch = self.advance_watch(current, frame.index, post, prev_post, records);
            }

            let curr_teching = is_teching(post.state);
            let was_teching = is_teching(prev_post.state);

            if !curr_teching {
                // Leaving the tech family closes the period; the record then
                // sits in the punish watch until the window lapses.
                if was_teching {
                    if let Some(done) = pending.take() {
                        if let Some(kind) = done.kind {
                            let mut event = done.event;
                            event.kind = kind;
                            if let Some(current) = watch.take() {
                                records.push(StatRecord::Tech(current.event));
                            }
                            watch = Some(PunishWatch {
                                event,
                                deadline: frame.index + self.punish_window,
                            });
                        }
                    }
                }
                continue;
            }

            let Some(opponent_post) = frame.post(opponent_port) else {
                continue;
            };

            if !was_teching {
                pending = Some(self.open_period(ctx, player, frame.index, post));
            }

            let Some(current) = pending.as_mut() else { continue };

            // Only state transitions can reclassify; holding one animation
            // across frames changes nothing.
            if current.last_state == Some(post.state) {
                continue;
            }
            current.last_state = Some(post.state);

            let Some(kind) = tech_kind(post.state, post.facing) else {
                // Unclassifiable id (unused engine state or unknown): pass
                // through without touching the record.
                continue;
            };

            current.kind = Some(kind);
            current.event.frame_index = frame.index;

            match kind {
                _ if kind.is_missed() => {
                    current.event.is_missed_tech = true;
                    current.event.jab_reset = false;
                },
                TechKind::JabReset => {
                    current.event.jab_reset = true;
                },
                _ => {},
            }

            if let Some(rolls_right) = kind.roll_direction() {
                let x = post.position.x;
                let opponent_dx = opponent_post.position.x - x;

                // Stage center sits at x = 0; a roll is toward it when the
                // lateral direction opposes the player's side of the stage.
                current.event.towards_center = Some(if rolls_right { x < 0.0 } else { x > 0.0 });
                current.event.towards_opponent = Some(if rolls_right {
                    opponent_dx > 0.0
                } else {
                    opponent_dx < 0.0
                });
            }
        }

        // Stream over: anything still pending goes out as-is. The punish
        // window can't be observed past the last frame, so it stays false.
        if let Some(current) = watch.take() {
            records.push(StatRecord::Tech(current.event));
        }
        if let Some(done) = pending.take() {
            if let Some(kind) = done.kind {
                let mut event = done.event;
                event.kind = kind;
                records.push(StatRecord::Tech(event));
            }
        }
    }

    fn open_period(&self, ctx: &GameContext<'_>, player: usize, frame_index: i32, post: &PostFrame) -> PendingTech {
        let grounded = !post.is_airborne.unwrap_or(false);
        let on_platform = match (grounded, ctx.stage, post.last_ground_id) {
            (true, Some(stage), Some(ground_id)) => is_platform(stage, ground_id),
            _ => None,
        }
        // Uncovered stage or missing ground data: fall back to height.
        .unwrap_or(post.position.y > 5.0);

        PendingTech {
            event: TechEvent {
                player,
                frame_index,
                stocks_remaining: post.stocks,
                // Placeholder until the first classifiable state; unset kinds
                // never leave this function's caller.
                kind: TechKind::MissedTech,
                was_punished: false,
                position: post.position,
                ground_id: post.last_ground_id,
                is_on_platform: on_platform,
                is_missed_tech: false,
                towards_center: None,
                towards_opponent: None,
                jab_reset: false,
                last_hit_by: post.last_hit_by,
            },
            kind: None,
            last_state: None,
        }
    }

    /// Steps the punish watch by one frame: emits the record punished if the
    /// opponent connected, unpunished once the window lapses or the player
    /// loses a stock, and keeps waiting otherwise.
    fn advance_watch(
        &self,
        mut watch: PunishWatch,
        frame_index: i32,
        post: &PostFrame,
        prev_post: &PostFrame,
        records: &mut Vec<StatRecord>,
    ) -> Option<PunishWatch> {
        let got_hit = just_took_damage(post.percent, prev_post.percent)
            || (in_hitstun(post.flags) && !in_hitstun(prev_post.flags));

        if got_hit {
            watch.event.was_punished = true;
            if let Some(hit_by) = post.last_hit_by {
                watch.event.last_hit_by = Some(hit_by);
            }
            records.push(StatRecord::Tech(watch.event));
            return None;
        }

        if post.stocks < prev_post.stocks || frame_index >= watch.deadline {
            records.push(StatRecord::Tech(watch.event));
            return None;
        }

        Some(watch)
    }
}
