//! In-memory game construction for detector tests: Fox (P1, "FOX#123") vs
//! Falco (P2, "BIRD#456") on Yoshi's Story, P1 winning.

use chrono::TimeZone;
use slippi_replay::events::{MatchType, PlayerSetup, PlayerType, UcfToggles};
use slippi_replay::frames::{PlayerData, PortFrame};
use slippi_replay::metadata::MetadataPlayer;
use slippi_replay::{
    EndMethod, Frame, Game, GameEnd, GameStart, Metadata, Platform, Port, Position, PostFrame, SlippiVersion,
    StateFlags, FIRST_FRAME_INDEX,
};

/// A post-frame snapshot with sane defaults: standing at origin, facing
/// right, 0%, 4 stocks, grounded on the main stage.
pub fn post(port: Port, state: u16) -> PostFrame {
    PostFrame {
        frame: 0,
        port,
        is_follower: false,
        character: 2,
        state,
        position: Position::new(0.0, 0.0),
        facing: 1.0,
        percent: 0.0,
        shield: 60.0,
        last_attack_landed: 0,
        combo_count: 0,
        last_hit_by: None,
        stocks: 4,
        state_age: Some(1.0),
        flags: Some(StateFlags([0; 5])),
        misc_timer: Some(0.0),
        is_airborne: Some(false),
        last_ground_id: Some(3),
        jumps: Some(2),
        l_cancel: Some(0),
        hurtbox_status: Some(0),
        self_ground_speed: None,
        self_air_speed: None,
        knockback_speed: None,
        hitlag_remaining: None,
        animation_index: None,
    }
}

/// Builds the frame sequence from two per-index scripts, covering frame
/// indices from the game start up to `last_index` inclusive.
pub fn scripted_frames(
    last_index: i32,
    p1: impl Fn(i32) -> PostFrame,
    p2: impl Fn(i32) -> PostFrame,
) -> Vec<Frame> {
    (FIRST_FRAME_INDEX..=last_index)
        .map(|index| {
            let mut p1_post = p1(index);
            p1_post.frame = index;
            p1_post.port = Port::P1;
            let mut p2_post = p2(index);
            p2_post.frame = index;
            p2_post.port = Port::P2;

            let mut ports: [Option<PortFrame>; 4] = Default::default();
            ports[0] = Some(PortFrame {
                leader: PlayerData {
                    pre: None,
                    post: Some(p1_post),
                },
                follower: None,
            });
            ports[1] = Some(PortFrame {
                leader: PlayerData {
                    pre: None,
                    post: Some(p2_post),
                },
                follower: None,
            });

            Frame {
                index,
                ports,
                items: Vec::new(),
                start: None,
                end: None,
            }
        })
        .collect()
}

fn setup(port: Port, character: u8) -> PlayerSetup {
    PlayerSetup {
        port,
        character,
        kind: PlayerType::Human,
        stocks: 4,
        costume: 0,
        team: None,
        ucf: UcfToggles::default(),
        tag: None,
    }
}

fn meta_player(code: &str, name: &str, character: u8, frames: i64) -> MetadataPlayer {
    MetadataPlayer {
        characters: vec![(character, frames)],
        connect_code: Some(code.to_string()),
        display_name: Some(name.to_string()),
    }
}

/// Wraps a frame sequence in a complete parsed game.
pub fn game(frames: Vec<Frame>) -> Game {
    let duration = frames.len() as i32;

    Game {
        start: GameStart {
            slippi_version: SlippiVersion::new(3, 16, 0),
            is_teams: false,
            stage: 8, // Yoshi's Story
            players: [Some(setup(Port::P1, 2)), Some(setup(Port::P2, 20)), None, None],
            random_seed: 0x1234_5678,
            is_pal: Some(false),
            is_frozen_ps: Some(false),
            match_id: Some("mode.ranked-2023-01-12T00:43:55.00-0".to_string()),
            match_type: MatchType::Ranked,
            game_number: Some(1),
            tiebreak_number: None,
        },
        end: Some(GameEnd {
            method: EndMethod::Game,
            lras_initiator: None,
            player_placements: Some([0, 1, -1, -1]),
        }),
        frames,
        metadata: Metadata {
            date: Some(chrono::Utc.with_ymd_and_hms(2023, 1, 12, 0, 43, 55).unwrap()),
            duration_frames: Some(duration),
            platform: Some(Platform::Dolphin),
            console_name: None,
            players: [
                Some(meta_player("FOX#123", "fox main", 1, duration as i64)),
                Some(meta_player("BIRD#456", "bird main", 22, duration as i64)),
                None,
                None,
            ],
        },
        metadata_raw: serde_json::json!({}),
    }
}

/// A game where one port never joined, for the player-count guard.
pub fn one_player_game() -> Game {
    let frames = scripted_frames(0, |_| post(Port::P1, 14), |_| post(Port::P2, 14));
    let mut game = game(frames);
    game.start.players[1] = None;
    game
}
