//! The trailing metadata element: everything the recorder knows that the
//! game itself doesn't emit, like wall-clock time and connect codes.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::errors::ReplayError;
use crate::events::FIRST_FRAME_INDEX;
use crate::Log;

/// Where a replay was recorded.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Platform {
    Console,
    Dolphin,
    Network,
    Nintendont,
}

impl Platform {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "console" => Some(Self::Console),
            "dolphin" => Some(Self::Dolphin),
            "network" => Some(Self::Network),
            "nintendont" => Some(Self::Nintendont),
            _ => None,
        }
    }
}

/// Per-port recorder metadata.
#[derive(Debug, Clone)]
pub struct MetadataPlayer {
    /// Character usage in frames, keyed by raw in-game character id. More
    /// than one entry only happens for Zelda/Sheik.
    pub characters: Vec<(u8, i64)>,
    /// Stable netplay identity in the usual "CODE#123" shape.
    pub connect_code: Option<String>,
    pub display_name: Option<String>,
}

/// Miscellaneous data not directly provided by the game.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Game start wall-clock time. Absent on recorders that never wrote
    /// `startAt`.
    pub date: Option<DateTime<Utc>>,
    /// Total duration in frames, counting the pre-GO frames; this will not
    /// match the in-game timer.
    pub duration_frames: Option<i32>,
    pub platform: Option<Platform>,
    pub console_name: Option<String>,
    /// Player metadata by port; empty ports are `None`.
    pub players: [Option<MetadataPlayer>; 4],
}

impl Metadata {
    /// Builds a `Metadata` from the parsed UBJSON element.
    ///
    /// Optional keys default quietly. The player map is the one mandatory
    /// piece: without it, stats have no identities to attach records to.
    pub fn parse(json: &Value) -> Result<Self, ReplayError> {
        let date = json
            .get("startAt")
            .and_then(Value::as_str)
            .and_then(|raw| {
                let parsed = parse_start_at(raw);
                if parsed.is_none() {
                    tracing::warn!(target: Log::Metadata, "unparseable startAt timestamp: {raw:?}");
                }
                parsed
            });

        let duration_frames = json
            .get("lastFrame")
            .and_then(Value::as_i64)
            .map(|last| 1 + last as i32 - FIRST_FRAME_INDEX);

        let platform = json.get("playedOn").and_then(Value::as_str).and_then(Platform::from_key);

        let console_name = json
            .get("consoleNick")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut players: [Option<MetadataPlayer>; 4] = [None, None, None, None];
        let player_map = json
            .get("players")
            .and_then(Value::as_object)
            .ok_or(ReplayError::MissingMetadata("players"))?;

        for (port_key, player_json) in player_map {
            let Ok(port) = port_key.parse::<usize>() else {
                continue;
            };
            if port >= 4 {
                continue;
            }
            players[port] = Some(parse_player(player_json));
        }

        if players.iter().all(Option::is_none) {
            return Err(ReplayError::MissingMetadata("players"));
        }

        Ok(Self {
            date,
            duration_frames,
            platform,
            console_name,
            players,
        })
    }
}

fn parse_player(json: &Value) -> MetadataPlayer {
    let mut characters = Vec::new();
    if let Some(map) = json.get("characters").and_then(Value::as_object) {
        for (char_id, duration) in map {
            if let (Ok(id), Some(frames)) = (char_id.parse::<u8>(), duration.as_i64()) {
                characters.push((id, frames));
            }
        }
        characters.sort();
    }

    let names = json.get("names");
    let connect_code = names
        .and_then(|n| n.get("code"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let display_name = names
        .and_then(|n| n.get("netplay"))
        .and_then(Value::as_str)
        .map(str::to_string);

    MetadataPlayer {
        characters,
        connect_code,
        display_name,
    }
}

/// Parses a `startAt` timestamp.
///
/// Timezone and fractional seconds aren't always present, and Nintendont /
/// Slippi < 1.5 pad the string with NULs, so this walks a few formats
/// instead of insisting on RFC 3339.
fn parse_start_at(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim_end_matches('\0').trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"] {
        if let Ok(parsed) = DateTime::parse_from_str(trimmed, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    // No timezone at all: the recorder wrote local-naive or UTC-naive time.
    // UTC is the least-wrong assumption.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed.and_utc());
        }
    }

    None
}
