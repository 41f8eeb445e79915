//! Typed decoding of the replay event stream.
//!
//! The stream is self-describing: the first event is always an Event
//! Payloads table mapping each command byte to its payload length for this
//! file's recorder version. [`EventStream`] walks the raw stream using that
//! table without interpreting payloads; the typed `parse` constructors on
//! each event decode the payload layouts, defaulting fields that only exist
//! in newer replay versions.

use num_enum::TryFromPrimitive;
use strum::Display;

use crate::errors::ReplayError;
use crate::reader::Reader;
use crate::Log;

/// The first frame of the game is indexed -123, counting up to zero (which
/// is when "GO" appears). Players gain control before frame zero, so these
/// frames carry real data.
pub const FIRST_FRAME_INDEX: i32 = -123;

/// The oldest replay revision the pipeline accepts. Anything older lacks the
/// post-frame state flags the detectors key off of.
pub const MINIMUM_VERSION: SlippiVersion = SlippiVersion {
    major: 2,
    minor: 0,
    revision: 0,
};

/// Event command bytes that can appear in a replay's `raw` element.
#[derive(Debug, PartialEq, Eq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum EventType {
    MessageSplitter = 0x10,
    EventPayloads = 0x35,
    GameStart = 0x36,
    FramePre = 0x37,
    FramePost = 0x38,
    GameEnd = 0x39,
    FrameStart = 0x3A,
    Item = 0x3B,
    FrameBookend = 0x3C,
    GeckoList = 0x3D,
}

/// Controller ports, 0-indexed.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum Port {
    P1 = 0,
    P2 = 1,
    P3 = 2,
    P4 = 3,
}

impl Port {
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", *self as u8 + 1)
    }
}

#[derive(Debug, Default, PartialEq, Copy, Clone, serde::Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Default, PartialEq, Copy, Clone, serde::Serialize)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

impl Velocity {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise sum; self-induced and knockback speeds combine into
    /// total velocity this way.
    pub fn add(self, other: Velocity) -> Velocity {
        Velocity::new(self.x + other.x, self.y + other.y)
    }
}

/// The recorder version that produced a replay, from the Game Start payload.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct SlippiVersion {
    pub major: u8,
    pub minor: u8,
    pub revision: u8,
}

impl SlippiVersion {
    pub fn new(major: u8, minor: u8, revision: u8) -> Self {
        Self { major, minor, revision }
    }
}

impl std::fmt::Display for SlippiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

/// The self-describing payload-size table from the Event Payloads event.
#[derive(Debug, Clone)]
pub struct PayloadSizes {
    sizes: [Option<u16>; 256],
}

impl PayloadSizes {
    /// Parses the Event Payloads event at the reader's position. Returns the
    /// table; the reader is left at the first real event.
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self, ReplayError> {
        let offset = reader.offset();
        let code = reader.u8()?;
        if code != EventType::EventPayloads as u8 {
            return Err(ReplayError::malformed(
                offset,
                format!("expected event payloads (0x35), but got 0x{code:02x}"),
            ));
        }

        // The declared size includes the size byte itself.
        let Some(size) = (reader.u8()? as usize).checked_sub(1) else {
            return Err(ReplayError::malformed(offset, "empty event payloads table"));
        };
        if size % 3 != 0 {
            return Err(ReplayError::malformed(offset, format!("payload size not divisible by 3: {size}")));
        }

        let mut sizes = [None; 256];
        for _ in 0..size / 3 {
            let code = reader.u8()?;
            let payload_size = reader.u16()?;
            sizes[code as usize] = Some(payload_size);

            if EventType::try_from(code).is_err() {
                tracing::trace!(target: Log::Parser, "ignoring unknown event type: 0x{code:02x}");
            }
        }

        Ok(Self { sizes })
    }

    pub fn get(&self, code: u8) -> Option<u16> {
        self.sizes[code as usize]
    }
}

/// One undecoded event: its command byte, payload bytes, and the absolute
/// offset of the command byte within the raw element.
#[derive(Debug, Copy, Clone)]
pub struct RawEvent<'a> {
    pub code: u8,
    pub payload: &'a [u8],
    pub offset: usize,
}

/// Lazy, forward-only walk over the raw event stream. Terminates after the
/// Game End event, or at end-of-buffer.
#[derive(Debug)]
pub struct EventStream<'a> {
    reader: Reader<'a>,
    sizes: PayloadSizes,
    done: bool,
}

impl<'a> EventStream<'a> {
    pub fn new(reader: Reader<'a>, sizes: PayloadSizes) -> Self {
        Self {
            reader,
            sizes,
            done: false,
        }
    }

    /// Bytes consumed so far, relative to the reader's base.
    pub fn consumed(&self) -> usize {
        self.reader.offset()
    }

    pub fn saw_game_end(&self) -> bool {
        self.done
    }
}

impl<'a> Iterator for EventStream<'a> {
    type Item = Result<RawEvent<'a>, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.reader.is_empty() {
            return None;
        }

        let offset = self.reader.offset();
        let code = match self.reader.u8() {
            Ok(code) => code,
            Err(err) => return Some(Err(err)),
        };

        let size = match self.sizes.get(code) {
            Some(size) => size as usize,
            None => {
                return Some(Err(ReplayError::malformed(
                    offset,
                    format!("unexpected event type: 0x{code:02x}"),
                )))
            },
        };

        let payload = match self.reader.take(size) {
            Ok(payload) => payload,
            Err(err) => return Some(Err(err)),
        };

        if code == EventType::GameEnd as u8 {
            self.done = true;
        }

        Some(Ok(RawEvent { code, payload, offset }))
    }
}

// ---------------------------------------------------------------------------
// Game Start
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum PlayerType {
    Human = 0,
    Cpu = 1,
    Demo = 2,
    Empty = 3,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum Team {
    Red = 0,
    Blue = 1,
    Green = 2,
}

#[derive(Debug, Default, PartialEq, Eq, Copy, Clone, TryFromPrimitive)]
#[repr(u32)]
pub enum UcfToggle {
    #[default]
    Off = 0,
    Ucf = 1,
    Arduino = 2,
}

#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub struct UcfToggles {
    pub dash_back: UcfToggle,
    pub shield_drop: UcfToggle,
}

/// Per-port player block from the Game Start payload.
#[derive(Debug, Clone)]
pub struct PlayerSetup {
    pub port: Port,
    /// Raw character-select-screen character id.
    pub character: u8,
    pub kind: PlayerType,
    pub stocks: u8,
    pub costume: u8,
    pub team: Option<Team>,
    pub ucf: UcfToggles,
    /// In-game name tag, decoded from Shift-JIS.
    pub tag: Option<String>,
}

#[derive(Debug, Display, PartialEq, Eq, Copy, Clone)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    Offline,
    Ranked,
    Unranked,
    Direct,
    Other,
}

/// Information used to initialize the game: mode, settings, characters, and
/// stage.
#[derive(Debug, Clone)]
pub struct GameStart {
    pub slippi_version: SlippiVersion,
    pub is_teams: bool,
    /// Raw stage id; see [`crate::enums::Stage`].
    pub stage: u16,
    pub players: [Option<PlayerSetup>; 4],
    pub random_seed: u32,
    pub is_pal: Option<bool>,
    pub is_frozen_ps: Option<bool>,
    pub match_id: Option<String>,
    pub match_type: MatchType,
    pub game_number: Option<u32>,
    pub tiebreak_number: Option<u32>,
}

impl GameStart {
    pub fn parse(payload: &[u8], offset: usize) -> Result<Self, ReplayError> {
        let mut r = Reader::with_base(payload, offset);

        let major = r.u8()?;
        let minor = r.u8()?;
        let revision = r.u8()?;
        r.skip(1)?; // build number, obsoleted in 2.0.0 and never nonzero
        let slippi_version = SlippiVersion::new(major, minor, revision);

        if slippi_version < MINIMUM_VERSION {
            return Err(ReplayError::UnsupportedVersion(slippi_version));
        }

        r.skip(8)?; // game bitfields
        let is_teams = r.bool()?;
        r.skip(5)?; // item spawn behavior, self destruct score value
        let stage = r.u16()?;
        r.skip(80)?; // game timer, item spawn bitfields, damage ratio

        let mut players: [Option<PlayerSetup>; 4] = [None, None, None, None];
        for slot in 0..4u8 {
            let character = r.u8()?;
            let kind = r.u8()?;
            let stocks = r.u8()?;
            let costume = r.u8()?;
            r.skip(5)?; // team shade, handicap
            let team = r.u8()?;
            r.skip(26)?; // remainder of the player-specific game info

            let kind = PlayerType::try_from(kind).ok();
            if let Some(kind) = kind {
                if kind != PlayerType::Empty {
                    players[slot as usize] = Some(PlayerSetup {
                        port: Port::try_from(slot).expect("slot is always 0-3"),
                        character,
                        kind,
                        stocks,
                        costume,
                        team: if is_teams { Team::try_from(team).ok() } else { None },
                        ucf: UcfToggles::default(),
                        tag: None,
                    });
                }
            }
        }

        r.skip(72)?; // rest of the game info block
        let random_seed = r.u32()?;

        // v1.0.0: UCF toggles per port
        for slot in 0..4 {
            let (Some(dash_back), Some(shield_drop)) = (r.try_u32(), r.try_u32()) else {
                break;
            };
            if let Some(player) = players[slot].as_mut() {
                player.ucf = UcfToggles {
                    dash_back: UcfToggle::try_from(dash_back).unwrap_or_default(),
                    shield_drop: UcfToggle::try_from(shield_drop).unwrap_or_default(),
                };
            }
        }

        // v1.3.0: in-game name tags, Shift-JIS encoded
        for slot in 0..4 {
            let Ok(tag_bytes) = r.take(16) else { break };
            if let Some(player) = players[slot].as_mut() {
                let end = tag_bytes.iter().position(|&b| b == 0).unwrap_or(tag_bytes.len());
                let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(&tag_bytes[..end]);
                let tag = decoded.trim_end().to_string();
                if !tag.is_empty() {
                    player.tag = Some(tag);
                }
            }
        }

        let is_pal = r.try_bool(); // v1.5.0
        let is_frozen_ps = r.try_bool(); // v2.0.0

        // v3.14.0: skip major/minor scene and slippi info, then match identity
        let match_id = if r.skip(283).is_ok() {
            r.take(50).ok().map(|raw| {
                String::from_utf8_lossy(raw).trim_end_matches('\0').to_string()
            })
        } else {
            None
        };
        let _ = r.try_u8();
        let game_number = r.try_u32();
        let tiebreak_number = r.try_u32();

        // The match id's mode segment ("mode.ranked-...") drives the type.
        let match_type = match match_id.as_deref() {
            None | Some("") => MatchType::Offline,
            Some(id) => match id.as_bytes().get(5) {
                Some(b'r') => MatchType::Ranked,
                Some(b'u') => MatchType::Unranked,
                Some(b'd') => MatchType::Direct,
                _ => MatchType::Other,
            },
        };

        Ok(Self {
            slippi_version,
            is_teams,
            stage,
            players,
            random_seed,
            is_pal,
            is_frozen_ps,
            match_id: match_id.filter(|id| !id.is_empty()),
            match_type,
            game_number,
            tiebreak_number,
        })
    }

    /// Ports with an occupied player slot, in port order.
    pub fn occupied_ports(&self) -> Vec<Port> {
        self.players.iter().flatten().map(|player| player.port).collect()
    }
}

// ---------------------------------------------------------------------------
// Frame events
// ---------------------------------------------------------------------------

/// Pre-frame update data, collected right before controller inputs are used
/// to figure out the character's next action.
#[derive(Debug, Clone)]
pub struct PreFrame {
    pub frame: i32,
    pub port: Port,
    pub is_follower: bool,
    pub random_seed: u32,
    pub state: u16,
    pub position: Position,
    pub facing: f32,
    pub joystick: Position,
    pub cstick: Position,
    pub trigger: f32,
    pub buttons_logical: u32,
    pub buttons_physical: u16,
    pub trigger_physical_l: f32,
    pub trigger_physical_r: f32,
    pub raw_analog_x: Option<u8>,
    pub percent: Option<f32>,
}

impl PreFrame {
    pub fn parse(payload: &[u8], offset: usize) -> Result<Self, ReplayError> {
        let mut r = Reader::with_base(payload, offset);

        let frame = r.i32()?;
        let port = parse_port(&mut r)?;
        let is_follower = r.bool()?;

        let random_seed = r.u32()?;
        let state = r.u16()?;
        let position = Position::new(r.f32()?, r.f32()?);
        let facing = r.f32()?;
        let joystick = Position::new(r.f32()?, r.f32()?);
        let cstick = Position::new(r.f32()?, r.f32()?);
        let trigger = r.f32()?;
        let buttons_logical = r.u32()?;
        let buttons_physical = r.u16()?;
        let trigger_physical_l = r.f32()?;
        let trigger_physical_r = r.f32()?;

        let raw_analog_x = r.try_u8(); // v1.2.0
        let percent = r.try_f32(); // v1.4.0

        Ok(Self {
            frame,
            port,
            is_follower,
            random_seed,
            state,
            position,
            facing,
            joystick,
            cstick,
            trigger,
            buttons_logical,
            buttons_physical,
            trigger_physical_l,
            trigger_physical_r,
            raw_analog_x,
            percent,
        })
    }
}

/// The five post-frame state bitfields. Bit meanings are pinned by the
/// engine; only the handful the detectors use are surfaced.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub struct StateFlags(pub [u8; 5]);

impl StateFlags {
    pub fn in_hitlag(&self) -> bool {
        self.0[1] & 0x20 != 0
    }

    pub fn in_hitstun(&self) -> bool {
        self.0[3] & 0x02 != 0
    }

    pub fn is_fastfalling(&self) -> bool {
        self.0[1] & 0x08 != 0
    }

    pub fn is_dead(&self) -> bool {
        self.0[4] & 0x10 != 0
    }

    pub fn is_offscreen(&self) -> bool {
        self.0[4] & 0x40 != 0
    }
}

/// Post-frame update data, collected at the end of collision detection -
/// the engine's last word on the frame, and the basis for stat computation.
#[derive(Debug, Clone)]
pub struct PostFrame {
    pub frame: i32,
    pub port: Port,
    pub is_follower: bool,
    /// Raw in-game character id; only changes mid-game for Zelda/Sheik.
    pub character: u8,
    /// Raw action-state id; see [`crate::enums::ActionState`].
    pub state: u16,
    pub position: Position,
    pub facing: f32,
    pub percent: f32,
    pub shield: f32,
    /// Raw attack id of the last attack this character landed.
    pub last_attack_landed: u8,
    pub combo_count: u8,
    /// Port of the character that last hit this character.
    pub last_hit_by: Option<Port>,
    pub stocks: u8,
    /// Frames the current action state has been active; can be fractional.
    pub state_age: Option<f32>,
    pub flags: Option<StateFlags>,
    /// Remaining hitstun frames while in hitstun; reused by other states.
    pub misc_timer: Option<f32>,
    pub is_airborne: Option<bool>,
    pub last_ground_id: Option<u16>,
    pub jumps: Option<u8>,
    pub l_cancel: Option<u8>,
    pub hurtbox_status: Option<u8>,
    pub self_ground_speed: Option<Velocity>,
    pub self_air_speed: Option<Velocity>,
    pub knockback_speed: Option<Velocity>,
    pub hitlag_remaining: Option<f32>,
    pub animation_index: Option<u32>,
}

impl PostFrame {
    pub fn parse(payload: &[u8], offset: usize) -> Result<Self, ReplayError> {
        let mut r = Reader::with_base(payload, offset);

        let frame = r.i32()?;
        let port = parse_port(&mut r)?;
        let is_follower = r.bool()?;

        let character = r.u8()?;
        let state = r.u16()?;
        let position = Position::new(r.f32()?, r.f32()?);
        let facing = r.f32()?;
        let percent = r.f32()?;
        let shield = r.f32()?;
        let last_attack_landed = r.u8()?;
        let combo_count = r.u8()?;
        let last_hit_by = r.u8()?;
        let stocks = r.u8()?;

        let state_age = r.try_f32(); // v0.2.0

        // v2.0.0: state flags and the fields that ride along with them
        let (flags, misc_timer, is_airborne, last_ground_id, jumps, l_cancel) = match r.take(5) {
            Ok(flag_bytes) => {
                let mut raw = [0u8; 5];
                raw.copy_from_slice(flag_bytes);
                (
                    Some(StateFlags(raw)),
                    r.try_f32(),
                    r.try_bool(),
                    r.try_u16(),
                    r.try_u8(),
                    r.try_u8(),
                )
            },
            Err(_) => (None, None, None, None, None, None),
        };

        let hurtbox_status = r.try_u8(); // v2.1.0

        // v3.5.0: speeds split into self air, knockback, and self ground x
        let (self_air_speed, knockback_speed, self_ground_speed) =
            match (r.try_f32(), r.try_f32(), r.try_f32(), r.try_f32(), r.try_f32()) {
                (Some(air_x), Some(y), Some(kb_x), Some(kb_y), Some(ground_x)) => (
                    Some(Velocity::new(air_x, y)),
                    Some(Velocity::new(kb_x, kb_y)),
                    Some(Velocity::new(ground_x, y)),
                ),
                _ => (None, None, None),
            };

        let hitlag_remaining = r.try_f32(); // v3.8.0
        let animation_index = r.try_u32(); // v3.11.0

        Ok(Self {
            frame,
            port,
            is_follower,
            character,
            state,
            position,
            facing,
            percent,
            shield,
            last_attack_landed,
            combo_count,
            last_hit_by: Port::try_from(last_hit_by).ok(),
            stocks,
            state_age,
            flags,
            misc_timer,
            is_airborne,
            last_ground_id,
            jumps,
            l_cancel,
            hurtbox_status,
            self_ground_speed,
            self_air_speed,
            knockback_speed,
            hitlag_remaining,
            animation_index,
        })
    }

    /// Total velocity for the frame: the applicable self-induced speed plus
    /// knockback. `None` on replays that predate the speed fields.
    pub fn total_velocity(&self) -> Option<Velocity> {
        let self_speed = if self.is_airborne.unwrap_or(false) {
            self.self_air_speed?
        } else {
            self.self_ground_speed?
        };
        Some(self_speed.add(self.knockback_speed?))
    }
}

/// An active item or projectile snapshot.
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub frame: i32,
    /// Raw item type id.
    pub kind: u16,
    pub state: u8,
    pub facing: Option<f32>,
    pub velocity: Velocity,
    pub position: Position,
    pub damage: u16,
    pub timer: f32,
    pub spawn_id: u32,
    pub owner: Option<i8>,
}

impl ItemUpdate {
    pub fn parse(payload: &[u8], offset: usize) -> Result<Self, ReplayError> {
        let mut r = Reader::with_base(payload, offset);

        let frame = r.i32()?;
        let kind = r.u16()?;
        let state = r.u8()?;
        let facing = r.f32()?;
        let velocity = Velocity::new(r.f32()?, r.f32()?);
        let position = Position::new(r.f32()?, r.f32()?);
        let damage = r.u16()?;
        let timer = r.f32()?;
        let spawn_id = r.u32()?;

        // v3.2.0: projectile subtypes and ownership; we only carry the owner
        let owner = match (r.try_u8(), r.try_u8(), r.try_u8(), r.try_u8()) {
            (Some(_missile), Some(_turnip), Some(_launched), Some(_charge)) => r.try_i8(),
            _ => None,
        };

        Ok(Self {
            frame,
            kind,
            state,
            facing: (facing != 0.0).then_some(facing),
            velocity,
            position,
            damage,
            timer,
            spawn_id,
            owner,
        })
    }
}

/// Start-of-frame data.
#[derive(Debug, Copy, Clone)]
pub struct FrameStart {
    pub frame: i32,
    pub random_seed: u32,
}

impl FrameStart {
    pub fn parse(payload: &[u8], offset: usize) -> Result<Self, ReplayError> {
        let mut r = Reader::with_base(payload, offset);
        Ok(Self {
            frame: r.i32()?,
            random_seed: r.u32()?,
        })
    }
}

/// Frame bookend: written once all of a frame's events are final, i.e. the
/// frame can no longer be rolled back.
#[derive(Debug, Copy, Clone)]
pub struct FrameBookend {
    pub frame: i32,
    pub latest_finalized_frame: Option<i32>,
}

impl FrameBookend {
    pub fn parse(payload: &[u8], offset: usize) -> Result<Self, ReplayError> {
        let mut r = Reader::with_base(payload, offset);
        Ok(Self {
            frame: r.i32()?,
            latest_finalized_frame: r.try_i32(), // v3.7.0
        })
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, TryFromPrimitive)]
#[repr(u8)]
pub enum EndMethod {
    Inconclusive = 0,
    Time = 1,
    Game = 2,
    Conclusive = 3,
    NoContest = 7,
}

/// Information about the end of the game.
#[derive(Debug, Clone)]
pub struct GameEnd {
    pub method: EndMethod,
    /// Port of the player that quit out, if any.
    pub lras_initiator: Option<Port>,
    /// Placement per port; 0 is the winner, -1 marks an absent player.
    pub player_placements: Option<[i8; 4]>,
}

impl GameEnd {
    pub fn parse(payload: &[u8], offset: usize) -> Result<Self, ReplayError> {
        let mut r = Reader::with_base(payload, offset);

        let raw_method = r.u8()?;
        let method = EndMethod::try_from(raw_method)
            .map_err(|_| ReplayError::malformed(offset, format!("unknown game end method: {raw_method}")))?;

        // v2.0.0
        let lras_initiator = r.try_u8().and_then(|port| Port::try_from(port).ok());

        // v3.13.0
        let player_placements = match (r.try_i8(), r.try_i8(), r.try_i8(), r.try_i8()) {
            (Some(p1), Some(p2), Some(p3), Some(p4)) => Some([p1, p2, p3, p4]),
            _ => None,
        };

        Ok(Self {
            method,
            lras_initiator,
            player_placements,
        })
    }
}

fn parse_port(r: &mut Reader<'_>) -> Result<Port, ReplayError> {
    let offset = r.offset();
    let raw = r.u8()?;
    Port::try_from(raw).map_err(|_| ReplayError::malformed(offset, format!("invalid port index: {raw}")))
}
