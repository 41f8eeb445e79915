//! Builds synthetic .slp byte streams for end-to-end parser tests.
//!
//! The builder writes a 2.0.0-era container: a 418-byte Game Start payload,
//! 51-byte Post-Frame payloads, a 2-byte Game End, and a UBJSON metadata
//! element with two netplay players.

pub const GAME_START_SIZE: u16 = 418;
pub const PRE_FRAME_SIZE: u16 = 58;
pub const POST_FRAME_SIZE: u16 = 51;
pub const GAME_END_SIZE: u16 = 2;

/// Everything a Post-Frame test event needs; the rest of the payload is
/// zeroed.
#[derive(Debug, Clone, Copy)]
pub struct PostSpec {
    pub frame: i32,
    pub port: u8,
    pub state: u16,
    pub x: f32,
    pub y: f32,
    pub facing: f32,
    pub percent: f32,
    pub stocks: u8,
    pub last_hit_by: u8,
    pub in_hitstun: bool,
    pub ground_id: u16,
    pub airborne: bool,
}

impl PostSpec {
    pub fn new(frame: i32, port: u8, state: u16) -> Self {
        Self {
            frame,
            port,
            state,
            x: 0.0,
            y: 0.0,
            facing: 1.0,
            percent: 0.0,
            stocks: 4,
            last_hit_by: 255,
            in_hitstun: false,
            ground_id: 0,
            airborne: false,
        }
    }
}

pub struct ReplayBuilder {
    version: (u8, u8, u8),
    stage: u16,
    events: Vec<u8>,
    last_frame: i32,
}

impl ReplayBuilder {
    /// Fox (P1) vs Falco (P2) on Yoshi's Story, replay version 2.0.0.
    pub fn new() -> Self {
        Self {
            version: (2, 0, 0),
            stage: 8,
            events: Vec::new(),
            last_frame: -123,
        }
    }

    pub fn with_version(mut self, major: u8, minor: u8, revision: u8) -> Self {
        self.version = (major, minor, revision);
        self
    }

    pub fn push_post(&mut self, spec: PostSpec) -> &mut Self {
        self.last_frame = self.last_frame.max(spec.frame);

        self.events.push(0x38);
        self.events.extend(spec.frame.to_be_bytes());
        self.events.push(spec.port);
        self.events.push(0); // follower

        self.events.push(2); // in-game character id (irrelevant to tests)
        self.events.extend(spec.state.to_be_bytes());
        self.events.extend(spec.x.to_be_bytes());
        self.events.extend(spec.y.to_be_bytes());
        self.events.extend(spec.facing.to_be_bytes());
        self.events.extend(spec.percent.to_be_bytes());
        self.events.extend(60.0f32.to_be_bytes()); // shield
        self.events.push(0); // last attack landed
        self.events.push(0); // combo count
        self.events.push(spec.last_hit_by);
        self.events.push(spec.stocks);
        self.events.extend(1.0f32.to_be_bytes()); // state age

        let flags = [0u8, 0, 0, if spec.in_hitstun { 0x02 } else { 0 }, 0];
        self.events.extend(flags);
        self.events.extend(0.0f32.to_be_bytes()); // misc timer
        self.events.push(spec.airborne as u8);
        self.events.extend(spec.ground_id.to_be_bytes());
        self.events.push(2); // jumps
        self.events.push(0); // l-cancel

        self
    }

    /// Writes identical idle Post-Frame pairs for both ports across a frame
    /// range (inclusive start, exclusive end).
    pub fn push_idle_frames(&mut self, start: i32, end: i32) -> &mut Self {
        for frame in start..end {
            self.push_post(PostSpec::new(frame, 0, 14));
            self.push_post(PostSpec::new(frame, 1, 14));
        }
        self
    }

    pub fn push_game_end(&mut self) -> &mut Self {
        self.events.push(0x39);
        self.events.push(2); // GAME
        self.events.push(255); // no LRAS initiator
        self
    }

    /// Appends raw bytes directly into the event region; for tests that
    /// need a deliberately short payload.
    pub fn push_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.events.extend(bytes);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.assemble(None, true)
    }

    /// Builds the container with the declared raw length intact but the
    /// last `cut` bytes of the event region missing.
    pub fn build_truncated(&self, cut: usize) -> Vec<u8> {
        self.assemble(Some(cut), false)
    }

    fn assemble(&self, cut: Option<usize>, with_metadata: bool) -> Vec<u8> {
        let mut raw = Vec::new();

        // Event payloads table: 4 commands, 3 bytes each, plus the size byte.
        raw.push(0x35);
        raw.push(13);
        for (code, size) in [
            (0x36u8, GAME_START_SIZE),
            (0x37, PRE_FRAME_SIZE),
            (0x38, POST_FRAME_SIZE),
            (0x39, GAME_END_SIZE),
        ] {
            raw.push(code);
            raw.extend(size.to_be_bytes());
        }

        raw.push(0x36);
        raw.extend(self.game_start_payload());
        raw.extend(&self.events);

        let declared = raw.len() as i32;
        if let Some(cut) = cut {
            raw.truncate(raw.len() - cut);
        }

        let mut bytes = Vec::new();
        bytes.extend(b"{U\x03raw[$U#l");
        bytes.extend(declared.to_be_bytes());
        bytes.extend(raw);

        if with_metadata {
            bytes.extend(b"U\x08metadata");
            bytes.extend(self.metadata_payload());
            bytes.push(b'}');
        }

        bytes
    }

    fn game_start_payload(&self) -> Vec<u8> {
        let mut p = Vec::with_capacity(GAME_START_SIZE as usize);

        p.extend([self.version.0, self.version.1, self.version.2, 0]);
        p.extend([0u8; 8]); // game bitfields
        p.push(0); // teams off
        p.extend([0u8; 5]);
        p.extend(self.stage.to_be_bytes());
        p.extend([0u8; 80]);

        // Port 1: Fox (human), port 2: Falco (human), ports 3/4 empty.
        for (character, kind) in [(2u8, 0u8), (20, 0), (0, 3), (0, 3)] {
            p.push(character);
            p.push(kind);
            p.push(4); // stocks
            p.push(0); // costume
            p.extend([0u8; 5]);
            p.push(0); // team
            p.extend([0u8; 26]);
        }

        p.extend([0u8; 72]);
        p.extend(0x1234_5678u32.to_be_bytes()); // random seed
        p.extend([0u8; 32]); // UCF toggles
        p.extend([0u8; 64]); // name tags
        p.push(0); // PAL
        p.push(0); // frozen PS

        assert_eq!(p.len(), GAME_START_SIZE as usize);
        p
    }

    fn metadata_payload(&self) -> Vec<u8> {
        let mut m = Vec::new();
        m.push(b'{');

        ub_key(&mut m, "startAt");
        ub_str(&mut m, "2023-01-12T00:43:55Z");

        ub_key(&mut m, "lastFrame");
        ub_i32(&mut m, self.last_frame);

        ub_key(&mut m, "playedOn");
        ub_str(&mut m, "dolphin");

        ub_key(&mut m, "players");
        m.push(b'{');
        for (port, code, name, character) in [(0u8, "FOX#123", "fox main", 1), (1, "BIRD#456", "bird main", 22)] {
            ub_key(&mut m, &port.to_string());
            m.push(b'{');

            ub_key(&mut m, "characters");
            m.push(b'{');
            ub_key(&mut m, &character.to_string());
            ub_i32(&mut m, self.last_frame + 123 + 1);
            m.push(b'}');

            ub_key(&mut m, "names");
            m.push(b'{');
            ub_key(&mut m, "code");
            ub_str(&mut m, code);
            ub_key(&mut m, "netplay");
            ub_str(&mut m, name);
            m.push(b'}');

            m.push(b'}');
        }
        m.push(b'}');

        m.push(b'}');
        m
    }
}

fn ub_key(buf: &mut Vec<u8>, name: &str) {
    buf.push(b'U');
    buf.push(name.len() as u8);
    buf.extend(name.as_bytes());
}

fn ub_str(buf: &mut Vec<u8>, value: &str) {
    buf.push(b'S');
    ub_key_len(buf, value.len() as u8);
    buf.extend(value.as_bytes());
}

fn ub_key_len(buf: &mut Vec<u8>, len: u8) {
    buf.push(b'U');
    buf.push(len);
}

fn ub_i32(buf: &mut Vec<u8>, value: i32) {
    buf.push(b'l');
    buf.extend(value.to_be_bytes());
}
