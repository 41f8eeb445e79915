//! Decoding for .slp replay files.
//!
//! A replay is a UBJSON container with two elements: `raw`, the binary event
//! stream captured from the game, and `metadata`, recorder-side context. This
//! crate turns that container into a [`Game`]: typed start/end events, a
//! deduplicated frame sequence, and structured metadata. It knows the wire
//! format and the engine's id tables, but nothing about stats - that lives a
//! crate up in `slippi-stats`.

use std::path::Path;

pub mod enums;
pub mod errors;
pub mod events;
pub mod frames;
pub mod metadata;
pub mod reader;

mod ubjson;

pub use errors::ReplayError;
pub use events::{
    EndMethod, EventType, FrameBookend, FrameStart, GameEnd, GameStart, ItemUpdate, MatchType, Port, Position,
    PostFrame, PreFrame, SlippiVersion, StateFlags, Velocity, FIRST_FRAME_INDEX, MINIMUM_VERSION,
};
pub use frames::{Frame, FrameReconstructor, PlayerData, PortFrame};
pub use metadata::{Metadata, MetadataPlayer, Platform};

use events::{EventStream, PayloadSizes};
use reader::Reader;

/// Log filter targets for this workspace's crates.
pub struct Log;

#[allow(non_upper_case_globals)]
impl Log {
    pub const Parser: &'static str = "slippi::parser";
    pub const Frames: &'static str = "slippi::frames";
    pub const Metadata: &'static str = "slippi::metadata";
    pub const Stats: &'static str = "slippi::stats";
    pub const Batch: &'static str = "slippi::batch";
}

// The container header for the raw element: a UBJSON object opener, the
// `raw` key, and a strongly-typed (`$U`) array with an `l` (int32) count of
// bytes. The official recorder always writes `raw` first, so we hardcode the
// prefix instead of running a generic UBJSON pass over megabytes of frames.
const RAW_HEADER: &[u8] = b"{U\x03raw[$U#l";
const METADATA_KEY: &[u8] = b"U\x08metadata";

/// A fully parsed replay.
#[derive(Debug, Clone)]
pub struct Game {
    pub start: GameStart,
    /// Absent when the recording stopped before the game resolved.
    pub end: Option<GameEnd>,
    /// Every simulation tick, in strictly increasing frame order with
    /// rollback duplicates already collapsed.
    pub frames: Vec<Frame>,
    pub metadata: Metadata,
    /// The metadata element as parsed, for debugging and forward
    /// compatibility with keys we don't model.
    pub metadata_raw: serde_json::Value,
}

impl Game {
    /// Reads and parses a replay file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        tracing::debug!(target: Log::Parser, "parsing replay: {}", path.display());

        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Parses a replay from its complete byte content.
    pub fn parse(bytes: &[u8]) -> Result<Self, ReplayError> {
        let mut outer = Reader::new(bytes);
        outer.expect(RAW_HEADER)?;

        let header_offset = outer.offset();
        let declared = outer.i32()?;
        if declared < 0 {
            return Err(ReplayError::malformed(header_offset, format!("negative raw element length: {declared}")));
        }
        let declared = declared as usize;

        // A zero length means the recorder never finalized the file (an
        // in-progress capture); the raw element then runs to the end of the
        // buffer and we rely on the Game End event for termination.
        let event_region = if declared == 0 { outer.remaining() } else { declared };
        let raw_start = outer.offset();
        let event_bytes = outer.take(event_region)?;
        let mut events = Reader::with_base(event_bytes, raw_start);

        let sizes = PayloadSizes::parse(&mut events)?;

        // The first real event must be Game Start; it pins the version every
        // later payload is decoded against.
        let start_offset = events.offset();
        let first_code = events.u8()?;
        if first_code != EventType::GameStart as u8 {
            return Err(ReplayError::malformed(
                start_offset,
                format!("expected game start (0x36), but got 0x{first_code:02x}"),
            ));
        }
        let start_size = sizes.get(EventType::GameStart as u8).ok_or_else(|| {
            ReplayError::malformed(start_offset, "payload table has no entry for game start")
        })? as usize;
        let start_payload = events.take(start_size)?;
        let start = GameStart::parse(start_payload, start_offset + 1)?;

        let occupied = start.occupied_ports().iter().map(|port| port.index()).collect();
        let mut reconstructor = FrameReconstructor::new(occupied);
        let mut end = None;

        let mut stream = EventStream::new(events, sizes);
        for item in &mut stream {
            let ev = item?;
            let payload_offset = ev.offset + 1;

            match EventType::try_from(ev.code) {
                Ok(EventType::FramePre) => {
                    let pre = PreFrame::parse(ev.payload, payload_offset)?;
                    reconstructor.push_pre(pre).map_err(|e| at_offset(e, ev.offset))?;
                },
                Ok(EventType::FramePost) => {
                    let post = PostFrame::parse(ev.payload, payload_offset)?;
                    reconstructor.push_post(post).map_err(|e| at_offset(e, ev.offset))?;
                },
                Ok(EventType::Item) => {
                    let item = ItemUpdate::parse(ev.payload, payload_offset)?;
                    reconstructor.push_item(item).map_err(|e| at_offset(e, ev.offset))?;
                },
                Ok(EventType::FrameStart) => {
                    let frame_start = FrameStart::parse(ev.payload, payload_offset)?;
                    reconstructor.push_start(frame_start).map_err(|e| at_offset(e, ev.offset))?;
                },
                Ok(EventType::FrameBookend) => {
                    let bookend = FrameBookend::parse(ev.payload, payload_offset)?;
                    reconstructor.push_end(bookend).map_err(|e| at_offset(e, ev.offset))?;
                },
                Ok(EventType::GameEnd) => {
                    end = Some(GameEnd::parse(ev.payload, payload_offset)?);
                },
                Ok(EventType::GameStart) => {
                    return Err(ReplayError::malformed(ev.offset, "duplicate game start event"));
                },
                // Structural noise we consume but don't model.
                Ok(EventType::MessageSplitter) | Ok(EventType::GeckoList) => {},
                Ok(EventType::EventPayloads) => {
                    return Err(ReplayError::malformed(ev.offset, "event payloads table repeated mid-stream"));
                },
                // In the size table but not one of ours; skip it.
                Err(_) => {},
            }
        }

        if !stream.saw_game_end() {
            let consumed = stream.consumed() - raw_start;
            if consumed != declared {
                return Err(ReplayError::TruncatedReplay {
                    offset: stream.consumed(),
                    needed: declared.saturating_sub(consumed).max(1),
                });
            }
            tracing::warn!(target: Log::Parser, "raw element ended without a game end event");
        }

        let frames = reconstructor.finish()?;
        tracing::debug!(target: Log::Parser, "reconstructed {} frame(s)", frames.len());

        outer.expect(METADATA_KEY)?;
        let metadata_raw = ubjson::parse_value(&mut outer)?;
        let metadata = Metadata::parse(&metadata_raw)?;
        outer.expect(b"}")?;

        Ok(Self {
            start,
            end,
            frames,
            metadata,
            metadata_raw,
        })
    }
}

/// Frame-reconstruction errors carry no stream position of their own; stamp
/// in the offending event's offset.
fn at_offset(err: ReplayError, offset: usize) -> ReplayError {
    match err {
        ReplayError::MalformedStream { offset: 0, reason } => ReplayError::MalformedStream { offset, reason },
        other => other,
    }
}
