//! Reassembles the flat event stream into per-frame snapshots.
//!
//! This stage is purely structural: it groups pre/post/item events by frame
//! index and handles rollback duplicates, but knows nothing about what the
//! states mean. Netplay rollbacks re-emit earlier frame indices with
//! corrected data; the last write in stream order wins, wholesale.

use crate::errors::ReplayError;
use crate::events::{FrameBookend, FrameStart, ItemUpdate, PostFrame, PreFrame, FIRST_FRAME_INDEX};
use crate::Log;

/// Frame data for one character: the pre-frame input snapshot and the
/// post-frame simulation result.
#[derive(Debug, Default, Clone)]
pub struct PlayerData {
    pub pre: Option<PreFrame>,
    pub post: Option<PostFrame>,
}

/// Frame data for one port. Ice Climbers carry a second character in
/// `follower`.
#[derive(Debug, Default, Clone)]
pub struct PortFrame {
    pub leader: PlayerData,
    pub follower: Option<PlayerData>,
}

/// One simulation tick: everything every active body did on one frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: i32,
    pub ports: [Option<PortFrame>; 4],
    pub items: Vec<ItemUpdate>,
    pub start: Option<FrameStart>,
    pub end: Option<FrameBookend>,
}

impl Frame {
    fn new(index: i32) -> Self {
        Self {
            index,
            ports: [None, None, None, None],
            items: Vec::new(),
            start: None,
            end: None,
        }
    }

    /// Post-frame data for a port's leader, if present.
    pub fn post(&self, port: usize) -> Option<&PostFrame> {
        self.ports[port].as_ref()?.leader.post.as_ref()
    }

    fn port_mut(&mut self, port: usize) -> &mut PortFrame {
        self.ports[port].get_or_insert_with(PortFrame::default)
    }
}

/// Accumulates frame events and produces the deduplicated, ordered frame
/// sequence.
///
/// Events for one frame arrive contiguously, so a change in frame index
/// flushes the frame under construction. Bookend events can't be used to
/// detect end-of-frame since they don't exist before 3.0.0.
#[derive(Debug)]
pub struct FrameReconstructor {
    frames: Vec<Frame>,
    current: Option<Frame>,
    /// Ports that should carry data every frame, from the Game Start player
    /// blocks.
    expected_ports: Vec<usize>,
    rollbacks: usize,
}

impl FrameReconstructor {
    pub fn new(expected_ports: Vec<usize>) -> Self {
        Self {
            frames: Vec::new(),
            current: None,
            expected_ports,
            rollbacks: 0,
        }
    }

    pub fn push_pre(&mut self, event: PreFrame) -> Result<(), ReplayError> {
        let frame = self.frame_for(event.frame)?;
        let port = frame.port_mut(event.port.index());
        if event.is_follower {
            port.follower.get_or_insert_with(PlayerData::default).pre = Some(event);
        } else {
            port.leader.pre = Some(event);
        }
        Ok(())
    }

    pub fn push_post(&mut self, event: PostFrame) -> Result<(), ReplayError> {
        let frame = self.frame_for(event.frame)?;
        let port = frame.port_mut(event.port.index());
        if event.is_follower {
            port.follower.get_or_insert_with(PlayerData::default).post = Some(event);
        } else {
            port.leader.post = Some(event);
        }
        Ok(())
    }

    pub fn push_item(&mut self, event: ItemUpdate) -> Result<(), ReplayError> {
        self.frame_for(event.frame)?.items.push(event);
        Ok(())
    }

    pub fn push_start(&mut self, event: FrameStart) -> Result<(), ReplayError> {
        self.frame_for(event.frame)?.start = Some(event);
        Ok(())
    }

    pub fn push_end(&mut self, event: FrameBookend) -> Result<(), ReplayError> {
        self.frame_for(event.frame)?.end = Some(event);
        Ok(())
    }

    fn frame_for(&mut self, index: i32) -> Result<&mut Frame, ReplayError> {
        if self.current.as_ref().is_some_and(|frame| frame.index != index) {
            let finished = self.current.take().expect("current frame checked above");
            self.store(finished)?;
        }

        Ok(self.current.get_or_insert_with(|| Frame::new(index)))
    }

    /// Slots a finished frame at `index - FIRST_FRAME_INDEX`. A slot that's
    /// already filled means the stream rolled this frame back; the rebuilt
    /// frame replaces it. A gap means the recorder dropped frames, which is
    /// unrecoverable.
    fn store(&mut self, frame: Frame) -> Result<(), ReplayError> {
        let slot = (frame.index - FIRST_FRAME_INDEX) as isize;
        if slot < 0 {
            return Err(ReplayError::malformed(0, format!("frame index {} precedes the first frame", frame.index)));
        }

        let slot = slot as usize;
        let count = self.frames.len();

        if slot == count {
            self.frames.push(frame);
        } else if slot < count {
            tracing::debug!(target: Log::Frames, "rollback: {} -> {}", count - 1, slot);
            self.rollbacks += 1;
            self.frames[slot] = frame;
        } else {
            return Err(ReplayError::malformed(
                0,
                format!("missing frames: have {}, next is {}", count, slot),
            ));
        }

        Ok(())
    }

    /// Flushes the in-flight frame and returns the final sequence.
    ///
    /// Trailing frames that never saw post-frame data for every expected
    /// port (a capture cut off mid-frame) are dropped with a warning rather
    /// than failing the file; the survivors are strictly increasing and
    /// contiguous.
    pub fn finish(mut self) -> Result<Vec<Frame>, ReplayError> {
        if let Some(frame) = self.current.take() {
            self.store(frame)?;
        }

        if self.rollbacks > 0 {
            tracing::debug!(target: Log::Frames, "overwrote {} rolled-back frame(s)", self.rollbacks);
        }

        let expected = &self.expected_ports;
        let complete_len = self
            .frames
            .iter()
            .position(|frame| {
                !expected
                    .iter()
                    .all(|&port| frame.ports[port].as_ref().is_some_and(|p| p.leader.post.is_some()))
            })
            .unwrap_or(self.frames.len());

        if complete_len < self.frames.len() {
            tracing::warn!(
                target: Log::Frames,
                "dropping {} incomplete frame(s) from frame {} onward",
                self.frames.len() - complete_len,
                self.frames[complete_len].index,
            );
            self.frames.truncate(complete_len);
        }

        Ok(self.frames)
    }
}
