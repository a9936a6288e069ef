//! Render sink
//!
//! Two-phase handoff toward a GPU upload loop that polls on its own
//! schedule. `stage` copies a frame into an internal reusable buffer
//! from any thread; `take_pending` drains it exactly once on the render
//! thread. Only the newest staged frame survives; staging twice between
//! drains overwrites.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tracing::warn;

use crate::video::format::Rotation;
use crate::video::mailbox::FrameMailbox;

/// Geometry of a staged frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
}

impl FrameGeometry {
    /// Whether switching from `other` to `self` requires the consumer to
    /// recompute its transform: a rotation change or an aspect change.
    fn needs_recompute(&self, other: &FrameGeometry) -> bool {
        self.rotation != other.rotation
            || self.width as u64 * other.height as u64 != other.width as u64 * self.height as u64
    }
}

/// What a drain produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainedFrame {
    pub geometry: FrameGeometry,
    pub len: usize,
    /// True when the consumer must recompute its transform before using
    /// the frame: first drain, rotation change, or aspect change.
    pub geometry_changed: bool,
}

struct Staged {
    buf: Vec<u8>,
    len: usize,
    geometry: FrameGeometry,
    last_drained: Option<FrameGeometry>,
}

pub struct RenderSink {
    pending: AtomicBool,
    staged: Mutex<Staged>,
    last_pumped_seq: AtomicU64,
}

impl RenderSink {
    pub fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            staged: Mutex::new(Staged {
                buf: Vec::new(),
                len: 0,
                geometry: FrameGeometry {
                    width: 0,
                    height: 0,
                    rotation: Rotation::Deg0,
                },
                last_drained: None,
            }),
            last_pumped_seq: AtomicU64::new(0),
        }
    }

    /// Stage a packed RGBA frame for the next drain. Rejects byte counts
    /// short of `width * height * 4` and zero dimensions; a rejected
    /// stage leaves any previously staged frame intact. Returns whether
    /// the frame was accepted.
    pub fn stage(&self, rgba: &[u8], width: u32, height: u32, rotation: Rotation) -> bool {
        let needed = width as usize * height as usize * 4;
        if width == 0 || height == 0 || rgba.len() < needed {
            warn!(
                len = rgba.len(),
                width, height, "Rejected undersized frame at render sink"
            );
            return false;
        }

        let mut staged = self.staged.lock();
        if staged.buf.len() < needed {
            staged.buf.resize(needed, 0);
        }
        staged.buf[..needed].copy_from_slice(&rgba[..needed]);
        staged.len = needed;
        staged.geometry = FrameGeometry {
            width,
            height,
            rotation,
        };
        self.pending.store(true, Ordering::Release);
        true
    }

    /// Drain the staged frame into `dst`, which is cleared first and
    /// reused across calls. Returns `None` when nothing new was staged
    /// since the last drain.
    pub fn take_pending(&self, dst: &mut Vec<u8>) -> Option<DrainedFrame> {
        if !self.pending.swap(false, Ordering::AcqRel) {
            return None;
        }

        let mut staged = self.staged.lock();
        dst.clear();
        dst.extend_from_slice(&staged.buf[..staged.len]);

        let geometry = staged.geometry;
        let geometry_changed = match staged.last_drained {
            None => true,
            Some(prev) => geometry.needs_recompute(&prev),
        };
        staged.last_drained = Some(geometry);

        Some(DrainedFrame {
            geometry,
            len: staged.len,
            geometry_changed,
        })
    }

    pub fn has_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Pull the newest frame out of a mailbox and stage it. Tracks the
    /// last staged sequence internally so repeated pumps of the same
    /// frame are cheap no-ops.
    pub fn pump(&self, mailbox: &FrameMailbox) -> bool {
        let last = self.last_pumped_seq.load(Ordering::Acquire);
        if let Some(frame) = mailbox.take_if_newer(last) {
            self.last_pumped_seq.store(frame.sequence, Ordering::Release);
            return self.stage(frame.data(), frame.width, frame.height, Rotation::Deg0);
        }
        false
    }
}

impl Default for RenderSink {
    fn default() -> Self {
        Self::new()
    }
}
