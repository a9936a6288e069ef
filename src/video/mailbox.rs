//! Single-slot frame handoff
//!
//! Producer overwrites, consumers read the latest frame without blocking
//! either side. A slow consumer never sees a backlog, just the newest
//! frame. Publishes and reads are lock-free via `ArcSwap`.

use arc_swap::ArcSwap;
use std::sync::Arc;

use super::frame::PackedFrame;

pub struct FrameMailbox {
    slot: ArcSwap<Option<PackedFrame>>,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self {
            slot: ArcSwap::from_pointee(None),
        }
    }

    /// Replace the slot contents. The previous frame, if any, is
    /// dropped once its last reader releases it.
    pub fn publish(&self, frame: PackedFrame) {
        self.slot.store(Arc::new(Some(frame)));
    }

    /// Read the latest frame, if any.
    pub fn latest(&self) -> Option<PackedFrame> {
        (**self.slot.load()).clone()
    }

    /// Read the latest frame only if its sequence differs from the one
    /// the caller saw last. Inequality rather than ordering tolerates a
    /// pipeline restart resetting the counter.
    pub fn take_if_newer(&self, last_seen: u64) -> Option<PackedFrame> {
        let guard = self.slot.load();
        match &**guard {
            Some(frame) if frame.sequence != last_seen => Some(frame.clone()),
            _ => None,
        }
    }

    pub fn clear(&self) {
        self.slot.store(Arc::new(None));
    }
}

impl Default for FrameMailbox {
    fn default() -> Self {
        Self::new()
    }
}
