//! Frame admission gate
//!
//! Drops frames arriving faster than the configured minimum interval so
//! the rest of the pipeline never sees more work than it can sustain.
//! Time is supplied by the caller as a millisecond timestamp, which
//! keeps the gate deterministic under test.

/// Gate decision counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
    pub accepted: u64,
    pub dropped: u64,
}

pub struct RateGate {
    min_interval_ms: u64,
    last_accepted_ms: Option<u64>,
    stats: GateStats,
}

impl RateGate {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_accepted_ms: None,
            stats: GateStats::default(),
        }
    }

    /// Decide whether a frame arriving at `now_ms` should be processed.
    /// The first frame is always admitted. Timestamps that jump backwards
    /// (clock reset) re-admit immediately.
    pub fn should_process(&mut self, now_ms: u64) -> bool {
        let admit = match self.last_accepted_ms {
            None => true,
            Some(last) => now_ms < last || now_ms - last >= self.min_interval_ms,
        };
        if admit {
            self.last_accepted_ms = Some(now_ms);
            self.stats.accepted += 1;
        } else {
            self.stats.dropped += 1;
        }
        admit
    }

    pub fn stats(&self) -> GateStats {
        self.stats
    }

    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }
}
