//! Motion-adaptive temporal stabilization
//!
//! Blends the current luma plane with the previous frame's, weighting by
//! how much of the scene moved. High motion favors the previous frame to
//! smear transient blur, a static scene favors the current frame to stay
//! sharp. The stored reference is always the unblended current frame so
//! ghosting never accumulates.

use crate::config::MotionConfig;

pub struct MotionStabilizer {
    config: MotionConfig,
    previous: Option<Vec<u8>>,
}

impl MotionStabilizer {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            previous: None,
        }
    }

    /// Fraction of pixels whose absolute difference against the previous
    /// frame exceeds the configured threshold.
    fn motion_ratio(&self, current: &[u8], previous: &[u8]) -> f32 {
        let moving = current
            .iter()
            .zip(previous.iter())
            .filter(|(&c, &p)| c.abs_diff(p) > self.config.diff_threshold)
            .count();
        moving as f32 / current.len() as f32
    }

    /// (current, previous) blend weights for a given motion ratio.
    pub fn select_weights(&self, ratio: f32) -> (f32, f32) {
        if ratio > self.config.high_ratio {
            self.config.high_weights
        } else if ratio > self.config.moderate_ratio {
            self.config.moderate_weights
        } else {
            self.config.low_weights
        }
    }

    /// Stabilize one luma plane. The first frame, and any frame whose
    /// geometry differs from the stored reference, passes through
    /// unchanged and becomes the new reference.
    pub fn stabilize(&mut self, luma: &[u8]) -> Vec<u8> {
        let previous = match &self.previous {
            Some(prev) if prev.len() == luma.len() => prev,
            _ => {
                self.previous = Some(luma.to_vec());
                return luma.to_vec();
            }
        };

        let ratio = self.motion_ratio(luma, previous);
        let (wc, wp) = self.select_weights(ratio);

        let blended: Vec<u8> = luma
            .iter()
            .zip(previous.iter())
            .map(|(&c, &p)| {
                let v = wc * c as f32 + wp * p as f32;
                v.round().clamp(0.0, 255.0) as u8
            })
            .collect();

        // reference is the raw current frame, not the blend
        self.previous = Some(luma.to_vec());
        blended
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}
