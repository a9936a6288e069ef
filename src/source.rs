//! Synthetic capture source
//!
//! Generates planar YUV test-pattern frames so the whole pipeline runs
//! without camera hardware: a luma gradient scrolling one step per
//! frame over slowly cycling chroma, plus a bright square that gives
//! the region detector something to find.

use bytes::Bytes;

use crate::video::format::{Resolution, Rotation};
use crate::video::frame::{Plane, RawFrame};

pub struct SyntheticSource {
    resolution: Resolution,
    rotation: Rotation,
    tick: u64,
}

impl SyntheticSource {
    pub fn new(resolution: Resolution, rotation: Rotation) -> Self {
        Self {
            resolution,
            rotation,
            tick: 0,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Produce the next frame of the pattern.
    pub fn next_frame(&mut self) -> RawFrame {
        let w = self.resolution.width as usize;
        let h = self.resolution.height as usize;
        let cw = (w + 1) / 2;
        let ch = (h + 1) / 2;
        let tick = self.tick;
        self.tick = self.tick.wrapping_add(1);

        let mut luma = vec![0u8; w * h];
        for (row, line) in luma.chunks_exact_mut(w).enumerate() {
            for (col, px) in line.iter_mut().enumerate() {
                *px = ((col as u64 + row as u64 + tick) % 256) as u8;
            }
        }

        // bright square in the upper-left quadrant
        let side = (w.min(h) / 4).max(1);
        for row in side..side * 2 {
            for col in side..side * 2 {
                luma[row * w + col] = 250;
            }
        }

        // chroma drifts through the color wheel one step per frame
        let u_fill = 128u8.wrapping_add((tick / 4) as u8);
        let v_fill = 128u8.wrapping_sub((tick / 4) as u8);

        RawFrame::new(
            self.resolution.width,
            self.resolution.height,
            self.rotation,
            vec![
                Plane::new(Bytes::from(luma), w, 1),
                Plane::new(Bytes::from(vec![u_fill; cw * ch]), cw, 1),
                Plane::new(Bytes::from(vec![v_fill; cw * ch]), cw, 1),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_well_formed() {
        let mut source = SyntheticSource::new(Resolution::new(64, 48), Rotation::Deg0);
        let frame = source.next_frame();
        assert_eq!(frame.planes.len(), 3);
        assert_eq!(frame.luma().unwrap().data.len(), 64 * 48);
        assert_eq!(frame.chroma_u().unwrap().data.len(), 32 * 24);
        assert_eq!(frame.chroma_v().unwrap().data.len(), 32 * 24);
    }

    #[test]
    fn pattern_advances_between_frames() {
        let mut source = SyntheticSource::new(Resolution::new(32, 32), Rotation::Deg0);
        let a = source.next_frame();
        let b = source.next_frame();
        assert_ne!(a.luma().unwrap().data, b.luma().unwrap().data);
    }

    #[test]
    fn contains_a_bright_region() {
        let mut source = SyntheticSource::new(Resolution::new(64, 64), Rotation::Deg0);
        let frame = source.next_frame();
        let luma = &frame.luma().unwrap().data;
        assert!(luma.iter().any(|&v| v == 250));
    }
}
