//! Frame data structures
//!
//! `RawFrame` is the planar YUV input as delivered by a capture source,
//! `PackedFrame` the immutable RGBA output shared across consumers.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;

use super::format::Rotation;
use crate::error::{AppError, Result};

/// One plane of a planar YUV frame
#[derive(Debug, Clone)]
pub struct Plane {
    pub data: Bytes,
    /// Bytes between the starts of two consecutive rows
    pub row_stride: usize,
    /// Bytes between two consecutive samples within a row
    pub pixel_stride: usize,
}

impl Plane {
    pub fn new(data: impl Into<Bytes>, row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data: data.into(),
            row_stride,
            pixel_stride,
        }
    }

    /// Smallest buffer length that covers `rows` rows of `cols` samples
    /// under this plane's strides.
    pub fn required_len(&self, rows: usize, cols: usize) -> usize {
        if rows == 0 || cols == 0 {
            return 0;
        }
        (rows - 1) * self.row_stride + (cols - 1) * self.pixel_stride + 1
    }
}

/// Planar YUV 4:2:0 frame with per-plane strides, plane order Y, U, V.
/// Chroma planes are subsampled 2:1 in both dimensions.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
    pub planes: Vec<Plane>,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, rotation: Rotation, planes: Vec<Plane>) -> Self {
        Self {
            width,
            height,
            rotation,
            planes,
        }
    }

    pub fn luma(&self) -> Option<&Plane> {
        self.planes.first()
    }

    pub fn chroma_u(&self) -> Option<&Plane> {
        self.planes.get(1)
    }

    pub fn chroma_v(&self) -> Option<&Plane> {
        self.planes.get(2)
    }
}

/// Immutable packed RGBA frame, cheap to clone and share across threads.
#[derive(Debug, Clone)]
pub struct PackedFrame {
    data: Arc<Bytes>,
    pub width: u32,
    pub height: u32,
    /// Monotonic per-pipeline sequence number, starts at 1
    pub sequence: u64,
    pub created_at: Instant,
}

impl PackedFrame {
    /// Wrap an RGBA buffer. The buffer must hold exactly
    /// `width * height * 4` bytes.
    pub fn from_vec(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(AppError::Convert(format!(
                "RGBA buffer length {} does not match {}x{} ({} expected)",
                data.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            data: Arc::new(Bytes::from(data)),
            width,
            height,
            sequence,
            created_at: Instant::now(),
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Age since the frame left the pipeline
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_frame_rejects_wrong_length() {
        let err = PackedFrame::from_vec(vec![0u8; 10], 2, 2, 1);
        assert!(err.is_err());

        let ok = PackedFrame::from_vec(vec![0u8; 16], 2, 2, 1).unwrap();
        assert_eq!(ok.len(), 16);
        assert_eq!(ok.sequence, 1);
    }

    #[test]
    fn packed_frame_clone_shares_data() {
        let frame = PackedFrame::from_vec(vec![7u8; 16], 2, 2, 3).unwrap();
        let clone = frame.clone();
        assert_eq!(clone.data().as_ptr(), frame.data().as_ptr());
        assert_eq!(clone.sequence, 3);
    }

    #[test]
    fn plane_required_len_accounts_for_strides() {
        let plane = Plane::new(vec![0u8; 64], 8, 2);
        // 4 rows of 3 samples: 3*8 + 2*2 + 1
        assert_eq!(plane.required_len(4, 3), 29);
        assert_eq!(plane.required_len(0, 3), 0);
    }
}
