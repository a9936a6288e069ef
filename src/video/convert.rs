//! Color space conversion
//!
//! Two-stage path used by the pipeline: planar YUV 4:2:0 is assembled
//! into an interleaved luma-plus-chroma layout (full luma plane followed
//! by V/U byte pairs), then expanded to packed RGBA with BT.601
//! full-range coefficients. The two stages form a matched pair: chroma
//! order is swapped once during assembly and swapped back during
//! expansion.

use super::format::Rotation;
use super::frame::{PackedFrame, RawFrame};
use crate::error::{AppError, Result};

/// Chroma plane dimensions for a 4:2:0 frame
const fn chroma_dim(dim: usize) -> usize {
    (dim + 1) / 2
}

/// Assemble a planar YUV frame into the interleaved layout: the full
/// luma plane, then interleaved chroma as V byte before U byte for each
/// 2x2 block, row-major.
///
/// Luma rows are bulk-copied when the plane is tightly packed
/// (`pixel_stride == 1`), otherwise gathered sample by sample. Chroma is
/// always gathered since the output interleaving differs from the
/// planar input.
pub fn to_interleaved(frame: &RawFrame) -> Result<Vec<u8>> {
    let w = frame.width as usize;
    let h = frame.height as usize;
    if w == 0 || h == 0 {
        return Err(AppError::Convert(format!(
            "invalid frame dimensions {}x{}",
            frame.width, frame.height
        )));
    }

    let (y, u, v) = match &frame.planes[..] {
        [y, u, v] => (y, u, v),
        other => {
            return Err(AppError::Convert(format!(
                "expected 3 planes, got {}",
                other.len()
            )))
        }
    };

    let cw = chroma_dim(w);
    let ch = chroma_dim(h);

    if y.data.len() < y.required_len(h, w) {
        return Err(AppError::Convert(format!(
            "luma plane too short: {} < {}",
            y.data.len(),
            y.required_len(h, w)
        )));
    }
    for (name, plane) in [("U", u), ("V", v)] {
        if plane.data.len() < plane.required_len(ch, cw) {
            return Err(AppError::Convert(format!(
                "{} plane too short: {} < {}",
                name,
                plane.data.len(),
                plane.required_len(ch, cw)
            )));
        }
    }

    let mut out = Vec::with_capacity(w * h + 2 * cw * ch);

    if y.pixel_stride == 1 {
        for row in 0..h {
            let start = row * y.row_stride;
            out.extend_from_slice(&y.data[start..start + w]);
        }
    } else {
        for row in 0..h {
            let base = row * y.row_stride;
            for col in 0..w {
                out.push(y.data[base + col * y.pixel_stride]);
            }
        }
    }

    for row in 0..ch {
        let v_base = row * v.row_stride;
        let u_base = row * u.row_stride;
        for col in 0..cw {
            out.push(v.data[v_base + col * v.pixel_stride]);
            out.push(u.data[u_base + col * u.pixel_stride]);
        }
    }

    Ok(out)
}

/// Expand the interleaved layout produced by [`to_interleaved`] into
/// packed RGBA, BT.601 full range. Alpha is always 255.
pub fn interleaved_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let w = width as usize;
    let h = height as usize;
    let cw = chroma_dim(w);
    let ch = chroma_dim(h);
    let expected = w * h + 2 * cw * ch;
    if w == 0 || h == 0 || data.len() < expected {
        return Err(AppError::Convert(format!(
            "interleaved buffer too short for {}x{}: {} < {}",
            width,
            height,
            data.len(),
            expected
        )));
    }

    let uv_base = w * h;
    let mut rgba = vec![0u8; w * h * 4];

    for row in 0..h {
        let uv_row = uv_base + (row / 2) * cw * 2;
        for col in 0..w {
            let luma = data[row * w + col] as f32;
            let pair = uv_row + (col / 2) * 2;
            let cr = data[pair] as f32 - 128.0;
            let cb = data[pair + 1] as f32 - 128.0;

            let r = luma + 1.402 * cr;
            let g = luma - 0.344_136 * cb - 0.714_136 * cr;
            let b = luma + 1.772 * cb;

            let o = (row * w + col) * 4;
            rgba[o] = clamp_u8(r);
            rgba[o + 1] = clamp_u8(g);
            rgba[o + 2] = clamp_u8(b);
            rgba[o + 3] = 255;
        }
    }

    Ok(rgba)
}

/// Expand an interleaved buffer into an immutable [`PackedFrame`].
pub fn to_packed(data: &[u8], width: u32, height: u32, sequence: u64) -> Result<PackedFrame> {
    let rgba = interleaved_to_rgba(data, width, height)?;
    PackedFrame::from_vec(rgba, width, height, sequence)
}

/// Rotate a packed RGBA buffer clockwise by a quarter-turn multiple.
/// Returns the (possibly transposed) buffer and its new dimensions.
/// `Deg0` returns the input untouched.
pub fn rotate_rgba(data: Vec<u8>, width: u32, height: u32, rotation: Rotation) -> (Vec<u8>, u32, u32) {
    let w = width as usize;
    let h = height as usize;
    match rotation {
        Rotation::Deg0 => (data, width, height),
        Rotation::Deg90 => {
            let mut out = vec![0u8; data.len()];
            for y in 0..h {
                for x in 0..w {
                    let src = (y * w + x) * 4;
                    let dst = (x * h + (h - 1 - y)) * 4;
                    out[dst..dst + 4].copy_from_slice(&data[src..src + 4]);
                }
            }
            (out, height, width)
        }
        Rotation::Deg180 => {
            let mut out = vec![0u8; data.len()];
            for y in 0..h {
                for x in 0..w {
                    let src = (y * w + x) * 4;
                    let dst = ((h - 1 - y) * w + (w - 1 - x)) * 4;
                    out[dst..dst + 4].copy_from_slice(&data[src..src + 4]);
                }
            }
            (out, width, height)
        }
        Rotation::Deg270 => {
            let mut out = vec![0u8; data.len()];
            for y in 0..h {
                for x in 0..w {
                    let src = (y * w + x) * 4;
                    let dst = ((w - 1 - x) * h + y) * 4;
                    out[dst..dst + 4].copy_from_slice(&data[src..src + 4]);
                }
            }
            (out, height, width)
        }
    }
}

/// Collapse packed RGBA to a single-channel luma plane using the
/// perceptual weights 0.299 R + 0.587 G + 0.114 B.
pub fn rgba_to_luma(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .map(|px| {
            let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
            clamp_u8(y)
        })
        .collect()
}

#[inline]
fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::frame::Plane;
    use bytes::Bytes;

    fn planar_frame(
        width: u32,
        height: u32,
        y_fill: u8,
        u_fill: u8,
        v_fill: u8,
    ) -> RawFrame {
        let w = width as usize;
        let h = height as usize;
        let cw = chroma_dim(w);
        let ch = chroma_dim(h);
        RawFrame::new(
            width,
            height,
            Rotation::Deg0,
            vec![
                Plane::new(vec![y_fill; w * h], w, 1),
                Plane::new(vec![u_fill; cw * ch], cw, 1),
                Plane::new(vec![v_fill; cw * ch], cw, 1),
            ],
        )
    }

    #[test]
    fn interleave_places_v_before_u() {
        let frame = planar_frame(4, 4, 100, 200, 50);
        let out = to_interleaved(&frame).unwrap();
        assert_eq!(out.len(), 16 + 8);
        assert!(out[..16].iter().all(|&b| b == 100));
        // V byte leads each chroma pair
        assert_eq!(&out[16..20], &[50, 200, 50, 200]);
    }

    #[test]
    fn interleave_respects_row_padding() {
        // luma rows padded to stride 8 for a width-4 frame
        let mut y = vec![0u8; 8 * 4];
        for row in 0..4 {
            for col in 0..4 {
                y[row * 8 + col] = (row * 4 + col) as u8;
            }
        }
        let frame = RawFrame::new(
            4,
            4,
            Rotation::Deg0,
            vec![
                Plane::new(y, 8, 1),
                Plane::new(vec![128u8; 4], 2, 1),
                Plane::new(vec![128u8; 4], 2, 1),
            ],
        );
        let out = to_interleaved(&frame).unwrap();
        let expected: Vec<u8> = (0..16).collect();
        assert_eq!(&out[..16], &expected[..]);
    }

    #[test]
    fn interleave_gathers_strided_chroma() {
        // chroma samples every other byte, as semi-planar sources deliver
        let u = Bytes::from(vec![10u8, 0, 11, 0, 12, 0, 13, 0]);
        let v = Bytes::from(vec![20u8, 0, 21, 0, 22, 0, 23, 0]);
        let frame = RawFrame::new(
            4,
            4,
            Rotation::Deg0,
            vec![
                Plane::new(vec![0u8; 16], 4, 1),
                Plane::new(u, 4, 2),
                Plane::new(v, 4, 2),
            ],
        );
        let out = to_interleaved(&frame).unwrap();
        assert_eq!(&out[16..], &[20, 10, 21, 11, 22, 12, 23, 13]);
    }

    #[test]
    fn interleave_rejects_short_plane() {
        let mut frame = planar_frame(4, 4, 0, 128, 128);
        frame.planes[0] = Plane::new(vec![0u8; 10], 4, 1);
        assert!(to_interleaved(&frame).is_err());
    }

    #[test]
    fn neutral_chroma_gives_gray() {
        let frame = planar_frame(4, 4, 128, 128, 128);
        let interleaved = to_interleaved(&frame).unwrap();
        let packed = to_packed(&interleaved, 4, 4, 1).unwrap();
        for px in packed.data().chunks_exact(4) {
            assert_eq!(px, &[128, 128, 128, 255]);
        }
    }

    #[test]
    fn matched_pair_recovers_primaries() {
        // pure red in BT.601 full range: Y=76, U=85, V=255
        let frame = planar_frame(2, 2, 76, 85, 255);
        let interleaved = to_interleaved(&frame).unwrap();
        let rgba = interleaved_to_rgba(&interleaved, 2, 2).unwrap();
        let px = &rgba[..4];
        assert!((px[0] as i32 - 255).abs() <= 1, "r = {}", px[0]);
        assert!((px[1] as i32).abs() <= 1, "g = {}", px[1]);
        assert!((px[2] as i32).abs() <= 1, "b = {}", px[2]);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn expansion_rejects_short_buffer() {
        assert!(interleaved_to_rgba(&[0u8; 10], 4, 4).is_err());
    }

    #[test]
    fn rotate_quarter_turns() {
        // 2x1 frame: [A, B]
        let a = [1, 2, 3, 4];
        let b = [5, 6, 7, 8];
        let data: Vec<u8> = a.iter().chain(b.iter()).copied().collect();

        let (r90, w, h) = rotate_rgba(data.clone(), 2, 1, Rotation::Deg90);
        assert_eq!((w, h), (1, 2));
        assert_eq!(&r90[..4], &a);
        assert_eq!(&r90[4..], &b);

        let (r180, w, h) = rotate_rgba(data.clone(), 2, 1, Rotation::Deg180);
        assert_eq!((w, h), (2, 1));
        assert_eq!(&r180[..4], &b);
        assert_eq!(&r180[4..], &a);

        let (r270, w, h) = rotate_rgba(data.clone(), 2, 1, Rotation::Deg270);
        assert_eq!((w, h), (1, 2));
        assert_eq!(&r270[..4], &b);
        assert_eq!(&r270[4..], &a);

        let (r0, w, h) = rotate_rgba(data.clone(), 2, 1, Rotation::Deg0);
        assert_eq!((w, h), (2, 1));
        assert_eq!(r0, data);
    }

    #[test]
    fn luma_weights() {
        let rgba = [255u8, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255];
        let luma = rgba_to_luma(&rgba);
        assert_eq!(luma, vec![76, 150, 29]);
    }
}
