//! Per-frame filters and the shared filter mode cell
//!
//! The active mode is a single atomic byte so HTTP handlers can change
//! it mid-stream without taking a lock on the processing thread.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

use super::convert::rgba_to_luma;
use super::detect::{draw_boxes, Detector};
use super::stabilize::MotionStabilizer;
use crate::config::{EdgeConfig, MotionConfig};
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FilterMode {
    #[default]
    #[serde(rename = "NONE")]
    None = 0,
    #[serde(rename = "GRAYSCALE")]
    Grayscale = 1,
    #[serde(rename = "EDGE_DETECTION")]
    EdgeDetection = 2,
}

impl FilterMode {
    /// Normalize a request string to a mode. Matching is case-insensitive
    /// and accepts short aliases; anything unrecognized maps to `None`.
    pub fn normalize(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "GRAY" | "GRAYSCALE" => FilterMode::Grayscale,
            "EDGE" | "EDGE_DETECTION" => FilterMode::EdgeDetection,
            _ => FilterMode::None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            FilterMode::None => "NONE",
            FilterMode::Grayscale => "GRAYSCALE",
            FilterMode::EdgeDetection => "EDGE_DETECTION",
        }
    }

    const fn from_u8(v: u8) -> Self {
        match v {
            1 => FilterMode::Grayscale,
            2 => FilterMode::EdgeDetection,
            _ => FilterMode::None,
        }
    }
}

/// Lock-free holder of the active filter mode
pub struct FilterCell(AtomicU8);

impl FilterCell {
    pub fn new(mode: FilterMode) -> Self {
        Self(AtomicU8::new(mode as u8))
    }

    pub fn get(&self) -> FilterMode {
        FilterMode::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, mode: FilterMode) {
        self.0.store(mode as u8, Ordering::SeqCst);
    }
}

impl Default for FilterCell {
    fn default() -> Self {
        Self::new(FilterMode::None)
    }
}

/// Applies the active filter to packed RGBA frames. Owns the temporal
/// stabilizer and the optional region detector, both of which only run
/// on the pass-through path.
pub struct FilterEngine {
    edge: EdgeConfig,
    stabilizer: MotionStabilizer,
    detector: Option<Box<dyn Detector>>,
}

impl FilterEngine {
    pub fn new(edge: EdgeConfig, motion: MotionConfig, detector: Option<Box<dyn Detector>>) -> Self {
        let mut edge = edge;
        // blur kernels must be odd
        if edge.blur_kernel % 2 == 0 {
            edge.blur_kernel += 1;
        }
        Self {
            edge,
            stabilizer: MotionStabilizer::new(motion),
            detector,
        }
    }

    /// Apply the given mode to an RGBA buffer in place.
    pub fn apply(&mut self, mode: FilterMode, rgba: &mut [u8], width: u32, height: u32) -> Result<()> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(AppError::Pipeline(format!(
                "filter input length {} does not match {}x{}",
                rgba.len(),
                width,
                height
            )));
        }

        match mode {
            FilterMode::None => {
                let luma = rgba_to_luma(rgba);
                let stabilized = self.stabilizer.stabilize(&luma);
                if let Some(detector) = self.detector.as_mut() {
                    let regions = detector.detect(&stabilized, width, height);
                    if !regions.is_empty() {
                        draw_boxes(rgba, width, height, &regions);
                    }
                }
            }
            FilterMode::Grayscale => {
                for px in rgba.chunks_exact_mut(4) {
                    let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
                    let y = y.round().clamp(0.0, 255.0) as u8;
                    px[0] = y;
                    px[1] = y;
                    px[2] = y;
                    px[3] = 255;
                }
            }
            FilterMode::EdgeDetection => {
                let luma = rgba_to_luma(rgba);
                let blurred = gaussian_blur(
                    &luma,
                    width as usize,
                    height as usize,
                    self.edge.blur_kernel,
                    self.edge.blur_sigma,
                );
                let edges = trace_edges(
                    &blurred,
                    width as usize,
                    height as usize,
                    self.edge.low_threshold,
                    self.edge.high_threshold,
                );
                for (px, &e) in rgba.chunks_exact_mut(4).zip(edges.iter()) {
                    px[0] = e;
                    px[1] = e;
                    px[2] = e;
                    px[3] = 255;
                }
            }
        }
        Ok(())
    }

    /// Drop temporal state, used when the source restarts.
    pub fn reset(&mut self) {
        self.stabilizer.reset();
    }
}

fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    let half = (size / 2) as i32;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-(i * i) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Separable Gaussian blur with replicated borders.
fn gaussian_blur(luma: &[u8], w: usize, h: usize, size: usize, sigma: f32) -> Vec<f32> {
    let kernel = gaussian_kernel(size, sigma);
    let half = (size / 2) as i64;

    // horizontal pass
    let mut tmp = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, &k) in kernel.iter().enumerate() {
                let sx = (x as i64 + i as i64 - half).clamp(0, w as i64 - 1) as usize;
                acc += k * luma[y * w + sx] as f32;
            }
            tmp[y * w + x] = acc;
        }
    }

    // vertical pass
    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, &k) in kernel.iter().enumerate() {
                let sy = (y as i64 + i as i64 - half).clamp(0, h as i64 - 1) as usize;
                acc += k * tmp[sy * w + x];
            }
            out[y * w + x] = acc;
        }
    }
    out
}

/// Sobel gradient plus double-threshold hysteresis. Pixels at or above
/// the high threshold are edges; pixels between the thresholds become
/// edges only when an 8-neighbor is above the high threshold. The
/// output is strictly 0 or 255.
fn trace_edges(blurred: &[f32], w: usize, h: usize, low: f32, high: f32) -> Vec<u8> {
    let mut magnitude = vec![0.0f32; w * h];
    if w >= 3 && h >= 3 {
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let p = |dx: i64, dy: i64| {
                    blurred[((y as i64 + dy) as usize) * w + (x as i64 + dx) as usize]
                };
                let gx = -p(-1, -1) - 2.0 * p(-1, 0) - p(-1, 1)
                    + p(1, -1) + 2.0 * p(1, 0) + p(1, 1);
                let gy = -p(-1, -1) - 2.0 * p(0, -1) - p(1, -1)
                    + p(-1, 1) + 2.0 * p(0, 1) + p(1, 1);
                magnitude[y * w + x] = gx.abs() + gy.abs();
            }
        }
    }

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let m = magnitude[y * w + x];
            if m >= high {
                out[y * w + x] = 255;
            } else if m >= low {
                // weak edge, keep only next to a strong one
                'scan: for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = x as i64 + dx;
                        let ny = y as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                            continue;
                        }
                        if magnitude[ny as usize * w + nx as usize] >= high {
                            out[y * w + x] = 255;
                            break 'scan;
                        }
                    }
                }
            }
        }
    }
    out
}
