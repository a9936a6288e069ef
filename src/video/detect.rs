//! Region detection seam
//!
//! The pipeline only needs something that maps a luma plane to zero or
//! more rectangles. The trait keeps the actual model swappable; the
//! built-in backend is a simple bright-region scanner so the overlay
//! path stays exercised without a trained classifier.

use std::path::Path;
use tracing::{info, warn};

/// Axis-aligned region in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

pub trait Detector: Send {
    fn name(&self) -> &'static str;

    /// Detect regions in a single luma plane. An empty result is a
    /// normal outcome, not an error.
    fn detect(&mut self, luma: &[u8], width: u32, height: u32) -> Vec<Rect>;
}

/// Bright-region backend: reports the bounding box of pixels above a
/// fixed luma threshold, when that box is at least `min_size` on both
/// sides.
pub struct LumaBlobDetector {
    threshold: u8,
    min_size: u32,
}

impl LumaBlobDetector {
    pub fn new(min_size: u32) -> Self {
        Self {
            threshold: 200,
            min_size,
        }
    }
}

impl Detector for LumaBlobDetector {
    fn name(&self) -> &'static str {
        "luma-blob"
    }

    fn detect(&mut self, luma: &[u8], width: u32, height: u32) -> Vec<Rect> {
        let w = width as usize;
        let h = height as usize;
        if luma.len() < w * h {
            return Vec::new();
        }

        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0usize;
        let mut max_y = 0usize;
        let mut found = false;

        for y in 0..h {
            let row = &luma[y * w..y * w + w];
            for (x, &px) in row.iter().enumerate() {
                if px > self.threshold {
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                    found = true;
                }
            }
        }

        if !found {
            return Vec::new();
        }

        let bw = (max_x - min_x + 1) as u32;
        let bh = (max_y - min_y + 1) as u32;
        if bw < self.min_size || bh < self.min_size {
            return Vec::new();
        }

        vec![Rect {
            x: min_x as u32,
            y: min_y as u32,
            width: bw,
            height: bh,
        }]
    }
}

/// Build a detector from the configured asset path. A missing path,
/// missing file, or zero-length file silently disables detection.
pub fn from_asset(path: Option<&Path>, min_size: u32) -> Option<Box<dyn Detector>> {
    let path = match path {
        Some(p) => p,
        None => {
            info!("No detector asset configured, detection disabled");
            return None;
        }
    };

    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => {
            info!(asset = %path.display(), "Detector asset loaded");
            Some(Box::new(LumaBlobDetector::new(min_size)))
        }
        Ok(_) => {
            warn!(asset = %path.display(), "Detector asset is empty, detection disabled");
            None
        }
        Err(e) => {
            warn!(asset = %path.display(), error = %e, "Detector asset unavailable, detection disabled");
            None
        }
    }
}

/// Stroke width of region overlays, in pixels
pub const BOX_STROKE: u32 = 2;

/// Overlay color, opaque green
pub const BOX_COLOR: [u8; 4] = [0, 255, 0, 255];

/// Draw rectangle outlines onto a packed RGBA buffer. Regions partially
/// outside the frame are clipped.
pub fn draw_boxes(rgba: &mut [u8], width: u32, height: u32, rects: &[Rect]) {
    let w = width as i64;
    let h = height as i64;
    for rect in rects {
        let x0 = rect.x as i64;
        let y0 = rect.y as i64;
        let x1 = x0 + rect.width as i64;
        let y1 = y0 + rect.height as i64;
        let stroke = BOX_STROKE as i64;

        for band in 0..stroke {
            // horizontal edges
            for x in x0..x1 {
                put_pixel(rgba, w, h, x, y0 + band);
                put_pixel(rgba, w, h, x, y1 - 1 - band);
            }
            // vertical edges
            for y in y0..y1 {
                put_pixel(rgba, w, h, x0 + band, y);
                put_pixel(rgba, w, h, x1 - 1 - band, y);
            }
        }
    }
}

#[inline]
fn put_pixel(rgba: &mut [u8], w: i64, h: i64, x: i64, y: i64) {
    if x < 0 || y < 0 || x >= w || y >= h {
        return;
    }
    let o = ((y * w + x) * 4) as usize;
    rgba[o..o + 4].copy_from_slice(&BOX_COLOR);
}
