//! Frame processing pipeline
//!
//! Single ingest path: gate, convert, rotate, filter, publish. Runs on
//! the capture thread; everything it shares with other threads
//! (mailboxes, metrics, the filter cell) is lock-free.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::trace;

use super::convert::{interleaved_to_rgba, rotate_rgba, to_interleaved};
use super::detect::Detector;
use super::filter::{FilterCell, FilterEngine};
use super::frame::{PackedFrame, RawFrame};
use super::gate::RateGate;
use super::mailbox::FrameMailbox;
use crate::config::AppConfig;
use crate::error::Result;

/// Counters shared between the pipeline and the HTTP status surface.
/// FPS is stored as hundredths to stay atomic.
#[derive(Default)]
pub struct PipelineMetrics {
    pub frames_processed: AtomicU64,
    pub frames_dropped: AtomicU64,
    pub fps_x100: AtomicU32,
}

impl PipelineMetrics {
    pub fn fps(&self) -> f32 {
        self.fps_x100.load(Ordering::Relaxed) as f32 / 100.0
    }
}

pub struct FramePipeline {
    gate: RateGate,
    engine: FilterEngine,
    filter: Arc<FilterCell>,
    render_mailbox: Arc<FrameMailbox>,
    stream_mailbox: Arc<FrameMailbox>,
    metrics: Arc<PipelineMetrics>,
    sequence: u64,
    window_start: Instant,
    window_frames: u32,
}

impl FramePipeline {
    pub fn new(
        config: &AppConfig,
        filter: Arc<FilterCell>,
        render_mailbox: Arc<FrameMailbox>,
        stream_mailbox: Arc<FrameMailbox>,
        metrics: Arc<PipelineMetrics>,
        detector: Option<Box<dyn Detector>>,
    ) -> Self {
        Self {
            gate: RateGate::new(config.pipeline.min_frame_interval_ms),
            engine: FilterEngine::new(config.edge.clone(), config.motion.clone(), detector),
            filter,
            render_mailbox,
            stream_mailbox,
            metrics,
            sequence: 0,
            window_start: Instant::now(),
            window_frames: 0,
        }
    }

    /// Ingest one raw frame. Returns the published frame, or `None` when
    /// the gate dropped it. A conversion or filter error leaves all
    /// published state untouched; the caller logs and moves on.
    pub fn process(&mut self, frame: &RawFrame, now_ms: u64) -> Result<Option<PackedFrame>> {
        if !self.gate.should_process(now_ms) {
            self.metrics.frames_dropped.fetch_add(1, Ordering::Relaxed);
            trace!(now_ms, "Frame dropped by rate gate");
            return Ok(None);
        }

        let mode = self.filter.get();

        let interleaved = to_interleaved(frame)?;
        let rgba = interleaved_to_rgba(&interleaved, frame.width, frame.height)?;
        let (mut rgba, width, height) = rotate_rgba(rgba, frame.width, frame.height, frame.rotation);

        self.engine.apply(mode, &mut rgba, width, height)?;

        let packed = PackedFrame::from_vec(rgba, width, height, self.sequence + 1)?;
        self.sequence += 1;

        self.render_mailbox.publish(packed.clone());
        self.stream_mailbox.publish(packed.clone());

        self.metrics.frames_processed.fetch_add(1, Ordering::Relaxed);
        self.update_fps();

        trace!(
            sequence = packed.sequence,
            width,
            height,
            filter = mode.as_str(),
            "Frame published"
        );

        Ok(Some(packed))
    }

    fn update_fps(&mut self) {
        self.window_frames += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed.as_secs() >= 1 {
            let fps = self.window_frames as f32 / elapsed.as_secs_f32();
            self.metrics
                .fps_x100
                .store((fps * 100.0) as u32, Ordering::Relaxed);
            self.window_start = Instant::now();
            self.window_frames = 0;
        }
    }

    /// Drop temporal state across a source restart. The sequence counter
    /// keeps running so consumers treat the next frame as new.
    pub fn reset(&mut self) {
        self.engine.reset();
    }

    pub fn gate_stats(&self) -> super::gate::GateStats {
        self.gate.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::filter::FilterMode;
    use crate::video::format::Rotation;
    use crate::video::frame::Plane;

    fn raw_frame(width: u32, height: u32, luma: u8) -> RawFrame {
        let w = width as usize;
        let h = height as usize;
        let cw = (w + 1) / 2;
        let ch = (h + 1) / 2;
        RawFrame::new(
            width,
            height,
            Rotation::Deg0,
            vec![
                Plane::new(vec![luma; w * h], w, 1),
                Plane::new(vec![128u8; cw * ch], cw, 1),
                Plane::new(vec![128u8; cw * ch], cw, 1),
            ],
        )
    }

    struct Fixture {
        pipeline: FramePipeline,
        filter: Arc<FilterCell>,
        render: Arc<FrameMailbox>,
        stream: Arc<FrameMailbox>,
        metrics: Arc<PipelineMetrics>,
    }

    fn fixture() -> Fixture {
        let filter = Arc::new(FilterCell::default());
        let render = Arc::new(FrameMailbox::new());
        let stream = Arc::new(FrameMailbox::new());
        let metrics = Arc::new(PipelineMetrics::default());
        let pipeline = FramePipeline::new(
            &AppConfig::default(),
            filter.clone(),
            render.clone(),
            stream.clone(),
            metrics.clone(),
            None,
        );
        Fixture {
            pipeline,
            filter,
            render,
            stream,
            metrics,
        }
    }

    #[test]
    fn publishes_to_both_mailboxes() {
        let mut f = fixture();
        let out = f.pipeline.process(&raw_frame(8, 8, 128), 0).unwrap();
        let frame = out.unwrap();
        assert_eq!(frame.sequence, 1);
        assert_eq!(f.render.latest().unwrap().sequence, 1);
        assert_eq!(f.stream.latest().unwrap().sequence, 1);
        // neutral chroma: gray pixels
        assert_eq!(&frame.data()[..4], &[128, 128, 128, 255]);
    }

    #[test]
    fn gate_drops_are_counted_and_publish_nothing() {
        let mut f = fixture();
        assert!(f.pipeline.process(&raw_frame(8, 8, 0), 0).unwrap().is_some());
        assert!(f.pipeline.process(&raw_frame(8, 8, 0), 50).unwrap().is_none());
        assert!(f.pipeline.process(&raw_frame(8, 8, 0), 100).unwrap().is_none());
        assert!(f.pipeline.process(&raw_frame(8, 8, 0), 150).unwrap().is_some());
        assert_eq!(f.metrics.frames_processed.load(Ordering::Relaxed), 2);
        assert_eq!(f.metrics.frames_dropped.load(Ordering::Relaxed), 2);
        assert_eq!(f.stream.latest().unwrap().sequence, 2);
    }

    #[test]
    fn filter_change_applies_to_next_frame() {
        let mut f = fixture();
        f.pipeline.process(&raw_frame(8, 8, 128), 0).unwrap();
        f.filter.set(FilterMode::Grayscale);
        let frame = f.pipeline.process(&raw_frame(8, 8, 128), 200).unwrap().unwrap();
        for px in frame.data().chunks_exact(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn rotation_transposes_published_frame() {
        let mut f = fixture();
        let mut frame = raw_frame(8, 4, 100);
        frame.rotation = Rotation::Deg90;
        let out = f.pipeline.process(&frame, 0).unwrap().unwrap();
        assert_eq!((out.width, out.height), (4, 8));
        assert_eq!(out.len(), 4 * 8 * 4);
    }

    #[test]
    fn bad_frame_is_contained() {
        let mut f = fixture();
        let mut frame = raw_frame(8, 8, 0);
        frame.planes.pop();
        assert!(f.pipeline.process(&frame, 0).is_err());
        // nothing published, sequence untouched
        assert!(f.stream.latest().is_none());
        let ok = f.pipeline.process(&raw_frame(8, 8, 0), 500).unwrap().unwrap();
        assert_eq!(ok.sequence, 1);
    }
}
