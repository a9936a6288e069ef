//! Shared application state for the HTTP surface

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::video::filter::{FilterCell, FilterMode};
use crate::video::mailbox::FrameMailbox;
use crate::video::pipeline::PipelineMetrics;

/// Host-side control actions the HTTP surface delegates to: capturing a
/// photo, switching cameras, reacting to filter changes. Implementations
/// return whether they accepted the action; the default host accepts
/// nothing.
pub trait HostControl: Send + Sync {
    fn capture(&self) -> bool {
        false
    }

    fn switch_camera(&self) -> bool {
        false
    }

    fn filter_changed(&self, _mode: FilterMode) -> bool {
        false
    }

    fn lens_facing(&self) -> String {
        "unknown".to_string()
    }

    /// Names of captured photos, newest first.
    fn gallery(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Host that accepts no control actions, used when the binary runs
/// without an embedding application.
pub struct NoopHost;

impl HostControl for NoopHost {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub filter: &'static str,
    pub fps: f32,
    pub frames: u64,
    pub served_frames: u64,
    pub lens_facing: String,
}

pub struct AppState {
    pub filter: Arc<FilterCell>,
    pub stream_mailbox: Arc<FrameMailbox>,
    pub metrics: Arc<PipelineMetrics>,
    pub host: Arc<dyn HostControl>,
    pub jpeg_quality: u8,
    served_frames: AtomicU64,
}

impl AppState {
    pub fn new(
        filter: Arc<FilterCell>,
        stream_mailbox: Arc<FrameMailbox>,
        metrics: Arc<PipelineMetrics>,
        host: Arc<dyn HostControl>,
        jpeg_quality: u8,
    ) -> Arc<Self> {
        Arc::new(Self {
            filter,
            stream_mailbox,
            metrics,
            host,
            jpeg_quality,
            served_frames: AtomicU64::new(0),
        })
    }

    pub fn record_served_frame(&self) {
        self.served_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn served_frames(&self) -> u64 {
        self.served_frames.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            filter: self.filter.get().as_str(),
            fps: self.metrics.fps(),
            frames: self.metrics.frames_processed.load(Ordering::Relaxed),
            served_frames: self.served_frames(),
            lens_facing: self.host.lens_facing(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Arc<AppState> {
        AppState::new(
            Arc::new(FilterCell::default()),
            Arc::new(FrameMailbox::new()),
            Arc::new(PipelineMetrics::default()),
            Arc::new(NoopHost),
            85,
        )
    }

    #[test]
    fn status_reflects_filter_and_counters() {
        let state = state();
        state.filter.set(FilterMode::Grayscale);
        state.record_served_frame();
        state.record_served_frame();

        let status = state.status();
        assert_eq!(status.filter, "GRAYSCALE");
        assert_eq!(status.served_frames, 2);
        assert_eq!(status.frames, 0);
        assert_eq!(status.lens_facing, "unknown");
    }

    #[test]
    fn status_serializes_camel_case() {
        let json = serde_json::to_value(state().status()).unwrap();
        assert!(json.get("servedFrames").is_some());
        assert!(json.get("lensFacing").is_some());
    }

    #[test]
    fn noop_host_accepts_nothing() {
        let host = NoopHost;
        assert!(!host.capture());
        assert!(!host.switch_camera());
        assert!(!host.filter_changed(FilterMode::None));
        assert!(host.gallery().is_empty());
    }
}
