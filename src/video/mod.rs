//! Frame processing and distribution
//!
//! Raw planar YUV goes in on the capture thread; packed RGBA frames
//! come out through single-slot mailboxes feeding the render and
//! streaming sinks.

pub mod convert;
pub mod detect;
pub mod filter;
pub mod format;
pub mod frame;
pub mod gate;
pub mod mailbox;
pub mod pipeline;
pub mod stabilize;

pub use filter::{FilterCell, FilterMode};
pub use format::{Resolution, Rotation};
pub use frame::{PackedFrame, Plane, RawFrame};
pub use mailbox::FrameMailbox;
pub use pipeline::{FramePipeline, PipelineMetrics};
