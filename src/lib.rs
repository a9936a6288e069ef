//! framecast - real-time camera frame processing and distribution
//!
//! A capture source feeds planar YUV frames into a single processing
//! pipeline: rate gating, color conversion to packed RGBA, an optional
//! per-frame filter, then publication through lock-free single-slot
//! mailboxes. Two consumers hang off the mailboxes: a render sink for a
//! GPU upload loop and an HTTP surface serving JPEG snapshots plus
//! control endpoints.

pub mod config;
pub mod error;
pub mod render;
pub mod source;
pub mod state;
pub mod video;
pub mod web;

pub use error::{AppError, Result};
