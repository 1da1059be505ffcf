//! Webcam capture for the timelapse application.
//!
//! A [`Camera`] owns one capture pipeline: a [`Device`] pumped by a blocking
//! worker, publishing frames to snapshots and to a preview [`Overlay`].

mod error;
pub use error::*;

mod device;
pub use device::*;

mod overlay;
pub use overlay::*;

mod pipeline;
pub use pipeline::ErrorCallback;

mod camera;
pub use camera::*;

pub mod pattern;
pub use pattern::{PatternConfig, PatternDevice};

#[cfg(feature = "v4l2")]
pub mod v4l2;

#[cfg(feature = "v4l2")]
pub use v4l2::{V4l2Config, V4l2Device};
