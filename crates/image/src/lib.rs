//! Pixel buffers for the timelapse workspace.
//!
//! Frames arrive from capture devices in whatever format the device offers.
//! Everything downstream works on 32-bit ARGB (bytes A, R, G, B per pixel);
//! this crate converts into that layout, scales it, reorders it for the
//! `image` crate's encoders and writes it to disk.

mod argb;
pub use argb::*;

mod error;
pub use error::*;

mod image;
pub use image::*;

mod pixelformat;
pub use pixelformat::*;

mod save;
pub use save::*;

mod packed;
pub use packed::*;
