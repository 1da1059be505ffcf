//! Timelapse capture sessions.
//!
//! A [`SessionController`] turns a [`SessionForm`] into a running session:
//! the [`CaptureScheduler`] decides when a frame is due, the [`sequencer`]
//! names it and the camera snapshots it.

mod error;
pub use error::*;

pub mod sequencer;

mod config;
pub use config::*;

mod settings;
pub use settings::*;

mod scheduler;
pub use scheduler::*;

mod ui;
pub use ui::*;

mod session;
pub use session::*;
