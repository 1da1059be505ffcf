use {base::Vec2, image::Image, std::path::PathBuf};

/// The most recent successful snapshot, as 32-bit ARGB.
#[derive(Debug, Clone)]
pub struct LastFrame {
    pub image: Image,
    pub path: PathBuf,
}

impl LastFrame {
    pub fn size(&self) -> Vec2<usize> {
        self.image.size
    }

    /// Pixels packed as `0xAARRGGBB`, ready for a framebuffer.
    pub fn pixels(&self) -> Vec<u32> {
        image::argb_to_u32(self.image.size, &self.image.data)
    }
}

/// What the session needs from the user interface.
pub trait SessionUi {
    /// Show a modal error message.
    fn show_error(&mut self, message: &str);

    /// The running indicator changed.
    fn running_changed(&mut self, running: bool);

    /// A new last frame is available, redraw its preview.
    fn last_frame_changed(&mut self, frame: &LastFrame);
}

/// UI that only logs, for headless runs.
pub struct LogUi;

impl SessionUi for LogUi {
    fn show_error(&mut self, message: &str) {
        log::error!("{}", message);
    }

    fn running_changed(&mut self, running: bool) {
        log::info!("session {}", if running { "running" } else { "stopped" });
    }

    fn last_frame_changed(&mut self, frame: &LastFrame) {
        log::info!("captured {} ({})", frame.path.display(), frame.size());
    }
}
