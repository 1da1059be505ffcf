use {
    base::Vec2,
    image::Image,
    std::sync::{Arc, Mutex},
};

/// Opaque handle of the surface the live preview is drawn into. 0 means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowHandle(pub u64);

impl WindowHandle {
    pub const UNSET: WindowHandle = WindowHandle(0);

    pub fn is_set(&self) -> bool {
        self.0 != 0
    }
}

/// The live preview sink of a pipeline.
///
/// The pipeline calls `bind_preview_surface` once, when the first frame is
/// ready to be shown, and `present` for every frame after a successful bind.
/// Both run on the pipeline worker thread.
pub trait Overlay: Send {
    fn bind_preview_surface(&mut self, handle: WindowHandle);
    fn present(&mut self, frame: &Image);
}

/// Overlay that drops every frame.
pub struct NullOverlay;

impl Overlay for NullOverlay {
    fn bind_preview_surface(&mut self, _handle: WindowHandle) {}
    fn present(&mut self, _frame: &Image) {}
}

/// A frame ready to be drawn: packed `0xAARRGGBB` pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewFrame {
    pub size: Vec2<usize>,
    pub pixels: Vec<u32>,
    pub sequence: u64,
}

#[derive(Default)]
struct SharedState {
    handle: WindowHandle,
    frame: Option<PreviewFrame>,
    sequence: u64,
}

/// Overlay keeping the latest frame for a UI thread to pick up.
///
/// Clones share the same slot: hand one to the camera and keep the other to draw from.
#[derive(Clone, Default)]
pub struct SharedOverlay {
    state: Arc<Mutex<SharedState>>,
}

impl SharedOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface the preview was bound to, `UNSET` before the handshake.
    pub fn bound_handle(&self) -> WindowHandle {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).handle
    }

    /// The latest frame if it is newer than `seen`.
    pub fn latest_after(&self, seen: u64) -> Option<PreviewFrame> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.frame.as_ref().filter(|f| f.sequence > seen).cloned()
    }
}

impl Overlay for SharedOverlay {
    fn bind_preview_surface(&mut self, handle: WindowHandle) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).handle = handle;
    }

    fn present(&mut self, frame: &Image) {
        let argb = match image::to_argb(frame) {
            Ok(argb) => argb,
            Err(error) => {
                log::warn!("overlay: dropping frame: {}", error);
                return;
            }
        };
        let pixels = image::argb_to_u32(argb.size, &argb.data);
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.sequence += 1;
        let sequence = state.sequence;
        state.frame = Some(PreviewFrame {
            size: argb.size,
            pixels,
            sequence,
        });
    }
}
