use {
    crate::{pipeline::*, *},
    base::Vec2,
    image::{Image, ImageError},
    std::{
        path::PathBuf,
        sync::{Arc, atomic::Ordering},
        time::Duration,
    },
    tokio::{sync::watch, task::spawn_blocking},
};

// how long start() waits for the device to open
const DEFAULT_OPEN_TIMEOUT_MS: u64 = 5000;

// how long a snapshot waits for a frame
const DEFAULT_SNAPSHOT_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Not built yet.
    Stopped,
    /// Built, device open, frames not pumped.
    Ready,
    Playing,
    /// Terminal.
    Destroyed,
}

/// Live camera: one capture pipeline plus at most one preview overlay.
///
/// The pipeline is built on the first [`Camera::start`]. [`Camera::stop`]
/// pauses it without closing the device, [`Camera::destroy`] releases
/// everything.
pub struct Camera {
    device: Option<Box<dyn Device>>,
    overlay: Option<Box<dyn Overlay>>,
    pipeline: Option<Pipeline>,
    shared: Shared,
    state: PipelineState,
    open_timeout: Duration,
    snapshot_timeout: Duration,
}

impl Camera {
    pub fn new(device: Box<dyn Device>, overlay: Box<dyn Overlay>) -> Self {
        Self {
            device: Some(device),
            overlay: Some(overlay),
            pipeline: None,
            shared: Shared::new(),
            state: PipelineState::Stopped,
            open_timeout: Duration::from_millis(DEFAULT_OPEN_TIMEOUT_MS),
            snapshot_timeout: Duration::from_millis(DEFAULT_SNAPSHOT_TIMEOUT_MS),
        }
    }

    pub fn from_config(config: &DeviceConfig, overlay: Box<dyn Overlay>) -> Self {
        Self::new(create_device(config), overlay)
    }

    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    pub fn with_snapshot_timeout(mut self, timeout: Duration) -> Self {
        self.snapshot_timeout = timeout;
        self
    }

    /// Current state. A pipeline that failed while playing reports `Ready`.
    pub fn state(&self) -> PipelineState {
        match self.state {
            PipelineState::Playing if !self.shared.playing.load(Ordering::Acquire) => {
                PipelineState::Ready
            }
            state => state,
        }
    }

    /// Whether the pipeline has been built.
    pub fn is_initialized(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Native frame size of the open device.
    pub fn native_size(&self) -> Option<Vec2<usize>> {
        self.pipeline.as_ref().map(|pipeline| pipeline.info().size)
    }

    /// Record the surface the live preview goes to. Read when the first frame
    /// is presented, so it has to be set before the first `start`.
    pub fn set_window_handle(&mut self, handle: WindowHandle) {
        log::debug!("camera: window handle {:#x}", handle.0);
        self.shared.window_handle.store(handle.0, Ordering::Release);
    }

    /// Register the callback for errors of the running pipeline. It runs on
    /// the capture worker thread.
    pub fn on_pipeline_error(&mut self, callback: impl Fn(CameraError) + Send + Sync + 'static) {
        *self.shared.on_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(Box::new(callback));
    }

    pub async fn start(&mut self) -> Result<(), CameraError> {
        match self.state() {
            PipelineState::Playing => return Ok(()),
            PipelineState::Destroyed => {
                log::error!("camera: start after destroy");
                return Err(CameraError::Destroyed);
            }
            PipelineState::Stopped | PipelineState::Ready => {}
        }

        if self.pipeline.is_none() {
            let (Some(device), Some(overlay)) = (self.device.take(), self.overlay.take()) else {
                let error = CameraError::Pipeline("capture device lost by an earlier failed open".to_string());
                log::error!("camera: unable to set the pipeline to the playing state: {}", error);
                return Err(error);
            };
            match Pipeline::build(device, overlay, self.shared.clone(), self.open_timeout).await {
                Ok(pipeline) => {
                    let info = pipeline.info();
                    log::info!("camera: pipeline built, {} {:?}", info.size, info.format);
                    self.pipeline = Some(pipeline);
                }
                Err((error, parts)) => {
                    if let Some((device, overlay)) = parts {
                        self.device = Some(device);
                        self.overlay = Some(overlay);
                    }
                    log::error!("camera: unable to set the pipeline to the playing state: {}", error);
                    return Err(error);
                }
            }
        }

        if let Some(pipeline) = &self.pipeline {
            pipeline.set_playing(true);
        }
        self.state = PipelineState::Playing;
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(pipeline) = &self.pipeline {
            pipeline.set_playing(false);
        }
        if self.state == PipelineState::Playing {
            self.state = PipelineState::Ready;
        }
    }

    /// Cancel the worker, wait for it to close the device and drop the pipeline.
    pub async fn destroy(&mut self) {
        if self.state == PipelineState::Destroyed {
            return;
        }
        if let Some(mut pipeline) = self.pipeline.take() {
            if let Some(join_handle) = pipeline.shutdown() {
                if let Err(error) = join_handle.await {
                    log::error!("camera: worker panicked: {}", error);
                }
            }
        }
        self.device = None;
        self.overlay = None;
        self.state = PipelineState::Destroyed;
        log::debug!("camera: destroyed");
    }

    /// Prepare a snapshot of the next available frame into `path`.
    ///
    /// The returned job owns everything it needs, so it can be spawned while
    /// the camera keeps being used. A zero `width` or `height` means native.
    pub fn snapshot(&self, path: impl Into<PathBuf>, width: u32, height: u32) -> SnapshotJob {
        let source = match (self.state(), &self.pipeline) {
            (PipelineState::Playing, Some(pipeline)) => Ok(pipeline.subscribe()),
            (PipelineState::Destroyed, _) => Err(CameraError::Destroyed),
            _ => Err(CameraError::NotPlaying),
        };
        SnapshotJob {
            source,
            path: path.into(),
            requested: Vec2::new(width as usize, height as usize),
            timeout: self.snapshot_timeout,
        }
    }

    /// Take, scale and save a snapshot, returning the saved ARGB image.
    pub async fn capture_snapshot(
        &self,
        path: impl Into<PathBuf>,
        width: u32,
        height: u32,
    ) -> Result<Image, CameraError> {
        self.snapshot(path, width, height).run().await
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        if let Some(mut pipeline) = self.pipeline.take() {
            pipeline.shutdown();
        }
    }
}

/// One pending snapshot, detached from the camera.
pub struct SnapshotJob {
    source: Result<watch::Receiver<FrameSlot>, CameraError>,
    path: PathBuf,
    requested: Vec2<usize>,
    timeout: Duration,
}

impl SnapshotJob {
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub async fn run(self) -> Result<Image, CameraError> {
        let frames = self.source?;
        let frame = wait_for_frame(frames, self.timeout).await?;

        let requested = self.requested;
        let argb = spawn_blocking(move || -> Result<Image, ImageError> {
            let argb = image::to_argb(&frame)?;
            let size = argb.size.resolve(requested);
            image::resize_argb(&argb, size)
        })
        .await
        .map_err(|error| CameraError::Pipeline(error.to_string()))??;

        let saved = image::save_argb(self.path.clone(), argb).await?;
        log::debug!("camera: snapshot {} written to {}", saved.size, self.path.display());
        Ok(saved)
    }
}

async fn wait_for_frame(
    mut frames: watch::Receiver<FrameSlot>,
    timeout: Duration,
) -> Result<Arc<Image>, CameraError> {
    match tokio::time::timeout(timeout, frames.wait_for(Option::is_some)).await {
        Ok(Ok(slot)) => slot.as_ref().cloned().ok_or(CameraError::NotPlaying),
        // the worker is gone
        Ok(Err(_)) => Err(CameraError::NotPlaying),
        Err(_) => Err(CameraError::Timeout(timeout)),
    }
}
