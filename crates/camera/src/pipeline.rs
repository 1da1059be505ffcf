use {
    crate::*,
    image::Image,
    std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, AtomicU64, Ordering},
        },
        time::Duration,
    },
    tokio::{
        sync::{oneshot, watch},
        task::{JoinHandle, spawn_blocking},
    },
};

// how long an idle (Ready) worker sleeps between checks of its flags
const IDLE_POLL_MS: u64 = 20;

pub type ErrorCallback = Box<dyn Fn(CameraError) + Send + Sync>;

/// Latest frame published by the worker, `None` while not playing.
pub(crate) type FrameSlot = Option<Arc<Image>>;

/// Device and overlay handed back when a pipeline could not be built.
pub(crate) type Parts = (Box<dyn Device>, Box<dyn Overlay>);

type OpenResult = Result<DeviceInfo, (CameraError, Parts)>;

/// State shared between the camera and its worker thread.
#[derive(Clone)]
pub(crate) struct Shared {
    pub playing: Arc<AtomicBool>,
    pub cancel: Arc<AtomicBool>,
    pub window_handle: Arc<AtomicU64>,
    pub on_error: Arc<Mutex<Option<ErrorCallback>>>,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            playing: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(AtomicBool::new(false)),
            window_handle: Arc::new(AtomicU64::new(0)),
            on_error: Arc::new(Mutex::new(None)),
        }
    }

    fn report_error(&self, error: CameraError) {
        let callback = self.on_error.lock().unwrap_or_else(|e| e.into_inner());
        match callback.as_ref() {
            Some(callback) => callback(error),
            None => log::error!("camera pipeline: unhandled error: {}", error),
        }
    }
}

/// A built capture pipeline: device → converter → preview overlay, pumped by
/// one blocking worker.
pub(crate) struct Pipeline {
    shared: Shared,
    frames: watch::Receiver<FrameSlot>,
    info: DeviceInfo,
    join_handle: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Open the device on a new worker and wait (bounded) for the result.
    ///
    /// When opening fails the parts are handed back so a later start can retry.
    pub async fn build(
        device: Box<dyn Device>,
        overlay: Box<dyn Overlay>,
        shared: Shared,
        open_timeout: Duration,
    ) -> Result<Self, (CameraError, Option<Parts>)> {
        let (frames_tx, frames_rx) = watch::channel::<FrameSlot>(None);
        let (init_tx, init_rx) = oneshot::channel::<OpenResult>();

        shared.cancel.store(false, Ordering::Release);
        let join_handle = spawn_blocking({
            let shared = shared.clone();
            move || run_worker(device, overlay, shared, frames_tx, init_tx)
        });

        match tokio::time::timeout(open_timeout, init_rx).await {
            Ok(Ok(Ok(info))) => Ok(Self {
                shared,
                frames: frames_rx,
                info,
                join_handle: Some(join_handle),
            }),
            Ok(Ok(Err((error, parts)))) => Err((error, Some(parts))),
            Ok(Err(_)) => Err((
                CameraError::Pipeline("worker thread died during init".to_string()),
                None,
            )),
            Err(_) => {
                // leave the worker to exit on its own once the open returns
                shared.cancel.store(true, Ordering::Release);
                Err((
                    CameraError::Pipeline(format!(
                        "device did not open within {} ms",
                        open_timeout.as_millis()
                    )),
                    None,
                ))
            }
        }
    }

    pub fn info(&self) -> DeviceInfo {
        self.info
    }

    pub fn set_playing(&self, playing: bool) {
        self.shared.playing.store(playing, Ordering::Release);
    }

    pub fn subscribe(&self) -> watch::Receiver<FrameSlot> {
        self.frames.clone()
    }

    /// Signal the worker to stop; it closes the device on its way out.
    ///
    /// Returns the worker handle the first time, so the caller can wait for it.
    pub fn shutdown(&mut self) -> Option<JoinHandle<()>> {
        self.shared.playing.store(false, Ordering::Release);
        self.shared.cancel.store(true, Ordering::Release);
        self.join_handle.take()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        // detach, the worker observes `cancel` after its current capture returns
        self.shutdown();
    }
}

fn run_worker(
    mut device: Box<dyn Device>,
    mut overlay: Box<dyn Overlay>,
    shared: Shared,
    frames: watch::Sender<FrameSlot>,
    init: oneshot::Sender<OpenResult>,
) {
    // open on the worker so open and capture share one OS thread
    match device.open() {
        Ok(info) => {
            log::info!(
                "camera pipeline: device open, {} {:?} {:.1} fps",
                info.size,
                info.format,
                info.frame_rate
            );
            if init.send(Ok(info)).is_err() {
                device.close();
                return;
            }
        }
        Err(error) => {
            let _ = init.send(Err((error, (device, overlay))));
            return;
        }
    }

    let mut handshake_done = false;
    let mut overlay_bound = false;
    let mut was_playing = false;

    while !shared.cancel.load(Ordering::Acquire) {
        if !shared.playing.load(Ordering::Acquire) {
            if was_playing {
                // a paused pipeline must not serve stale frames
                frames.send_replace(None);
                was_playing = false;
            }
            std::thread::sleep(Duration::from_millis(IDLE_POLL_MS));
            continue;
        }
        was_playing = true;

        match device.blocking_capture() {
            Ok(frame) => {
                if !handshake_done {
                    handshake_done = true;
                    let handle = WindowHandle(shared.window_handle.load(Ordering::Acquire));
                    if handle.is_set() {
                        overlay.bind_preview_surface(handle);
                        overlay_bound = true;
                    } else {
                        log::error!("camera pipeline: should have window handle now");
                    }
                }
                if overlay_bound {
                    overlay.present(&frame);
                }
                frames.send_replace(Some(Arc::new(frame)));
            }
            Err(error) => {
                log::error!("camera pipeline: capture failed: {}", error);
                // like a bus error: drop back to Ready and tell the owner
                shared.playing.store(false, Ordering::Release);
                frames.send_replace(None);
                was_playing = false;
                shared.report_error(error);
            }
        }
    }

    device.close();
    log::debug!("camera pipeline: worker exited");
}
