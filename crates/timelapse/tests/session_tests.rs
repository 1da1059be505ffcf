use {
    base::Vec2,
    camera::*,
    image::{Image, PixelFormat},
    std::{
        path::{Path, PathBuf},
        time::Duration,
    },
    timelapse::*,
    tokio::time::Instant,
};

#[derive(Default)]
struct RecordingUi {
    errors: Vec<String>,
    running: Vec<bool>,
    frames: Vec<(PathBuf, Vec2<usize>)>,
}

impl SessionUi for RecordingUi {
    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn running_changed(&mut self, running: bool) {
        self.running.push(running);
    }

    fn last_frame_changed(&mut self, frame: &LastFrame) {
        self.frames.push((frame.path.clone(), frame.size()));
    }
}

/// Opens, then fails every capture.
struct BrokenDevice {
    fail_open: bool,
}

impl Device for BrokenDevice {
    fn open(&mut self) -> Result<DeviceInfo, CameraError> {
        if self.fail_open {
            return Err(CameraError::Device("no camera".to_string()));
        }
        Ok(DeviceInfo {
            size: Vec2::new(4, 4),
            format: PixelFormat::Rgb8,
            frame_rate: 30.0,
        })
    }

    fn close(&mut self) {}

    fn blocking_capture(&mut self) -> Result<Image, CameraError> {
        std::thread::sleep(Duration::from_millis(5));
        Err(CameraError::Stream("cable pulled".to_string()))
    }
}

/// Pattern frames, but the first one takes a while.
struct SlowStartDevice {
    first: bool,
}

impl Device for SlowStartDevice {
    fn open(&mut self) -> Result<DeviceInfo, CameraError> {
        Ok(DeviceInfo {
            size: Vec2::new(4, 4),
            format: PixelFormat::Rgb8,
            frame_rate: 100.0,
        })
    }

    fn close(&mut self) {}

    fn blocking_capture(&mut self) -> Result<Image, CameraError> {
        if self.first {
            self.first = false;
            std::thread::sleep(Duration::from_millis(500));
        } else {
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(Image::new(Vec2::new(4, 4), vec![200; 4 * 4 * 3], PixelFormat::Rgb8))
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("timelapse-session-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn pattern_camera() -> Camera {
    Camera::new(
        Box::new(PatternDevice::new(PatternConfig {
            size: Vec2::new(32, 24),
            frame_rate: 200.0,
        })),
        Box::new(NullOverlay),
    )
}

fn controller(camera: Camera) -> SessionController<RecordingUi> {
    SessionController::new(camera, RecordingUi::default(), Settings::default())
        .with_tick_mode(TickMode::Manual)
}

fn form(dir: &Path, basename: &str, count: u32, interval: u32) -> SessionForm {
    SessionForm {
        directory: Some(dir.to_path_buf()),
        basename: basename.to_string(),
        width: "16".to_string(),
        height: "0".to_string(),
        count: count.to_string(),
        interval: interval.to_string(),
    }
}

fn tick_after(offset: Duration) -> SessionEvent {
    SessionEvent::Tick(Instant::now() + offset)
}

async fn process<U: SessionUi>(controller: &mut SessionController<U>) {
    tokio::time::timeout(Duration::from_secs(5), controller.process_next())
        .await
        .expect("no session event");
}

#[tokio::test]
async fn test_invalid_form_not_started() {
    let dir = temp_dir("invalid");
    let mut controller = controller(pattern_camera());
    let mut form = form(&dir, "frame00.png", 3, 1);
    form.width = "wide".to_string();

    let result = controller.start_session(&form).await;
    assert!(matches!(result, Err(SessionError::Validation(_))));
    assert!(!controller.is_running());
    assert_eq!(controller.ui().errors, vec!["Width must be a number.".to_string()]);
    assert!(controller.ui().running.is_empty());
    assert_eq!(controller.camera().state(), PipelineState::Stopped);
    controller.shutdown().await;
}

#[tokio::test]
async fn test_camera_failure_not_started() {
    let dir = temp_dir("no-camera");
    let camera = Camera::new(Box::new(BrokenDevice { fail_open: true }), Box::new(NullOverlay));
    let mut controller = controller(camera);

    let result = controller.start_session(&form(&dir, "frame00.png", 3, 1)).await;
    assert!(matches!(result, Err(SessionError::Pipeline(_))));
    assert!(!controller.is_running());
    assert_eq!(controller.ui().errors.len(), 1);
    assert!(controller.scheduler().is_none());
    controller.shutdown().await;
}

#[tokio::test]
async fn test_session_runs_to_completion() {
    let dir = temp_dir("complete");
    let mut controller = controller(pattern_camera());
    controller.start_session(&form(&dir, "frame0000.png", 2, 1)).await.unwrap();
    assert!(controller.is_running());
    assert_eq!(controller.ui().running, vec![true]);

    controller.handle_event(tick_after(Duration::from_millis(1)));
    assert!(controller.is_running());
    process(&mut controller).await;
    controller.handle_event(tick_after(Duration::from_secs(2)));
    assert!(!controller.is_running());
    assert_eq!(controller.ui().running, vec![true, false]);
    assert!(controller.snapshot_in_flight());

    // late ticks after completion do nothing
    controller.handle_event(tick_after(Duration::from_secs(10)));

    // the last snapshot still lands, completion does not invalidate it
    process(&mut controller).await;
    assert!(!controller.snapshot_in_flight());
    assert_eq!(controller.ui().frames.len(), 2);
    assert!(dir.join("frame0000.png").exists());
    assert!(dir.join("frame0001.png").exists());
    assert!(!dir.join("frame0002.png").exists());

    let last = controller.last_frame().unwrap();
    assert_eq!(last.size(), Vec2::new(16, 12));
    assert_eq!(last.pixels().len(), 16 * 12);
    assert!(!controller.is_running());

    controller.shutdown().await;
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_late_snapshot_after_stop_discarded() {
    let dir = temp_dir("stale");
    let mut controller = controller(pattern_camera());
    controller.start_session(&form(&dir, "frame0000.png", 0, 1)).await.unwrap();

    controller.handle_event(tick_after(Duration::from_millis(1)));
    controller.stop_session();
    assert!(!controller.is_running());

    process(&mut controller).await;
    assert!(!controller.is_running());
    assert!(controller.last_frame().is_none());
    assert!(controller.ui().frames.is_empty());
    assert_eq!(controller.ui().running, vec![true, false]);

    // idempotent
    controller.stop_session();
    assert_eq!(controller.ui().running, vec![true, false]);

    controller.shutdown().await;
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_failed_snapshot_keeps_schedule() {
    let dir = temp_dir("failed-snapshot");
    let mut controller = controller(pattern_camera());
    controller.start_session(&form(&dir, "frame00.xyz", 0, 1)).await.unwrap();

    controller.handle_event(tick_after(Duration::from_millis(1)));
    process(&mut controller).await;
    assert!(controller.is_running());
    assert!(controller.last_frame().is_none());
    assert!(controller.ui().errors.is_empty());

    // the failed frame used up its number
    controller.handle_event(tick_after(Duration::from_secs(2)));
    assert_eq!(controller.scheduler().map(|s| s.frames_done()), Some(2));

    controller.shutdown().await;
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_pipeline_error_stops_session() {
    let dir = temp_dir("pipeline-error");
    let camera = Camera::new(Box::new(BrokenDevice { fail_open: false }), Box::new(NullOverlay));
    let mut controller = controller(camera);
    controller.start_session(&form(&dir, "frame00.png", 0, 1)).await.unwrap();
    assert!(controller.is_running());

    process(&mut controller).await;
    assert!(!controller.is_running());
    assert_eq!(controller.ui().errors.len(), 1);
    assert!(controller.ui().errors[0].contains("cable pulled"));
    assert_eq!(controller.camera().state(), PipelineState::Ready);

    controller.shutdown().await;
}

#[tokio::test]
async fn test_restart_replaces_session() {
    let dir = temp_dir("restart");
    let mut controller = controller(pattern_camera());
    controller.start_session(&form(&dir, "a000.png", 0, 1)).await.unwrap();
    controller.handle_event(tick_after(Duration::from_millis(1)));

    controller.start_session(&form(&dir, "b000.png", 5, 3)).await.unwrap();
    assert!(controller.is_running());
    assert_eq!(controller.ui().running, vec![true, false, true]);
    assert_eq!(controller.config().map(|c| c.count), Some(5));
    assert_eq!(controller.settings().interval, 3);

    // the snapshot issued by the first session is stale now
    process(&mut controller).await;
    assert!(controller.last_frame().is_none());

    controller.shutdown().await;
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_shutdown_saves_settings() {
    let dir = temp_dir("shutdown");
    let store = SettingsStore::new(dir.join("settings.toml"));
    let mut controller = SessionController::new(pattern_camera(), RecordingUi::default(), store.load())
        .with_store(store.clone())
        .with_tick_mode(TickMode::Manual);
    assert_eq!(controller.form().basename, "frame0000.jpeg");

    controller.start_session(&form(&dir, "keep07.png", 9, 4)).await.unwrap();
    controller.shutdown().await;
    assert!(!controller.is_running());
    assert_eq!(controller.camera().state(), PipelineState::Destroyed);

    let saved = store.load();
    assert_eq!(saved.filename, dir.join("keep07.png").to_string_lossy());
    assert_eq!((saved.width, saved.height), (16, 0));
    assert_eq!(saved.count, 9);
    assert_eq!(saved.interval, 4);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_scheduled_ticks_drive_session() {
    let dir = temp_dir("scheduled");
    let mut controller =
        SessionController::new(pattern_camera(), RecordingUi::default(), Settings::default());
    controller.start_session(&form(&dir, "tick0.png", 1, 1)).await.unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while controller.last_frame().is_none() && Instant::now() < deadline {
        process(&mut controller).await;
    }
    assert!(!controller.is_running());
    assert_eq!(controller.ui().frames.len(), 1);
    assert!(dir.join("tick0.png").exists());

    controller.shutdown().await;
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_one_snapshot_at_a_time() {
    let dir = temp_dir("one-at-a-time");
    let camera = Camera::new(Box::new(SlowStartDevice { first: true }), Box::new(NullOverlay));
    let mut controller = controller(camera);
    controller.start_session(&form(&dir, "f000.png", 0, 1)).await.unwrap();

    controller.handle_event(tick_after(Duration::from_millis(1)));
    assert!(controller.snapshot_in_flight());
    // both fire while the first frame is still coming, neither issues a request
    controller.handle_event(tick_after(Duration::from_millis(1001)));
    controller.handle_event(tick_after(Duration::from_millis(2001)));
    assert_eq!(controller.scheduler().map(|s| s.frames_done()), Some(3));

    process(&mut controller).await;
    assert!(!controller.snapshot_in_flight());
    assert_eq!(controller.ui().frames.len(), 1);
    assert_eq!(controller.ui().frames[0].0, dir.join("f000.png"));
    let nothing_else = tokio::time::timeout(Duration::from_millis(300), controller.next_event()).await;
    assert!(nothing_else.is_err());
    assert!(!dir.join("f001.png").exists());
    assert!(!dir.join("f002.png").exists());

    // skipped frames used up their numbers
    controller.handle_event(tick_after(Duration::from_millis(3001)));
    process(&mut controller).await;
    assert!(dir.join("f003.png").exists());
    assert_eq!(controller.ui().frames.len(), 2);

    controller.shutdown().await;
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_stop_clears_snapshot_in_flight() {
    let dir = temp_dir("stop-in-flight");
    let camera = Camera::new(Box::new(SlowStartDevice { first: true }), Box::new(NullOverlay));
    let mut controller = controller(camera);
    controller.start_session(&form(&dir, "g000.png", 0, 1)).await.unwrap();

    controller.handle_event(tick_after(Duration::from_millis(1)));
    assert!(controller.snapshot_in_flight());
    controller.start_session(&form(&dir, "h000.png", 0, 1)).await.unwrap();
    assert!(!controller.snapshot_in_flight());

    // the new session may issue right away
    controller.handle_event(tick_after(Duration::from_millis(1)));
    assert!(controller.snapshot_in_flight());

    // the stale result of the first session leaves the new request pending
    process(&mut controller).await;
    if controller.ui().frames.is_empty() {
        assert!(controller.snapshot_in_flight());
        process(&mut controller).await;
    }
    assert!(!controller.snapshot_in_flight());
    assert_eq!(controller.ui().frames.len(), 1);
    assert_eq!(controller.ui().frames[0].0, dir.join("h000.png"));

    controller.shutdown().await;
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_pipeline_error_without_session_shown_once() {
    let camera = Camera::new(Box::new(BrokenDevice { fail_open: false }), Box::new(NullOverlay));
    let mut controller = controller(camera);
    controller.start_camera().await.unwrap();
    assert!(!controller.is_running());

    process(&mut controller).await;
    assert_eq!(controller.camera().state(), PipelineState::Ready);
    assert_eq!(controller.ui().errors.len(), 1);
    assert!(controller.ui().errors[0].contains("cable pulled"));
    assert!(controller.ui().running.is_empty());

    // a repeated report before the camera is started again stays quiet
    controller
        .events()
        .send(SessionEvent::PipelineError(CameraError::Stream("again".to_string())))
        .unwrap();
    process(&mut controller).await;
    assert_eq!(controller.ui().errors.len(), 1);

    // a fresh start arms the message again
    controller.start_camera().await.unwrap();
    process(&mut controller).await;
    assert_eq!(controller.ui().errors.len(), 2);

    controller.shutdown().await;
}

#[tokio::test]
async fn test_log_ui_drains_final_snapshot() {
    let dir = temp_dir("log-ui");
    let mut controller = SessionController::new(pattern_camera(), LogUi, Settings::default())
        .with_tick_mode(TickMode::Manual);
    controller.start_session(&form(&dir, "last0.png", 1, 1)).await.unwrap();

    controller.handle_event(tick_after(Duration::from_millis(1)));
    assert!(!controller.is_running());
    while controller.snapshot_in_flight() {
        process(&mut controller).await;
    }
    assert!(dir.join("last0.png").exists());
    assert!(controller.last_frame().is_some());

    controller.shutdown().await;
    std::fs::remove_dir_all(&dir).ok();
}
