use {
    base::Vec2,
    camera::*,
    minifb::{Key, KeyRepeat, Window, WindowOptions},
    std::{path::PathBuf, time::Duration},
    timelapse::*,
};

const USAGE: &str = "usage: timelapse [--pattern] [--device PATH] [--no-preview]";

// how often the windows are polled and redrawn
const UI_FRAME_MS: u64 = 33;

// how long to wait for the last snapshot of a finished session
const DRAIN_TIMEOUT_MS: u64 = 3000;

#[derive(Debug, Default, PartialEq)]
struct Args {
    pattern: bool,
    device: Option<PathBuf>,
    no_preview: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--pattern" => parsed.pattern = true,
                "--no-preview" => parsed.no_preview = true,
                "--device" => match args.next() {
                    Some(path) => parsed.device = Some(PathBuf::from(path)),
                    None => return Err("--device needs a path".to_string()),
                },
                other => return Err(format!("unknown argument: {other}")),
            }
        }
        Ok(parsed)
    }

    fn device_config(&self) -> Result<DeviceConfig, String> {
        if self.pattern {
            return Ok(DeviceConfig::Pattern(PatternConfig::default()));
        }
        #[cfg(feature = "v4l2")]
        let config = DeviceConfig::V4l2(V4l2Config {
            path: self.device.clone(),
            ..V4l2Config::default()
        });
        #[cfg(not(feature = "v4l2"))]
        let config = {
            if self.device.is_some() {
                return Err("built without v4l2 support, use --pattern".to_string());
            }
            log::warn!("built without v4l2 support, using the test pattern");
            DeviceConfig::default()
        };
        Ok(config)
    }
}

/// Keeps what the windows have to show; the main loop draws it.
#[derive(Default)]
struct WindowUi {
    running: bool,
    error: Option<String>,
    last_frame: Option<(Vec2<usize>, Vec<u32>)>,
    last_frame_dirty: bool,
}

impl SessionUi for WindowUi {
    fn show_error(&mut self, message: &str) {
        log::error!("{}", message);
        eprintln!("Error: {}", message);
        self.error = Some(message.to_string());
    }

    fn running_changed(&mut self, running: bool) {
        log::info!("session {}", if running { "running" } else { "stopped" });
        self.running = running;
        if running {
            self.error = None;
        }
    }

    fn last_frame_changed(&mut self, frame: &LastFrame) {
        log::info!("captured {} ({})", frame.path.display(), frame.size());
        self.last_frame = Some((frame.size(), frame.pixels()));
        self.last_frame_dirty = true;
    }
}

impl WindowUi {
    fn title(&self) -> String {
        let state = if self.running { "running" } else { "idle" };
        match &self.error {
            Some(error) => format!("Timelapse ({state}) - {error}"),
            None => format!("Timelapse ({state}) - S start, X stop, Esc quit"),
        }
    }
}

fn session_controller<U: SessionUi>(
    camera: Camera,
    ui: U,
    settings: Settings,
    store: Option<SettingsStore>,
) -> SessionController<U> {
    let controller = SessionController::new(camera, ui, settings);
    match store {
        Some(store) => controller.with_store(store),
        None => controller,
    }
}

/// Handle events until no snapshot of the finished session is in flight.
async fn drain<U: SessionUi>(controller: &mut SessionController<U>) {
    let drained = tokio::time::timeout(Duration::from_millis(DRAIN_TIMEOUT_MS), async {
        while controller.snapshot_in_flight() {
            controller.process_next().await;
        }
    })
    .await;
    if drained.is_err() {
        log::warn!("no final snapshot within {} ms", DRAIN_TIMEOUT_MS);
    }
}

async fn run_headless(controller: &mut SessionController<LogUi>) {
    let form = controller.form();
    if controller.start_session(&form).await.is_err() {
        return;
    }
    while controller.is_running() {
        tokio::select! {
            Some(event) = controller.next_event() => controller.handle_event(event),
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted");
                return;
            }
        }
    }
    // a session that ran to completion may still have its last snapshot in flight
    drain(controller).await;
}

async fn run_windows(
    controller: &mut SessionController<WindowUi>,
    overlay: &SharedOverlay,
    mut live: Window,
) -> Result<(), minifb::Error> {
    let mut last: Option<Window> = None;
    let mut seen = 0u64;
    let mut ui_tick = tokio::time::interval(Duration::from_millis(UI_FRAME_MS));

    loop {
        tokio::select! {
            Some(event) = controller.next_event() => controller.handle_event(event),
            _ = ui_tick.tick() => {
                if !live.is_open() || live.is_key_down(Key::Escape) {
                    return Ok(());
                }
                if live.is_key_pressed(Key::S, KeyRepeat::No) {
                    let form = controller.form();
                    // failures were already shown
                    let _ = controller.start_session(&form).await;
                }
                if live.is_key_pressed(Key::X, KeyRepeat::No) {
                    controller.stop_session();
                }

                live.set_title(&controller.ui().title());
                match overlay.latest_after(seen) {
                    Some(frame) => {
                        seen = frame.sequence;
                        live.update_with_buffer(&frame.pixels, frame.size.x, frame.size.y)?;
                    }
                    None => live.update(),
                }

                let ui = controller.ui_mut();
                if ui.last_frame_dirty {
                    ui.last_frame_dirty = false;
                    if let Some((size, pixels)) = &ui.last_frame {
                        if last.as_ref().is_none_or(|window| window.get_size() != (size.x, size.y)) {
                            last = Some(Window::new("Last frame", size.x, size.y, WindowOptions::default())?);
                        }
                        if let Some(window) = last.as_mut() {
                            window.update_with_buffer(pixels, size.x, size.y)?;
                        }
                    }
                } else if let Some(window) = last.as_mut() {
                    window.update();
                }
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    base::init_stdout_logger();

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            std::process::exit(2);
        }
    };
    let device_config = match args.device_config() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    let store = match SettingsStore::open_default() {
        Ok(store) => Some(store),
        Err(error) => {
            log::warn!("settings will not be kept: {}", error);
            None
        }
    };
    let settings = store.as_ref().map(SettingsStore::load).unwrap_or_default();

    let overlay = SharedOverlay::new();
    let mut camera = if args.no_preview {
        Camera::from_config(&device_config, Box::new(NullOverlay))
    } else {
        Camera::from_config(&device_config, Box::new(overlay.clone()))
    };

    let live = if args.no_preview {
        None
    } else {
        let size = Vec2::new(settings.width as usize, settings.height as usize);
        let size = if size.is_empty() { Vec2::new(640, 480) } else { size };
        let window = Window::new(
            "Timelapse - S start, X stop, Esc quit",
            size.x,
            size.y,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )?;
        camera.set_window_handle(WindowHandle(window.get_window_handle() as usize as u64));
        Some(window)
    };

    match live {
        Some(live) => {
            let mut controller = session_controller(camera, WindowUi::default(), settings, store);
            // live view runs from startup, sessions only add snapshots
            if let Err(error) = controller.start_camera().await {
                controller.ui_mut().show_error(&format!("Could not start the camera: {error}"));
            }
            let result = run_windows(&mut controller, &overlay, live).await;
            controller.shutdown().await;
            result?;
        }
        None => {
            let mut controller = session_controller(camera, LogUi, settings, store);
            run_headless(&mut controller).await;
            controller.shutdown().await;
        }
    }
    Ok(())
}
