use {
    crate::*,
    base::{Epoch, Stamped},
    camera::{Camera, CameraError},
    image::Image,
    std::path::PathBuf,
    tokio::{sync::mpsc, time::Instant},
};

/// Where ticks come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    /// A `Ticker` at the session interval.
    Scheduled,
    /// Nothing ticks on its own, ticks are injected with `handle_event`.
    Manual,
}

/// Outcome of one snapshot, reported back to the loop.
#[derive(Debug)]
pub struct SnapshotResult {
    pub path: PathBuf,
    pub result: Result<Image, CameraError>,
}

#[derive(Debug)]
pub enum SessionEvent {
    Tick(Instant),
    /// Stamped with the epoch the snapshot was issued under.
    SnapshotDone(Stamped<SnapshotResult>),
    PipelineError(CameraError),
}

/// Runs capture sessions: validates the form, drives the camera and the
/// scheduler, and keeps the UI in sync.
///
/// Everything happens on the thread driving [`SessionController::process_next`];
/// snapshot and camera callbacks come back as [`SessionEvent`]s.
pub struct SessionController<U: SessionUi> {
    camera: Camera,
    ui: U,
    store: Option<SettingsStore>,
    settings: Settings,
    tick_mode: TickMode,
    config: Option<SessionConfig>,
    scheduler: Option<CaptureScheduler>,
    epoch: Epoch,
    /// Epoch of the snapshot that has not reported back yet.
    in_flight: Option<u64>,
    pipeline_error_shown: bool,
    is_running: bool,
    last_frame: Option<LastFrame>,
    sender: mpsc::UnboundedSender<SessionEvent>,
    receiver: mpsc::UnboundedReceiver<SessionEvent>,
}

impl<U: SessionUi> SessionController<U> {
    pub fn new(mut camera: Camera, ui: U, settings: Settings) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        camera.on_pipeline_error({
            let sender = sender.clone();
            move |error| {
                let _ = sender.send(SessionEvent::PipelineError(error));
            }
        });
        Self {
            camera,
            ui,
            store: None,
            settings,
            tick_mode: TickMode::Scheduled,
            config: None,
            scheduler: None,
            epoch: Epoch::new(),
            in_flight: None,
            pipeline_error_shown: false,
            is_running: false,
            last_frame: None,
            sender,
            receiver,
        }
    }

    /// Save the settings to `store` on shutdown.
    pub fn with_store(mut self, store: SettingsStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_tick_mode(mut self, tick_mode: TickMode) -> Self {
        self.tick_mode = tick_mode;
        self
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Whether a snapshot of the current session is still being taken.
    pub fn snapshot_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn last_frame(&self) -> Option<&LastFrame> {
        self.last_frame.as_ref()
    }

    /// Settings of the last accepted session, or the ones loaded at startup.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// A form filled from the current settings.
    pub fn form(&self) -> SessionForm {
        SessionForm::from_settings(&self.settings)
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn scheduler(&self) -> Option<&CaptureScheduler> {
        self.scheduler.as_ref()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    /// Sender into the event loop.
    pub fn events(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.sender.clone()
    }

    fn set_running(&mut self, running: bool) {
        if self.is_running != running {
            self.is_running = running;
            self.ui.running_changed(running);
        }
    }

    /// Start the camera without a session, for the live preview.
    pub async fn start_camera(&mut self) -> Result<(), CameraError> {
        self.camera.start().await?;
        self.pipeline_error_shown = false;
        Ok(())
    }

    pub async fn start_session(&mut self, form: &SessionForm) -> Result<(), SessionError> {
        let config = match form.validate() {
            Ok(config) => config,
            Err(error) => {
                log::warn!("session: invalid form: {}", error.to_string().replace('\n', " "));
                self.ui.show_error(&error.to_string());
                return Err(error.into());
            }
        };

        if self.scheduler.is_some() {
            self.stop_session();
        }

        if let Err(error) = self.camera.start().await {
            let error = SessionError::Pipeline(error);
            self.ui.show_error(&error.to_string());
            return Err(error);
        }
        self.pipeline_error_shown = false;

        let mut scheduler = CaptureScheduler::start(&config, Instant::now());
        if self.tick_mode == TickMode::Scheduled {
            scheduler.attach(Ticker::spawn(config.period(), self.sender.clone()));
        }
        self.epoch.advance();
        self.in_flight = None;
        log::info!(
            "session: started {} every {} s, {} frames",
            config.output_path_template.display(),
            config.interval_seconds,
            config.count
        );
        self.settings = Settings::from(&config);
        self.scheduler = Some(scheduler);
        self.config = Some(config);
        self.set_running(true);
        Ok(())
    }

    pub fn stop_session(&mut self) {
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.stop();
            log::info!("session: stopped after {} frames", scheduler.frames_done());
        }
        self.config = None;
        // results of snapshots still in flight are stale from here on
        self.epoch.advance();
        self.in_flight = None;
        self.set_running(false);
    }

    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.receiver.recv().await
    }

    /// Wait for the next event and handle it.
    pub async fn process_next(&mut self) {
        if let Some(event) = self.next_event().await {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Tick(now) => self.handle_tick(now),
            SessionEvent::SnapshotDone(stamped) => self.handle_snapshot(stamped),
            SessionEvent::PipelineError(error) => {
                log::error!("session: pipeline error: {}", error);
                if self.scheduler.is_some() {
                    self.stop_session();
                }
                // the camera is down until the next start, say so once
                if !self.pipeline_error_shown {
                    self.pipeline_error_shown = true;
                    self.ui.show_error(&format!("Camera error: {error}"));
                }
            }
        }
    }

    fn handle_tick(&mut self, now: Instant) {
        let Some(scheduler) = self.scheduler.as_mut() else {
            return;
        };
        let outcome = scheduler.on_tick(now);
        let frames = scheduler.frames_done();
        match outcome {
            TickOutcome::Idle | TickOutcome::Finished => {}
            TickOutcome::Fire { offset, complete } => {
                if self.in_flight.is_some() {
                    log::warn!("session: frame {} skipped, previous snapshot still running", offset);
                } else {
                    self.issue_snapshot(offset);
                }
                if complete {
                    // no epoch advance, the last snapshot still lands
                    self.scheduler = None;
                    self.config = None;
                    log::info!("session: complete, {} frames", frames);
                    self.set_running(false);
                }
            }
        }
    }

    fn issue_snapshot(&mut self, offset: u64) {
        let Some(config) = &self.config else {
            return;
        };
        let path = match sequencer::generate(&config.template(), offset) {
            Ok(path) => PathBuf::from(path),
            Err(error) => {
                log::error!("session: no filename for frame {}: {}", offset, error);
                return;
            }
        };
        log::debug!("session: frame {} -> {}", offset, path.display());

        let job = self.camera.snapshot(&path, config.width, config.height);
        let epoch = self.epoch.current();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let result = job.run().await;
            let _ = sender.send(SessionEvent::SnapshotDone(Stamped {
                epoch,
                inner: SnapshotResult { path, result },
            }));
        });
        self.in_flight = Some(epoch);
    }

    fn handle_snapshot(&mut self, stamped: Stamped<SnapshotResult>) {
        if self.in_flight == Some(stamped.epoch) {
            self.in_flight = None;
        }
        let Some(SnapshotResult { path, result }) = stamped.take_if_current(&self.epoch) else {
            log::debug!("session: discarding stale snapshot");
            return;
        };
        match result {
            Ok(image) => {
                let frame = LastFrame { image, path };
                self.ui.last_frame_changed(&frame);
                self.last_frame = Some(frame);
            }
            Err(error) => log::error!("session: snapshot {} failed: {}", path.display(), error),
        }
    }

    /// Stop the session, release the camera and save the settings.
    pub async fn shutdown(&mut self) {
        self.stop_session();
        self.camera.destroy().await;
        if let Some(store) = &self.store {
            store.save_or_log(&self.settings);
        }
    }
}
