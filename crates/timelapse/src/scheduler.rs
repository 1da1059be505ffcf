use {
    crate::*,
    std::time::Duration,
    tokio::{
        sync::mpsc,
        task::JoinHandle,
        time::{Instant, MissedTickBehavior},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not due yet.
    Idle,
    /// Take frame `offset` now. `complete` is set on the last frame.
    Fire { offset: u64, complete: bool },
    /// The job already completed.
    Finished,
}

/// Decides on each tick whether a frame is due.
///
/// Fire times are kept on the grid `start + k * period`: a late tick does not
/// shift later frames, and missed frames are not caught up.
#[derive(Debug)]
pub struct CaptureScheduler {
    next_fire_time: Instant,
    period: Duration,
    image_number: u64,
    frames_done: u64,
    target_count: u64,
    finished: bool,
    ticker: Option<TickHandle>,
}

impl CaptureScheduler {
    pub fn start(config: &SessionConfig, now: Instant) -> Self {
        Self {
            next_fire_time: now,
            period: config.period(),
            image_number: 0,
            frames_done: 0,
            target_count: config.count as u64,
            finished: false,
            ticker: None,
        }
    }

    /// Attach the tick source, cancelled on completion or `stop`.
    pub fn attach(&mut self, ticker: TickHandle) {
        self.ticker = Some(ticker);
    }

    pub fn on_tick(&mut self, now: Instant) -> TickOutcome {
        if self.finished {
            return TickOutcome::Finished;
        }
        if now <= self.next_fire_time {
            return TickOutcome::Idle;
        }
        self.next_fire_time += self.period;
        let offset = self.image_number;
        self.image_number += 1;
        self.frames_done += 1;

        let complete = self.target_count != 0 && self.frames_done >= self.target_count;
        if complete {
            self.finished = true;
            self.stop();
        }
        TickOutcome::Fire { offset, complete }
    }

    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_fire_time(&self) -> Instant {
        self.next_fire_time
    }

    pub fn frames_done(&self) -> u64 {
        self.frames_done
    }

    pub fn target_count(&self) -> u64 {
        self.target_count
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn has_ticker(&self) -> bool {
        self.ticker.is_some()
    }
}

/// Repeating tick source feeding `SessionEvent::Tick` into the event channel.
pub struct Ticker;

impl Ticker {
    /// Start ticking every `period`, the first tick immediately.
    pub fn spawn(period: Duration, sender: mpsc::UnboundedSender<SessionEvent>) -> TickHandle {
        let join_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if sender.send(SessionEvent::Tick(Instant::now())).is_err() {
                    // controller gone
                    return;
                }
            }
        });
        TickHandle { join_handle }
    }
}

/// Cancels its tick task when cancelled or dropped.
#[derive(Debug)]
pub struct TickHandle {
    join_handle: JoinHandle<()>,
}

impl TickHandle {
    pub fn cancel(&self) {
        self.join_handle.abort();
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.join_handle.abort();
    }
}
