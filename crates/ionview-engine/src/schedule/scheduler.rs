use std::cell::Cell;
use std::rc::Rc;

use crate::core::AppControl;
use crate::time::{FrameClock, FrameTime};

use super::host::{FrameHost, FrameToken};

/// Per-frame work driven by [`FrameScheduler`].
///
/// Stages are invoked in declaration order, exactly once per rendered frame.
pub trait FrameStages {
    /// Advances time-based state by `dt` seconds.
    fn advance_animation(&mut self, dt: f32);

    /// Applies accumulated user interaction.
    fn update_interaction(&mut self);

    /// Renders and presents one frame.
    fn render(&mut self, time: &FrameTime) -> AppControl;
}

/// Shared flag that stops the render loop at its next reschedule point.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Rc<Cell<bool>>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SchedulerState {
    /// Not started.
    Idle,
    /// Waiting for the first callback, which only records a timestamp.
    Priming,
    Running,
    Stopped,
}

/// Result of one delivered callback.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FrameOutcome {
    /// First callback; clock primed, nothing rendered.
    Primed,
    Rendered(FrameTime),
    /// The loop ended during this callback; no further frame is requested.
    Stopped,
    /// Callback delivered while idle or stopped. Nothing happened.
    Ignored,
}

/// Display-synchronized render loop.
///
/// Owns the [`FrameClock`]. Each callback computes a clamped delta and drives
/// animation, interaction and rendering in that order before requesting the
/// next frame from the host.
#[derive(Debug)]
pub struct FrameScheduler {
    clock: FrameClock,
    state: SchedulerState,
    pending: Option<FrameToken>,
    cancel: CancelHandle,
    rendered: u64,
}

impl FrameScheduler {
    pub fn new(clock: FrameClock) -> Self {
        Self {
            clock,
            state: SchedulerState::Idle,
            pending: None,
            cancel: CancelHandle::default(),
            rendered: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Number of frames rendered so far.
    pub fn rendered_frames(&self) -> u64 {
        self.rendered
    }

    /// Handle that stops the loop before its next reschedule.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Requests the priming callback. Only valid from `Idle`.
    pub fn start<H>(&mut self, host: &mut H)
    where
        H: FrameHost + ?Sized,
    {
        if self.state != SchedulerState::Idle {
            log::warn!("frame scheduler start ignored in state {:?}", self.state);
            return;
        }
        if self.cancel.is_cancelled() {
            log::info!("frame scheduler cancelled before start");
            self.state = SchedulerState::Stopped;
            return;
        }

        self.pending = Some(host.request_frame());
        self.state = SchedulerState::Priming;
        log::debug!("frame scheduler started");
    }

    /// Handles one host callback.
    pub fn on_frame<H, S>(&mut self, timestamp_ms: f64, host: &mut H, stages: &mut S) -> FrameOutcome
    where
        H: FrameHost + ?Sized,
        S: FrameStages + ?Sized,
    {
        match self.state {
            SchedulerState::Idle | SchedulerState::Stopped => {
                log::trace!("frame callback at {timestamp_ms:.3} ms ignored in state {:?}", self.state);
                return FrameOutcome::Ignored;
            }
            SchedulerState::Priming | SchedulerState::Running => {}
        }

        // The delivered callback consumes the outstanding request.
        self.pending = None;

        let time = match self.clock.tick(timestamp_ms) {
            Some(time) if self.state == SchedulerState::Running => time,
            _ => {
                // Priming frame: the clock has only recorded the timestamp.
                self.state = SchedulerState::Running;
                return if self.reschedule(host) {
                    FrameOutcome::Primed
                } else {
                    FrameOutcome::Stopped
                };
            }
        };

        stages.advance_animation(time.dt);
        stages.update_interaction();
        let control = stages.render(&time);
        self.rendered += 1;

        if control == AppControl::Exit {
            log::info!("frame scheduler stopping: render requested exit");
            self.state = SchedulerState::Stopped;
            return FrameOutcome::Stopped;
        }

        if self.reschedule(host) {
            FrameOutcome::Rendered(time)
        } else {
            FrameOutcome::Stopped
        }
    }

    /// Withdraws the pending callback and stops the loop.
    pub fn stop<H>(&mut self, host: &mut H)
    where
        H: FrameHost + ?Sized,
    {
        if let Some(token) = self.pending.take() {
            if !host.cancel_frame(token) {
                log::debug!("frame request {} was no longer pending at stop", token.raw());
            }
        }
        self.cancel.cancel();
        if self.state != SchedulerState::Stopped {
            log::info!("frame scheduler stopped after {} frames", self.rendered);
        }
        self.state = SchedulerState::Stopped;
    }

    fn reschedule<H>(&mut self, host: &mut H) -> bool
    where
        H: FrameHost + ?Sized,
    {
        if self.cancel.is_cancelled() {
            log::info!("frame scheduler cancelled after {} frames", self.rendered);
            self.state = SchedulerState::Stopped;
            return false;
        }
        self.pending = Some(host.request_frame());
        true
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(FrameClock::new())
    }
}
