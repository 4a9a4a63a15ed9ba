//! Per-node oscillators
//!
//! An oscillator moves one node along
//! `y(t) = base_y + amplitude * sin(angular_speed * t + phase)`.
//! The position is a pure function of the frame timestamp, so any tick can be
//! computed (and tested) without replaying earlier ones.
//!
//! [`Oscillator`] is the two-state machine (Running, Stopped). It never
//! schedules anything itself: each frame it answers with a [`FrameDecision`],
//! and [`OscillatorTask`] turns `Continue` into the next scheduled frame.

use rand::Rng;
use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use crate::config::MotionConfig;
use crate::error::Result;
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::target::RenderTarget;

/// Fixed parameters of one node's motion
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OscillatorConfig {
    /// Resting coordinate, taken from the node
    pub base_y: f64,
    pub amplitude: f64,
    /// Radians per millisecond
    pub angular_speed: f64,
    /// Radians, in `[0, 2π)`
    pub phase: f64,
}

impl OscillatorConfig {
    pub fn new(base_y: f64, amplitude: f64, angular_speed: f64, phase: f64) -> Self {
        Self {
            base_y,
            amplitude,
            angular_speed,
            phase,
        }
    }

    /// Displacement from the resting coordinate at time `t`
    pub fn offset(&self, t: f64) -> f64 {
        self.amplitude * (self.angular_speed * t + self.phase).sin()
    }

    /// Absolute vertical coordinate at time `t`
    pub fn position(&self, t: f64) -> f64 {
        self.base_y + self.offset(t)
    }
}

/// Draws randomized oscillator parameters
///
/// The random source is passed per call, so tests can seed it and hosts can
/// use `rand::thread_rng()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OscillatorFactory {
    motion: MotionConfig,
}

impl OscillatorFactory {
    /// Factory over custom ranges; fails if a range cannot be sampled
    pub fn new(motion: MotionConfig) -> Result<Self> {
        motion.validate()?;
        Ok(Self { motion })
    }

    pub fn motion(&self) -> &MotionConfig {
        &self.motion
    }

    /// Draw amplitude, speed, and phase independently and uniformly
    pub fn create<R: Rng + ?Sized>(&self, base_y: f64, rng: &mut R) -> OscillatorConfig {
        OscillatorConfig {
            base_y,
            amplitude: rng.gen_range(self.motion.amplitude.as_range()),
            angular_speed: rng.gen_range(self.motion.speed.as_range()),
            phase: rng.gen_range(0.0..TAU),
        }
    }
}

/// What an oscillator wants after handling a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameDecision {
    /// Schedule another frame
    Continue,
    /// Stopped; schedule nothing
    Halt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// `pending` is empty only before the first frame is armed and briefly
    /// between a frame firing and the next being armed
    Running { pending: Option<FrameHandle> },
    Stopped,
}

/// Running/Stopped state machine for one node
///
/// Stopped is terminal. A graph that is shown again gets fresh oscillators.
#[derive(Debug)]
pub struct Oscillator {
    config: OscillatorConfig,
    state: State,
}

impl Oscillator {
    /// A running oscillator waiting for its first frame
    pub fn new(config: OscillatorConfig) -> Self {
        Self {
            config,
            state: State::Running { pending: None },
        }
    }

    pub fn config(&self) -> &OscillatorConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    /// The scheduled frame, if one is outstanding
    pub fn pending(&self) -> Option<FrameHandle> {
        match self.state {
            State::Running { pending } => pending,
            State::Stopped => None,
        }
    }

    /// Record the handle of the next scheduled frame
    ///
    /// Returns false if the oscillator is already stopped, in which case the
    /// caller owns the handle and should cancel it.
    pub fn arm(&mut self, handle: FrameHandle) -> bool {
        match &mut self.state {
            State::Running { pending } => {
                *pending = Some(handle);
                true
            }
            State::Stopped => false,
        }
    }

    /// Handle one frame
    ///
    /// Running: writes the position for `timestamp` to `target` and asks to
    /// continue. Stopped: a frame that was already in flight when `stop` ran;
    /// nothing is written.
    pub fn tick(&mut self, timestamp: f64, target: &mut dyn RenderTarget) -> FrameDecision {
        match &mut self.state {
            State::Running { pending } => {
                // The frame being handled is the one that was pending
                *pending = None;
                target.set_y(self.config.position(timestamp));
                FrameDecision::Continue
            }
            State::Stopped => {
                tracing::trace!("discarding frame at {:.1}ms for stopped oscillator", timestamp);
                FrameDecision::Halt
            }
        }
    }

    /// Transition to Stopped, cancelling the outstanding frame
    ///
    /// Returns true if this call did the transition. Stopping twice is a
    /// no-op and never cancels twice.
    pub fn stop(&mut self, scheduler: &dyn FrameScheduler) -> bool {
        match std::mem::replace(&mut self.state, State::Stopped) {
            State::Running { pending } => {
                if let Some(handle) = pending {
                    scheduler.cancel(handle);
                }
                true
            }
            State::Stopped => false,
        }
    }
}

/// An oscillator bound to its render target and driven by a scheduler
///
/// Each scheduled frame holds only a weak reference to the task, so a task
/// dropped by its owner can never be written through again.
pub struct OscillatorTask {
    oscillator: Oscillator,
    target: Box<dyn RenderTarget>,
    scheduler: Rc<dyn FrameScheduler>,
}

impl OscillatorTask {
    /// Create a running oscillator and schedule its first frame
    pub fn start(
        config: OscillatorConfig,
        target: Box<dyn RenderTarget>,
        scheduler: Rc<dyn FrameScheduler>,
    ) -> Rc<RefCell<Self>> {
        let task = Rc::new(RefCell::new(Self {
            oscillator: Oscillator::new(config),
            target,
            scheduler,
        }));
        Self::arm(&task);
        task
    }

    fn arm(task: &Rc<RefCell<Self>>) {
        let scheduler = Rc::clone(&task.borrow().scheduler);
        let weak = Rc::downgrade(task);

        let handle = scheduler.schedule(Box::new(move |timestamp: f64| {
            let Some(task) = weak.upgrade() else {
                return;
            };
            let decision = task.borrow_mut().on_frame(timestamp);
            if decision == FrameDecision::Continue {
                Self::arm(&task);
            }
        }));

        if !task.borrow_mut().oscillator.arm(handle) {
            scheduler.cancel(handle);
        }
    }

    fn on_frame(&mut self, timestamp: f64) -> FrameDecision {
        self.oscillator.tick(timestamp, self.target.as_mut())
    }

    /// Stop the oscillator; see [`Oscillator::stop`]
    pub fn stop(&mut self) -> bool {
        self.oscillator.stop(self.scheduler.as_ref())
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }
}
