//! Frame scheduling
//!
//! The engine only needs "call this once at the next frame, with a
//! timestamp" and a best-effort way to take that back. [`FrameScheduler`]
//! is that contract; hosts implement it over their own paint loop.
//!
//! Two hosts ship with the crate:
//! - [`ManualFrameScheduler`] - frames are delivered by calling `advance()`
//! - [`FrameLoop`] - paces a manual scheduler on the calling thread at a
//!   target frame rate
//!
//! Everything here runs on a single thread. Callbacks are not `Send`, and a
//! callback may schedule or cancel from inside its own dispatch.

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

new_key_type! {
    /// Handle to a scheduled frame callback
    ///
    /// Generational: once the callback fires or is cancelled the handle goes
    /// stale, and cancelling it again does nothing.
    pub struct FrameHandle;
}

/// One-shot frame callback, invoked with the frame timestamp in milliseconds
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Host primitive for "run this once at the next paint"
pub trait FrameScheduler {
    /// Arrange for `callback` to run once at the next frame
    ///
    /// Timestamps delivered across calls never decrease.
    fn schedule(&self, callback: FrameCallback) -> FrameHandle;

    /// Best-effort withdrawal of a scheduled callback
    ///
    /// May lose the race against a callback the host has already dispatched;
    /// callers must not treat this as a synchronous guarantee.
    fn cancel(&self, handle: FrameHandle);

    /// Whether the host can deliver frames at all
    ///
    /// When false, the engine renders statically and schedules nothing.
    fn is_available(&self) -> bool {
        true
    }
}

// ============================================================================
// Manual Scheduler
// ============================================================================

struct Scheduled {
    seq: u64,
    callback: FrameCallback,
}

struct ManualInner {
    pending: SlotMap<FrameHandle, Scheduled>,
    next_seq: u64,
    last_timestamp: Option<f64>,
    cancel_calls: usize,
    frames: u64,
}

/// Scheduler whose frames are delivered by the host calling [`advance`]
///
/// Each `advance` dispatches exactly the callbacks pending when it was
/// called, in the order they were scheduled. Callbacks scheduled during
/// dispatch wait for the next frame.
///
/// The whole batch is taken out of the queue before the first callback runs,
/// so a `cancel` issued mid-dispatch cannot stop a later callback of the same
/// batch. That is the in-flight race every frame host has, made
/// deterministic.
///
/// [`advance`]: ManualFrameScheduler::advance
pub struct ManualFrameScheduler {
    inner: RefCell<ManualInner>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(ManualInner {
                pending: SlotMap::with_key(),
                next_seq: 0,
                last_timestamp: None,
                cancel_calls: 0,
                frames: 0,
            }),
        }
    }

    /// Deliver one frame at `timestamp` milliseconds
    ///
    /// A timestamp earlier than the previous frame is clamped to it, as is a
    /// non-finite one. The first frame may carry any finite timestamp; a
    /// non-finite first timestamp becomes 0.
    /// Returns the number of callbacks dispatched.
    pub fn advance(&self, timestamp: f64) -> usize {
        let (timestamp, batch) = {
            let mut inner = self.inner.borrow_mut();
            let timestamp = match inner.last_timestamp {
                Some(last) if !timestamp.is_finite() || timestamp < last => {
                    tracing::warn!(
                        "frame timestamp {} is not after {}, clamping",
                        timestamp,
                        last
                    );
                    last
                }
                None if !timestamp.is_finite() => {
                    tracing::warn!("first frame timestamp {} is not finite, using 0", timestamp);
                    0.0
                }
                _ => timestamp,
            };
            inner.last_timestamp = Some(timestamp);
            inner.frames += 1;

            let mut batch: SmallVec<[Scheduled; 16]> =
                inner.pending.drain().map(|(_, scheduled)| scheduled).collect();
            batch.sort_unstable_by_key(|scheduled| scheduled.seq);
            (timestamp, batch)
        };

        let dispatched = batch.len();
        for scheduled in batch {
            (scheduled.callback)(timestamp);
        }

        tracing::trace!("frame at {:.1}ms dispatched {} callbacks", timestamp, dispatched);
        dispatched
    }

    /// Number of callbacks waiting for the next frame
    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Number of `cancel` calls received, stale handles included
    pub fn cancel_count(&self) -> usize {
        self.inner.borrow().cancel_calls
    }

    /// Number of frames delivered so far
    pub fn frame_count(&self) -> u64 {
        self.inner.borrow().frames
    }

    /// Timestamp of the last delivered frame, `None` before the first one
    pub fn last_timestamp(&self) -> Option<f64> {
        self.inner.borrow().last_timestamp
    }
}

impl Default for ManualFrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn schedule(&self, callback: FrameCallback) -> FrameHandle {
        let mut inner = self.inner.borrow_mut();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.pending.insert(Scheduled { seq, callback })
    }

    fn cancel(&self, handle: FrameHandle) {
        let mut inner = self.inner.borrow_mut();
        inner.cancel_calls += 1;
        inner.pending.remove(handle);
    }
}

/// Stand-in for hosts without a frame primitive
///
/// Reports itself unavailable and drops anything scheduled on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableScheduler;

impl FrameScheduler for UnavailableScheduler {
    fn schedule(&self, _callback: FrameCallback) -> FrameHandle {
        FrameHandle::default()
    }

    fn cancel(&self, _handle: FrameHandle) {}

    fn is_available(&self) -> bool {
        false
    }
}

// ============================================================================
// Paced Frame Loop
// ============================================================================

/// Totals from one run of a [`FrameLoop`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u64,
    pub callbacks: usize,
}

/// Drives a [`ManualFrameScheduler`] at a fixed rate on the calling thread
///
/// Timestamps are milliseconds since the loop first ran, so they are
/// monotonic across repeated `run_*` calls.
///
/// ```ignore
/// let scheduler = Rc::new(ManualFrameScheduler::new());
/// let mut frame_loop = FrameLoop::new(scheduler.clone()).with_target_fps(60);
/// frame_loop.run_for(Duration::from_secs(2));
/// ```
pub struct FrameLoop {
    scheduler: Rc<ManualFrameScheduler>,
    target_fps: u32,
    origin: Option<Instant>,
}

impl FrameLoop {
    pub const DEFAULT_FPS: u32 = 60;

    pub fn new(scheduler: Rc<ManualFrameScheduler>) -> Self {
        Self {
            scheduler,
            target_fps: Self::DEFAULT_FPS,
            origin: None,
        }
    }

    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps.max(1);
        self
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.target_fps))
    }

    pub fn scheduler(&self) -> &Rc<ManualFrameScheduler> {
        &self.scheduler
    }

    /// Deliver exactly `frames` frames
    pub fn run_frames(&mut self, frames: u64) -> FrameStats {
        let mut stats = FrameStats::default();
        for _ in 0..frames {
            stats.callbacks += self.step();
            stats.frames += 1;
        }
        stats
    }

    /// Deliver frames until `duration` of wall time has passed
    pub fn run_for(&mut self, duration: Duration) -> FrameStats {
        let deadline = Instant::now() + duration;
        let mut stats = FrameStats::default();
        while Instant::now() < deadline {
            stats.callbacks += self.step();
            stats.frames += 1;
        }
        stats
    }

    fn step(&mut self) -> usize {
        let start = Instant::now();
        let origin = *self.origin.get_or_insert(start);
        let timestamp = (start - origin).as_secs_f64() * 1000.0;

        let dispatched = self.scheduler.advance(timestamp);

        // Sleep for remaining frame time
        let frame_duration = self.frame_duration();
        let elapsed = start.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorder(log: &Rc<RefCell<Vec<f64>>>) -> FrameCallback {
        let log = Rc::clone(log);
        Box::new(move |t: f64| log.borrow_mut().push(t))
    }

    #[test]
    fn test_callbacks_fire_once() {
        let scheduler = ManualFrameScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        scheduler.schedule(recorder(&log));
        scheduler.schedule(recorder(&log));
        assert_eq!(scheduler.pending_count(), 2);

        assert_eq!(scheduler.advance(16.0), 2);
        assert_eq!(scheduler.advance(32.0), 0);
        assert_eq!(*log.borrow(), vec![16.0, 16.0]);
    }

    #[test]
    fn test_dispatch_in_schedule_order() {
        let scheduler = ManualFrameScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        // Free a low slot first so slot order and schedule order differ
        let first = scheduler.schedule(Box::new(|_: f64| {}));
        for i in 0..4 {
            let order = Rc::clone(&order);
            scheduler.schedule(Box::new(move |_: f64| order.borrow_mut().push(i)));
        }
        scheduler.cancel(first);
        let order_late = Rc::clone(&order);
        scheduler.schedule(Box::new(move |_: f64| order_late.borrow_mut().push(4)));

        assert_eq!(scheduler.advance(0.0), 5);
        assert_eq!(*order.borrow(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cancel_prevents_dispatch() {
        let scheduler = ManualFrameScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let handle = scheduler.schedule(recorder(&log));
        scheduler.cancel(handle);
        assert_eq!(scheduler.advance(16.0), 0);
        assert!(log.borrow().is_empty());

        // Stale handle: counted, otherwise a no-op
        scheduler.cancel(handle);
        assert_eq!(scheduler.cancel_count(), 2);
    }

    #[test]
    fn test_fired_handle_is_stale() {
        let scheduler = ManualFrameScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let old = scheduler.schedule(recorder(&log));
        scheduler.advance(1.0);

        // The freed slot is reused, but the old handle must not reach it
        scheduler.schedule(recorder(&log));
        scheduler.cancel(old);
        assert_eq!(scheduler.advance(2.0), 1);
        assert_eq!(*log.borrow(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_reschedule_during_dispatch_waits_for_next_frame() {
        let scheduler = Rc::new(ManualFrameScheduler::new());
        let count = Rc::new(Cell::new(0));

        let inner_scheduler = Rc::clone(&scheduler);
        let inner_count = Rc::clone(&count);
        scheduler.schedule(Box::new(move |_: f64| {
            inner_count.set(inner_count.get() + 1);
            let again = Rc::clone(&inner_count);
            inner_scheduler.schedule(Box::new(move |_: f64| again.set(again.get() + 1)));
        }));

        assert_eq!(scheduler.advance(10.0), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.advance(20.0), 1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let scheduler = ManualFrameScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        scheduler.schedule(recorder(&log));
        scheduler.advance(100.0);
        scheduler.schedule(recorder(&log));
        scheduler.advance(50.0);

        assert_eq!(*log.borrow(), vec![100.0, 100.0]);
        assert_eq!(scheduler.last_timestamp(), Some(100.0));
        assert_eq!(scheduler.frame_count(), 2);
    }

    #[test]
    fn test_first_frame_may_be_negative() {
        let scheduler = ManualFrameScheduler::new();
        assert_eq!(scheduler.last_timestamp(), None);
        let log = Rc::new(RefCell::new(Vec::new()));

        scheduler.schedule(recorder(&log));
        scheduler.advance(-2000.0);
        scheduler.schedule(recorder(&log));
        scheduler.advance(-1000.0);
        scheduler.schedule(recorder(&log));
        scheduler.advance(-1500.0);

        assert_eq!(*log.borrow(), vec![-2000.0, -1000.0, -1000.0]);
        assert_eq!(scheduler.last_timestamp(), Some(-1000.0));
    }

    #[test]
    fn test_non_finite_timestamps_are_clamped() {
        let scheduler = ManualFrameScheduler::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        scheduler.schedule(recorder(&log));
        scheduler.advance(f64::NAN);
        scheduler.schedule(recorder(&log));
        scheduler.advance(40.0);
        scheduler.schedule(recorder(&log));
        scheduler.advance(f64::NAN);
        scheduler.schedule(recorder(&log));
        scheduler.advance(f64::INFINITY);
        scheduler.schedule(recorder(&log));
        scheduler.advance(10.0);

        assert_eq!(*log.borrow(), vec![0.0, 40.0, 40.0, 40.0, 40.0]);
        assert_eq!(scheduler.last_timestamp(), Some(40.0));
    }

    #[test]
    fn test_unavailable_scheduler() {
        let scheduler = UnavailableScheduler;
        assert!(!scheduler.is_available());
        let handle = scheduler.schedule(Box::new(|_: f64| panic!("must never fire")));
        scheduler.cancel(handle);
        assert!(ManualFrameScheduler::new().is_available());
    }

    #[test]
    fn test_frame_loop_delivers_monotonic_frames() {
        let scheduler = Rc::new(ManualFrameScheduler::new());
        let mut frame_loop = FrameLoop::new(Rc::clone(&scheduler)).with_target_fps(1000);
        assert_eq!(frame_loop.frame_duration(), Duration::from_millis(1));

        let log = Rc::new(RefCell::new(Vec::new()));
        scheduler.schedule(recorder(&log));
        let stats = frame_loop.run_frames(3);
        assert_eq!(stats, FrameStats { frames: 3, callbacks: 1 });

        scheduler.schedule(recorder(&log));
        frame_loop.run_frames(1);

        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], 0.0);
        assert!(log[1] > log[0]);
    }

    #[test]
    fn test_frame_loop_runs_for_duration() {
        let scheduler = Rc::new(ManualFrameScheduler::new());
        let mut frame_loop = FrameLoop::new(Rc::clone(&scheduler)).with_target_fps(100);

        let started = Instant::now();
        let stats = frame_loop.run_for(Duration::from_millis(50));

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(stats.frames >= 1);
        // Each frame sleeps out its 10ms slot
        assert!(stats.frames <= 6);
        assert_eq!(stats.callbacks, 0);
        assert_eq!(scheduler.frame_count(), stats.frames);
    }

    #[test]
    fn test_frame_loop_clamps_fps() {
        let frame_loop = FrameLoop::new(Rc::new(ManualFrameScheduler::new())).with_target_fps(0);
        assert_eq!(frame_loop.target_fps(), 1);
    }
}
