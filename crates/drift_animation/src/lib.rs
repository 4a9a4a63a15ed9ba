//! Drift Animation Engine
//!
//! Gentle, independent floating motion for the nodes of a static graph.
//!
//! # Features
//!
//! - **Oscillators**: Closed-form `y(t) = base + amplitude * sin(speed * t + phase)`
//!   per node, with randomized parameters from an injectable source
//! - **Frame Scheduling**: A one-shot "next frame" callback abstraction, with a
//!   manually advanced host and a paced loop on the calling thread
//! - **Lifecycle**: One controller owns every oscillator it starts and stops
//!   all of them synchronously on deactivation
//!
//! ```rust
//! use std::rc::Rc;
//! use drift_animation::{
//!     FrameScheduler, LifecycleController, ManualFrameScheduler, RecordingTarget, RenderTargets,
//! };
//! use drift_graph::GraphModel;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let graph = GraphModel::illustration();
//! let scheduler = Rc::new(ManualFrameScheduler::new());
//!
//! let mut targets = RenderTargets::default();
//! let target = RecordingTarget::new();
//! targets.insert(0, Box::new(target.clone()));
//!
//! let mut controller = LifecycleController::default();
//! let mut rng = StdRng::seed_from_u64(7);
//! let shared: Rc<dyn FrameScheduler> = scheduler.clone();
//! controller.activate(&graph, targets, &mut rng, shared).unwrap();
//!
//! scheduler.advance(16.0);
//! assert_eq!(target.writes().len(), 1);
//!
//! controller.deactivate();
//! scheduler.advance(32.0);
//! assert_eq!(target.writes().len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod oscillator;
pub mod scheduler;
pub mod target;

pub use config::{MotionConfig, Range};
pub use error::{AnimationError, Result};
pub use lifecycle::{LifecycleController, OscillatorId, RunningSet};
pub use oscillator::{
    FrameDecision, Oscillator, OscillatorConfig, OscillatorFactory, OscillatorTask,
};
pub use scheduler::{
    FrameCallback, FrameHandle, FrameLoop, FrameScheduler, FrameStats, ManualFrameScheduler,
    UnavailableScheduler,
};
pub use target::{RecordingTarget, RenderTarget, RenderTargets};
