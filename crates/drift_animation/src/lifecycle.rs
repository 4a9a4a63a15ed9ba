//! Oscillator lifecycle
//!
//! [`LifecycleController`] is the only owner of the oscillators it creates.
//! `activate` binds one oscillator per node that has a render target and
//! starts it; `deactivate` stops every one of them before returning. After
//! that no oscillator of the set writes to a render target again, even for
//! a frame the host had already dispatched.
//!
//! ```ignore
//! let mut controller = LifecycleController::default();
//! controller.activate(&graph, targets, &mut rand::thread_rng(), scheduler)?;
//! // ... graph is visible ...
//! controller.deactivate();
//! ```

use drift_graph::GraphModel;
use rand::Rng;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::Rc;

use crate::config::MotionConfig;
use crate::error::{AnimationError, Result};
use crate::oscillator::{OscillatorConfig, OscillatorFactory, OscillatorTask};
use crate::scheduler::FrameScheduler;
use crate::target::RenderTargets;

new_key_type! {
    /// Handle to an oscillator inside a [`RunningSet`]
    pub struct OscillatorId;
}

struct Entry {
    node: usize,
    task: Rc<RefCell<OscillatorTask>>,
}

/// The oscillators created by one activation
///
/// An arena keyed by [`OscillatorId`] plus a node-index lookup. Render
/// targets never hold a reference back into it.
pub struct RunningSet {
    oscillators: SlotMap<OscillatorId, Entry>,
    by_node: FxHashMap<usize, OscillatorId>,
}

impl RunningSet {
    fn empty() -> Self {
        Self {
            oscillators: SlotMap::with_key(),
            by_node: FxHashMap::default(),
        }
    }

    fn insert(&mut self, node: usize, task: Rc<RefCell<OscillatorTask>>) -> OscillatorId {
        let id = self.oscillators.insert(Entry { node, task });
        self.by_node.insert(node, id);
        id
    }

    /// Number of oscillators created, running or not
    pub fn len(&self) -> usize {
        self.oscillators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oscillators.is_empty()
    }

    /// Node indices that received an oscillator, in graph order
    pub fn node_ids(&self) -> Vec<usize> {
        let mut nodes: Vec<usize> = self.by_node.keys().copied().collect();
        nodes.sort_unstable();
        nodes
    }

    pub fn oscillator_for(&self, node: usize) -> Option<OscillatorId> {
        self.by_node.get(&node).copied()
    }

    pub fn node_of(&self, id: OscillatorId) -> Option<usize> {
        self.oscillators.get(id).map(|entry| entry.node)
    }

    pub fn config_for(&self, node: usize) -> Option<OscillatorConfig> {
        let id = self.oscillator_for(node)?;
        self.oscillators
            .get(id)
            .map(|entry| *entry.task.borrow().oscillator().config())
    }

    pub fn is_running(&self, id: OscillatorId) -> bool {
        self.oscillators
            .get(id)
            .is_some_and(|entry| entry.task.borrow().oscillator().is_running())
    }

    pub fn running_count(&self) -> usize {
        self.oscillators
            .values()
            .filter(|entry| entry.task.borrow().oscillator().is_running())
            .count()
    }

    /// Stop every oscillator in the set
    ///
    /// Returns how many this call transitioned; 0 when repeated.
    pub fn stop_all(&self) -> usize {
        self.oscillators
            .values()
            .filter(|entry| entry.task.borrow_mut().stop())
            .count()
    }
}

/// Owner of all oscillators for one graph instance
///
/// Holds at most one [`RunningSet`]. Dropping the controller deactivates it.
#[derive(Default)]
pub struct LifecycleController {
    factory: OscillatorFactory,
    running: Option<RunningSet>,
}

impl LifecycleController {
    pub fn new(factory: OscillatorFactory) -> Self {
        Self {
            factory,
            running: None,
        }
    }

    /// Controller drawing parameters from custom ranges
    pub fn with_motion(motion: MotionConfig) -> Result<Self> {
        Ok(Self::new(OscillatorFactory::new(motion)?))
    }

    pub fn factory(&self) -> &OscillatorFactory {
        &self.factory
    }

    pub fn is_active(&self) -> bool {
        self.running.is_some()
    }

    pub fn running(&self) -> Option<&RunningSet> {
        self.running.as_ref()
    }

    /// Start one oscillator per node that has a render target
    ///
    /// Nodes without a target are skipped silently. When the scheduler is
    /// unavailable the graph stays static: an empty set is installed and
    /// nothing is scheduled.
    ///
    /// Fails with [`AnimationError::AlreadyActive`] if the previous
    /// activation was never deactivated; nothing is created in that case.
    pub fn activate<R: Rng + ?Sized>(
        &mut self,
        graph: &GraphModel,
        mut targets: RenderTargets,
        rng: &mut R,
        scheduler: Rc<dyn FrameScheduler>,
    ) -> Result<&RunningSet> {
        if let Some(running) = &self.running {
            return Err(AnimationError::AlreadyActive {
                running: running.len(),
            });
        }

        if !scheduler.is_available() {
            tracing::warn!("frame scheduler unavailable, rendering graph without motion");
            return Ok(&*self.running.insert(RunningSet::empty()));
        }

        let mut set = RunningSet::empty();
        for (index, node) in graph.nodes().iter().enumerate() {
            let Some(target) = targets.remove(&index) else {
                continue;
            };
            let config = self.factory.create(node.y, rng);
            let task = OscillatorTask::start(config, target, Rc::clone(&scheduler));
            set.insert(index, task);
        }

        if !targets.is_empty() {
            tracing::debug!(
                "ignoring {} render targets bound to nodes outside the graph",
                targets.len()
            );
        }

        tracing::debug!(
            "activated {} oscillators ({} nodes without targets)",
            set.len(),
            graph.len() - set.len()
        );
        Ok(&*self.running.insert(set))
    }

    /// Stop every oscillator from the last activation
    ///
    /// Synchronous: all oscillators are stopped when this returns. Safe to
    /// repeat; returns the number stopped by this call.
    pub fn deactivate(&mut self) -> usize {
        let Some(set) = self.running.take() else {
            return 0;
        };
        let stopped = set.stop_all();
        tracing::debug!("deactivated {} of {} oscillators", stopped, set.len());
        stopped
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Range;
    use crate::scheduler::{ManualFrameScheduler, UnavailableScheduler};
    use crate::target::RecordingTarget;
    use drift_graph::{Edge, Node};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bind(
        indices: impl IntoIterator<Item = usize>,
    ) -> (RenderTargets, Vec<(usize, RecordingTarget)>) {
        let mut targets = RenderTargets::default();
        let mut handles = Vec::new();
        for index in indices {
            let target = RecordingTarget::new();
            targets.insert(index, Box::new(target.clone()));
            handles.push((index, target));
        }
        (targets, handles)
    }

    fn manual() -> (Rc<ManualFrameScheduler>, Rc<dyn FrameScheduler>) {
        let scheduler = Rc::new(ManualFrameScheduler::new());
        let shared: Rc<dyn FrameScheduler> = scheduler.clone();
        (scheduler, shared)
    }

    #[test]
    fn test_activate_skips_nodes_without_targets() {
        let graph = GraphModel::illustration();
        let (scheduler, shared) = manual();
        let (targets, handles) = bind((0..15).filter(|i| *i != 3 && *i != 11));

        let mut controller = LifecycleController::default();
        let mut rng = StdRng::seed_from_u64(1);
        let running = controller.activate(&graph, targets, &mut rng, shared).unwrap();

        assert_eq!(running.len(), 13);
        assert_eq!(running.running_count(), 13);
        assert!(running.oscillator_for(3).is_none());
        assert!(running.oscillator_for(11).is_none());
        assert_eq!(running.node_ids().len(), 13);
        assert_eq!(scheduler.pending_count(), 13);

        assert_eq!(controller.deactivate(), 13);
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(scheduler.cancel_count(), 13);

        scheduler.advance(16.0);
        assert!(handles.iter().all(|(_, target)| target.is_empty()));
    }

    #[test]
    fn test_frames_write_each_node_position() {
        let graph = GraphModel::illustration();
        let (scheduler, shared) = manual();
        let (targets, handles) = bind([0, 4, 9]);

        let mut controller = LifecycleController::default();
        let mut rng = StdRng::seed_from_u64(5);
        controller.activate(&graph, targets, &mut rng, shared).unwrap();

        for t in [0.0, 500.0, 1000.0] {
            scheduler.advance(t);
        }

        let running = controller.running().unwrap();
        for (index, target) in &handles {
            let config = running.config_for(*index).unwrap();
            assert_eq!(config.base_y, graph.nodes()[*index].y);
            assert_eq!(
                target.writes(),
                vec![config.position(0.0), config.position(500.0), config.position(1000.0)]
            );
        }
    }

    #[test]
    fn test_negative_timestamps_follow_closed_form() {
        let graph = GraphModel::illustration();
        let (scheduler, shared) = manual();
        let (targets, handles) = bind([0]);

        let mut controller = LifecycleController::default();
        let mut rng = StdRng::seed_from_u64(2);
        controller.activate(&graph, targets, &mut rng, shared).unwrap();

        scheduler.advance(-1000.0);
        scheduler.advance(0.0);

        let config = controller.running().unwrap().config_for(0).unwrap();
        assert_eq!(
            handles[0].1.writes(),
            vec![config.position(-1000.0), config.position(0.0)]
        );
    }

    #[test]
    fn test_seeded_activation_is_reproducible() {
        let graph = GraphModel::illustration();
        let configs = |seed| {
            let (_scheduler, shared) = manual();
            let (targets, _) = bind(0..15);
            let mut controller = LifecycleController::default();
            let running = controller
                .activate(&graph, targets, &mut StdRng::seed_from_u64(seed), shared)
                .unwrap();
            (0..15)
                .map(|i| running.config_for(i).unwrap())
                .collect::<Vec<_>>()
        };

        assert_eq!(configs(11), configs(11));
        assert_ne!(configs(11), configs(12));
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let graph = GraphModel::illustration();
        let (scheduler, shared) = manual();
        let (targets, _) = bind(0..15);

        let mut controller = LifecycleController::default();
        controller
            .activate(&graph, targets, &mut StdRng::seed_from_u64(2), shared)
            .unwrap();
        scheduler.advance(0.0);

        assert_eq!(controller.deactivate(), 15);
        assert_eq!(controller.deactivate(), 0);
        assert!(!controller.is_active());
        assert_eq!(scheduler.cancel_count(), 15);
    }

    #[test]
    fn test_stop_all_is_idempotent() {
        let graph = GraphModel::illustration();
        let (scheduler, shared) = manual();
        let (targets, _) = bind([1, 2]);

        let mut controller = LifecycleController::default();
        let running = controller
            .activate(&graph, targets, &mut StdRng::seed_from_u64(2), shared)
            .unwrap();
        let id = running.oscillator_for(1).unwrap();
        assert_eq!(running.node_of(id), Some(1));

        assert_eq!(running.stop_all(), 2);
        assert_eq!(running.stop_all(), 0);
        assert!(!running.is_running(id));
        assert_eq!(running.running_count(), 0);
        assert_eq!(scheduler.cancel_count(), 2);

        // The set stays installed until deactivated
        assert!(controller.is_active());
        assert_eq!(controller.deactivate(), 0);
    }

    #[test]
    fn test_stray_frame_after_deactivate_writes_nothing() {
        let graph = GraphModel::illustration();
        let (scheduler, shared) = manual();
        let controller = Rc::new(RefCell::new(LifecycleController::default()));

        // Host teardown lands in the same frame, ahead of the oscillators
        let host = Rc::clone(&controller);
        scheduler.schedule(Box::new(move |_: f64| {
            assert_eq!(host.borrow_mut().deactivate(), 15);
        }));

        let (targets, handles) = bind(0..15);
        controller
            .borrow_mut()
            .activate(&graph, targets, &mut StdRng::seed_from_u64(3), shared)
            .unwrap();

        assert_eq!(scheduler.advance(16.0), 16);
        assert!(handles.iter().all(|(_, target)| target.is_empty()));
        assert_eq!(scheduler.pending_count(), 0);

        for t in [32.0, 48.0, 1.0e6] {
            assert_eq!(scheduler.advance(t), 0);
        }
        assert!(handles.iter().all(|(_, target)| target.is_empty()));
    }

    #[test]
    fn test_double_activate_is_rejected() {
        let graph = GraphModel::illustration();
        let (scheduler, shared) = manual();

        let mut controller = LifecycleController::default();
        let (targets, _) = bind(0..4);
        controller
            .activate(&graph, targets, &mut StdRng::seed_from_u64(4), shared.clone())
            .unwrap();

        let (targets, _) = bind(0..15);
        let err = controller
            .activate(&graph, targets, &mut StdRng::seed_from_u64(4), shared.clone())
            .err();
        assert_eq!(err, Some(AnimationError::AlreadyActive { running: 4 }));
        assert_eq!(scheduler.pending_count(), 4);

        // A fresh set after deactivation
        controller.deactivate();
        let (targets, _) = bind(0..15);
        let running = controller
            .activate(&graph, targets, &mut StdRng::seed_from_u64(4), shared)
            .unwrap();
        assert_eq!(running.len(), 15);
        assert_eq!(scheduler.pending_count(), 15);
    }

    #[test]
    fn test_unavailable_scheduler_renders_static() {
        let graph = GraphModel::illustration();
        let (targets, handles) = bind(0..15);

        let mut controller = LifecycleController::default();
        let running = controller
            .activate(
                &graph,
                targets,
                &mut StdRng::seed_from_u64(6),
                Rc::new(UnavailableScheduler),
            )
            .unwrap();

        assert!(running.is_empty());
        assert!(controller.is_active());
        assert!(handles.iter().all(|(_, target)| target.is_empty()));
        assert_eq!(controller.deactivate(), 0);
    }

    #[test]
    fn test_targets_outside_graph_are_ignored() {
        let graph = GraphModel::new(
            vec![Node::new(0.0, 10.0, 2.0, "a"), Node::new(5.0, 20.0, 2.0, "b")],
            vec![Edge::new(0, 1)],
        )
        .unwrap();
        let (scheduler, shared) = manual();
        let (targets, handles) = bind([1, 7]);

        let mut controller = LifecycleController::default();
        let running = controller
            .activate(&graph, targets, &mut StdRng::seed_from_u64(8), shared)
            .unwrap();
        assert_eq!(running.node_ids(), vec![1]);

        scheduler.advance(0.0);
        assert_eq!(handles[0].1.len(), 1);
        assert!(handles[1].1.is_empty());
    }

    #[test]
    fn test_custom_motion_ranges() {
        let motion = MotionConfig {
            amplitude: Range::new(0.5, 1.0),
            speed: Range::new(0.002, 0.003),
        };
        let graph = GraphModel::illustration();
        let (_scheduler, shared) = manual();
        let (targets, _) = bind(0..15);

        let mut controller = LifecycleController::with_motion(motion).unwrap();
        let running = controller
            .activate(&graph, targets, &mut StdRng::seed_from_u64(9), shared)
            .unwrap();
        for node in running.node_ids() {
            let config = running.config_for(node).unwrap();
            assert!(motion.amplitude.contains(config.amplitude));
            assert!(motion.speed.contains(config.angular_speed));
        }

        assert!(LifecycleController::with_motion(MotionConfig {
            speed: Range::new(0.0, 0.0),
            ..MotionConfig::default()
        })
        .is_err());
    }

    #[test]
    fn test_drop_deactivates() {
        let graph = GraphModel::illustration();
        let (scheduler, shared) = manual();
        let (targets, handles) = bind(0..15);

        {
            let mut controller = LifecycleController::default();
            controller
                .activate(&graph, targets, &mut StdRng::seed_from_u64(10), shared)
                .unwrap();
            scheduler.advance(0.0);
        }

        assert_eq!(scheduler.pending_count(), 0);
        scheduler.advance(16.0);
        assert!(handles.iter().all(|(_, target)| target.len() == 1));
    }
}
