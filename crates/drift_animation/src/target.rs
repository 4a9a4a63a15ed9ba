//! Render targets
//!
//! The sink a host binds to each node. The engine writes the node's current
//! vertical coordinate into it once per frame and never reads it back.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Addressable sink for a node's vertical coordinate
pub trait RenderTarget {
    fn set_y(&mut self, y: f64);
}

impl<F> RenderTarget for F
where
    F: FnMut(f64),
{
    fn set_y(&mut self, y: f64) {
        self(y)
    }
}

/// Render targets keyed by node index
///
/// A node without an entry is not animated.
pub type RenderTargets = FxHashMap<usize, Box<dyn RenderTarget>>;

/// Target that keeps every value written to it
///
/// Clones share the same log, so a test can hand one clone to the engine and
/// inspect the other.
#[derive(Clone, Debug, Default)]
pub struct RecordingTarget {
    writes: Rc<RefCell<Vec<f64>>>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<f64> {
        self.writes.borrow().clone()
    }

    pub fn last(&self) -> Option<f64> {
        self.writes.borrow().last().copied()
    }

    pub fn len(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.borrow().is_empty()
    }
}

impl RenderTarget for RecordingTarget {
    fn set_y(&mut self, y: f64) {
        self.writes.borrow_mut().push(y);
    }
}
