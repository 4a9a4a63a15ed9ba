//! Nodes, edges, and the immutable graph that holds them
//!
//! Node order is significant for painting (later nodes draw on top) but
//! carries no meaning for motion.

use serde::{Deserialize, Serialize};

use crate::appearance::GlowPulse;
use crate::error::{GraphError, Result};

/// A circle in the illustration
///
/// `y` is the resting vertical coordinate. The motion engine reads it as the
/// base of each node's oscillation and never writes it back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub label: String,
}

impl Node {
    pub fn new(x: f64, y: f64, r: f64, label: impl Into<String>) -> Self {
        Self {
            x,
            y,
            r,
            active: false,
            label: label.into(),
        }
    }

    /// Mark the node as the highlighted one
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn has_label(&self) -> bool {
        !self.label.is_empty()
    }

    fn validate(&self, index: usize) -> Result<()> {
        let reason = if !(self.x.is_finite() && self.y.is_finite()) {
            Some("coordinates must be finite".to_string())
        } else if !(self.r.is_finite() && self.r > 0.0) {
            Some(format!("radius must be positive, got {}", self.r))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(GraphError::InvalidNode { index, reason }),
            None => Ok(()),
        }
    }
}

/// A line between two nodes, by index into the node sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
}

impl Edge {
    pub const fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

/// Validated, read-only graph layout
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    view_box: Option<(f64, f64)>,
}

impl GraphModel {
    /// Build a graph, checking every node and every edge endpoint
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self> {
        for (index, node) in nodes.iter().enumerate() {
            node.validate(index)?;
        }

        let len = nodes.len();
        for (i, edge) in edges.iter().enumerate() {
            for index in [edge.from, edge.to] {
                if index >= len {
                    return Err(GraphError::EdgeOutOfBounds {
                        edge: i,
                        index,
                        len,
                    });
                }
            }
        }

        Ok(Self {
            nodes,
            edges,
            view_box: None,
        })
    }

    pub(crate) fn from_parts_unchecked(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        debug_assert!(edges
            .iter()
            .all(|e| e.from < nodes.len() && e.to < nodes.len()));
        Self {
            nodes,
            edges,
            view_box: None,
        }
    }

    /// Fix the drawing area instead of deriving it from the nodes
    pub fn with_view_box(mut self, width: f64, height: f64) -> Self {
        self.view_box = Some((width, height));
        self
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Endpoints of an edge as `((x1, y1), (x2, y2))`
    ///
    /// Uses the resting positions; edges do not follow the floating nodes.
    /// `None` when the edge names a node this graph does not have.
    pub fn edge_endpoints(&self, edge: &Edge) -> Option<((f64, f64), (f64, f64))> {
        let a = self.nodes.get(edge.from)?;
        let b = self.nodes.get(edge.to)?;
        Some(((a.x, a.y), (b.x, b.y)))
    }

    /// Index of every highlighted node, in paint order
    pub fn active_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.active)
            .map(|(i, _)| i)
    }

    /// The halo drawn around the first active node, if any
    pub fn glow(&self) -> Option<GlowPulse> {
        self.active_nodes()
            .next()
            .map(|i| GlowPulse::around(i, &self.nodes[i]))
    }

    /// Width and height of the drawing area
    ///
    /// Without an explicit view box, the smallest origin-anchored box
    /// containing every node circle.
    pub fn view_box(&self) -> (f64, f64) {
        if let Some(view_box) = self.view_box {
            return view_box;
        }
        self.nodes.iter().fold((0.0, 0.0), |(w, h), n| {
            (f64::max(w, n.x + n.r), f64::max(h, n.y + n.r))
        })
    }
}
