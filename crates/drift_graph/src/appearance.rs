//! Declarative styling for whatever surface paints the graph
//!
//! Nothing here is animated by the engine. The glow pulse in particular is
//! handed to the host's own declarative animation primitive as-is.

use crate::model::Node;

/// Highlight color shared by active nodes and the glow
pub const ACCENT: &str = "#7f6df2";
/// Fill for ordinary nodes
pub const NODE_FILL: &str = "#dcddde";
/// Label text color
pub const LABEL_FILL: &str = "#999";
/// Label font size in view-box units
pub const LABEL_FONT_SIZE: f64 = 10.0;

pub const EDGE_STROKE: &str = "#3e3e3e";
pub const EDGE_STROKE_WIDTH: f64 = 1.0;
pub const EDGE_OPACITY: f64 = 0.6;

/// Nodes smaller than this render faded
const MINOR_RADIUS: f64 = 4.0;

/// Paint attributes for one node circle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeAppearance {
    pub fill: &'static str,
    pub stroke: Option<&'static str>,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Node {
    pub fn appearance(&self) -> NodeAppearance {
        let opacity = if self.r < MINOR_RADIUS { 0.5 } else { 0.9 };
        if self.active {
            NodeAppearance {
                fill: ACCENT,
                stroke: Some(ACCENT),
                stroke_width: 2.0,
                opacity,
            }
        } else {
            NodeAppearance {
                fill: NODE_FILL,
                stroke: None,
                stroke_width: 0.0,
                opacity,
            }
        }
    }

    /// Baseline origin for the label text, right of the circle
    ///
    /// Unlabelled nodes have no anchor.
    pub fn label_anchor(&self) -> Option<(f64, f64)> {
        self.has_label()
            .then(|| (self.x + self.r + 4.0, self.y + 4.0))
    }
}

/// The breathing halo around the active node
#[derive(Clone, Debug, PartialEq)]
pub struct GlowPulse {
    /// Index of the node the halo surrounds
    pub node: usize,
    pub cx: f64,
    pub cy: f64,
    /// Radius keyframes over one period
    pub radius: [f64; 3],
    /// Opacity keyframes over one period
    pub opacity: [f64; 3],
    pub period_ms: u32,
    pub stroke: &'static str,
}

impl GlowPulse {
    pub fn around(index: usize, node: &Node) -> Self {
        Self {
            node: index,
            cx: node.x,
            cy: node.y,
            radius: [15.0, 22.0, 15.0],
            opacity: [0.3, 0.1, 0.3],
            period_ms: 3000,
            stroke: ACCENT,
        }
    }
}
