//! Drift Graph Model
//!
//! The static node/edge layout that the drift motion engine floats.
//!
//! # Features
//!
//! - **Graph Model**: Immutable, validated node and edge sequences
//! - **Illustration Asset**: The built-in 15-node knowledge graph
//! - **Appearance Data**: Declarative fills, label anchors, and the glow pulse
//!   consumed by whatever surface paints the graph
//!
//! ```rust
//! use drift_graph::GraphModel;
//!
//! let graph = GraphModel::illustration();
//! assert_eq!(graph.nodes().len(), 15);
//! assert_eq!(graph.edges().len(), 18);
//! assert!(graph.nodes()[0].active);
//! ```

pub mod appearance;
pub mod error;
pub mod illustration;
pub mod model;

pub use appearance::{
    GlowPulse, NodeAppearance, EDGE_OPACITY, EDGE_STROKE, EDGE_STROKE_WIDTH, LABEL_FILL,
    LABEL_FONT_SIZE,
};
pub use error::{GraphError, Result};
pub use model::{Edge, GraphModel, Node};
