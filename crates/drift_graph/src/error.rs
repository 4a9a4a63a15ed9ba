//! Graph validation errors

use thiserror::Error;

/// Errors raised while constructing a [`GraphModel`](crate::GraphModel)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// An edge refers to a node index past the end of the node sequence
    #[error("edge {edge} references node {index}, but the graph has {len} nodes")]
    EdgeOutOfBounds { edge: usize, index: usize, len: usize },

    /// A node has a non-finite coordinate or a non-positive radius
    #[error("node {index} is invalid: {reason}")]
    InvalidNode { index: usize, reason: String },
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
