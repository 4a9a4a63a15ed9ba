//! The built-in knowledge graph illustration

use crate::model::{Edge, GraphModel, Node};

const VIEW_BOX: (f64, f64) = (430.0, 330.0);

/// `(x, y, r, label)`; the first node is the active one
const NODES: [(f64, f64, f64, &str); 15] = [
    (200.0, 150.0, 10.0, "Projects"),
    (120.0, 80.0, 7.0, "Ideas"),
    (310.0, 90.0, 8.0, "Research"),
    (80.0, 180.0, 6.0, "Tasks"),
    (160.0, 250.0, 9.0, "Notes"),
    (300.0, 200.0, 7.0, "Reading"),
    (350.0, 130.0, 5.0, "Links"),
    (250.0, 280.0, 6.0, "Archive"),
    (60.0, 260.0, 5.0, "Daily"),
    (370.0, 250.0, 5.0, "Quotes"),
    (140.0, 160.0, 4.0, ""),
    (270.0, 160.0, 4.0, ""),
    (220.0, 220.0, 4.0, ""),
    (100.0, 120.0, 3.0, ""),
    (330.0, 180.0, 3.0, ""),
];

const EDGES: [Edge; 18] = [
    Edge::new(0, 1),
    Edge::new(0, 2),
    Edge::new(0, 4),
    Edge::new(0, 5),
    Edge::new(1, 3),
    Edge::new(1, 10),
    Edge::new(2, 6),
    Edge::new(2, 5),
    Edge::new(3, 8),
    Edge::new(4, 7),
    Edge::new(4, 12),
    Edge::new(5, 9),
    Edge::new(5, 14),
    Edge::new(0, 11),
    Edge::new(1, 13),
    Edge::new(10, 4),
    Edge::new(11, 2),
    Edge::new(12, 8),
];

impl GraphModel {
    /// The fixed illustration asset
    pub fn illustration() -> Self {
        let nodes = NODES
            .iter()
            .enumerate()
            .map(|(i, &(x, y, r, label))| Node::new(x, y, r, label).with_active(i == 0))
            .collect();

        // Built from constants; every edge endpoint is below NODES.len()
        Self::from_parts_unchecked(nodes, EDGES.to_vec()).with_view_box(VIEW_BOX.0, VIEW_BOX.1)
    }
}
