//! Render targets that summarize what the engine wrote, and table output

use drift_animation::RenderTarget;
use drift_graph::GraphModel;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

/// Running statistics for one node's writes
#[derive(Debug, Clone, Copy)]
pub struct Track {
    pub writes: u64,
    pub min: f64,
    pub max: f64,
    pub last: Option<f64>,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            writes: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            last: None,
        }
    }
}

impl Track {
    fn record(&mut self, y: f64) {
        self.writes += 1;
        self.min = self.min.min(y);
        self.max = self.max.max(y);
        self.last = Some(y);
    }
}

/// Render target feeding a shared [`Track`]
pub struct TrackingTarget {
    node: usize,
    track: Rc<RefCell<Track>>,
}

impl TrackingTarget {
    pub fn new(node: usize) -> (Self, Rc<RefCell<Track>>) {
        let track = Rc::new(RefCell::new(Track::default()));
        (
            Self {
                node,
                track: Rc::clone(&track),
            },
            track,
        )
    }
}

impl RenderTarget for TrackingTarget {
    fn set_y(&mut self, y: f64) {
        tracing::trace!(node = self.node, y, "set_y");
        self.track.borrow_mut().record(y);
    }
}

fn label(graph: &GraphModel, node: usize) -> &str {
    match graph.nodes()[node].label.as_str() {
        "" => "-",
        label => label,
    }
}

/// Per-node summary of a `drift run`
pub fn print_run_table(graph: &GraphModel, tracks: &[(usize, Rc<RefCell<Track>>)]) {
    println!(
        "{:>4}  {:<10} {:>8} {:>8} {:>8} {:>7}",
        "node", "label", "base y", "min y", "max y", "frames"
    );
    for (node, track) in tracks {
        let track = track.borrow();
        let base = graph.nodes()[*node].y;
        if track.writes == 0 {
            println!(
                "{:>4}  {:<10} {:>8.2} {:>8} {:>8} {:>7}",
                node,
                label(graph, *node),
                base,
                "-",
                "-",
                0
            );
            continue;
        }
        println!(
            "{:>4}  {:<10} {:>8.2} {:>8.2} {:>8.2} {:>7}",
            node,
            label(graph, *node),
            base,
            track.min,
            track.max,
            track.writes
        );
    }
}

/// Positions of one node at each sampled timestamp
#[derive(Debug, Serialize)]
pub struct SampleRow {
    pub node: usize,
    pub label: String,
    pub base_y: f64,
    pub positions: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct SampleReport {
    pub seed: u64,
    pub times: Vec<f64>,
    pub rows: Vec<SampleRow>,
}

pub fn print_sample_table(report: &SampleReport) {
    print!("{:>4}  {:<10} {:>8}", "node", "label", "base y");
    for t in &report.times {
        print!(" {:>9}", format!("t={}", t));
    }
    println!();

    for row in &report.rows {
        let label = if row.label.is_empty() { "-" } else { &row.label };
        print!("{:>4}  {:<10} {:>8.2}", row.node, label, row.base_y);
        for y in &row.positions {
            print!(" {:>9.3}", y);
        }
        println!();
    }
}
