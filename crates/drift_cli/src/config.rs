//! drift.toml handling
//!
//! Every table is optional. Without a `[graph]` table the built-in
//! illustration is used.

use anyhow::{Context, Result};
use drift_animation::{FrameLoop, MotionConfig};
use drift_graph::{Edge, GraphModel, Node};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "drift.toml";

/// Contents of drift.toml
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DriftConfig {
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<GraphConfig>,
}

/// Frame pacing for `drift run`
#[derive(Debug, Deserialize, Serialize)]
pub struct FrameConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_fps() -> u32 {
    FrameLoop::DEFAULT_FPS
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { fps: default_fps() }
    }
}

/// A custom graph layout
#[derive(Debug, Deserialize, Serialize)]
pub struct GraphConfig {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// `[width, height]`; derived from the nodes when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_box: Option<[f64; 2]>,
}

impl DriftConfig {
    /// Load an explicit config file, or `./drift.toml` if present
    ///
    /// An explicit path must exist. A missing `./drift.toml` yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file {} does not exist", path.display());
                }
                path.to_path_buf()
            }
            None => {
                let path = PathBuf::from(CONFIG_FILE);
                if !path.exists() {
                    tracing::debug!("No {} found, using defaults", CONFIG_FILE);
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DriftConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// The graph to animate: the configured one or the illustration
    pub fn graph(&self) -> Result<GraphModel> {
        let Some(graph) = &self.graph else {
            return Ok(GraphModel::illustration());
        };

        let model = GraphModel::new(graph.nodes.clone(), graph.edges.clone())
            .context("Invalid [graph] table")?;
        Ok(match graph.view_box {
            Some([width, height]) => model.with_view_box(width, height),
            None => model,
        })
    }

    /// Check motion ranges and the graph
    pub fn validate(&self) -> Result<GraphModel> {
        self.motion.validate().context("Invalid [motion] table")?;
        if self.frame.fps == 0 {
            anyhow::bail!("Invalid [frame] table: fps must be at least 1");
        }
        self.graph()
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
