//! Drift CLI
//!
//! Drive, sample, and validate the drift motion engine without a display.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use drift_animation::{
    FrameLoop, FrameScheduler, LifecycleController, ManualFrameScheduler, RecordingTarget,
    RenderTargets,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod report;

use config::{DriftConfig, CONFIG_FILE};
use report::{SampleReport, SampleRow, TrackingTarget};

#[derive(Parser)]
#[command(name = "drift")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ambient floating motion for graph illustrations", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Animate the graph in real time and summarize each node's motion
    Run {
        /// Config file (defaults to ./drift.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frames to deliver
        #[arg(short, long, default_value = "180")]
        frames: u64,

        /// Frame rate (overrides [frame] fps)
        #[arg(long)]
        fps: Option<u32>,

        /// Seed for oscillator parameters (random when omitted)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Node indices to leave without a render target
        #[arg(long, value_delimiter = ',')]
        skip: Vec<usize>,
    },

    /// Print every node's position at the given timestamps
    Sample {
        /// Config file (defaults to ./drift.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for oscillator parameters
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Timestamps in milliseconds, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        at: Vec<f64>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Validate a config file and describe its graph
    Check {
        /// Config file (defaults to ./drift.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a default drift.toml
    Init {
        /// Directory to write into
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            config,
            frames,
            fps,
            seed,
            skip,
        } => cmd_run(config.as_deref(), frames, fps, seed, &skip),

        Commands::Sample {
            config,
            seed,
            at,
            json,
        } => cmd_sample(config.as_deref(), seed, at, json),

        Commands::Check { config } => cmd_check(config.as_deref()),

        Commands::Init { path, force } => cmd_init(&path, force),
    }
}

fn make_rng(seed: Option<u64>) -> Box<dyn RngCore> {
    match seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(rand::thread_rng()),
    }
}

fn cmd_run(
    config_path: Option<&Path>,
    frames: u64,
    fps: Option<u32>,
    seed: Option<u64>,
    skip: &[usize],
) -> Result<()> {
    let config = DriftConfig::load(config_path)?;
    let graph = config.validate()?;
    let fps = fps.unwrap_or(config.frame.fps);

    for index in skip.iter().filter(|i| **i >= graph.len()) {
        warn!("--skip {} is not a node of this graph", index);
    }

    let mut targets = RenderTargets::default();
    let mut tracks = Vec::new();
    for index in (0..graph.len()).filter(|i| !skip.contains(i)) {
        let (target, track) = TrackingTarget::new(index);
        targets.insert(index, Box::new(target));
        tracks.push((index, track));
    }

    let scheduler = Rc::new(ManualFrameScheduler::new());
    let shared: Rc<dyn FrameScheduler> = scheduler.clone();
    let mut controller = LifecycleController::with_motion(config.motion)?;
    let mut rng = make_rng(seed);

    let running = controller.activate(&graph, targets, rng.as_mut(), shared)?;
    info!(
        "Animating {} of {} nodes for {} frames at {} fps",
        running.len(),
        graph.len(),
        frames,
        fps
    );

    let mut frame_loop = FrameLoop::new(scheduler).with_target_fps(fps);
    let stats = frame_loop.run_frames(frames);
    let stopped = controller.deactivate();
    info!(
        "Delivered {} frames ({} node updates), stopped {} oscillators",
        stats.frames, stats.callbacks, stopped
    );

    report::print_run_table(&graph, &tracks);
    Ok(())
}

fn cmd_sample(
    config_path: Option<&Path>,
    seed: u64,
    mut times: Vec<f64>,
    json: bool,
) -> Result<()> {
    let config = DriftConfig::load(config_path)?;
    let graph = config.validate()?;

    if times.iter().any(|t| !t.is_finite()) {
        anyhow::bail!("Timestamps must be finite");
    }
    // Frames arrive in order; sort so no timestamp gets clamped
    times.sort_by(f64::total_cmp);

    let mut targets = RenderTargets::default();
    let mut recorders = Vec::with_capacity(graph.len());
    for index in 0..graph.len() {
        let target = RecordingTarget::new();
        targets.insert(index, Box::new(target.clone()));
        recorders.push(target);
    }

    let scheduler = Rc::new(ManualFrameScheduler::new());
    let shared: Rc<dyn FrameScheduler> = scheduler.clone();
    let mut controller = LifecycleController::with_motion(config.motion)?;
    let mut rng = StdRng::seed_from_u64(seed);
    controller.activate(&graph, targets, &mut rng, shared)?;

    for t in &times {
        scheduler.advance(*t);
    }
    controller.deactivate();

    let rows = graph
        .nodes()
        .iter()
        .zip(recorders)
        .enumerate()
        .map(|(index, (node, recorder))| SampleRow {
            node: index,
            label: node.label.clone(),
            base_y: node.y,
            positions: recorder.writes(),
        })
        .collect();
    let sample = SampleReport { seed, times, rows };

    if json {
        let text = serde_json::to_string_pretty(&sample).context("Failed to serialize samples")?;
        println!("{}", text);
    } else {
        report::print_sample_table(&sample);
    }
    Ok(())
}

fn cmd_check(config_path: Option<&Path>) -> Result<()> {
    let config = DriftConfig::load(config_path)?;
    let graph = config.validate()?;

    let source = if config.graph.is_some() {
        "custom"
    } else {
        "built-in"
    };
    let (width, height) = graph.view_box();
    let labelled = graph.nodes().iter().filter(|n| n.has_label()).count();

    info!("Config OK");
    println!(
        "graph:      {} ({} nodes, {} labelled, {} edges)",
        source,
        graph.len(),
        labelled,
        graph.edges().len()
    );
    println!("view box:   {} x {}", width, height);
    println!(
        "amplitude:  [{}, {})",
        config.motion.amplitude.min, config.motion.amplitude.max
    );
    println!(
        "speed:      [{}, {}) rad/ms",
        config.motion.speed.min, config.motion.speed.max
    );
    println!("frame rate: {} fps", config.frame.fps);

    let active: Vec<String> = graph.active_nodes().map(|i| i.to_string()).collect();
    if active.is_empty() {
        println!("active:     none");
    } else {
        println!("active:     {}", active.join(", "));
    }
    if let Some(glow) = graph.glow() {
        println!(
            "glow:       node {} r {:?} opacity {:?} every {} ms",
            glow.node, glow.radius, glow.opacity, glow.period_ms
        );
    }
    Ok(())
}

fn cmd_init(dir: &Path, force: bool) -> Result<()> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        );
    }

    let text = DriftConfig::default().to_toml()?;
    fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}
