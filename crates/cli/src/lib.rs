use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc_model::PageFeed;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use viewer_core::{
    MemoryViewport, NavigationOutcome, NavigationSkip, RecordingStyleSink, RenderSummary, Viewer,
    ViewerConfig, Viewport, ZoomCommand,
};

type HeadlessViewer = Viewer<MemoryViewport, RecordingStyleSink>;

#[derive(Debug, Parser)]
#[command(name = "pageview")]
#[command(about = "Headless driver for the page virtualization engine")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a scripted session against a page feed and print a JSON report.
    Simulate {
        #[arg(long, value_name = "FILE")]
        feed: PathBuf,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        script: PathBuf,
    },
    /// Resolve one destination payload into a scroll offset.
    Resolve {
        #[arg(long, value_name = "FILE")]
        feed: PathBuf,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Raw destination, e.g. '[3, "XYZ", 72, 720, null]'
        #[arg(long, value_name = "JSON")]
        dest: String,
        /// Page the activation came from
        #[arg(long)]
        source: Option<u32>,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        scroll_x: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        scroll_y: f64,
        #[arg(long, default_value_t = 800.0)]
        viewport_height: f64,
    },
    /// Print CLI version.
    Version,
}

fn default_viewport_height() -> f64 {
    800.0
}

#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default = "default_viewport_height")]
    viewport_height: f64,
    #[serde(default)]
    steps: Vec<ScriptStep>,
}

#[derive(Debug, Deserialize)]
struct ScriptStep {
    at_ms: u64,
    #[serde(flatten)]
    event: ScriptEvent,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ScriptEvent {
    Scroll {
        #[serde(default)]
        x: f64,
        y: f64,
    },
    Resize {
        height: f64,
    },
    Rescale {
        ratio: f64,
        #[serde(default)]
        relative: bool,
    },
    Zoom {
        direction: ZoomDirection,
    },
    Wheel {
        detail: i32,
    },
    Key {
        code: u32,
    },
    Activate {
        dest: serde_json::Value,
        #[serde(default)]
        source: Option<u32>,
    },
    Teardown,
    Tick,
}

impl ScriptEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Scroll { .. } => "scroll",
            Self::Resize { .. } => "resize",
            Self::Rescale { .. } => "rescale",
            Self::Zoom { .. } => "zoom",
            Self::Wheel { .. } => "wheel",
            Self::Key { .. } => "key",
            Self::Activate { .. } => "activate",
            Self::Teardown => "teardown",
            Self::Tick => "tick",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ZoomDirection {
    In,
    Out,
    Reset,
}

impl From<ZoomDirection> for ZoomCommand {
    fn from(direction: ZoomDirection) -> Self {
        match direction {
            ZoomDirection::In => Self::In,
            ZoomDirection::Out => Self::Out,
            ZoomDirection::Reset => Self::Reset,
        }
    }
}

#[derive(Debug, Serialize)]
struct PassOutput {
    shown: usize,
    hidden: usize,
}

impl From<RenderSummary> for PassOutput {
    fn from(summary: RenderSummary) -> Self {
        Self { shown: summary.shown, hidden: summary.hidden }
    }
}

#[derive(Debug, Serialize)]
struct NavigationOutput {
    navigated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    y: Option<f64>,
    #[serde(flatten)]
    skip: Option<NavigationSkip>,
}

impl From<NavigationOutcome> for NavigationOutput {
    fn from(outcome: NavigationOutcome) -> Self {
        match outcome {
            NavigationOutcome::Scrolled { x, y } => {
                Self { navigated: true, x: Some(x), y: Some(y), skip: None }
            }
            NavigationOutcome::NotPerformed(skip) => {
                Self { navigated: false, x: None, y: None, skip: Some(skip) }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct StepOutput {
    at_ms: u64,
    event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    navigation: Option<NavigationOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    render: Option<PassOutput>,
}

#[derive(Debug, Serialize)]
struct PageOutput {
    index: u32,
    visible: bool,
    requested_ratio: f64,
    applied_ratio: f64,
    placeholder_width: f64,
    placeholder_height: f64,
}

#[derive(Debug, Serialize)]
struct SimulationOutput {
    steps: Vec<StepOutput>,
    visible_pages: Vec<u32>,
    scroll_x: f64,
    scroll_y: f64,
    scroll_calls: usize,
    style_writes: usize,
    pending_render: bool,
    live: bool,
    pages: Vec<PageOutput>,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    init_tracing();

    match cli.command {
        Commands::Simulate { feed, config, script } => {
            run_simulate(&feed, config.as_deref(), &script)
        }
        Commands::Resolve { feed, config, dest, source, scroll_x, scroll_y, viewport_height } => {
            run_resolve(&feed, config.as_deref(), &dest, source, (scroll_x, scroll_y), viewport_height)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    let base = match path {
        Some(path) => ViewerConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    base.with_env_overrides().context("invalid PAGEVIEW_* environment override")
}

fn load_viewer(feed: &Path, config: Option<&Path>, viewport_height: f64) -> Result<HeadlessViewer> {
    ensure_file_exists(feed)?;
    let config = load_config(config)?;

    let json =
        fs::read_to_string(feed).with_context(|| format!("failed to read {}", feed.display()))?;
    let feed = PageFeed::from_json(&json).context("failed to parse page feed")?;

    Viewer::from_feed(config, feed, MemoryViewport::new(viewport_height), RecordingStyleSink::new())
        .context("failed to index pages")
}

fn run_simulate(feed: &Path, config: Option<&Path>, script: &Path) -> Result<()> {
    ensure_file_exists(script)?;
    let contents = fs::read_to_string(script)
        .with_context(|| format!("failed to read {}", script.display()))?;
    let script: Script = serde_json::from_str(&contents).context("failed to parse script")?;

    let mut viewer = load_viewer(feed, config, script.viewport_height)?;
    let start = Instant::now();
    let mut steps = Vec::with_capacity(script.steps.len());

    for step in script.steps {
        let now = start + Duration::from_millis(step.at_ms);
        let navigation = apply_event(&mut viewer, &step.event, now)?;
        let render = viewer.tick(now).map(PassOutput::from);

        steps.push(StepOutput { at_ms: step.at_ms, event: step.event.name(), navigation, render });
    }

    let scroll = viewer.viewport().scroll_offset();
    let payload = SimulationOutput {
        steps,
        visible_pages: viewer.visible_pages(),
        scroll_x: scroll.x,
        scroll_y: scroll.y,
        scroll_calls: viewer.viewport().scroll_calls().len(),
        style_writes: viewer.styles().len(),
        pending_render: viewer.pending_render().is_some(),
        live: viewer.is_live(),
        pages: viewer
            .pages()
            .iter()
            .map(|page| PageOutput {
                index: page.index(),
                visible: page.is_content_visible(),
                requested_ratio: page.requested_ratio(),
                applied_ratio: page.applied_ratio(),
                placeholder_width: page.placeholder_size().width,
                placeholder_height: page.placeholder_size().height,
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

fn apply_event(
    viewer: &mut HeadlessViewer,
    event: &ScriptEvent,
    now: Instant,
) -> Result<Option<NavigationOutput>> {
    match event {
        ScriptEvent::Scroll { x, y } => {
            viewer.viewport_mut().set_offset(*x, *y);
            viewer.on_scroll(now);
        }
        ScriptEvent::Resize { height } => {
            viewer.viewport_mut().set_visible_height(*height);
            viewer.on_resize(now);
        }
        ScriptEvent::Rescale { ratio, relative } => viewer.rescale(*ratio, *relative, now),
        ScriptEvent::Zoom { direction } => viewer.zoom((*direction).into(), now),
        ScriptEvent::Wheel { detail } => viewer.zoom(ZoomCommand::Wheel { detail: *detail }, now),
        ScriptEvent::Key { code } => match ZoomCommand::from_key_code(*code) {
            Some(command) => viewer.zoom(command, now),
            None => tracing::debug!(code, "key is not a zoom shortcut"),
        },
        ScriptEvent::Activate { dest, source } => {
            let raw = match dest {
                serde_json::Value::String(raw) => raw.clone(),
                other => serde_json::to_string(other)?,
            };
            return Ok(Some(viewer.activate(*source, &raw, now).into()));
        }
        ScriptEvent::Teardown => viewer.teardown(),
        ScriptEvent::Tick => {}
    }

    Ok(None)
}

fn run_resolve(
    feed: &Path,
    config: Option<&Path>,
    dest: &str,
    source: Option<u32>,
    scroll: (f64, f64),
    viewport_height: f64,
) -> Result<()> {
    let mut viewer = load_viewer(feed, config, viewport_height)?;
    viewer.viewport_mut().set_offset(scroll.0, scroll.1);

    let payload = NavigationOutput::from(viewer.activate(source, dest, Instant::now()));

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

fn ensure_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
