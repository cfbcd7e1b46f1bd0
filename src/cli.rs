use crate::config::{Config, load_config};
use crate::dump::{LayoutDump, write_layout_dump};
use crate::render::{render_svg, write_output_svg};
use crate::scene::{SceneLayout, layout_scene, parse_scene};
use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "groupdock",
    version,
    about = "Arrange connector dock points on the sides of rectangular groups"
)]
pub struct Args {
    /// Input scene (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for JSON and SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Config JSON file (dock settings, theme, render size)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width used when rasterizing
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height used when rasterizing
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Override the untangle iteration cap
    #[arg(long = "max-iterations")]
    pub max_iterations: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Svg,
    Png,
}

impl Args {
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(io::stderr)
        .with_target(false)
        .init();
    run_with_args(&args)
}

pub fn run_with_args(args: &Args) -> Result<()> {
    let config = resolve_config(args)?;
    let input = read_input(args.input.as_deref())?;
    let scene = parse_scene(&input)?;
    debug!(
        groups = scene.groups.len(),
        connectors = scene.connectors.len(),
        "scene parsed"
    );
    let layout = layout_scene(&scene, &config.dock)?;
    write_layout(&layout, &config, args.output_format, args.output.as_deref())
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if let Some(cap) = args.max_iterations {
        config.dock.max_untangle_iterations = cap;
    }
    Ok(config)
}

fn write_layout(
    layout: &SceneLayout,
    config: &Config,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    match format {
        OutputFormat::Json => write_layout_dump(&LayoutDump::from_layout(layout), output),
        OutputFormat::Svg => {
            let svg = render_svg(layout, &config.theme, &config.render);
            write_output_svg(&svg, output)
        }
        OutputFormat::Png => write_png(layout, config, output),
    }
}

#[cfg(feature = "png")]
fn write_png(layout: &SceneLayout, config: &Config, output: Option<&Path>) -> Result<()> {
    let output = ensure_output(output, "png")?;
    let svg = render_svg(layout, &config.theme, &config.render);
    crate::render::write_output_png(&svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_layout: &SceneLayout, _config: &Config, _output: Option<&Path>) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg_attr(not(feature = "png"), allow(dead_code))]
fn ensure_output<'a>(output: Option<&'a Path>, ext: &str) -> Result<&'a Path> {
    output.ok_or_else(|| anyhow::anyhow!("Output path required for {} output", ext))
}
