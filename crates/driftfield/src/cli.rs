use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use fieldconfig::PowerSetting;

#[derive(Parser, Debug)]
#[command(
    name = "driftfield",
    author,
    version,
    about = "Animated fractal-noise background",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file; defaults to `config.toml` in the config directory.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Number of FBM octaves (1-8).
    #[arg(long, value_name = "COUNT", global = true)]
    pub octaves: Option<u32>,

    /// Per-frame pointer trail smoothing rate, strictly between 0 and 1.
    #[arg(long, value_name = "RATE", global = true)]
    pub trail_rate: Option<f32>,

    /// Distance in UV units over which the pointer push fades out.
    #[arg(long, value_name = "RADIUS", global = true)]
    pub pointer_radius: Option<f32>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Optional FPS cap (0=uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// GPU power preference: `low` or `high`.
    #[arg(long, value_name = "PREFERENCE", value_parser = parse_power)]
    pub power: Option<PowerSetting>,

    /// Present without waiting for vertical blank.
    #[arg(long)]
    pub no_vsync: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render one frame on the CPU and write it as PNG.
    Still(StillArgs),
    /// Print the effective configuration as TOML.
    Config,
    /// Print resolved directories.
    Paths,
}

#[derive(Args, Debug)]
pub struct StillArgs {
    /// Destination PNG path.
    #[arg(long, short, value_name = "PATH", value_parser = parse_png_path)]
    pub output: PathBuf,

    /// Timestamp to evaluate, as seconds (`2.5`) or a duration (`2s 500ms`).
    #[arg(long, value_name = "SECONDS", value_parser = parse_still_time)]
    pub time: Option<f32>,

    /// Image size (e.g. `1920x1080`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Pointer position in image pixels, top-left origin (e.g. `640,360`).
    #[arg(long, value_name = "X,Y", value_parser = parse_pointer)]
    pub pointer: Option<[f32; 2]>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_power(value: &str) -> Result<PowerSetting, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" | "integrated" => Ok(PowerSetting::Low),
        "high" | "high-performance" | "discrete" => Ok(PowerSetting::High),
        "" => Err("power preference must not be empty".to_string()),
        other => Err(format!(
            "unknown power preference '{other}'; expected low or high"
        )),
    }
}

pub fn parse_still_time(value: &str) -> Result<f32, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("still time must not be empty".to_string());
    }
    if let Ok(seconds) = trimmed.parse::<f32>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err("still time must be a finite non-negative number".to_string());
        }
        return Ok(seconds);
    }
    humantime::parse_duration(trimmed)
        .map(|duration: Duration| duration.as_secs_f32())
        .map_err(|err| format!("invalid still time '{trimmed}': {err}"))
}

pub fn parse_pointer(value: &str) -> Result<[f32; 2], String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| "expected X,Y".to_string())?;
    let x = x
        .trim()
        .parse::<f32>()
        .map_err(|_| "invalid pointer x coordinate".to_string())?;
    let y = y
        .trim()
        .parse::<f32>()
        .map_err(|_| "invalid pointer y coordinate".to_string())?;
    if !x.is_finite() || !y.is_finite() {
        return Err("pointer coordinates must be finite".into());
    }
    Ok([x, y])
}

pub fn parse_png_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    match extension(&path).as_deref() {
        Some("png") => Ok(path),
        None => Err("export path has no extension; expected .png".to_string()),
        Some(other) => Err(format!(
            "unsupported export format '.{other}'; expected .png"
        )),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
