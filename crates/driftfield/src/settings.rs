use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use fieldconfig::{FieldConfig, PowerSetting};
use renderer::{DriftParams, FieldParams, GpuPowerPreference, RendererConfig, Rgb};

use crate::cli::RunArgs;
use crate::paths::AppPaths;

/// Loads the configuration file and applies command-line overrides.
///
/// An explicit `--config` path must exist; the default location is optional.
pub fn load_config(args: &RunArgs, paths: &AppPaths) -> Result<FieldConfig> {
    let mut config = match config_path(args, paths) {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            let config = FieldConfig::from_toml_str(&text)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded configuration");
            config
        }
        None => FieldConfig::default(),
    };

    apply_overrides(&mut config, args);
    config
        .validate()
        .context("invalid command-line override")?;
    Ok(config)
}

fn config_path(args: &RunArgs, paths: &AppPaths) -> Option<PathBuf> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }
    let default = paths.config_file();
    default.is_file().then_some(default)
}

pub fn apply_overrides(config: &mut FieldConfig, args: &RunArgs) {
    if let Some(octaves) = args.octaves {
        config.field.octaves = octaves;
    }
    if let Some(rate) = args.trail_rate {
        config.field.trail_rate = rate;
    }
    if let Some(radius) = args.pointer_radius {
        config.field.pointer_radius = radius;
    }
    if let Some(fps) = args.fps {
        config.render.fps = Some(fps);
    }
    if let Some(power) = args.power {
        config.render.power = power;
    }
    if args.no_vsync {
        config.render.vsync = false;
    }
}

pub fn field_params(config: &FieldConfig) -> FieldParams {
    let field = &config.field;
    let mut color_stops: [Rgb; renderer::COLOR_STOP_COUNT] = renderer::DEFAULT_COLOR_STOPS;
    for (slot, stop) in color_stops.iter_mut().zip(&field.color_stops) {
        *slot = stop.0;
    }
    FieldParams {
        octaves: field.octaves,
        scale: field.scale,
        color_stops,
        stop_weights: field.stop_weights,
        shimmer: field.shimmer,
        shimmer_frequency: field.shimmer_frequency,
        gradient_floor: field.gradient_floor,
        drift: DriftParams {
            speed: config.drift.speed,
            sway: config.drift.sway,
            frequency: config.drift.frequency,
        },
        pointer_radius: field.pointer_radius,
        pointer_strength: field.pointer_strength,
        trail_rate: field.trail_rate,
    }
}

pub fn renderer_config(config: &FieldConfig, args: &RunArgs) -> Result<RendererConfig> {
    let defaults = RendererConfig::default();
    let surface_size = args
        .size
        .as_deref()
        .map(parse_surface_size)
        .transpose()?
        .unwrap_or(defaults.surface_size);

    Ok(RendererConfig {
        surface_size,
        params: field_params(config),
        target_fps: match config.render.fps {
            Some(v) if v > 0.0 => Some(v),
            _ => None,
        },
        power: match config.render.power {
            PowerSetting::Low => GpuPowerPreference::Low,
            PowerSetting::High => GpuPowerPreference::High,
        },
        vsync: config.render.vsync,
        ..defaults
    })
}

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32)> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| anyhow::anyhow!("expected WxH format, e.g. 1920x1080"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid width in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid height in size specification"))?;

    if width == 0 || height == 0 {
        anyhow::bail!("surface dimensions must be greater than zero");
    }

    Ok((width, height))
}
