use anyhow::{Context, Result};
use renderer::{Renderer, StillRequest};
use tracing_subscriber::EnvFilter;

use crate::cli::{RunArgs, StillArgs};
use crate::paths::AppPaths;
use crate::settings::{load_config, parse_surface_size, renderer_config};

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run_window(args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = load_config(args, &paths)?;
    let renderer_config = renderer_config(&config, args)?;
    tracing::info!(
        width = renderer_config.surface_size.0,
        height = renderer_config.surface_size.1,
        octaves = renderer_config.params.octaves,
        fps = ?renderer_config.target_fps,
        power = %renderer_config.power,
        "starting driftfield"
    );
    Renderer::new(renderer_config).run()
}

pub fn run_still(args: &RunArgs, still: StillArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = load_config(args, &paths)?;
    let renderer_config = renderer_config(&config, args)?;
    let size = match still.size.as_deref() {
        Some(spec) => parse_surface_size(spec).context("invalid still size")?,
        None => renderer_config.surface_size,
    };
    let request = StillRequest {
        size,
        time: still.time.unwrap_or_else(|| config.still_seconds()),
        pointer: still.pointer,
    };
    tracing::debug!(?request, output = %still.output.display(), "rendering still frame");
    Renderer::new(renderer_config).export_still(&request, &still.output)
}

pub fn print_config(args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = load_config(args, &paths)?;
    let rendered =
        toml::to_string_pretty(&config).context("failed to serialise configuration")?;
    print!("{rendered}");
    Ok(())
}

pub fn print_paths() -> Result<()> {
    let paths = AppPaths::discover()?;
    let config_file = paths.config_file();
    println!("Configuration directories:");
    println!("  config:     {}", paths.config_dir().display());
    println!(
        "  file:       {} ({})",
        config_file.display(),
        if config_file.is_file() {
            "present"
        } else {
            "missing"
        }
    );
    Ok(())
}
