use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use tracing::info;

use crate::noise::NoiseField;
use crate::types::FieldParams;

/// Parameters of a single CPU-rendered frame.
#[derive(Debug, Clone)]
pub struct StillRequest {
    pub size: (u32, u32),
    pub time: f32,
    /// Pointer in image pixels, top-left origin. `None` renders the field
    /// without the pointer push.
    pub pointer: Option<[f32; 2]>,
}

/// Renders the field on the CPU, one sample per pixel center.
pub fn render_still(params: &FieldParams, request: &StillRequest) -> RgbImage {
    let field = NoiseField::new(params.clone());
    let time = request.time;
    let (width, height) = request.size;
    let resolution = [width as f32, height as f32];
    let pointer = request
        .pointer
        .map(|[x, y]| [x, resolution[1] - y]);

    RgbImage::from_fn(width, height, |column, row| {
        let frag = [column as f32 + 0.5, resolution[1] - (row as f32 + 0.5)];
        let color = field.shade(frag, resolution, pointer, time);
        Rgb(color.map(to_byte))
    })
}

/// Renders a still and writes it to `path` as PNG.
pub fn export_png(params: &FieldParams, request: &StillRequest, path: &Path) -> Result<()> {
    anyhow::ensure!(
        request.size.0 > 0 && request.size.1 > 0,
        "still size must be non-zero, got {}x{}",
        request.size.0,
        request.size.1
    );
    let image = render_still(params, request);
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write still frame to {}", path.display()))?;
    info!(
        path = %path.display(),
        width = request.size.0,
        height = request.size.1,
        time = request.time,
        "still frame written"
    );
    Ok(())
}

// Display saturates; mirror that.
fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}
