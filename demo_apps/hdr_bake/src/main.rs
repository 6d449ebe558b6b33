//! Headless bake-and-render demo.
//!
//! ```text
//! hdr_bake [environment.hdr] [config.json] [output.png]
//! ```
//!
//! Loads an equirectangular HDR image (or a flat gray sky when none is
//! given), precomputes the IBL maps, renders a fixed number of frames with a
//! constant time step so eye adaptation settles, and writes the last display
//! frame as PNG.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use radiance::prelude::*;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct BakeConfig {
    width: u32,
    height: u32,
    frames: u32,
    frame_dt: f32,
    adaptation: AdaptationSettings,
    tone_mapping: ToneMappingSettings,
    ibl: IblSettings,
    scene: SceneSettings,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            frames: 60,
            frame_dt: 1.0 / 60.0,
            adaptation: AdaptationSettings::default(),
            tone_mapping: ToneMappingSettings::default(),
            ibl: IblSettings::default(),
            scene: SceneSettings::default(),
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BakeConfig> {
    let Some(path) = path else {
        return Ok(BakeConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn load_environment(path: Option<&Path>) -> anyhow::Result<HdrImage> {
    let Some(path) = path else {
        log::info!("No environment given, using a flat sky");
        return Ok(HdrImage::uniform(64, 32, [0.5, 0.5, 0.5]));
    };
    let decoded = image::open(path)
        .with_context(|| format!("decoding {}", path.display()))?
        .into_rgb32f();
    let (width, height) = decoded.dimensions();
    log::info!("Loaded {} ({width}x{height})", path.display());
    Ok(HdrImage::from_rgb(width, height, decoded.as_raw())?)
}

fn write_png(ctx: &WgpuContext, target: &GpuTexture, path: &Path) -> anyhow::Result<()> {
    let texels = read_texture(ctx, target, 0, 0)?;
    let bytes: Vec<u8> = texels
        .values
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    let image = image::RgbaImage::from_raw(texels.width, texels.height, bytes)
        .context("display read-back has the wrong size")?;
    image.save(path).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    let environment_path = args.first().map(PathBuf::as_path);
    let config_path = args.get(1).map(PathBuf::as_path);
    let output = args.get(2).cloned().unwrap_or_else(|| PathBuf::from("hdr_bake.png"));

    let config = load_config(config_path)?;
    let settings = RendererSettings {
        width: config.width,
        height: config.height,
        ..Default::default()
    };
    let ctx = WgpuContext::new_headless_blocking(&settings)?;

    let environment = load_environment(environment_path)?;
    let mut generator = CubemapGenerator::new(&ctx, config.ibl.clone())?;
    let maps = generator.generate_all(&ctx, &environment)?;

    let mut renderer = Renderer::new(
        &ctx,
        settings,
        &config.adaptation,
        &config.tone_mapping,
        config.scene,
        maps,
    )?;
    let display = renderer.create_display_target(&ctx)?;
    let display_view = display.render_target_view()?;

    for frame in 0..config.frames.max(1) {
        let report = renderer.render_with_dt(&ctx, &display_view, config.frame_dt)?;
        if let Some(adapted) = report.adapted_luminance {
            log::debug!("frame {frame}: adapted luminance {adapted:.4}");
        }
    }
    if let Some(adapted) = renderer.hdr().adaptation().adapted() {
        log::info!("Final adapted luminance {adapted:.4}");
    }

    write_png(&ctx, &display, &output)
}
