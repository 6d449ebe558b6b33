//! GPU Integration Tests
//!
//! Tests for:
//! - Luminance pyramid reduction of a uniform frame
//! - Eye adaptation driven by real read-backs, and reset on resize
//! - IBL generation from a uniform environment
//! - Full renderer frames in HDR and debug shading modes, skybox included
//!
//! Every test returns early when no adapter is available or the adapter
//! cannot render to the luminance, HDR or IBL formats.

use radiance::prelude::*;
use radiance::radiance_render::LUMINANCE_FORMAT;
use radiance::radiance_render::reduction::read_level;

const CLEAR_LUMINANCE: f32 = 0.25;
const TOLERANCE: f32 = 1e-3;

fn adapter_context(settings: &RendererSettings) -> Option<WgpuContext> {
    let _ = env_logger::builder().is_test(true).try_init();
    match WgpuContext::new_headless_blocking(settings) {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            log::warn!("Skipping GPU test: {err}");
            None
        }
    }
}

/// Context whose adapter can render every target the pipeline uses.
fn context(settings: &RendererSettings) -> Option<WgpuContext> {
    let ctx = adapter_context(settings)?;
    let targets = [
        settings.hdr_format,
        settings.display_format,
        LUMINANCE_FORMAT,
        ctx.ibl_format(),
    ];
    if let Err(err) = ctx.require_render_targets(&targets) {
        log::warn!("Skipping GPU test: {err}");
        return None;
    }
    Some(ctx)
}

fn small_settings(width: u32, height: u32) -> RendererSettings {
    RendererSettings {
        width,
        height,
        ..Default::default()
    }
}

fn small_ibl() -> IblSettings {
    IblSettings {
        environment_size: 64,
        irradiance_size: 8,
        prefiltered_size: 16,
        brdf_lut_size: 16,
        roughness_levels: vec![0.0, 0.5, 1.0],
        prefilter_samples: 64,
    }
}

// ============================================================================
// Luminance Reduction
// ============================================================================

#[test]
fn uniform_frame_reduces_to_constant_at_every_level() {
    let settings = small_settings(256, 256);
    let Some(ctx) = context(&settings) else { return };

    let mut hdr = HdrPipeline::new(&ctx, &settings, &AdaptationSettings::default(), &ToneMappingSettings::default())
        .expect("hdr pipeline");
    let mut encoder = ctx.create_encoder("Test Reduction");
    hdr.encode_clear(&mut encoder).unwrap();
    hdr.encode_reduction(&ctx, &mut encoder).unwrap();
    ctx.submit(encoder);

    let pyramid = hdr.pyramid().unwrap();
    assert_eq!(pyramid.level_count(), 9);
    for level in pyramid.levels() {
        for (stat, texels) in ["avg", "min", "max"].iter().zip(read_level(&ctx, level).unwrap()) {
            let (lo, hi) = texels.channel_range(0);
            assert!(
                (lo - CLEAR_LUMINANCE).abs() < TOLERANCE && (hi - CLEAR_LUMINANCE).abs() < TOLERANCE,
                "level {}x{} {stat}: [{lo}, {hi}]",
                level.size(),
                level.size()
            );
        }
    }

    let adapted = hdr.adapt_with_dt(&ctx, 0.016).unwrap().expect("first read-back");
    assert!((adapted - CLEAR_LUMINANCE).abs() < TOLERANCE);
}

fn gray(value: f64) -> wgpu::Color {
    wgpu::Color {
        r: value,
        g: value,
        b: value,
        a: 1.0,
    }
}

fn reduce_cleared_frame(ctx: &WgpuContext, hdr: &mut HdrPipeline, value: f64) {
    hdr.set_clear_color(gray(value));
    let mut encoder = ctx.create_encoder("Test Reduction");
    hdr.encode_clear(&mut encoder).unwrap();
    hdr.encode_reduction(ctx, &mut encoder).unwrap();
    ctx.submit(encoder);
}

#[test]
fn bright_step_after_first_sample() {
    let settings = small_settings(256, 256);
    let Some(ctx) = context(&settings) else { return };

    let mut hdr = HdrPipeline::new(&ctx, &settings, &AdaptationSettings::default(), &ToneMappingSettings::default())
        .expect("hdr pipeline");
    assert_eq!(hdr.pyramid().unwrap().finest_level(), 8);

    reduce_cleared_frame(&ctx, &mut hdr, 0.5);
    let level0 = read_level(&ctx, hdr.pyramid().unwrap().result()).unwrap();
    assert!((level0[0].texel(0, 0)[0] - 0.5).abs() < TOLERANCE);
    let first = hdr.adapt_with_dt(&ctx, 1.0).unwrap().expect("first sample");
    assert!((first - 0.5).abs() < TOLERANCE);

    reduce_cleared_frame(&ctx, &mut hdr, 2.0);
    let adapted = hdr.adapt_with_dt(&ctx, 0.5).unwrap().expect("second sample");
    let expected = 0.5 + 1.5 * (1.0 - (-1.0_f32).exp());
    assert!((adapted - expected).abs() < 2.0 * TOLERANCE, "expected {expected}, got {adapted}");
}

#[test]
fn unrenderable_targets_are_reported_as_errors() {
    let settings = small_settings(64, 64);
    let Some(ctx) = adapter_context(&settings) else { return };

    let renderable = |format| ctx.supports_usage(format, wgpu::TextureUsages::RENDER_ATTACHMENT);
    let missing = [settings.hdr_format, settings.display_format, LUMINANCE_FORMAT]
        .into_iter()
        .find(|&format| !renderable(format));

    let result = HdrPipeline::new(&ctx, &settings, &AdaptationSettings::default(), &ToneMappingSettings::default());
    match missing {
        Some(expected) => assert!(
            matches!(result, Err(RadianceError::UnsupportedFormat { format, .. }) if format == expected),
            "expected UnsupportedFormat({expected:?})"
        ),
        None => assert!(result.is_ok()),
    }
}

#[test]
fn non_square_frame_uses_smaller_side() {
    let settings = small_settings(200, 72);
    let Some(ctx) = context(&settings) else { return };

    let hdr = HdrPipeline::new(&ctx, &settings, &AdaptationSettings::default(), &ToneMappingSettings::default())
        .expect("hdr pipeline");
    let pyramid = hdr.pyramid().unwrap();
    assert_eq!(pyramid.level_count(), 7);
    assert_eq!(pyramid.finest().size(), 64);
    assert_eq!(pyramid.result().size(), 1);
}

#[test]
fn resize_resets_adaptation() {
    let settings = small_settings(64, 64);
    let Some(ctx) = context(&settings) else { return };

    let mut hdr = HdrPipeline::new(&ctx, &settings, &AdaptationSettings::default(), &ToneMappingSettings::default())
        .expect("hdr pipeline");
    let mut encoder = ctx.create_encoder("Test Reduction");
    hdr.encode_clear(&mut encoder).unwrap();
    hdr.encode_reduction(&ctx, &mut encoder).unwrap();
    ctx.submit(encoder);
    assert!(hdr.adapt_with_dt(&ctx, 0.016).unwrap().is_some());

    hdr.resize(&ctx, 3, 500).unwrap();
    assert_eq!(hdr.size(), Some((8, 500)));
    assert_eq!(hdr.adaptation().state(), AdaptationState::Uninitialized);
    assert_eq!(hdr.pyramid().unwrap().level_count(), 4);
}

// ============================================================================
// IBL Generation
// ============================================================================

#[test]
fn uniform_environment_is_preserved_by_every_map() {
    let settings = small_settings(64, 64);
    let Some(ctx) = context(&settings) else { return };

    let radiance = 0.6;
    let mut generator = CubemapGenerator::new(&ctx, small_ibl()).expect("ibl generator");
    let maps = generator
        .generate_all(&ctx, &HdrImage::uniform(32, 16, [radiance; 3]))
        .expect("ibl generation");

    assert_eq!(maps.prefiltered.mip_level_count(), 3);
    assert!((maps.prefiltered_max_mip() - 2.0).abs() < f32::EPSILON);

    for face in CubeFace::ALL {
        let layer = face.index();
        let env = read_texture(&ctx, &maps.environment, layer, 0).unwrap();
        let (lo, hi) = env.channel_range(0);
        assert!((lo - radiance).abs() < 0.01 && (hi - radiance).abs() < 0.01, "environment {}", face.name());

        let irradiance = read_texture(&ctx, &maps.irradiance, layer, 0).unwrap();
        let (lo, hi) = irradiance.channel_range(1);
        assert!((lo - radiance).abs() < 0.03 && (hi - radiance).abs() < 0.03, "irradiance {}: [{lo}, {hi}]", face.name());

        for mip in 0..3 {
            let prefiltered = read_texture(&ctx, &maps.prefiltered, layer, mip).unwrap();
            let (lo, hi) = prefiltered.channel_range(2);
            assert!(
                (lo - radiance).abs() < 0.03 && (hi - radiance).abs() < 0.03,
                "prefiltered {} mip {mip}: [{lo}, {hi}]",
                face.name()
            );
        }
    }

    let lut = read_texture(&ctx, &maps.brdf_lut, 0, 0).unwrap();
    for y in 0..lut.height {
        for x in 0..lut.width {
            let texel = lut.texel(x, y);
            assert!(texel[0] >= 0.0 && texel[1] >= 0.0 && texel[0] + texel[1] <= 1.01, "lut ({x}, {y}) = {texel:?}");
        }
    }
}

// ============================================================================
// Renderer
// ============================================================================

#[test]
fn renderer_adapts_over_frames() {
    let settings = small_settings(64, 48);
    let Some(ctx) = context(&settings) else { return };

    let mut generator = CubemapGenerator::new(&ctx, small_ibl()).expect("ibl generator");
    let maps = generator
        .generate_all(&ctx, &HdrImage::uniform(32, 16, [1.0, 0.9, 0.8]))
        .expect("ibl generation");
    let mut renderer = Renderer::new(
        &ctx,
        settings,
        &AdaptationSettings::default(),
        &ToneMappingSettings::default(),
        SceneSettings::default(),
        maps,
    )
    .expect("renderer");
    assert!(renderer.textures().contains("irradiance"));

    let display = renderer.create_display_target(&ctx).unwrap();
    let view = display.render_target_view().unwrap();

    let mut last = None;
    for _ in 0..4 {
        let report = renderer.render_with_dt(&ctx, &view, 0.1).unwrap();
        assert_eq!(report.shading_mode, ShadingMode::Default);
        let adapted = report.adapted_luminance.expect("adapted luminance");
        assert!(adapted.is_finite() && adapted > 0.0);
        last = Some(adapted);
    }
    assert_eq!(renderer.hdr().adaptation().adapted(), last);

    let pixels = read_texture(&ctx, &display, 0, 0).unwrap();
    assert_eq!((pixels.width, pixels.height), (64, 48));
    let (lo, hi) = pixels.channel_range(0);
    assert!(lo >= 0.0 && hi <= 1.0);
}

#[test]
fn debug_modes_bypass_adaptation() {
    let settings = small_settings(32, 32);
    let Some(ctx) = context(&settings) else { return };

    let mut generator = CubemapGenerator::new(&ctx, small_ibl()).expect("ibl generator");
    let maps = generator
        .generate_all(&ctx, &HdrImage::uniform(16, 8, [0.5; 3]))
        .expect("ibl generation");
    let scene = SceneSettings {
        shading_mode: ShadingMode::Fresnel,
        ..Default::default()
    };
    let mut renderer = Renderer::new(
        &ctx,
        settings,
        &AdaptationSettings::default(),
        &ToneMappingSettings::default(),
        scene,
        maps,
    )
    .expect("renderer");

    let display = renderer.create_display_target(&ctx).unwrap();
    let view = display.render_target_view().unwrap();
    for &mode in ShadingMode::all().iter().filter(|m| !m.uses_hdr()) {
        renderer.scene.shading_mode = mode;
        let report = renderer.render_with_dt(&ctx, &view, 0.016).unwrap();
        assert_eq!(report.adapted_luminance, None, "{}", mode.name());
    }
    assert_eq!(renderer.hdr().adaptation().state(), AdaptationState::Uninitialized);

    renderer.resize(&ctx, 2, 2).unwrap();
    assert_eq!(renderer.size(), (8, 8));
}

#[test]
fn debug_modes_draw_skybox_behind_sphere() {
    let settings = small_settings(32, 32);
    let Some(ctx) = context(&settings) else { return };

    let mut generator = CubemapGenerator::new(&ctx, small_ibl()).expect("ibl generator");
    let maps = generator
        .generate_all(&ctx, &HdrImage::uniform(16, 8, [2.0, 0.0, 0.0]))
        .expect("ibl generation");
    let scene = SceneSettings {
        shading_mode: ShadingMode::Geometry,
        ..Default::default()
    };
    let mut renderer = Renderer::new(
        &ctx,
        settings,
        &AdaptationSettings::default(),
        &ToneMappingSettings::default(),
        scene,
        maps,
    )
    .expect("renderer");

    let display = renderer.create_display_target(&ctx).unwrap();
    let view = display.render_target_view().unwrap();
    renderer.render_with_dt(&ctx, &view, 0.016).unwrap();

    // The corner lies outside the sphere: a red sky, not the gray clear.
    let pixels = read_texture(&ctx, &display, 0, 0).unwrap();
    let corner = pixels.texel(0, 0);
    assert!(corner[0] > 0.9, "corner {corner:?}");
    assert!(corner[1] < 0.1 && corner[2] < 0.1, "corner {corner:?}");
}
