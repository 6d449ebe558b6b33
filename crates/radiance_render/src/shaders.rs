//! WGSL program library.
//!
//! Programs are assembled from embedded chunks: the shared full-screen quad
//! vertex stage, a few helper libraries and one entry-point file per pass.
//! Variants are produced by prepending `const` definitions, so every variant
//! is compiled once up front instead of being patched at runtime.

use std::borrow::Cow;

use crate::shading::ShadingMode;

const FULLSCREEN: &str = include_str!("shaders/fullscreen.wgsl");
const LUMINANCE_COMMON: &str = include_str!("shaders/luminance_common.wgsl");
const IBL_COMMON: &str = include_str!("shaders/ibl_common.wgsl");

const BRIGHTNESS: &str = include_str!("shaders/brightness.wgsl");
const DOWNSAMPLE: &str = include_str!("shaders/downsample.wgsl");
const TONE_MAPPING: &str = include_str!("shaders/tone_mapping.wgsl");
const MIPMAP_BLIT: &str = include_str!("shaders/mipmap_blit.wgsl");
const EQUIRECT_CAPTURE: &str = include_str!("shaders/equirect_capture.wgsl");
const IRRADIANCE: &str = include_str!("shaders/irradiance.wgsl");
const PREFILTER: &str = include_str!("shaders/prefilter.wgsl");
const BRDF: &str = include_str!("shaders/brdf.wgsl");
const SKYBOX: &str = include_str!("shaders/skybox.wgsl");
const PBR: &str = include_str!("shaders/pbr.wgsl");

/// Vertex entry point shared by every full-screen program.
pub const FULLSCREEN_VERTEX_ENTRY: &str = "vs_fullscreen";

/// Every shader program the renderer compiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    Brightness,
    Downsample,
    ToneMapping,
    MipmapBlit,
    EquirectCapture,
    Irradiance,
    Prefilter,
    Brdf,
    Skybox,
    Pbr(ShadingMode),
}

impl Program {
    /// Fragment entry point of the program.
    #[must_use]
    pub fn fragment_entry(self) -> &'static str {
        match self {
            Self::Brightness => "fs_brightness",
            Self::Downsample => "fs_downsample",
            Self::ToneMapping => "fs_tone_map",
            Self::MipmapBlit => "fs_blit",
            Self::EquirectCapture => "fs_capture",
            Self::Irradiance => "fs_irradiance",
            Self::Prefilter => "fs_prefilter",
            Self::Brdf => "fs_brdf",
            Self::Skybox => "fs_skybox",
            Self::Pbr(_) => "fs_main",
        }
    }

    /// Vertex entry point of the program.
    #[must_use]
    pub fn vertex_entry(self) -> &'static str {
        match self {
            Self::Pbr(_) => "vs_main",
            _ => FULLSCREEN_VERTEX_ENTRY,
        }
    }

    #[must_use]
    pub fn label(self) -> Cow<'static, str> {
        match self {
            Self::Brightness => "Brightness".into(),
            Self::Downsample => "Downsample".into(),
            Self::ToneMapping => "Tone Map".into(),
            Self::MipmapBlit => "Mipmap Blit".into(),
            Self::EquirectCapture => "Equirect Capture".into(),
            Self::Irradiance => "Irradiance".into(),
            Self::Prefilter => "Prefilter".into(),
            Self::Brdf => "BRDF LUT".into(),
            Self::Skybox => "Skybox".into(),
            Self::Pbr(mode) => format!("PBR ({})", mode.name()).into(),
        }
    }

    /// Assembled WGSL source.
    #[must_use]
    pub fn source(self) -> String {
        match self {
            Self::Brightness => compose(&[], &[FULLSCREEN, LUMINANCE_COMMON, BRIGHTNESS]),
            Self::Downsample => compose(&[], &[FULLSCREEN, LUMINANCE_COMMON, DOWNSAMPLE]),
            Self::ToneMapping => compose(&[], &[FULLSCREEN, LUMINANCE_COMMON, TONE_MAPPING]),
            Self::MipmapBlit => compose(&[], &[FULLSCREEN, MIPMAP_BLIT]),
            Self::EquirectCapture => compose(&[], &[FULLSCREEN, IBL_COMMON, EQUIRECT_CAPTURE]),
            Self::Irradiance => compose(&[], &[FULLSCREEN, IBL_COMMON, IRRADIANCE]),
            Self::Prefilter => compose(&[], &[FULLSCREEN, IBL_COMMON, PREFILTER]),
            Self::Brdf => compose(&[], &[FULLSCREEN, IBL_COMMON, BRDF]),
            Self::Skybox => compose(&[], &[FULLSCREEN, IBL_COMMON, SKYBOX]),
            Self::Pbr(mode) => compose(
                &[("SHADING_MODE", "u32", &format!("{}u", mode.index()))],
                &[IBL_COMMON, PBR],
            ),
        }
    }

    /// Every program, including one PBR variant per shading mode.
    #[must_use]
    pub fn all() -> Vec<Program> {
        let mut programs = vec![
            Self::Brightness,
            Self::Downsample,
            Self::ToneMapping,
            Self::MipmapBlit,
            Self::EquirectCapture,
            Self::Irradiance,
            Self::Prefilter,
            Self::Brdf,
            Self::Skybox,
        ];
        programs.extend(ShadingMode::all().iter().map(|&m| Self::Pbr(m)));
        programs
    }

    pub fn create_module(self, device: &wgpu::Device) -> wgpu::ShaderModule {
        let source = self.source();
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} Shader", self.label())),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
        })
    }
}

/// Joins `const` definitions and source chunks into one WGSL module.
fn compose(defines: &[(&str, &str, &str)], chunks: &[&str]) -> String {
    let mut out = String::new();
    for (name, ty, value) in defines {
        out.push_str(&format!("const {name}: {ty} = {value};\n"));
    }
    for chunk in chunks {
        out.push_str(chunk);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(program: Program) {
        let source = program.source();
        let module = naga::front::wgsl::parse_str(&source)
            .unwrap_or_else(|e| panic!("{:?} failed to parse:\n{}", program, e.emit_to_string(&source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("{program:?} failed validation: {e:?}"));

        for entry in [program.vertex_entry(), program.fragment_entry()] {
            assert!(
                module.entry_points.iter().any(|ep| ep.name == entry),
                "{program:?} is missing entry point {entry}"
            );
        }
    }

    #[test]
    fn every_program_parses_and_validates() {
        for program in Program::all() {
            validate(program);
        }
    }

    #[test]
    fn shading_variants_differ_only_by_mode_constant() {
        let default = Program::Pbr(ShadingMode::Default).source();
        let fresnel = Program::Pbr(ShadingMode::Fresnel).source();
        assert!(default.starts_with("const SHADING_MODE: u32 = 0u;"));
        assert!(fresnel.starts_with("const SHADING_MODE: u32 = 1u;"));
        assert_eq!(default.lines().skip(1).collect::<Vec<_>>(), fresnel.lines().skip(1).collect::<Vec<_>>());
    }

    #[test]
    fn fullscreen_programs_share_vertex_stage() {
        for program in Program::all() {
            if !matches!(program, Program::Pbr(_)) {
                assert_eq!(program.vertex_entry(), FULLSCREEN_VERTEX_ENTRY);
                assert!(program.source().contains("fn vs_fullscreen"));
            }
        }
    }
}
