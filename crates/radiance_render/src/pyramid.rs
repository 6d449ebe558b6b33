//! Mip Pyramid Builder
//!
//! A chain of square power-of-two luminance targets, indexed so that level
//! `i` is `2^i` on a side: level 0 is the final 1×1 result, level `n` is the
//! finest, where `n = floor(log2(min(width, height)))`. Each level holds an
//! (average, minimum, maximum) triplet of `R32Float` render targets.
//!
//! Building is all-or-nothing: a failed allocation drops every level that
//! was already created and returns the error.

use smallvec::SmallVec;

use radiance_core::{GpuTexture, Result, TextureSpec, WgpuContext};

/// Single 32-bit float channel used by every reduction target.
pub const LUMINANCE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

/// Index of the finest level for a `width × height` source.
#[inline]
#[must_use]
pub fn coarsest_level(width: u32, height: u32) -> u32 {
    width.min(height).max(1).ilog2()
}

/// Number of levels in the pyramid for a `width × height` source.
#[inline]
#[must_use]
pub fn level_count(width: u32, height: u32) -> u32 {
    coarsest_level(width, height) + 1
}

/// Side length of level `index`.
#[inline]
#[must_use]
pub fn level_size(index: u32) -> u32 {
    1 << index
}

/// Power-of-two chain of square extents, from `base` halving per step.
///
/// Shared by the luminance pyramid (ascending from 1×1) and the
/// prefiltered specular cubemap (descending from the base size).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipChain {
    pub base: u32,
    pub count: u32,
}

impl MipChain {
    #[must_use]
    pub fn new(base: u32, count: u32) -> Self {
        Self { base, count }
    }

    /// Side length of step `mip`, clamped at 1.
    #[must_use]
    pub fn extent(&self, mip: u32) -> u32 {
        radiance_core::resources::mip_extent(self.base, mip)
    }

    pub fn extents(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.count).map(|mip| self.extent(mip))
    }
}

/// One pyramid level: three parallel luminance targets of equal size.
#[derive(Debug, Clone)]
pub struct ScaledFrame {
    pub level: u32,
    pub avg: GpuTexture,
    pub min: GpuTexture,
    pub max: GpuTexture,
}

impl ScaledFrame {
    fn new(ctx: &WgpuContext, level: u32) -> Result<Self> {
        let size = level_size(level);
        let target = |name: &str| {
            GpuTexture::new(
                ctx,
                TextureSpec::render_target(&format!("Luminance {name} L{level}"), size, size, LUMINANCE_FORMAT),
            )
        };
        Ok(Self {
            level,
            avg: target("Avg")?,
            min: target("Min")?,
            max: target("Max")?,
        })
    }

    #[must_use]
    pub fn size(&self) -> u32 {
        level_size(self.level)
    }

    /// The three targets in avg, min, max order.
    #[must_use]
    pub fn targets(&self) -> [&GpuTexture; 3] {
        [&self.avg, &self.min, &self.max]
    }
}

/// Reduction pyramid owned by the HDR pipeline.
#[derive(Debug)]
pub struct LuminancePyramid {
    source_width: u32,
    source_height: u32,
    levels: SmallVec<[ScaledFrame; 16]>,
}

impl LuminancePyramid {
    /// Allocates `n + 1` level triplets for a `width × height` source.
    pub fn build(ctx: &WgpuContext, width: u32, height: u32) -> Result<Self> {
        let count = level_count(width, height);
        let mut levels = SmallVec::with_capacity(count as usize);
        for level in 0..count {
            levels.push(ScaledFrame::new(ctx, level)?);
        }

        log::info!(
            "Built luminance pyramid for {width}x{height}: {count} levels, finest {0}x{0}",
            level_size(count - 1)
        );

        Ok(Self {
            source_width: width,
            source_height: height,
            levels,
        })
    }

    #[must_use]
    pub fn source_size(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    #[must_use]
    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Index of the finest level.
    #[must_use]
    pub fn finest_level(&self) -> u32 {
        self.level_count() - 1
    }

    #[must_use]
    pub fn level(&self, index: u32) -> Option<&ScaledFrame> {
        self.levels.get(index as usize)
    }

    pub fn levels(&self) -> impl DoubleEndedIterator<Item = &ScaledFrame> {
        self.levels.iter()
    }

    /// The 1×1 level holding the final triplet.
    #[must_use]
    pub fn result(&self) -> &ScaledFrame {
        &self.levels[0]
    }

    #[must_use]
    pub fn finest(&self) -> &ScaledFrame {
        &self.levels[self.levels.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_counts() {
        assert_eq!(level_count(1280, 720), 10);
        assert_eq!(coarsest_level(1280, 720), 9);
        assert_eq!(level_count(256, 256), 9);
        assert_eq!(level_count(8, 8), 4);
        assert_eq!(level_count(1, 1), 1);
        assert_eq!(level_count(3, 1000), 2);
    }

    #[test]
    fn level_sizes_are_powers_of_two() {
        assert_eq!(level_size(0), 1);
        assert_eq!(level_size(coarsest_level(1280, 720)), 512);
    }

    #[test]
    fn mip_chain_halves() {
        let chain = MipChain::new(128, 5);
        assert_eq!(chain.extents().collect::<Vec<_>>(), vec![128, 64, 32, 16, 8]);
        assert_eq!(MipChain::new(2, 4).extent(3), 1);
    }
}
