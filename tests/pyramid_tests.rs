//! Luminance Pyramid Tests
//!
//! Tests for:
//! - Level count and per-level extents for assorted source sizes
//! - MipChain extents shared with the prefiltered cubemap
//! - Host 2×2 reduction (average, minimum, maximum) and luma weights

use radiance::radiance_render::pyramid::{coarsest_level, level_count, level_size};
use radiance::radiance_render::reduction::{LUMA_WEIGHTS, luminance, reduce_on_host};
use radiance::radiance_render::{LevelStats, MipChain, ReductionOp};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Level Counts
// ============================================================================

#[test]
fn level_count_follows_smaller_side() {
    let cases = [
        ((1, 1), 1),
        ((8, 8), 4),
        ((256, 256), 9),
        ((800, 600), 10),
        ((1280, 720), 10),
        ((1920, 1080), 11),
        ((8, 1000), 4),
        ((1000, 9), 4),
    ];
    for ((w, h), expected) in cases {
        assert_eq!(level_count(w, h), expected, "{w}x{h}");
    }
}

#[test]
fn finest_level_fits_inside_source() {
    for (w, h) in [(8, 8), (37, 91), (640, 480), (4096, 2160)] {
        let finest = level_size(coarsest_level(w, h));
        assert!(finest <= w.min(h));
        assert!(finest * 2 > w.min(h), "{w}x{h}: {finest} is not the largest fit");
    }
}

#[test]
fn level_sizes_double_per_step() {
    let sizes: Vec<u32> = (0..level_count(64, 64)).map(level_size).collect();
    assert_eq!(sizes, vec![1, 2, 4, 8, 16, 32, 64]);
}

// ============================================================================
// MipChain
// ============================================================================

#[test]
fn mip_chain_halves_and_clamps() {
    let chain = MipChain::new(128, 5);
    let extents: Vec<u32> = chain.extents().collect();
    assert_eq!(extents, vec![128, 64, 32, 16, 8]);
    assert_eq!(MipChain::new(4, 4).extent(3), 1);
}

// ============================================================================
// Host Reduction
// ============================================================================

#[test]
fn luma_weights_sum_to_one() {
    assert!(approx(LUMA_WEIGHTS.iter().sum::<f32>(), 1.0));
    assert!(approx(luminance([1.0, 1.0, 1.0]), 1.0));
    assert!(approx(luminance([0.0, 1.0, 0.0]), 0.7152));
}

#[test]
fn uniform_grid_keeps_its_value_at_every_statistic() {
    let stats = reduce_on_host(&vec![0.35; 64 * 64], 64);
    assert!(approx(stats.avg, 0.35));
    assert!(approx(stats.min, 0.35));
    assert!(approx(stats.max, 0.35));
}

#[test]
fn single_bright_texel_raises_average_and_maximum() {
    let mut values = vec![0.0_f32; 16 * 16];
    values[37] = 256.0;
    let stats = reduce_on_host(&values, 16);
    assert!(approx(stats.avg, 1.0));
    assert_eq!(stats.min, 0.0);
    assert_eq!(stats.max, 256.0);
}

#[test]
fn reduction_is_ordered() {
    let values: Vec<f32> = (0..32 * 32).map(|i| ((i * 7919) % 101) as f32 / 10.0).collect();
    let stats = reduce_on_host(&values, 32);
    assert!(stats.min <= stats.avg && stats.avg <= stats.max);
}

#[test]
fn level_stats_reduce_each_channel_independently() {
    let block = [
        LevelStats { avg: 1.0, min: 0.5, max: 2.0 },
        LevelStats { avg: 2.0, min: 0.1, max: 3.0 },
        LevelStats { avg: 3.0, min: 0.2, max: 8.0 },
        LevelStats { avg: 2.0, min: 0.3, max: 4.0 },
    ];
    let out = LevelStats::reduce(block);
    assert!(approx(out.avg, 2.0));
    assert!(approx(out.min, 0.1));
    assert!(approx(out.max, 8.0));
    assert!(approx(ReductionOp::Average.apply([1.0, 2.0, 3.0, 2.0]), out.avg));
}
