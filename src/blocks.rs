//! Split the nostril window into measurement blocks, measure
//! them, and pick the one most likely to cover the nostril.

use rayon::prelude::*;
use serde_derive::*;

use crate::{
    frame::ThermalSampler,
    geometry::{Rect, Space, Thermal, Visual},
    stats::Stats,
};

pub const BLOCK_COUNT: usize = 4;

/// Split `region` into [`BLOCK_COUNT`] vertical strips, left to
/// right. Every strip is `width / 4` wide; the remainder goes to
/// the last strip, so the strips tile `region` exactly.
pub fn partition<S: Space>(region: &Rect<S>) -> [Rect<S>; BLOCK_COUNT] {
    let width = region.width();
    let base = width / BLOCK_COUNT as i32;
    let remainder = width % BLOCK_COUNT as i32;

    let mut blocks = [*region; BLOCK_COUNT];
    let mut left = region.left;
    for (k, block) in blocks.iter_mut().enumerate() {
        let w = if k == BLOCK_COUNT - 1 {
            base + remainder
        } else {
            base
        };
        *block = Rect::new(left, region.top, left + w, region.bottom);
        left += w;
    }
    blocks
}

/// One measured strip of the nostril window.
#[derive(Clone, Debug, Serialize)]
pub struct Block {
    pub index: usize,
    pub thermal: Rect<Thermal>,
    pub visual: Rect<Visual>,
    pub stats: Stats,
}

impl Block {
    /// Mean Kelvin of the block; `None` if it covered no pixels.
    pub fn mean(&self) -> Option<f64> {
        self.stats.mean()
    }

    pub fn variance(&self) -> Option<f64> {
        self.stats.variance()
    }
}

/// Statistics of the thermal samples inside `rect`, clamped to
/// the sampler's bounds.
pub fn measure<T: ThermalSampler + ?Sized>(sampler: &T, rect: &Rect<Thermal>) -> Stats {
    let (width, height) = sampler.dimensions();
    let rect = rect.clamp_to(width, height);
    let mut stats = Stats::default();
    if !rect.is_empty() {
        sampler.accumulate(&rect, &mut stats);
    }
    stats
}

/// Partition a thermal region and measure every block.
pub fn measure_blocks<T>(sampler: &T, region: &Rect<Thermal>, parallel: bool) -> Vec<Block>
where
    T: ThermalSampler + Sync + ?Sized,
{
    let rects = partition(region);
    let build = |(index, thermal): (usize, &Rect<Thermal>)| Block {
        index,
        thermal: *thermal,
        visual: thermal.map(),
        stats: measure(sampler, thermal),
    };

    if parallel {
        rects[..].par_iter().enumerate().map(build).collect()
    } else {
        rects[..].iter().enumerate().map(build).collect()
    }
}

/// Index of the block with the strictly greatest variance,
/// scanning left to right so ties keep the earlier block.
/// Blocks without samples, or with a non-finite variance
/// (a NaN or infinite pixel), never win.
pub fn select(blocks: &[Block]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for block in blocks {
        let variance = match block.variance() {
            Some(v) if v.is_finite() => v,
            _ => continue,
        };
        match best {
            Some((_, best_var)) if !(variance > best_var) => {}
            _ => best = Some((block.index, variance)),
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn widths<S: Space>(blocks: &[Rect<S>]) -> Vec<i32> {
        blocks.iter().map(|b| b.width()).collect()
    }

    fn block(index: usize, values: &[f64]) -> Block {
        Block {
            index,
            thermal: Rect::new(0, 0, 1, 1),
            visual: Rect::new(0, 0, 2, 2),
            stats: values.iter().copied().collect(),
        }
    }

    #[test]
    fn remainder_goes_to_last_block() {
        let region: Rect<Thermal> = Rect::new(30, 5, 40, 9);
        let blocks = partition(&region);
        assert_eq!(widths(&blocks), vec![2, 2, 2, 4]);
        assert_eq!(blocks[0].left, 30);
        assert_eq!(blocks[3].right, 40);
    }

    #[test]
    fn blocks_tile_region() {
        for width in 0..40 {
            let region: Rect<Thermal> = Rect::new(7, 3, 7 + width, 12);
            let blocks = partition(&region);
            assert_eq!(widths(&blocks).iter().sum::<i32>(), width);
            assert_eq!(blocks[0].left, region.left);
            assert_eq!(blocks[BLOCK_COUNT - 1].right, region.right);
            for pair in blocks.windows(2) {
                assert_eq!(pair[0].right, pair[1].left);
            }
            for b in blocks.iter() {
                assert_eq!((b.top, b.bottom), (region.top, region.bottom));
                assert!(b.width() >= 0);
            }
        }
    }

    #[test]
    fn select_picks_first_maximum() {
        let blocks = vec![
            block(0, &[1., 1.]),
            block(1, &[0., 2.]),
            block(2, &[2., 0.]),
            block(3, &[1., 2.]),
        ];
        assert_eq!(select(&blocks), Some(1));
    }

    #[test]
    fn select_skips_empty_blocks() {
        let blocks = vec![block(0, &[]), block(1, &[]), block(2, &[5.]), block(3, &[])];
        assert_eq!(select(&blocks), Some(2));
        assert_eq!(select(&[block(0, &[]), block(1, &[])]), None);
    }

    #[test]
    fn select_skips_non_finite_variance() {
        // 40 columns -> blocks of 10; a NaN pixel in block 0 and
        // a hot edge in block 2
        let grid = Array2::from_shape_fn((10, 40), |(row, col)| match (row, col) {
            (3, 4) => f64::NAN,
            (_, c) if (25..30).contains(&c) => 310.,
            _ => 305.,
        });
        let blocks = measure_blocks(&grid, &Rect::new(0, 0, 40, 10), false);
        assert!(blocks[0].variance().map_or(false, f64::is_nan));
        assert_eq!(select(&blocks), Some(2));

        let flat = Array2::from_elem((10, 40), f64::NAN);
        let blocks = measure_blocks(&flat, &Rect::new(0, 0, 40, 10), false);
        assert_eq!(select(&blocks), None);
    }

    #[test]
    fn select_all_equal_keeps_first() {
        let blocks: Vec<_> = (0..4).map(|i| block(i, &[300., 300.])).collect();
        assert_eq!(select(&blocks), Some(0));
    }

    #[test]
    fn measure_blocks_parallel_matches_serial() {
        let grid = Array2::from_shape_fn((40, 60), |(r, c)| 300. + ((r * 7 + c * 13) % 11) as f64 * 0.25);
        let region = Rect::new(5, 4, 38, 20);

        let serial = measure_blocks(&grid, &region, false);
        let parallel = measure_blocks(&grid, &region, true);
        assert_eq!(serial.len(), BLOCK_COUNT);
        for (a, b) in serial.iter().zip(parallel.iter()) {
            assert_eq!(a.index, b.index);
            assert_eq!(a.thermal, b.thermal);
            assert_eq!(a.stats, b.stats);
        }
        assert_eq!(serial[0].visual, Rect::new(10, 8, 26, 40));
        assert_eq!(serial[3].stats.count(), (38 - 29) * 16);
    }

    #[test]
    fn block_statistics_bounds() {
        let grid = Array2::from_shape_fn((20, 20), |(r, c)| 290. + (r * c) as f64 * 0.1);
        for b in measure_blocks(&grid, &Rect::new(0, 0, 20, 20), false) {
            let mean = b.mean().unwrap();
            assert!(b.variance().unwrap() >= 0.);
            assert!(mean >= b.stats.min().unwrap() - 1e-9);
            assert!(mean <= b.stats.max().unwrap() + 1e-9);
        }
    }

    #[test]
    fn measure_clamps_out_of_bounds() {
        let grid = Array2::from_elem((4, 4), 305.);
        let stats = measure(&grid, &Rect::new(2, 2, 50, 50));
        assert_eq!(stats.count(), 4);
        assert!(measure(&grid, &Rect::new(10, 10, 20, 20)).is_empty());
    }
}
