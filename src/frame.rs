//! Paired visual / thermal frames and the accessors the
//! pipeline reads them through.

use image::{imageops, RgbImage};
use ndarray::{s, Array2};
use thiserror::Error;

use crate::{
    geometry::{Rect, Thermal, Visual},
    stats::Stats,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("thermal frame is {thermal:?} but the {visual:?} visual frame needs {expected:?}")]
    DimensionMismatch {
        visual: (usize, usize),
        thermal: (usize, usize),
        expected: (usize, usize),
    },

    #[error("empty {0} frame")]
    Empty(&'static str),
}

/// Capability: Kelvin readings for a thermal pixel rectangle.
///
/// Implementations must tolerate rectangles that extend past
/// [`dimensions`](ThermalSampler::dimensions) and only return
/// the covered pixels.
pub trait ThermalSampler {
    /// `(width, height)` of the thermal buffer.
    fn dimensions(&self) -> (usize, usize);

    /// Kelvin values covered by `rect`, row by row.
    fn values(&self, rect: &Rect<Thermal>) -> Vec<f64>;

    /// Fold every value covered by `rect` into `stats`.
    fn accumulate(&self, rect: &Rect<Thermal>, stats: &mut Stats) {
        for v in self.values(rect) {
            *stats += v;
        }
    }
}

/// Thermal grid stored row-major as `(height, width)` Kelvin.
impl ThermalSampler for Array2<f64> {
    fn dimensions(&self) -> (usize, usize) {
        let (ht, wid) = self.dim();
        (wid, ht)
    }

    fn accumulate(&self, rect: &Rect<Thermal>, stats: &mut Stats) {
        let (wid, ht) = ThermalSampler::dimensions(self);
        let rect = rect.clamp_to(wid, ht);
        if rect.is_empty() {
            return;
        }
        let view = self.slice(s![
            rect.top as usize..rect.bottom as usize,
            rect.left as usize..rect.right as usize
        ]);
        for &v in view.iter() {
            *stats += v;
        }
    }

    fn values(&self, rect: &Rect<Thermal>) -> Vec<f64> {
        let (wid, ht) = ThermalSampler::dimensions(self);
        let rect = rect.clamp_to(wid, ht);
        if rect.is_empty() {
            return vec![];
        }
        self.slice(s![
            rect.top as usize..rect.bottom as usize,
            rect.left as usize..rect.right as usize
        ])
        .iter()
        .copied()
        .collect()
    }
}

/// Capability: read a rectangle of the visual frame.
pub trait VisualSource {
    fn dimensions(&self) -> (usize, usize);

    /// Copy out `rect`, clamped to the frame.
    fn region(&self, rect: &Rect<Visual>) -> RgbImage;
}

impl VisualSource for RgbImage {
    fn dimensions(&self) -> (usize, usize) {
        (self.width() as usize, self.height() as usize)
    }

    fn region(&self, rect: &Rect<Visual>) -> RgbImage {
        let (wid, ht) = VisualSource::dimensions(self);
        let rect = rect.clamp_to(wid, ht);
        imageops::crop_imm(
            self,
            rect.left as u32,
            rect.top as u32,
            rect.width() as u32,
            rect.height() as u32,
        )
        .to_image()
    }
}

/// A visual frame and the thermal frame captured with it.
pub struct FramePair {
    visual: RgbImage,
    thermal: Array2<f64>,
}

impl FramePair {
    /// Pair two buffers; the thermal grid must be exactly half
    /// the visual size (truncated) on both axes.
    pub fn new(visual: RgbImage, thermal: Array2<f64>) -> Result<Self, FrameError> {
        let visual_dim = VisualSource::dimensions(&visual);
        let thermal_dim = ThermalSampler::dimensions(&thermal);
        if visual_dim.0 == 0 || visual_dim.1 == 0 {
            return Err(FrameError::Empty("visual"));
        }
        if thermal_dim.0 == 0 || thermal_dim.1 == 0 {
            return Err(FrameError::Empty("thermal"));
        }

        let expected = (visual_dim.0 / 2, visual_dim.1 / 2);
        if thermal_dim != expected {
            return Err(FrameError::DimensionMismatch {
                visual: visual_dim,
                thermal: thermal_dim,
                expected,
            });
        }
        Ok(FramePair { visual, thermal })
    }

    pub fn visual(&self) -> &RgbImage {
        &self.visual
    }

    pub fn thermal(&self) -> &Array2<f64> {
        &self.thermal
    }
}

impl ThermalSampler for FramePair {
    fn dimensions(&self) -> (usize, usize) {
        ThermalSampler::dimensions(&self.thermal)
    }

    fn accumulate(&self, rect: &Rect<Thermal>, stats: &mut Stats) {
        self.thermal.accumulate(rect, stats)
    }

    fn values(&self, rect: &Rect<Thermal>) -> Vec<f64> {
        self.thermal.values(rect)
    }
}

impl VisualSource for FramePair {
    fn dimensions(&self) -> (usize, usize) {
        VisualSource::dimensions(&self.visual)
    }

    fn region(&self, rect: &Rect<Visual>) -> RgbImage {
        self.visual.region(rect)
    }
}
