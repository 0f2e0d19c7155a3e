//! Pipeline configuration.
//!
//! Every field has a default matching the FLIR ONE capture
//! setup, so a config file only needs the values it changes:
//!
//! ```json
//! { "history_capacity": 120, "parallel_blocks": true }
//! ```

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{ensure, Context, Result};
use serde_derive::*;

use crate::geometry::{Rect, Visual};

pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Measured samples per counter cycle of the history.
    pub history_capacity: usize,

    /// Part of the visual frame handed to face detection.
    /// Region coordinates are relative to this canvas.
    pub canvas: Option<CanvasCrop>,

    pub nostril: NostrilGeometry,

    /// Compute block statistics on the rayon pool.
    pub parallel_blocks: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            canvas: Some(CanvasCrop::default()),
            nostril: NostrilGeometry::default(),
            parallel_blocks: false,
        }
    }
}

impl PipelineConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.history_capacity > 0, "history_capacity must be positive");
        if let Some(crop) = &self.canvas {
            ensure!(
                crop.width > 0 && crop.height > 0,
                "canvas crop must have a positive size"
            );
        }
        self.nostril.validate()
    }

    /// Canvas size used when a frame does not carry one.
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        self.canvas.as_ref().map(|c| (c.width, c.height))
    }
}

/// Crop of the visual frame, in visual frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasCrop {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasCrop {
    fn default() -> Self {
        CanvasCrop {
            x: 65,
            y: 160,
            width: 960,
            height: 1280,
        }
    }
}

impl CanvasCrop {
    pub fn rect(&self) -> Rect<Visual> {
        Rect::from_origin_size(
            self.x as i32,
            self.y as i32,
            self.width as i32,
            self.height as i32,
        )
    }
}

/// Shape of the nostril window around the nose-base landmark.
///
/// Half-width is `canvas_width * width_numerator / width_denominator / 2`
/// shrunk by `width_inset` on each side; height is
/// `canvas_height / height_divisor - height_inset` below the
/// landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NostrilGeometry {
    pub width_numerator: f32,
    pub width_denominator: f32,
    pub width_inset: f32,
    pub height_divisor: f32,
    pub height_inset: f32,
}

impl Default for NostrilGeometry {
    fn default() -> Self {
        NostrilGeometry {
            width_numerator: 4.,
            width_denominator: 11.,
            width_inset: 60.,
            height_divisor: 8.,
            height_inset: 80.,
        }
    }
}

impl NostrilGeometry {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.width_denominator != 0. && self.height_divisor != 0.,
            "nostril geometry divisors must be non-zero"
        );
        Ok(())
    }

    pub fn scale_width(&self, canvas_width: f32) -> f32 {
        (self.width_numerator * canvas_width / self.width_denominator) / 2.
    }

    pub fn scale_height(&self, canvas_height: f32) -> f32 {
        canvas_height / self.height_divisor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() -> Result<()> {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "history_capacity": 50, "nostril": { "width_inset": 40 } }"#)?;
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.canvas, Some(CanvasCrop::default()));
        assert_eq!(config.nostril.width_inset, 40.);
        assert_eq!(config.nostril.height_inset, 80.);
        assert!(!config.parallel_blocks);
        config.validate()
    }

    #[test]
    fn null_canvas_disables_crop() -> Result<()> {
        let config: PipelineConfig = serde_json::from_str(r#"{ "canvas": null }"#)?;
        assert_eq!(config.canvas, None);
        assert_eq!(config.canvas_size(), None);
        Ok(())
    }

    #[test]
    fn rejects_zero_capacity() {
        let config = PipelineConfig {
            history_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_scale_factors() {
        let geometry = NostrilGeometry::default();
        assert!((geometry.scale_width(960.) - 174.545_45).abs() < 1e-3);
        assert_eq!(geometry.scale_height(1280.), 160.);
    }
}
