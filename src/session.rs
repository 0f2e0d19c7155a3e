//! Recorded capture sessions.
//!
//! A session file is a stream of JSON frame records (either
//! concatenated objects or one per line), each carrying the
//! thermal raster captured for that frame and the face the
//! detector reported on the visual canvas:
//!
//! ```json
//! {"frame": 0, "canvas": [960, 1280],
//!  "thermal": {"width": 480, "height": 640, "kelvin": [305.1, ...]},
//!  "face": {"x": 310, "y": 402, "width": 380, "height": 420,
//!           "landmarks": [{"type": "NOSE_BASE", "x": 498, "y": 610}]}}
//! {"frame": 1, "thermal": {"tiff": "base64:SUkqAA...", "scale": 0.01}, "face": null}
//! ```
//!
//! TIFF rasters hold 8- or 16-bit counts; `scale` converts a
//! count to Kelvin (default: centi-Kelvin).

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use anyhow::{bail, Context, Result};
use image::{DynamicImage, GenericImageView};
use itertools::Either;
use log::warn;
use ndarray::Array2;
use serde_derive::*;
use serde_json::Deserializer;

use crate::{
    config::PipelineConfig,
    face::DetectedFace,
    pipeline::{NoOverlay, NostrilPipeline},
    stats::Stats,
};

#[derive(Debug, Clone, Deserialize)]
pub struct FrameRecord {
    #[serde(default)]
    pub frame: Option<u64>,

    /// Size of the canvas the face coordinates refer to.
    #[serde(default)]
    pub canvas: Option<(u32, u32)>,

    pub thermal: ThermalRaster,

    #[serde(default)]
    pub face: Option<DetectedFace>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ThermalRaster {
    Kelvin {
        width: usize,
        height: usize,
        kelvin: Vec<f64>,
    },
    Tiff {
        #[serde(deserialize_with = "serde_helpers::base64_bytes")]
        tiff: Vec<u8>,
        #[serde(default = "default_scale")]
        scale: f64,
    },
}

fn default_scale() -> f64 {
    0.01
}

impl ThermalRaster {
    /// Kelvin grid shaped `(height, width)`.
    pub fn to_kelvin(&self) -> Result<Array2<f64>> {
        match self {
            ThermalRaster::Kelvin {
                width,
                height,
                kelvin,
            } => Ok(Array2::from_shape_vec((*height, *width), kelvin.clone())
                .with_context(|| format!("{} values for a {}x{} raster", kelvin.len(), width, height))?),
            ThermalRaster::Tiff { tiff, scale } => {
                let image = image::load_from_memory_with_format(tiff, image::ImageFormat::Tiff)
                    .context("decoding thermal tiff")?;
                let (width, height) = (image.width() as usize, image.height() as usize);
                let counts: Vec<f64> = match image {
                    DynamicImage::ImageLuma16(buf) => {
                        buf.into_raw().into_iter().map(f64::from).collect()
                    }
                    DynamicImage::ImageLuma8(buf) => {
                        buf.into_raw().into_iter().map(f64::from).collect()
                    }
                    other => bail!("unsupported thermal color type: {:?}", other.color()),
                };
                let kelvin = counts.into_iter().map(|c| c * scale).collect();
                Ok(Array2::from_shape_vec((height, width), kelvin)?)
            }
        }
    }
}

/// Lazily read frame records from a JSON stream.
pub fn read_frames<R: Read>(rdr: R) -> impl Iterator<Item = Result<FrameRecord>> {
    Deserializer::from_reader(rdr)
        .into_iter::<FrameRecord>()
        .map(|r| r.context("malformed frame record"))
}

/// Outcome of replaying one session through a fresh pipeline.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub path: String,
    pub frames: u64,
    pub measured: u64,
    pub skipped: u64,
    pub history: Vec<f64>,
    pub stats: Stats,
}

/// Replay every frame of a session. Frames whose thermal
/// raster cannot be decoded count as skipped (and record a
/// sentinel) rather than aborting the session.
pub fn replay<R: Read>(rdr: R, path: String, config: &PipelineConfig) -> Result<SessionReport> {
    let mut pipeline = NostrilPipeline::new(config.clone());
    let (mut measured, mut skipped) = (0, 0);

    for (idx, record) in read_frames(rdr).enumerate() {
        let record = record.with_context(|| format!("{}: record {}", path, idx))?;
        let frame = record.frame.unwrap_or(idx as u64);
        let canvas = match record.canvas.or_else(|| config.canvas_size()) {
            Some(c) => c,
            None => bail!("{}: frame {} has no canvas size and no crop is configured", path, frame),
        };

        let thermal = match record.thermal.to_kelvin() {
            Ok(t) => t,
            Err(e) => {
                warn!("{}: frame {}: {:#}", path, frame, e);
                pipeline.process_detection(&Array2::<f64>::zeros((0, 0)), canvas, None, &mut NoOverlay);
                skipped += 1;
                continue;
            }
        };

        let outcome = pipeline.process_detection(&thermal, canvas, record.face.as_ref(), &mut NoOverlay);
        match outcome.reading() {
            Some(_) => measured += 1,
            None => skipped += 1,
        }
    }

    let frames = pipeline.frames();
    let history = pipeline.end_session();
    Ok(SessionReport {
        path,
        frames,
        measured,
        skipped,
        stats: history.stats(),
        history: history.to_vec(),
    })
}

/// Replay a session file; `-` reads the session from stdin.
pub fn replay_path(path: &Path, config: &PipelineConfig) -> Result<SessionReport> {
    let rdr = if path == Path::new("-") {
        Either::Left(io::stdin())
    } else {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Either::Right(file)
    };
    replay(BufReader::new(rdr), format!("{}", path.display()), config)
}

mod serde_helpers {
    use serde::*;

    pub fn base64_bytes<'de, D>(de: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        let str_rep = <String as Deserialize>::deserialize(de)?;
        let slice = str_rep
            .strip_prefix("base64:")
            .ok_or_else(|| Error::custom("unexpected format: must begin with `base64:`"))?;
        base64::decode(slice).map_err(Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::SENTINEL;
    use image::{codecs::tiff::TiffEncoder, ColorType};
    use std::io::Cursor;

    fn kelvin_record(frame: u64, face: &str) -> String {
        let (width, height) = (160usize, 120usize);
        let kelvin: Vec<&str> = (0..width * height)
            .map(|i| {
                if (110..130).contains(&(i % width)) {
                    "309.15"
                } else {
                    "305.15"
                }
            })
            .collect();
        format!(
            r#"{{"frame": {}, "canvas": [960, 1280], "thermal": {{"width": {}, "height": {}, "kelvin": [{}]}}, "face": {}}}"#,
            frame,
            width,
            height,
            kelvin.join(","),
            face
        )
    }

    const FACE: &str = r#"{"x": 100, "y": 100, "width": 200, "height": 200,
        "landmarks": [{"type": "NOSE_BASE", "x": 200, "y": 150}]}"#;

    fn tiff_base64(width: u32, height: u32, count: u16) -> String {
        let pixels: Vec<u8> = (0..width * height)
            .flat_map(|_| count.to_ne_bytes().to_vec())
            .collect();
        let mut bytes = Cursor::new(Vec::new());
        TiffEncoder::new(&mut bytes)
            .encode(&pixels, width, height, ColorType::L16)
            .expect("encode tiff");
        format!("base64:{}", base64::encode(bytes.get_ref()))
    }

    #[test]
    fn replays_kelvin_frames() -> Result<()> {
        let stream = [
            kelvin_record(0, FACE),
            kelvin_record(1, "null"),
            kelvin_record(2, FACE),
        ]
        .join("\n");

        let report = replay(Cursor::new(stream), "mem".into(), &PipelineConfig::default())?;
        assert_eq!(report.frames, 3);
        assert_eq!(report.measured, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.history.len(), 3);
        assert_eq!(report.history[0], SENTINEL);
        assert_eq!(report.stats.count(), 2);
        // block 2 is 15/25 hot
        let expected = (15. * 36. + 10. * 32.) / 25.;
        assert!((report.history[1] - expected).abs() < 1e-9, "{:?}", report.history);
        Ok(())
    }

    #[test]
    fn decodes_tiff_raster() -> Result<()> {
        let json = format!(r#"{{"tiff": "{}", "scale": 0.01}}"#, tiff_base64(6, 4, 30615));
        let raster: ThermalRaster = serde_json::from_str(&json)?;
        let grid = raster.to_kelvin()?;
        assert_eq!(grid.dim(), (4, 6));
        assert!(grid.iter().all(|&k| (k - 306.15).abs() < 1e-9));
        Ok(())
    }

    #[test]
    fn rejects_missing_base64_prefix() {
        let raster = serde_json::from_str::<ThermalRaster>(r#"{"tiff": "SUkqAA=="}"#);
        assert!(raster.is_err());
    }

    #[test]
    fn bad_raster_records_sentinel() -> Result<()> {
        let stream = r#"{"thermal": {"width": 3, "height": 3, "kelvin": [1, 2]}, "face": null}"#;
        let report = replay(Cursor::new(stream), "bad".into(), &PipelineConfig::default())?;
        assert_eq!(report.frames, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.history, vec![SENTINEL]);
        Ok(())
    }

    #[test]
    fn canvas_falls_back_to_configured_crop() -> Result<()> {
        let stream = r#"{"thermal": {"width": 1, "height": 1, "kelvin": [300]}}"#;
        let mut config = PipelineConfig::default();
        assert!(replay(Cursor::new(stream), "ok".into(), &config).is_ok());

        config.canvas = None;
        assert!(replay(Cursor::new(stream), "no canvas".into(), &config).is_err());
        Ok(())
    }
}
