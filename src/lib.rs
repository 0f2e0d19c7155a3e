//! Estimate nostril-region temperature from paired visual and
//! thermal frames.
//!
//! A thermal camera such as the FLIR ONE delivers a visual
//! photo and a radiometric frame at half its linear resolution.
//! Given a face detected on the (cropped) visual canvas, this
//! crate:
//!
//! 1. [locates](locate::locate_nostril) a nostril window below
//! the nose-base landmark,
//! 2. [maps](geometry::Rect::map) it into thermal pixels and
//! [splits](blocks::partition) it into four vertical blocks,
//! 3. computes per-block [statistics](stats::Stats) and
//! [selects](blocks::select) the block with the highest
//! variance (a breathing nostril shows as a sharp thermal
//! edge),
//! 4. converts that block's mean from Kelvin to
//! [Celsius](temperature::kelvin_to_celsius) and appends it to
//! a per-session [history](history::HistoryBuffer).
//!
//! # Usage
//!
//! Camera access and face detection stay outside the crate;
//! they plug in through [`FaceDetector`] and the sampler
//! traits in [`frame`].
//!
//! ```rust
//! # fn test_compile() -> anyhow::Result<()> {
//! use nasal_thermal::{FramePair, NostrilPipeline, PipelineConfig};
//! use nasal_thermal::pipeline::NoOverlay;
//! use nasal_thermal::face::DetectedFace;
//! use image::RgbImage;
//! use ndarray::Array2;
//!
//! let mut pipeline = NostrilPipeline::new(PipelineConfig::default());
//! let frame = FramePair::new(
//!     RgbImage::new(1080, 1440),
//!     Array2::from_elem((720, 540), 306.0),
//! )?;
//! let mut detector = |_canvas: &RgbImage| -> Option<DetectedFace> { None };
//! let outcome = pipeline.process_frame(&frame, &mut detector, &mut NoOverlay);
//! println!("{:.2} °C", outcome.celsius());
//!
//! let history = pipeline.end_session();
//! # Ok(())
//! # }
//! ```
//!
//! Recorded sessions (thermal rasters plus detections) can be
//! replayed offline with [`session::replay_path`] or the
//! `nostril-replay` binary.

pub mod geometry;
pub mod stats;
pub mod temperature;

pub mod config;
pub mod face;
pub mod frame;

pub mod blocks;
pub mod history;
pub mod locate;
pub mod pipeline;

pub mod session;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::config::PipelineConfig;
pub use crate::face::{DetectedFace, FaceDetector};
pub use crate::frame::FramePair;
pub use crate::history::HistoryBuffer;
pub use crate::pipeline::{FrameOutcome, NostrilPipeline, SharedPipeline};
