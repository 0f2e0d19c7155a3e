//! The per-frame nostril temperature pipeline.
//!
//! One [`NostrilPipeline`] lives for one capture session. Each
//! frame runs synchronously to completion:
//!
//! 1. crop the visual frame to the canvas and detect a face
//!    (skipped when the detection is supplied directly),
//! 2. [locate](crate::locate::locate_nostril) the nostril window
//!    below the nose-base landmark,
//! 3. map it to thermal space, [partition](crate::blocks::partition)
//!    it and [measure](crate::blocks::measure_blocks) each block,
//! 4. [select](crate::blocks::select) the highest-variance block
//!    and convert its mean to Celsius,
//! 5. append the reading (or a sentinel) to the history.
//!
//! Nothing here fails: frames that cannot be measured come back
//! as [`FrameOutcome::Skipped`] and leave a sentinel behind.

use std::sync::Arc;

use log::{debug, trace, warn};
use parking_lot::Mutex;
use serde_derive::*;

use crate::{
    blocks::{self, Block},
    config::PipelineConfig,
    face::{DetectedFace, FaceDetector},
    frame::{FramePair, ThermalSampler, VisualSource},
    geometry::{Rect, Thermal, Visual},
    history::{HistoryBuffer, SENTINEL},
    locate,
    temperature::kelvin_to_celsius,
};

/// Shapes handed to an [`Overlay`] while a frame is processed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    Face {
        visual: Rect<Visual>,
        thermal: Rect<Thermal>,
    },
    Nostril {
        visual: Rect<Visual>,
        thermal: Rect<Thermal>,
    },
    Block {
        index: usize,
        visual: Rect<Visual>,
        thermal: Rect<Thermal>,
        selected: bool,
    },
}

/// Capability: render pipeline geometry somewhere.
pub trait Overlay {
    fn draw(&mut self, shape: Shape);
}

impl<F: FnMut(Shape)> Overlay for F {
    fn draw(&mut self, shape: Shape) {
        self(shape)
    }
}

/// Overlay that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOverlay;

impl Overlay for NoOverlay {
    fn draw(&mut self, _: Shape) {}
}

/// Why a frame produced a sentinel instead of a reading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Skip {
    NoFace,
    NoNoseBase,
    DegenerateRegion,
    NoSamples,
}

#[derive(Clone, Debug, Serialize)]
pub struct Reading {
    pub celsius: f64,
    pub kelvin: f64,
    pub selected: usize,
    pub nostril: Rect<Visual>,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameOutcome {
    Measured(Reading),
    Skipped(Skip),
}

impl FrameOutcome {
    /// Value recorded in the history for this frame.
    pub fn celsius(&self) -> f64 {
        match self {
            FrameOutcome::Measured(r) => r.celsius,
            FrameOutcome::Skipped(_) => SENTINEL,
        }
    }

    pub fn reading(&self) -> Option<&Reading> {
        match self {
            FrameOutcome::Measured(r) => Some(r),
            FrameOutcome::Skipped(_) => None,
        }
    }

    pub fn skip(&self) -> Option<Skip> {
        match self {
            FrameOutcome::Measured(_) => None,
            FrameOutcome::Skipped(s) => Some(*s),
        }
    }
}

pub struct NostrilPipeline {
    config: PipelineConfig,
    history: HistoryBuffer,
    frames: u64,
}

impl Default for NostrilPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl NostrilPipeline {
    /// Start a capture session.
    pub fn new(config: PipelineConfig) -> Self {
        let history = HistoryBuffer::with_capacity(config.history_capacity);
        NostrilPipeline {
            config,
            history,
            frames: 0,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Frames processed since the session started.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// End the capture session: hand back the history and
    /// leave the pipeline empty for the next one.
    pub fn end_session(&mut self) -> HistoryBuffer {
        let capacity = self.history.capacity();
        self.frames = 0;
        std::mem::replace(&mut self.history, HistoryBuffer::with_capacity(capacity))
    }

    /// Full pass over a live frame pair: crop the canvas, run
    /// the detector on it, then measure.
    pub fn process_frame<D, O>(
        &mut self,
        frame: &FramePair,
        detector: &mut D,
        overlay: &mut O,
    ) -> FrameOutcome
    where
        D: FaceDetector + ?Sized,
        O: Overlay + ?Sized,
    {
        let canvas = match &self.config.canvas {
            Some(crop) => frame.region(&crop.rect()),
            None => frame.visual().clone(),
        };
        let face = if canvas.width() == 0 || canvas.height() == 0 {
            warn!("canvas crop lies outside the {:?} visual frame", frame.visual().dimensions());
            None
        } else {
            detector.detect(&canvas)
        };
        self.process_detection(frame, canvas.dimensions(), face.as_ref(), overlay)
    }

    /// Measure a frame given its detection (or lack of one).
    ///
    /// `canvas` is the size of the visual canvas the detection
    /// coordinates refer to.
    pub fn process_detection<T, O>(
        &mut self,
        thermal: &T,
        canvas: (u32, u32),
        face: Option<&DetectedFace>,
        overlay: &mut O,
    ) -> FrameOutcome
    where
        T: ThermalSampler + Sync + ?Sized,
        O: Overlay + ?Sized,
    {
        self.frames += 1;
        let outcome = match face {
            None => FrameOutcome::Skipped(Skip::NoFace),
            Some(face) => self.measure(thermal, canvas, face, overlay),
        };

        match &outcome {
            FrameOutcome::Measured(r) => {
                debug!(
                    "frame {}: {:.2} °C from block {} of {:?}",
                    self.frames, r.celsius, r.selected, r.nostril
                );
                self.history.record(Some(r.celsius));
            }
            FrameOutcome::Skipped(skip) => {
                debug!("frame {}: skipped ({:?})", self.frames, skip);
                self.history.record(None);
            }
        }
        outcome
    }

    fn measure<T, O>(
        &self,
        thermal: &T,
        canvas: (u32, u32),
        face: &DetectedFace,
        overlay: &mut O,
    ) -> FrameOutcome
    where
        T: ThermalSampler + Sync + ?Sized,
        O: Overlay + ?Sized,
    {
        let (x1, y1, x2, y2) = locate::clamp_face(face, canvas);
        let face_box: Rect<Visual> = Rect::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32);
        overlay.draw(Shape::Face {
            visual: face_box,
            thermal: face_box.map(),
        });

        let nose = match face.nose_base() {
            Some(p) => p,
            None => return FrameOutcome::Skipped(Skip::NoNoseBase),
        };

        let nostril = locate::locate_nostril(face, nose, canvas, &self.config.nostril);
        let region: Rect<Thermal> = nostril.map();
        if nostril.is_empty() || region.is_empty() {
            warn!(
                "degenerate nostril region {:?} (thermal {:?}) for face {:?}",
                nostril,
                region,
                face.bounding_rect()
            );
            return FrameOutcome::Skipped(Skip::DegenerateRegion);
        }
        overlay.draw(Shape::Nostril {
            visual: nostril,
            thermal: region,
        });

        let blocks = blocks::measure_blocks(thermal, &region, self.config.parallel_blocks);
        for b in &blocks {
            trace!(
                "block {} {:?}: n={} mean={:?} var={:?}",
                b.index,
                b.thermal,
                b.stats.count(),
                b.mean(),
                b.variance()
            );
        }

        let selected = blocks::select(&blocks);
        for b in &blocks {
            overlay.draw(Shape::Block {
                index: b.index,
                visual: b.visual,
                thermal: b.thermal,
                selected: Some(b.index) == selected,
            });
        }

        let (selected, kelvin) = match selected.and_then(|i| blocks[i].mean().map(|m| (i, m))) {
            Some(found) => found,
            None => {
                warn!("no thermal samples under nostril region {:?}", region);
                return FrameOutcome::Skipped(Skip::NoSamples);
            }
        };

        FrameOutcome::Measured(Reading {
            celsius: kelvin_to_celsius(kelvin),
            kelvin,
            selected,
            nostril,
            blocks,
        })
    }
}

/// A pipeline that can be fed from several delivery threads.
/// Each frame holds the lock for its whole pass, so history
/// insertion order matches completion order.
#[derive(Clone, Default)]
pub struct SharedPipeline {
    inner: Arc<Mutex<NostrilPipeline>>,
}

impl SharedPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        SharedPipeline {
            inner: Arc::new(Mutex::new(NostrilPipeline::new(config))),
        }
    }

    pub fn process_frame<D, O>(
        &self,
        frame: &FramePair,
        detector: &mut D,
        overlay: &mut O,
    ) -> FrameOutcome
    where
        D: FaceDetector + ?Sized,
        O: Overlay + ?Sized,
    {
        self.inner.lock().process_frame(frame, detector, overlay)
    }

    pub fn process_detection<T, O>(
        &self,
        thermal: &T,
        canvas: (u32, u32),
        face: Option<&DetectedFace>,
        overlay: &mut O,
    ) -> FrameOutcome
    where
        T: ThermalSampler + Sync + ?Sized,
        O: Overlay + ?Sized,
    {
        self.inner
            .lock()
            .process_detection(thermal, canvas, face, overlay)
    }

    /// Copy of the history so far.
    pub fn history(&self) -> HistoryBuffer {
        self.inner.lock().history().clone()
    }

    pub fn end_session(&self) -> HistoryBuffer {
        self.inner.lock().end_session()
    }
}
