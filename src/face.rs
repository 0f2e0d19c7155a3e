//! Face detections supplied by an external detector.
//!
//! The pipeline only reads detections; producing them is the
//! job of a [`FaceDetector`] implementation (a vendor library,
//! a model, or a recording).

use std::str::FromStr;

use image::RgbImage;
use inflector::Inflector;
use serde_derive::*;

use crate::geometry::{Point, Rect, Visual};

/// Named facial reference points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKind {
    BottomMouth,
    LeftCheek,
    LeftEarTip,
    LeftEar,
    LeftEye,
    LeftMouth,
    NoseBase,
    RightCheek,
    RightEarTip,
    RightEar,
    RightEye,
    RightMouth,
}

impl FromStr for LandmarkKind {
    type Err = UnknownLandmark;

    /// Accepts any case convention: `NOSE_BASE`, `noseBase`,
    /// `nose-base` and `nose_base` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use LandmarkKind::*;
        Ok(match s.to_snake_case().as_str() {
            "bottom_mouth" => BottomMouth,
            "left_cheek" => LeftCheek,
            "left_ear_tip" => LeftEarTip,
            "left_ear" => LeftEar,
            "left_eye" => LeftEye,
            "left_mouth" => LeftMouth,
            "nose_base" => NoseBase,
            "right_cheek" => RightCheek,
            "right_ear_tip" => RightEarTip,
            "right_ear" => RightEar,
            "right_eye" => RightEye,
            "right_mouth" => RightMouth,
            _ => return Err(UnknownLandmark(s.into())),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown landmark `{0}`")]
pub struct UnknownLandmark(pub String);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    #[serde(rename = "type", deserialize_with = "serde_helpers::landmark_kind")]
    pub kind: LandmarkKind,
    pub x: f32,
    pub y: f32,
}

/// A face in visual canvas coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

impl DetectedFace {
    /// Corners `(x1, y1, x2, y2)` of the bounding box.
    pub fn corners(&self) -> (f32, f32, f32, f32) {
        (self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// First landmark of the given kind.
    pub fn landmark(&self, kind: LandmarkKind) -> Option<&Landmark> {
        self.landmarks.iter().find(|l| l.kind == kind)
    }

    pub fn nose_base(&self) -> Option<Point<Visual>> {
        self.landmark(LandmarkKind::NoseBase)
            .map(|l| Point::new(l.x as i32, l.y as i32))
    }

    pub fn bounding_rect(&self) -> Rect<Visual> {
        let (x1, y1, x2, y2) = self.corners();
        Rect::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }
}

/// Capability: find the prominent face on a visual canvas.
pub trait FaceDetector {
    fn detect(&mut self, canvas: &RgbImage) -> Option<DetectedFace>;
}

impl<F> FaceDetector for F
where
    F: FnMut(&RgbImage) -> Option<DetectedFace>,
{
    fn detect(&mut self, canvas: &RgbImage) -> Option<DetectedFace> {
        self(canvas)
    }
}

mod serde_helpers {
    use serde::*;

    use super::LandmarkKind;

    pub fn landmark_kind<'de, D>(de: D) -> Result<LandmarkKind, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        let str_rep = <String as Deserialize>::deserialize(de)?;
        str_rep.parse().map_err(Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landmark_names_in_any_case() {
        for name in &["NOSE_BASE", "noseBase", "nose-base", "nose_base", "NoseBase"] {
            assert_eq!(name.parse::<LandmarkKind>(), Ok(LandmarkKind::NoseBase));
        }
        assert_eq!(
            "LEFT_EAR_TIP".parse::<LandmarkKind>(),
            Ok(LandmarkKind::LeftEarTip)
        );
        assert!("third_eye".parse::<LandmarkKind>().is_err());
    }

    #[test]
    fn deserialize_face() -> anyhow::Result<()> {
        let face: DetectedFace = serde_json::from_str(
            r#"{
                "x": 100.5, "y": 90, "width": 200, "height": 240,
                "landmarks": [
                    {"type": "LEFT_EYE", "x": 150, "y": 160},
                    {"type": "NOSE_BASE", "x": 201.7, "y": 215.2}
                ]
            }"#,
        )?;
        assert_eq!(face.corners(), (100.5, 90., 300.5, 330.));
        let nose = face.nose_base().expect("nose base");
        assert_eq!((nose.x, nose.y), (201, 215));
        assert_eq!(face.bounding_rect(), Rect::new(100, 90, 300, 330));
        Ok(())
    }

    #[test]
    fn missing_nose_base() {
        let face = DetectedFace {
            x: 0.,
            y: 0.,
            width: 10.,
            height: 10.,
            landmarks: vec![Landmark {
                kind: LandmarkKind::RightEye,
                x: 3.,
                y: 3.,
            }],
        };
        assert!(face.nose_base().is_none());
    }
}
