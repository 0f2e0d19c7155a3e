//! Locate the nostril window on a detected face.

use crate::{
    config::NostrilGeometry,
    face::DetectedFace,
    geometry::{Point, Rect, Visual},
};

/// Face box clamped to `[1, canvas]` on each axis, as
/// `(x1, y1, x2, y2)`.
pub fn clamp_face(face: &DetectedFace, canvas: (u32, u32)) -> (f32, f32, f32, f32) {
    let (width, height) = (canvas.0 as f32, canvas.1 as f32);
    let clamp = |v: f32, hi: f32| v.max(1.).min(hi);
    let (x1, y1, x2, y2) = face.corners();
    (
        clamp(x1, width),
        clamp(y1, height),
        clamp(x2, width),
        clamp(y2, height),
    )
}

/// Nostril candidate below the nose base, in visual canvas
/// coordinates.
///
/// The window is centred horizontally on the landmark and
/// hangs down from it; left, right and bottom are kept inside
/// the (clamped) face box. The result may be empty or inverted
/// for very small faces; callers must check
/// [`Rect::is_empty`] before sampling.
pub fn locate_nostril(
    face: &DetectedFace,
    nose_base: Point<Visual>,
    canvas: (u32, u32),
    geometry: &NostrilGeometry,
) -> Rect<Visual> {
    let (x1, _, x2, y2) = clamp_face(face, canvas);
    let scale_width = geometry.scale_width(canvas.0 as f32);
    let scale_height = geometry.scale_height(canvas.1 as f32);

    let (cx, cy) = (nose_base.x as f32, nose_base.y as f32);
    let left = (cx - scale_width + geometry.width_inset).max(x1);
    let right = (cx + scale_width - geometry.width_inset).min(x2);
    let bottom = (cy + scale_height - geometry.height_inset).min(y2);

    Rect::new(left as i32, cy as i32, right as i32, bottom as i32)
}
