//! Pixel-space geometry shared by the pipeline stages.
//!
//! Every [`Point`] and [`Rect`] is tagged with the coordinate
//! space it lives in ([`Visual`] or [`Thermal`]), so a visual
//! rectangle can never be handed to the thermal sampler by
//! accident. Moving between spaces goes through
//! [`Rect::map`] / [`Point::map`], which apply the fixed
//! sensor scale with integer truncation toward zero.

use std::{fmt::Debug, marker::PhantomData};

use serde_derive::*;

/// A pixel coordinate space.
///
/// `DOWNSCALE` is the number of visual pixels per pixel of
/// this space along each axis.
pub trait Space: Copy + Debug + Default + PartialEq + Eq {
    const DOWNSCALE: i32;
    const NAME: &'static str;
}

/// Visual (color) canvas coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Visual;

/// Thermal frame coordinates: half the linear resolution of
/// the visual frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Thermal;

impl Space for Visual {
    const DOWNSCALE: i32 = 1;
    const NAME: &'static str = "visual";
}

impl Space for Thermal {
    const DOWNSCALE: i32 = 2;
    const NAME: &'static str = "thermal";
}

#[inline]
fn rescale<From: Space, To: Space>(v: i32) -> i32 {
    v * From::DOWNSCALE / To::DOWNSCALE
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Point<S: Space> {
    pub x: i32,
    pub y: i32,
    #[serde(skip)]
    space: PhantomData<S>,
}

impl<S: Space> Point<S> {
    pub fn new(x: i32, y: i32) -> Self {
        Point {
            x,
            y,
            space: PhantomData,
        }
    }

    pub fn map<T: Space>(self) -> Point<T> {
        Point::new(rescale::<S, T>(self.x), rescale::<S, T>(self.y))
    }
}

/// Axis-aligned rectangle with half-open extents: it covers
/// columns `left..right` and rows `top..bottom`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Rect<S: Space> {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    #[serde(skip)]
    space: PhantomData<S>,
}

impl<S: Space> Rect<S> {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Rect {
            left,
            top,
            right,
            bottom,
            space: PhantomData,
        }
    }

    pub fn from_origin_size(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    /// Width in pixels; zero when `right <= left`.
    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    /// Height in pixels; zero when `bottom <= top`.
    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn contains(&self, other: &Rect<S>) -> bool {
        other.left >= self.left
            && other.right <= self.right
            && other.top >= self.top
            && other.bottom <= self.bottom
    }

    /// Convert to another space, truncating toward zero.
    ///
    /// Out-of-bounds results are left as-is; clamp with
    /// [`Rect::clamp_to`] before touching a buffer.
    pub fn map<T: Space>(self) -> Rect<T> {
        Rect::new(
            rescale::<S, T>(self.left),
            rescale::<S, T>(self.top),
            rescale::<S, T>(self.right),
            rescale::<S, T>(self.bottom),
        )
    }

    /// Clamp to the bounds of a `width x height` buffer so the
    /// result can be used as a slice range.
    pub fn clamp_to(&self, width: usize, height: usize) -> Rect<S> {
        let clamp = |v: i32, hi: usize| v.max(0).min(hi.min(i32::MAX as usize) as i32);
        let left = clamp(self.left, width);
        let top = clamp(self.top, height);
        Rect::new(
            left,
            top,
            clamp(self.right, width).max(left),
            clamp(self.bottom, height).max(top),
        )
    }
}
