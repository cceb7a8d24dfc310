//! Core geometry types for page layout
//!
//! All layout math runs in `f32` content units. Helpers here never let a
//! NaN or a negative extent leak into later arithmetic.

use serde::{Deserialize, Serialize};

/// A point in page, content or device space (the caller knows which)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    #[must_use]
    pub fn get(self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }
}

/// Width/height pair
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeF {
    pub width: f32,
    pub height: f32,
}

impl SizeF {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Replace NaN and negative components with zero
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self::new(non_negative(self.width), non_negative(self.height))
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.width * factor, self.height * factor).sanitized()
    }

    #[must_use]
    pub fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }

    #[must_use]
    pub fn get(self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

/// Axis-aligned rectangle; `(x, y)` is the minimum corner
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn from_origin_size(origin: PointF, size: SizeF) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Rectangle spanning two arbitrary corners
    #[must_use]
    pub fn from_corners(a: PointF, b: PointF) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    #[must_use]
    pub fn origin(&self) -> PointF {
        PointF::new(self.x, self.y)
    }

    #[must_use]
    pub fn size(&self) -> SizeF {
        SizeF::new(self.width, self.height)
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        non_negative(self.width) * non_negative(self.height)
    }

    /// Start and end of the rectangle along an axis
    #[must_use]
    pub fn span(&self, axis: Axis) -> (f32, f32) {
        match axis {
            Axis::Horizontal => (self.x, self.right()),
            Axis::Vertical => (self.y, self.bottom()),
        }
    }

    #[must_use]
    pub fn contains(&self, p: PointF) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Overlap with positive area, `None` when the rectangles only touch
    #[must_use]
    pub fn intersection(&self, other: &RectF) -> Option<RectF> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 > x0 && y1 > y0 {
            Some(RectF::new(x0, y0, x1 - x0, y1 - y0))
        } else {
            None
        }
    }

    #[must_use]
    pub fn intersects(&self, other: &RectF) -> bool {
        self.intersection(other).is_some()
    }

    #[must_use]
    pub fn union(&self, other: &RectF) -> RectF {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        RectF::new(x0, y0, x1 - x0, y1 - y0)
    }

    #[must_use]
    pub fn translated(&self, dx: f32, dy: f32) -> RectF {
        RectF::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grow the rectangle outward by the given margins
    #[must_use]
    pub fn inflated(&self, by: Thickness) -> RectF {
        RectF::new(
            self.x - by.left,
            self.y - by.top,
            non_negative(self.width + by.horizontal()),
            non_negative(self.height + by.vertical()),
        )
    }
}

/// Four-sided spacing used for page margins, padding and highlight inflation
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Thickness {
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub top: f32,
    #[serde(default)]
    pub right: f32,
    #[serde(default)]
    pub bottom: f32,
}

impl Thickness {
    #[must_use]
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[must_use]
    pub const fn uniform(v: f32) -> Self {
        Self::new(v, v, v, v)
    }

    /// Negative sides are clamped to zero
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::new(
            non_negative(self.left),
            non_negative(self.top),
            non_negative(self.right),
            non_negative(self.bottom),
        )
    }

    #[must_use]
    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    #[must_use]
    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    /// Leading side on an axis (left or top)
    #[must_use]
    pub fn leading(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.left,
            Axis::Vertical => self.top,
        }
    }

    /// Trailing side on an axis (right or bottom)
    #[must_use]
    pub fn trailing(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.right,
            Axis::Vertical => self.bottom,
        }
    }
}

/// 32-bit ARGB color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0);
    pub const WHITE: Color = Color(0xFFFF_FFFF);

    #[must_use]
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    #[must_use]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    #[must_use]
    pub fn cross(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }
}

/// Layout rectangle of one page in content space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    pub rect: RectF,
    /// True when derived from an actual size query for the current layout,
    /// false for a placeholder carried over from an earlier pass
    pub is_computed: bool,
}

impl PageRect {
    #[must_use]
    pub fn exact(rect: RectF) -> Self {
        Self {
            rect,
            is_computed: true,
        }
    }

    #[must_use]
    pub fn placeholder(rect: RectF) -> Self {
        Self {
            rect,
            is_computed: false,
        }
    }
}

/// Extension trait for Vec operations
pub trait VecExt<T> {
    /// Reset vector to a given length, clearing existing items
    fn reset_to_len(&mut self, len: usize)
    where
        T: Default;
}

impl<T> VecExt<T> for Vec<T> {
    #[inline]
    fn reset_to_len(&mut self, len: usize)
    where
        T: Default,
    {
        self.clear();
        self.resize_with(len, T::default);
    }
}

#[inline]
pub(crate) fn non_negative(v: f32) -> f32 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_size_drops_nan_and_negative() {
        let s = SizeF::new(f32::NAN, -3.0).sanitized();
        assert_eq!(s, SizeF::ZERO);
        assert!(s.is_empty());
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = RectF::new(0.0, 0.0, 10.0, 10.0);
        let b = RectF::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        let c = RectF::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&c), Some(RectF::new(5.0, 5.0, 5.0, 5.0)));
    }

    #[test]
    fn thickness_clamps_negative_sides() {
        let t = Thickness::new(-1.0, 2.0, -0.5, 4.0).clamped();
        assert_eq!(t, Thickness::new(0.0, 2.0, 0.0, 4.0));
    }

    #[test]
    fn inflate_grows_in_all_directions() {
        let r = RectF::new(10.0, 10.0, 5.0, 5.0).inflated(Thickness::uniform(1.0));
        assert_eq!(r, RectF::new(9.0, 9.0, 7.0, 7.0));
    }

    #[test]
    fn argb_packs_channels() {
        assert_eq!(Color::from_argb(0x80, 0xFF, 0, 0x10).0, 0x80FF_0010);
        assert_eq!(Color::from_argb(0x80, 0, 0, 0).alpha(), 0x80);
    }
}
