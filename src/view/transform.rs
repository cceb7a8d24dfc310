//! Page space ⇄ content space ⇄ device pixel transforms
//!
//! Page space has its origin at the bottom-left corner with y growing up,
//! in the page's original (unrotated) frame. Only the rotation applied on
//! top of the stored orientation takes part in the mapping.

use serde::{Deserialize, Serialize};

use super::types::{PointF, RectF, SizeF};

/// Quarter-turn page rotation, clockwise
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    pub fn from_quarter_turns(turns: i32) -> Self {
        match turns.rem_euclid(4) {
            1 => Self::Rotate90,
            2 => Self::Rotate180,
            3 => Self::Rotate270,
            _ => Self::None,
        }
    }

    pub fn quarter_turns(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Rotate90 => 1,
            Self::Rotate180 => 2,
            Self::Rotate270 => 3,
        }
    }

    /// Rotation applied on top of the stored orientation
    pub fn effective(current: Rotation, original: Rotation) -> Rotation {
        Self::from_quarter_turns(current.quarter_turns() - original.quarter_turns())
    }

    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Rotate90 | Self::Rotate270)
    }
}

/// Current and stored rotation of one page
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRotation {
    #[serde(default)]
    pub current: Rotation,
    #[serde(default)]
    pub original: Rotation,
}

impl PageRotation {
    pub fn effective(&self) -> Rotation {
        Rotation::effective(self.current, self.original)
    }
}

/// Placement of one page in content space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    /// Layout rectangle of the page
    pub rect: RectF,
    /// Intrinsic page size as displayed (current orientation)
    pub page_size: SizeF,
    /// Effective rotation
    pub rotation: Rotation,
}

impl PageGeometry {
    /// Size of the page in its original frame
    fn frame_size(&self) -> SizeF {
        let size = self.page_size.sanitized();
        if self.rotation.swaps_axes() {
            size.transposed()
        } else {
            size
        }
    }

    /// Page point to normalized display coordinates (top-left origin)
    fn normalize(&self, p: PointF) -> (f32, f32) {
        let frame = self.frame_size();
        let u0 = ratio(p.x, frame.width);
        let v0 = 1.0 - ratio(p.y, frame.height);
        match self.rotation {
            Rotation::None => (u0, v0),
            Rotation::Rotate90 => (1.0 - v0, u0),
            Rotation::Rotate180 => (1.0 - u0, 1.0 - v0),
            Rotation::Rotate270 => (v0, 1.0 - u0),
        }
    }

    fn denormalize(&self, u: f32, v: f32) -> PointF {
        let (u0, v0) = match self.rotation {
            Rotation::None => (u, v),
            Rotation::Rotate90 => (v, 1.0 - u),
            Rotation::Rotate180 => (1.0 - u, 1.0 - v),
            Rotation::Rotate270 => (1.0 - v, u),
        };
        let frame = self.frame_size();
        PointF::new(u0 * frame.width, (1.0 - v0) * frame.height)
    }

    pub fn page_to_content(&self, p: PointF) -> PointF {
        let (u, v) = self.normalize(p);
        PointF::new(
            self.rect.x + u * self.rect.width,
            self.rect.y + v * self.rect.height,
        )
    }

    pub fn content_to_page(&self, p: PointF) -> PointF {
        let u = ratio(p.x - self.rect.x, self.rect.width);
        let v = ratio(p.y - self.rect.y, self.rect.height);
        self.denormalize(u, v)
    }

    /// Map a page-space rectangle; the result is normalized
    pub fn page_rect_to_content(&self, r: &RectF) -> RectF {
        let a = self.page_to_content(r.origin());
        let b = self.page_to_content(PointF::new(r.right(), r.bottom()));
        RectF::from_corners(a, b)
    }
}

/// Content space to device pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeviceMapping {
    pub scroll_offset: PointF,
    pub pixels_per_unit: f32,
}

impl Default for DeviceMapping {
    fn default() -> Self {
        Self {
            scroll_offset: PointF::default(),
            pixels_per_unit: 1.0,
        }
    }
}

impl DeviceMapping {
    fn scale(&self) -> f32 {
        if self.pixels_per_unit.is_finite() && self.pixels_per_unit > 0.0 {
            self.pixels_per_unit
        } else {
            1.0
        }
    }

    pub fn content_to_device(&self, p: PointF) -> PointF {
        let scale = self.scale();
        PointF::new(
            (p.x - self.scroll_offset.x) * scale,
            (p.y - self.scroll_offset.y) * scale,
        )
    }

    pub fn device_to_content(&self, p: PointF) -> PointF {
        let scale = self.scale();
        PointF::new(
            p.x / scale + self.scroll_offset.x,
            p.y / scale + self.scroll_offset.y,
        )
    }

    pub fn content_rect_to_device(&self, r: &RectF) -> RectF {
        let scale = self.scale();
        let origin = self.content_to_device(r.origin());
        RectF::new(origin.x, origin.y, r.width * scale, r.height * scale)
    }
}

fn ratio(v: f32, len: f32) -> f32 {
    if len > 0.0 { v / len } else { 0.0 }
}
