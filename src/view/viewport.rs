//! Viewport and scroll model
//!
//! Owns extent, viewport size and the clamped scroll offset, and derives
//! the visible page range and the current page from layout rectangles.

use std::ops::{Range, RangeInclusive};

use super::types::{Axis, PageRect, PointF, RectF, SizeF};

/// Scroll direction for stepwise scrolling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    /// Returns true if the direction is vertical (Up or Down)
    pub fn vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    pub fn axis(self) -> Axis {
        if self.vertical() {
            Axis::Vertical
        } else {
            Axis::Horizontal
        }
    }

    fn sign(self) -> f32 {
        match self {
            Self::Up | Self::Left => -1.0,
            Self::Down | Self::Right => 1.0,
        }
    }
}

/// Extent, viewport and scroll offset
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportState {
    extent: SizeF,
    viewport: SizeF,
    offset: PointF,
}

impl ViewportState {
    #[must_use]
    pub fn new(viewport: SizeF) -> Self {
        Self {
            viewport: viewport.sanitized(),
            ..Self::default()
        }
    }

    pub fn extent(&self) -> SizeF {
        self.extent
    }

    pub fn viewport_size(&self) -> SizeF {
        self.viewport
    }

    pub fn offset(&self) -> PointF {
        self.offset
    }

    /// The visible window in content space
    pub fn visible_rect(&self) -> RectF {
        RectF::from_origin_size(self.offset, self.viewport)
    }

    /// Largest valid offset on an axis
    pub fn max_offset(&self, axis: Axis) -> f32 {
        let free = self.extent.get(axis) - self.viewport.get(axis);
        if free > 0.0 { free } else { 0.0 }
    }

    /// Clamp and apply an offset; returns whether it changed
    pub fn set_offset(&mut self, axis: Axis, value: f32) -> bool {
        let clamped = self.clamp(axis, value);
        let slot = match axis {
            Axis::Horizontal => &mut self.offset.x,
            Axis::Vertical => &mut self.offset.y,
        };
        if *slot == clamped {
            return false;
        }
        *slot = clamped;
        true
    }

    /// Apply both offsets; returns whether either changed
    pub fn set_offsets(&mut self, target: PointF) -> bool {
        let horizontal = self.set_offset(Axis::Horizontal, target.x);
        let vertical = self.set_offset(Axis::Vertical, target.y);
        horizontal || vertical
    }

    pub fn scroll_by(&mut self, direction: ScrollDirection, amount: f32) -> bool {
        let axis = direction.axis();
        let current = self.offset.get(axis);
        self.set_offset(axis, current + direction.sign() * amount)
    }

    /// Update the content extent and re-clamp the offset
    pub fn set_extent(&mut self, extent: SizeF) -> bool {
        self.extent = extent.sanitized();
        self.reclamp()
    }

    /// Update the viewport size and re-clamp the offset
    pub fn set_viewport_size(&mut self, viewport: SizeF) -> bool {
        self.viewport = viewport.sanitized();
        self.reclamp()
    }

    fn reclamp(&mut self) -> bool {
        let offset = self.offset;
        self.set_offsets(offset)
    }

    fn clamp(&self, axis: Axis, value: f32) -> f32 {
        let extent = self.extent.get(axis);
        let viewport = self.viewport.get(axis);
        if !value.is_finite() || value < 0.0 || viewport >= extent {
            0.0
        } else if value + viewport >= extent {
            extent - viewport
        } else {
            value
        }
    }

    /// Contiguous span of displayed pages intersecting the viewport
    pub fn visible_range(
        &self,
        rects: &[PageRect],
        displayed: Range<usize>,
    ) -> Option<RangeInclusive<usize>> {
        let window = self.visible_rect();
        let mut intersecting = displayed
            .filter(|&page| rects.get(page).is_some_and(|r| r.rect.intersects(&window)));
        let first = intersecting.next()?;
        let last = intersecting.last().unwrap_or(first);
        Some(first..=last)
    }

    /// Page with the largest visible area; earlier pages win ties
    pub fn current_page(&self, rects: &[PageRect], displayed: Range<usize>) -> Option<usize> {
        let window = self.visible_rect();
        let mut best: Option<(usize, f32)> = None;
        for page in displayed {
            let Some(area) = rects
                .get(page)
                .and_then(|r| r.rect.intersection(&window))
                .map(|r| r.area())
            else {
                continue;
            };
            if best.is_none_or(|(_, best_area)| area > best_area) {
                best = Some((page, area));
            }
        }
        best.map(|(page, _)| page)
    }
}
