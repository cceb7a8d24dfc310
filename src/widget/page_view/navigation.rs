//! Scrolling and coordinate queries

use log::{trace, warn};

use crate::document::DocumentEngine;
use crate::error::{Result, ViewerError};
use crate::view::{
    Axis, Command, PageGeometry, PointF, RectF, ScrollDirection, SizeF,
};

use super::DocumentViewer;

impl<E: DocumentEngine> DocumentViewer<E> {
    pub fn offset(&self) -> PointF {
        self.viewport.offset()
    }

    /// Set the scroll offset on one axis, clamped to the extent
    pub fn set_offset(&mut self, axis: Axis, value: f32) -> bool {
        if !self.has_document() {
            return false;
        }
        self.ensure_layout();
        if !self.viewport.set_offset(axis, value) {
            return false;
        }
        self.scrolled();
        true
    }

    pub fn scroll_by(&mut self, direction: ScrollDirection, amount: f32) -> bool {
        if !self.has_document() {
            return false;
        }
        self.ensure_layout();
        if !self.viewport.scroll_by(direction, amount) {
            return false;
        }
        self.scrolled();
        true
    }

    /// New viewport size in device pixels
    pub fn resize(&mut self, size: SizeF) {
        self.apply(Command::SetViewportSize(size));
        self.ensure_layout();
    }

    fn scrolled(&mut self) {
        trace!("scrolled to {:?}", self.viewport.offset());
        self.scheduler.invalidate();
        self.ensure_layout();
        self.update_current_page();
    }

    fn clamp_page(&self, page: usize) -> Option<usize> {
        let count = self.page_count();
        if count == 0 {
            return None;
        }
        if page >= count {
            warn!("page {page} out of range, clamping to {}", count - 1);
        }
        Some(page.min(count - 1))
    }

    /// Bring `page` into view. The page index is clamped.
    pub fn scroll_to_page(&mut self, page: usize) {
        let Some(page) = self.clamp_page(page) else {
            return;
        };

        if self.state.layout.mode.is_single() {
            self.apply(Command::SetActivePage(page));
            self.ensure_layout();
            if self.viewport.set_offsets(PointF::default()) {
                self.scheduler.invalidate();
            }
            return;
        }

        let axis = self.state.layout.mode.stacking_axis();
        let margin = self.state.layout.page_margin.leading(axis);
        self.ensure_layout();
        // A culled page only has a placeholder until it is in view, and
        // measuring it can move it; aim a second time if it did.
        for _attempt in 0..2 {
            let Some(before) = self.layout.rect(page) else {
                return;
            };
            let target = before.rect.span(axis).0 - margin;
            if self.viewport.set_offset(axis, target) {
                self.scrolled();
            }
            if self.layout.rect(page) == Some(before) {
                break;
            }
        }
    }

    /// Scroll so that a page-space point sits at the top-left of the view
    pub fn scroll_to_point(&mut self, page: usize, point: PointF) {
        let Some(page) = self.clamp_page(page) else {
            return;
        };
        self.scroll_to_page(page);
        let Some(geometry) = self.geometry(page) else {
            return;
        };
        if self.viewport.set_offsets(geometry.page_to_content(point)) {
            self.scrolled();
        }
    }

    /// Scroll to the top-left corner of a character's glyph box
    pub fn scroll_to_char(&mut self, page: usize, char_index: usize) {
        let Some(page) = self.clamp_page(page) else {
            return;
        };
        let Some(engine) = self.slot.get_mut() else {
            return;
        };
        let count = engine.char_count(page);
        if count == 0 {
            self.scroll_to_page(page);
            return;
        }
        let index = char_index.min(count - 1);
        match engine.char_box(page, index) {
            // Page space grows upward, so the box's far edge is its top
            Some(glyph) => self.scroll_to_point(page, PointF::new(glyph.x, glyph.bottom())),
            None => self.scroll_to_page(page),
        }
    }

    /// Page rectangle in device pixels
    pub fn actual_rect(&mut self, page: usize) -> Option<RectF> {
        self.ensure_layout();
        let rect = self.layout.rect(page)?;
        Some(self.mapping().content_rect_to_device(&rect.rect))
    }

    /// Device point to page space; the page must be visible
    pub fn client_to_page(&mut self, page: usize, point: PointF) -> Result<PointF> {
        let geometry = self.visible_geometry(page)?;
        let content = self.mapping().device_to_content(point);
        Ok(geometry.content_to_page(content))
    }

    /// Page-space point to device pixels; the page must be visible
    pub fn page_to_client(&mut self, page: usize, point: PointF) -> Result<PointF> {
        let geometry = self.visible_geometry(page)?;
        Ok(self
            .mapping()
            .content_to_device(geometry.page_to_content(point)))
    }

    /// Page under a device point and the point in that page's space.
    /// Only pages in the visible range are considered; `None` when the
    /// point falls between pages or outside the content.
    pub fn device_to_page(&mut self, device: PointF) -> Option<(usize, PointF)> {
        let visible = self.visible_range()?;
        let content = self.mapping().device_to_content(device);
        let page = visible.into_iter().find(|&page| {
            self.layout
                .rect(page)
                .is_some_and(|r| r.is_computed && r.rect.contains(content))
        })?;
        let point = self.geometry(page)?.content_to_page(content);
        Some((page, point))
    }

    fn visible_geometry(&mut self, page: usize) -> Result<PageGeometry> {
        if !self.has_document() {
            return Err(ViewerError::NoDocument);
        }
        let visible = self.visible_range();
        let exact = self.layout.rect(page).is_some_and(|r| r.is_computed);
        if !exact || !visible.is_some_and(|range| range.contains(&page)) {
            return Err(ViewerError::PageNotVisible { page });
        }
        self.geometry(page)
            .ok_or(ViewerError::PageNotVisible { page })
    }
}
