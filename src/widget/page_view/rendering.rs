//! Painting and page release

use log::debug;

use crate::document::DocumentEngine;
use crate::error::{Result, ViewerError};
use crate::view::{Canvas, PageRenderStatus, PaintReport, PaintTarget};

use super::DocumentViewer;

impl<E: DocumentEngine> DocumentViewer<E> {
    /// Run one paint pass over the visible pages.
    ///
    /// While the report asks for another tick the host should call `paint`
    /// again from its idle or timer callback.
    pub fn paint(&mut self) -> Result<PaintReport> {
        if !self.has_document() {
            return Err(ViewerError::NoDocument);
        }
        self.ensure_layout();
        let targets = self.paint_targets();
        let size = self.canvas_size();

        let engine = self.slot.get_mut().ok_or(ViewerError::NoDocument)?;
        let mut report = self.scheduler.paint(engine, size, &targets);
        for &page in &report.rendered {
            self.cache.touch(page);
        }

        // Changes applied after the pass leave the canvas stale again
        if self.sync_document() {
            report.complete = false;
            report.needs_tick = true;
        }
        Ok(report)
    }

    fn paint_targets(&mut self) -> Vec<PaintTarget> {
        let Some(visible) = self.visible_range() else {
            return Vec::new();
        };
        let mapping = self.mapping();
        let Some(engine) = self.slot.get() else {
            return Vec::new();
        };
        visible
            .filter_map(|page| {
                let rect = self.layout.rect(page).filter(|r| r.is_computed)?;
                Some(PaintTarget {
                    page,
                    dest: mapping.content_rect_to_device(&rect.rect),
                    rotation: engine.page_rotation(page).effective(),
                })
            })
            .collect()
    }

    fn canvas_size(&self) -> (u32, u32) {
        let size = self.state.viewport.sanitized();
        (size.width.ceil() as u32, size.height.ceil() as u32)
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.scheduler.canvas()
    }

    pub fn render_status(&self, page: usize) -> PageRenderStatus {
        self.scheduler.status(page)
    }

    /// Interrupt a page mid-render; it resumes first on the next pass
    pub fn pause_rendering(&mut self, page: usize) -> bool {
        self.scheduler.pause(page)
    }

    pub fn pause_all_rendering(&mut self) {
        self.scheduler.pause_all();
    }

    /// Release engine data for pages far from view, keeping pages that
    /// carry the selection or a highlight. Returns the released pages.
    pub fn release_offscreen_pages(&mut self) -> Vec<usize> {
        let visible = self.visible_range();
        let highlights = &self.highlights;
        let selection = &self.selection;
        let released = self.cache.release_offscreen(visible, |page| {
            highlights.has_page(page)
                || selection
                    .span()
                    .is_some_and(|span| !span.is_empty() && span.touches_page(page))
        });
        if let Some(engine) = self.slot.get_mut() {
            for &page in &released {
                engine.release_page(page);
            }
        }
        if !released.is_empty() {
            debug!("released {} off-screen pages", released.len());
        }
        released
    }
}
