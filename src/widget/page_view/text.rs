//! Text selection and highlights

use std::ops::Range;

use log::debug;

use crate::document::DocumentEngine;
use crate::error::{Result, ViewerError};
use crate::view::text_rects::span_rects;
use crate::view::{
    CharPosition, Color, Glyph, HighlightEntry, PointF, RectF, SelectionSpan, SizeF, Thickness,
    ViewerEvent,
};

use super::DocumentViewer;

/// Slack around glyph boxes for pointer hit tests, in page units
const HIT_TOLERANCE: SizeF = SizeF::new(2.0, 2.0);

impl<E: DocumentEngine> DocumentViewer<E> {
    /// Select from `start` to `end` (end exclusive). Either order is
    /// accepted; out-of-range positions are clamped.
    pub fn select_text(&mut self, start: CharPosition, end: CharPosition) -> Result<()> {
        let start = self.clamp_position(start)?;
        let end = self.clamp_position(end)?;
        self.drag_anchor = None;
        let span = SelectionSpan::new(start, end);
        if self.selection.span() != Some(span) {
            self.selection.set(span);
            self.events.push(ViewerEvent::SelectionChanged);
        }
        Ok(())
    }

    pub fn deselect_text(&mut self) {
        self.drag_anchor = None;
        if self.selection.clear() {
            self.events.push(ViewerEvent::SelectionChanged);
        }
    }

    fn clamp_position(&mut self, at: CharPosition) -> Result<CharPosition> {
        let engine = self.slot.get_mut().ok_or(ViewerError::NoDocument)?;
        let pages = engine.page_count();
        if pages == 0 {
            return Ok(CharPosition::default());
        }
        let page = at.page.min(pages - 1);
        let index = at.index.min(engine.char_count(page));
        Ok(CharPosition::new(page, index))
    }

    /// Character under a device point
    pub fn hit_test(&mut self, device: PointF) -> Option<CharPosition> {
        let (page, point) = self.device_to_page(device)?;
        let index = self
            .slot
            .get_mut()?
            .char_index_at(page, point, HIT_TOLERANCE)?;
        Some(CharPosition::new(page, index))
    }

    /// Start a pointer selection; false when no character is hit
    pub fn begin_drag(&mut self, device: PointF) -> bool {
        let Some(anchor) = self.hit_test(device) else {
            return false;
        };
        let had_selection = self.selection.has_selection();
        self.selection.start_at(anchor);
        self.drag_anchor = Some(anchor);
        if had_selection {
            self.events.push(ViewerEvent::SelectionChanged);
        }
        true
    }

    /// Extend the pointer selection. The anchor character stays selected
    /// whichever way the pointer moves.
    pub fn drag_to(&mut self, device: PointF) -> bool {
        let Some(anchor) = self.drag_anchor else {
            return false;
        };
        let Some(hit) = self.hit_test(device) else {
            return false;
        };
        let span = if hit >= anchor {
            SelectionSpan::new(anchor, CharPosition::new(hit.page, hit.index + 1))
        } else {
            SelectionSpan::new(CharPosition::new(anchor.page, anchor.index + 1), hit)
        };
        let changed = self.selection.update_span(span);
        if changed {
            self.events.push(ViewerEvent::SelectionChanged);
        }
        changed
    }

    pub fn end_drag(&mut self) {
        self.selection.finish();
        self.drag_anchor = None;
    }

    /// Text of the normalized selection, pages joined by newlines
    pub fn selected_text(&mut self) -> Result<String> {
        let engine = self.slot.get_mut().ok_or(ViewerError::NoDocument)?;
        let Some(span) = self.selection.get_ordered_bounds() else {
            return Ok(String::new());
        };
        let pages = span.pages().start..span.pages().end.min(engine.page_count());
        let parts: Vec<String> = pages
            .filter_map(|page| {
                let range = span.range_on_page(page, engine.char_count(page))?;
                Some(engine.extract_text(page, range.start, range.len()))
            })
            .collect();
        Ok(parts.join("\n"))
    }

    /// Highlight a run of characters. A negative `char_count` runs to the
    /// end of the page. Returns whether the page's highlights changed.
    pub fn highlight_text(
        &mut self,
        page: usize,
        char_index: usize,
        char_count: isize,
        color: Color,
        inflate: Thickness,
    ) -> Result<bool> {
        self.update_highlight(page, char_index, char_count, Some(color), inflate)
    }

    pub fn remove_highlight(
        &mut self,
        page: usize,
        char_index: usize,
        char_count: isize,
    ) -> Result<bool> {
        self.update_highlight(page, char_index, char_count, None, Thickness::default())
    }

    pub fn remove_highlight_from_page(&mut self, page: usize) -> bool {
        let changed = self.highlights.clear_page(page);
        if changed {
            self.events.push(ViewerEvent::HighlightedTextChanged);
        }
        changed
    }

    pub fn clear_highlights(&mut self) -> bool {
        let changed = self.highlights.clear();
        if changed {
            self.events.push(ViewerEvent::HighlightedTextChanged);
        }
        changed
    }

    fn update_highlight(
        &mut self,
        page: usize,
        char_index: usize,
        char_count: isize,
        color: Option<Color>,
        inflate: Thickness,
    ) -> Result<bool> {
        let Some((page, run)) = self.resolve_run(page, char_index, char_count)? else {
            return Ok(false);
        };
        let changed = self
            .highlights
            .apply(page, run.start, run.len(), color, inflate);
        if changed {
            debug!("highlights on page {page}: {:?}", self.highlights.entries(page));
            self.events.push(ViewerEvent::HighlightedTextChanged);
        }
        Ok(changed)
    }

    fn resolve_run(
        &mut self,
        page: usize,
        char_index: usize,
        char_count: isize,
    ) -> Result<Option<(usize, Range<usize>)>> {
        let engine = self.slot.get_mut().ok_or(ViewerError::NoDocument)?;
        let pages = engine.page_count();
        if pages == 0 {
            return Ok(None);
        }
        let page = page.min(pages - 1);
        let chars = engine.char_count(page);
        let start = char_index.min(chars);
        let len = match usize::try_from(char_count) {
            Ok(count) => count.min(chars - start),
            Err(_) => chars - start,
        };
        Ok((len > 0).then_some((page, start..start + len)))
    }

    /// Device rectangles of the current selection on `page`
    pub fn selected_rects(&mut self, page: usize) -> Vec<RectF> {
        match self.selection.span() {
            Some(span) => self.selected_rects_for(page, span),
            None => Vec::new(),
        }
    }

    /// Device rectangles of an arbitrary selection span on `page`
    pub fn selected_rects_for(&mut self, page: usize, span: SelectionSpan) -> Vec<RectF> {
        let Some(engine) = self.slot.get_mut() else {
            return Vec::new();
        };
        let char_count = engine.char_count(page);
        match span.range_on_page(page, char_count) {
            Some(range) => self.run_rects(page, range, Thickness::default()),
            None => Vec::new(),
        }
    }

    /// Device rectangles of one highlight entry, inflated by its margins
    pub fn highlighted_rects(&mut self, page: usize, entry: &HighlightEntry) -> Vec<RectF> {
        self.run_rects(page, entry.range(), entry.inflate)
    }

    fn run_rects(&mut self, page: usize, range: Range<usize>, inflate: Thickness) -> Vec<RectF> {
        self.ensure_layout();
        if !self.layout.rect(page).is_some_and(|r| r.is_computed) {
            return Vec::new();
        }
        let Some(geometry) = self.geometry(page) else {
            return Vec::new();
        };
        let mapping = self.mapping();
        let smooth = self.state.smooth_selection;
        let Some(engine) = self.slot.get_mut() else {
            return Vec::new();
        };
        let char_count = engine.char_count(page);
        let page_rects = span_rects(range, char_count, smooth, &mut |index| {
            let ch = engine.char_at(page, index)?;
            let rect = engine.char_box(page, index)?;
            Some(Glyph::new(ch, rect))
        });
        page_rects
            .iter()
            .map(|r| {
                mapping
                    .content_rect_to_device(&geometry.page_rect_to_content(r))
                    .inflated(inflate)
            })
            .collect()
    }
}
