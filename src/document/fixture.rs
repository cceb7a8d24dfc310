//! JSON-described document engine
//!
//! Backs the command line tool and the tests. Pages carry a size, an
//! optional rotation and plain text; glyph boxes are laid out on a fixed
//! grid unless given explicitly. Rendering paints a flat color per page in
//! `render_steps` horizontal bands, one band per call.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{
    DocumentChange, DocumentEngine, EngineFault, LoadFault, RenderProgress, RenderRequest,
};
use crate::view::canvas::Canvas;
use crate::view::transform::PageRotation;
use crate::view::types::{Color, PointF, RectF, SizeF};

const TEXT_INSET: f32 = 36.0;

fn default_font_size() -> f32 {
    12.0
}

fn default_render_steps() -> usize {
    1
}

/// One page of a fixture document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixturePage {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub rotation: PageRotation,
    #[serde(default)]
    pub text: String,
    /// Explicit glyph boxes in page space, one per character
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glyphs: Option<Vec<RectF>>,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

impl FixturePage {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            rotation: PageRotation::default(),
            text: String::new(),
            glyphs: None,
            font_size: default_font_size(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    fn layout_text(&self) -> PageText {
        let chars: Vec<char> = self.text.chars().collect();
        if let Some(glyphs) = &self.glyphs {
            let mut boxes = glyphs.clone();
            boxes.resize(chars.len(), RectF::default());
            return PageText { chars, boxes };
        }

        let char_width = self.font_size * 0.5;
        let line_height = self.font_size * 1.2;
        let right = (self.width - TEXT_INSET).max(TEXT_INSET + char_width);
        let top = self.height - TEXT_INSET;
        let mut x = TEXT_INSET;
        let mut line = 0usize;
        let mut boxes = Vec::with_capacity(chars.len());
        for &c in &chars {
            if c != '\n' && x + char_width > right {
                line += 1;
                x = TEXT_INSET;
            }
            let bottom = top - (line + 1) as f32 * line_height;
            if c == '\n' {
                boxes.push(RectF::new(x, bottom, 0.0, self.font_size));
                line += 1;
                x = TEXT_INSET;
            } else {
                boxes.push(RectF::new(x, bottom, char_width, self.font_size));
                x += char_width;
            }
        }
        PageText { chars, boxes }
    }
}

#[derive(Clone, Debug, Default)]
struct PageText {
    chars: Vec<char>,
    boxes: Vec<RectF>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FixtureDocument {
    pub pages: Vec<FixturePage>,
    #[serde(default = "default_render_steps")]
    pub render_steps: usize,
    #[serde(skip)]
    text: Vec<PageText>,
    #[serde(skip)]
    progress: HashMap<usize, usize>,
    #[serde(skip)]
    revision: u64,
    #[serde(skip)]
    changes: Vec<DocumentChange>,
    #[serde(skip)]
    mutate_while_rendering: Option<usize>,
    #[serde(skip)]
    size_queries: usize,
    #[serde(skip)]
    released: Vec<usize>,
    #[serde(skip)]
    render_log: Vec<RenderRequest>,
}

impl FixtureDocument {
    pub fn new(pages: Vec<FixturePage>) -> Self {
        let mut doc = Self {
            pages,
            render_steps: default_render_steps(),
            ..Self::default()
        };
        doc.prepare();
        doc
    }

    /// `count` identical pages without text
    pub fn uniform(count: usize, width: f32, height: f32) -> Self {
        Self::new(vec![FixturePage::new(width, height); count])
    }

    pub fn from_json(json: &str) -> Result<Self, LoadFault> {
        let mut doc: FixtureDocument =
            serde_json::from_str(json).map_err(|e| LoadFault::BadFormat(e.to_string()))?;
        doc.prepare();
        Ok(doc)
    }

    pub fn open(path: &Path) -> Result<Self, LoadFault> {
        if !path.exists() {
            return Err(LoadFault::NotFound(path.display().to_string()));
        }
        let json = fs::read_to_string(path)
            .map_err(|e| LoadFault::Unknown(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    #[must_use]
    pub fn with_render_steps(mut self, steps: usize) -> Self {
        self.render_steps = steps.max(1);
        self
    }

    fn prepare(&mut self) {
        self.render_steps = self.render_steps.max(1);
        self.text = self.pages.iter().map(FixturePage::layout_text).collect();
    }

    pub fn insert_page(&mut self, index: usize, page: FixturePage) {
        let index = index.min(self.pages.len());
        self.text.insert(index, page.layout_text());
        self.pages.insert(index, page);
        self.record(DocumentChange::PagesInserted { index, count: 1 });
    }

    pub fn remove_page(&mut self, index: usize) {
        if index >= self.pages.len() {
            return;
        }
        self.pages.remove(index);
        self.text.remove(index);
        self.record(DocumentChange::PagesRemoved { index, count: 1 });
    }

    pub fn rotate_page(&mut self, index: usize, rotation: PageRotation) {
        let Some(page) = self.pages.get_mut(index) else {
            return;
        };
        let swap = rotation.current.swaps_axes() != page.rotation.current.swaps_axes();
        if swap {
            std::mem::swap(&mut page.width, &mut page.height);
        }
        page.rotation = rotation;
        self.record(DocumentChange::PageRotated(index));
    }

    /// Simulate scripting that edits `page` while it is being painted
    pub fn mutate_while_rendering(&mut self, page: usize) {
        self.mutate_while_rendering = Some(page);
    }

    pub fn size_queries(&self) -> usize {
        self.size_queries
    }

    pub fn released_pages(&self) -> &[usize] {
        &self.released
    }

    pub fn render_log(&self) -> &[RenderRequest] {
        &self.render_log
    }

    fn record(&mut self, change: DocumentChange) {
        self.revision += 1;
        self.changes.push(change);
    }

    fn page_color(page: usize) -> Color {
        let shade = (page % 8) as u8 * 24;
        Color::from_argb(0xFF, 0xE0, 0xE0 - shade, 0xC0 + shade / 4)
    }
}

impl DocumentEngine for FixtureDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&mut self, page: usize) -> SizeF {
        self.size_queries += 1;
        self.pages
            .get(page)
            .map(|p| SizeF::new(p.width, p.height))
            .unwrap_or(SizeF::ZERO)
    }

    fn page_rotation(&self, page: usize) -> PageRotation {
        self.pages
            .get(page)
            .map(|p| p.rotation)
            .unwrap_or_default()
    }

    fn char_count(&mut self, page: usize) -> usize {
        self.text.get(page).map_or(0, |t| t.chars.len())
    }

    fn char_at(&mut self, page: usize, index: usize) -> Option<char> {
        self.text.get(page)?.chars.get(index).copied()
    }

    fn char_box(&mut self, page: usize, index: usize) -> Option<RectF> {
        self.text.get(page)?.boxes.get(index).copied()
    }

    fn char_index_at(&mut self, page: usize, point: PointF, tolerance: SizeF) -> Option<usize> {
        let text = self.text.get(page)?;
        let exact = text
            .boxes
            .iter()
            .position(|b| point_in(b, point, SizeF::ZERO));
        exact.or_else(|| {
            text.boxes
                .iter()
                .position(|b| point_in(b, point, tolerance))
        })
    }

    fn extract_text(&mut self, page: usize, start: usize, count: usize) -> String {
        self.text
            .get(page)
            .map(|t| t.chars.iter().skip(start).take(count).collect())
            .unwrap_or_default()
    }

    fn render(
        &mut self,
        request: &RenderRequest,
        canvas: &mut Canvas,
    ) -> Result<RenderProgress, EngineFault> {
        if request.page >= self.pages.len() {
            return Err(EngineFault::NoSuchPage(request.page));
        }
        self.render_log.push(*request);

        if self.mutate_while_rendering == Some(request.page) {
            self.mutate_while_rendering = None;
            debug!("fixture: mutating page {} during render", request.page);
            self.record(DocumentChange::PageContentChanged(request.page));
        }

        let steps = self.render_steps;
        let done = if request.resume {
            self.progress.get(&request.page).copied().unwrap_or(0)
        } else {
            0
        };
        let band_height = request.dest.height / steps as f32;
        let band = RectF::new(
            request.dest.x,
            request.dest.y + band_height * done as f32,
            request.dest.width,
            band_height,
        );
        canvas.fill_rect(&band, Self::page_color(request.page));

        if done + 1 >= steps {
            self.progress.remove(&request.page);
            Ok(RenderProgress::Done)
        } else {
            self.progress.insert(request.page, done + 1);
            Ok(RenderProgress::NeedsMore)
        }
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn drain_changes(&mut self) -> Vec<DocumentChange> {
        std::mem::take(&mut self.changes)
    }

    fn release_page(&mut self, page: usize) {
        self.released.push(page);
    }
}

fn point_in(b: &RectF, p: PointF, tolerance: SizeF) -> bool {
    p.x >= b.x - tolerance.width
        && p.x <= b.right() + tolerance.width
        && p.y >= b.y - tolerance.height
        && p.y <= b.bottom() + tolerance.height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyphs_wrap_at_the_right_inset() {
        let mut doc = FixtureDocument::new(vec![FixturePage::new(100.0, 200.0).with_text("abcdefg")]);
        // 28 units of room at 6 units per glyph: four glyphs per line.
        let first = doc.char_box(0, 0).unwrap();
        let fifth = doc.char_box(0, 4).unwrap();
        assert_eq!(first.x, 36.0);
        assert_eq!(fifth.x, 36.0);
        assert!(fifth.y < first.y);
    }

    #[test]
    fn malformed_json_is_bad_format() {
        assert!(matches!(
            FixtureDocument::from_json("{ not json"),
            Err(LoadFault::BadFormat(_))
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        assert!(matches!(
            FixtureDocument::open(Path::new("/definitely/not/here.json")),
            Err(LoadFault::NotFound(_))
        ));
    }

    #[test]
    fn render_takes_configured_steps() {
        let mut doc = FixtureDocument::uniform(1, 10.0, 10.0).with_render_steps(3);
        let mut canvas = Canvas::new(10, 10, Color::WHITE);
        let mut request = RenderRequest {
            page: 0,
            dest: RectF::new(0.0, 0.0, 10.0, 9.0),
            rotation: Default::default(),
            flags: Default::default(),
            resume: false,
        };
        assert_eq!(doc.render(&request, &mut canvas), Ok(RenderProgress::NeedsMore));
        request.resume = true;
        assert_eq!(doc.render(&request, &mut canvas), Ok(RenderProgress::NeedsMore));
        assert_eq!(doc.render(&request, &mut canvas), Ok(RenderProgress::Done));
        assert_ne!(canvas.pixel(5, 8), Some(Color::WHITE));
    }

    #[test]
    fn structural_edits_are_reported_once() {
        let mut doc = FixtureDocument::uniform(2, 10.0, 10.0);
        doc.insert_page(1, FixturePage::new(5.0, 5.0));
        doc.remove_page(0);
        assert_eq!(doc.revision(), 2);
        assert_eq!(
            doc.drain_changes(),
            vec![
                DocumentChange::PagesInserted { index: 1, count: 1 },
                DocumentChange::PagesRemoved { index: 0, count: 1 },
            ]
        );
        assert!(doc.drain_changes().is_empty());
    }
}
