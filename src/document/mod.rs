//! Document engine boundary
//!
//! The viewer never parses or rasterizes documents itself. Everything it
//! needs from the underlying engine goes through [`DocumentEngine`].

mod fixture;

pub use fixture::{FixtureDocument, FixturePage};

use serde::{Deserialize, Serialize};

use crate::view::canvas::Canvas;
use crate::view::transform::{PageRotation, Rotation};
use crate::view::types::{PointF, RectF, SizeF};

/// Why a document could not be opened
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadFault {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("bad document format: {0}")]
    BadFormat(String),

    #[error("wrong or missing password")]
    BadPassword,

    #[error("unsupported security scheme")]
    UnsupportedSecurity,

    #[error("{0}")]
    Unknown(String),
}

/// Errors raised by the engine while the document is open
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineFault {
    #[error("page {0} does not exist")]
    NoSuchPage(usize),

    #[error("rendering page {page} failed: {detail}")]
    Render { page: usize, detail: String },
}

impl EngineFault {
    pub fn render(page: usize, detail: impl Into<String>) -> Self {
        Self::Render {
            page,
            detail: detail.into(),
        }
    }
}

/// Rasterizer options passed through untouched
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFlags {
    #[serde(default)]
    pub annotations: bool,
    #[serde(default)]
    pub grayscale: bool,
    #[serde(default)]
    pub lcd_text: bool,
}

/// One increment of page rendering
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderRequest {
    pub page: usize,
    /// Page rectangle in canvas pixels, possibly partly off-canvas
    pub dest: RectF,
    pub rotation: Rotation,
    pub flags: RenderFlags,
    /// Continue an interrupted render instead of starting over
    pub resume: bool,
}

/// Renderer's answer to one [`RenderRequest`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderProgress {
    Done,
    NeedsMore,
}

/// Structural document changes reported by the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentChange {
    PagesInserted { index: usize, count: usize },
    PagesRemoved { index: usize, count: usize },
    PageRotated(usize),
    PageContentChanged(usize),
}

/// Interface of the page engine (parser, text layer and rasterizer)
pub trait DocumentEngine {
    fn page_count(&self) -> usize;

    /// Intrinsic page size in points, in the page's current orientation
    fn page_size(&mut self, page: usize) -> SizeF;

    fn page_rotation(&self, _page: usize) -> PageRotation {
        PageRotation::default()
    }

    fn char_count(&mut self, page: usize) -> usize;

    fn char_at(&mut self, page: usize, index: usize) -> Option<char>;

    /// Glyph box in page space
    fn char_box(&mut self, page: usize, index: usize) -> Option<RectF>;

    /// Character under a page-space point, within `tolerance`
    fn char_index_at(&mut self, page: usize, point: PointF, tolerance: SizeF) -> Option<usize>;

    fn extract_text(&mut self, page: usize, start: usize, count: usize) -> String;

    /// Paint one increment of a page into the canvas
    fn render(
        &mut self,
        request: &RenderRequest,
        canvas: &mut Canvas,
    ) -> Result<RenderProgress, EngineFault>;

    /// Bumped whenever the document mutates, including during `render`
    fn revision(&self) -> u64 {
        0
    }

    /// Changes since the last call
    fn drain_changes(&mut self) -> Vec<DocumentChange> {
        Vec::new()
    }

    /// The viewer no longer needs cached data for this page
    fn release_page(&mut self, _page: usize) {}
}

impl<T: DocumentEngine + ?Sized> DocumentEngine for Box<T> {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn page_size(&mut self, page: usize) -> SizeF {
        (**self).page_size(page)
    }

    fn page_rotation(&self, page: usize) -> PageRotation {
        (**self).page_rotation(page)
    }

    fn char_count(&mut self, page: usize) -> usize {
        (**self).char_count(page)
    }

    fn char_at(&mut self, page: usize, index: usize) -> Option<char> {
        (**self).char_at(page, index)
    }

    fn char_box(&mut self, page: usize, index: usize) -> Option<RectF> {
        (**self).char_box(page, index)
    }

    fn char_index_at(&mut self, page: usize, point: PointF, tolerance: SizeF) -> Option<usize> {
        (**self).char_index_at(page, point, tolerance)
    }

    fn extract_text(&mut self, page: usize, start: usize, count: usize) -> String {
        (**self).extract_text(page, start, count)
    }

    fn render(
        &mut self,
        request: &RenderRequest,
        canvas: &mut Canvas,
    ) -> Result<RenderProgress, EngineFault> {
        (**self).render(request, canvas)
    }

    fn revision(&self) -> u64 {
        (**self).revision()
    }

    fn drain_changes(&mut self) -> Vec<DocumentChange> {
        (**self).drain_changes()
    }

    fn release_page(&mut self, page: usize) {
        (**self).release_page(page)
    }
}
