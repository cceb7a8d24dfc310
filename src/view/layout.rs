//! Page layout engine
//!
//! Computes one content-space rectangle per page for every layout mode.
//! Continuous modes are grids with a single tile per row, so all modes
//! share [`LayoutEngine::layout_grid`].
//!
//! Intrinsic page sizes are queried lazily and cached. Above the culling
//! threshold, pages outside the viewport get a placeholder size instead of
//! a query; a placeholder that lands inside the viewport is measured
//! exactly and its slot redone.

use std::ops::Range;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::types::{Axis, PageRect, PointF, RectF, SizeF, Thickness, VecExt};
use super::zoom::{SizingPolicy, derived_zoom, render_size};

/// Arrangement of pages in the content space
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Only the active page is shown
    SinglePage,
    /// Pages stacked top to bottom
    #[default]
    Vertical,
    /// Pages stacked left to right
    Horizontal,
    /// Rows of `tile_count` pages stacked top to bottom
    TilesVertical,
    /// Columns of `tile_count` pages stacked left to right
    TilesHorizontal,
    /// Only the row holding the active page is shown
    TilesLine,
}

impl LayoutMode {
    /// Modes that show one page or one tile group at a time
    pub fn is_single(self) -> bool {
        matches!(self, Self::SinglePage | Self::TilesLine)
    }

    /// Axis along which rows (or single pages) are stacked
    pub fn stacking_axis(self) -> Axis {
        match self {
            Self::Horizontal | Self::TilesHorizontal => Axis::Horizontal,
            _ => Axis::Vertical,
        }
    }

    pub fn uses_tiles(self) -> bool {
        matches!(
            self,
            Self::TilesVertical | Self::TilesHorizontal | Self::TilesLine
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::SinglePage => "single_page",
            LayoutMode::Vertical => "vertical",
            LayoutMode::Horizontal => "horizontal",
            LayoutMode::TilesVertical => "tiles_vertical",
            LayoutMode::TilesHorizontal => "tiles_horizontal",
            LayoutMode::TilesLine => "tiles_line",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlignment {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlignment {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Placement of pages inside rows and of content inside a larger viewport
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Alignment {
    #[serde(default)]
    pub horizontal: HorizontalAlignment,
    #[serde(default)]
    pub vertical: VerticalAlignment,
}

impl Alignment {
    pub const TOP_LEFT: Alignment = Alignment {
        horizontal: HorizontalAlignment::Left,
        vertical: VerticalAlignment::Top,
    };

    /// Fraction of free space placed before the content on an axis
    pub fn factor(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => match self.horizontal {
                HorizontalAlignment::Left => 0.0,
                HorizontalAlignment::Center => 0.5,
                HorizontalAlignment::Right => 1.0,
            },
            Axis::Vertical => match self.vertical {
                VerticalAlignment::Top => 0.0,
                VerticalAlignment::Center => 0.5,
                VerticalAlignment::Bottom => 1.0,
            },
        }
    }
}

/// Everything the layout depends on apart from the document
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutParams {
    pub mode: LayoutMode,
    pub sizing: SizingPolicy,
    pub zoom: f32,
    pub page_margin: Thickness,
    pub padding: Thickness,
    pub alignment: Alignment,
    pub tile_count: usize,
    /// Page count above which off-screen pages are not measured
    pub culling_threshold: usize,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            mode: LayoutMode::default(),
            sizing: SizingPolicy::default(),
            zoom: 1.0,
            page_margin: Thickness::uniform(10.0),
            padding: Thickness::default(),
            alignment: Alignment::default(),
            tile_count: 2,
            culling_threshold: 200,
        }
    }
}

impl LayoutParams {
    fn tiles(&self) -> usize {
        if self.mode.uses_tiles() {
            self.tile_count.max(1)
        } else {
            1
        }
    }
}

/// Per-pass inputs that change with scrolling
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutInput {
    /// Visible window in content space (scroll offset + viewport size)
    pub viewport: RectF,
    /// Page shown by the single-page modes; zoom is derived from it
    pub active_page: usize,
}

/// Result of one layout pass
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutOutcome {
    pub extent: SizeF,
    /// Pages placed by this pass; the rest hold placeholders
    pub displayed: Range<usize>,
    /// Zoom implied by the active page under a fit policy
    pub derived_zoom: Option<f32>,
    /// Number of page size queries issued
    pub size_queries: usize,
}

struct Pass<'a> {
    params: &'a LayoutParams,
    viewport: RectF,
    culling: bool,
    sizes: &'a mut dyn FnMut(usize) -> SizeF,
    last_known: Option<SizeF>,
    queries: usize,
}

struct Row {
    pages: Range<usize>,
    main_len: f32,
    cross_len: f32,
}

/// Owns the page rectangles and the intrinsic size cache
#[derive(Debug, Default)]
pub struct LayoutEngine {
    rects: Vec<PageRect>,
    intrinsic: Vec<Option<SizeF>>,
    mode: Option<LayoutMode>,
    extent: SizeF,
    displayed: Range<usize>,
}

impl LayoutEngine {
    #[must_use]
    pub fn new(page_count: usize) -> Self {
        let mut engine = Self::default();
        engine.reset(page_count);
        engine
    }

    /// Recreate rectangles and forget every cached page size
    pub fn reset(&mut self, page_count: usize) {
        self.rects.reset_to_len(page_count);
        self.intrinsic.reset_to_len(page_count);
        self.mode = None;
        self.extent = SizeF::ZERO;
        self.displayed = 0..0;
    }

    /// Forget one page's intrinsic size, e.g. after it was rotated
    pub fn invalidate_page(&mut self, page: usize) {
        if let Some(slot) = self.intrinsic.get_mut(page) {
            *slot = None;
        }
        if let Some(rect) = self.rects.get_mut(page) {
            rect.is_computed = false;
        }
    }

    /// Mark every rectangle stale while keeping sizes as placeholders
    pub fn invalidate_all(&mut self) {
        for rect in &mut self.rects {
            rect.is_computed = false;
        }
    }

    pub fn page_count(&self) -> usize {
        self.rects.len()
    }

    pub fn rects(&self) -> &[PageRect] {
        &self.rects
    }

    pub fn rect(&self, page: usize) -> Option<PageRect> {
        self.rects.get(page).copied()
    }

    pub fn extent(&self) -> SizeF {
        self.extent
    }

    pub fn displayed(&self) -> Range<usize> {
        self.displayed.clone()
    }

    /// Cached intrinsic size of a page, if it was measured
    pub fn intrinsic_size(&self, page: usize) -> Option<SizeF> {
        self.intrinsic.get(page).copied().flatten()
    }

    /// True when a displayed page inside `viewport` still holds a placeholder
    pub fn needs_relayout(&self, viewport: &RectF) -> bool {
        self.displayed.clone().any(|page| {
            let rect = &self.rects[page];
            !rect.is_computed
                && overlaps(rect.rect.span(Axis::Vertical), viewport.span(Axis::Vertical))
                && overlaps(rect.rect.span(Axis::Horizontal), viewport.span(Axis::Horizontal))
        })
    }

    /// Run one layout pass.
    ///
    /// `sizes` returns the intrinsic size of a page; it is only called for
    /// pages whose size is not cached yet.
    pub fn layout(
        &mut self,
        params: &LayoutParams,
        input: LayoutInput,
        sizes: &mut dyn FnMut(usize) -> SizeF,
    ) -> LayoutOutcome {
        let count = self.rects.len();
        if self.mode != Some(params.mode) {
            self.rects.reset_to_len(count);
            self.mode = Some(params.mode);
        }

        if count == 0 {
            self.extent = SizeF::ZERO;
            self.displayed = 0..0;
            return LayoutOutcome {
                extent: SizeF::ZERO,
                displayed: 0..0,
                derived_zoom: None,
                size_queries: 0,
            };
        }

        let active = input.active_page.min(count - 1);
        let tiles = params.tiles();
        let displayed = match params.mode {
            LayoutMode::SinglePage => active..active + 1,
            LayoutMode::TilesLine => {
                let first = active / tiles * tiles;
                first..(first + tiles).min(count)
            }
            _ => 0..count,
        };

        let mut pass = Pass {
            params,
            viewport: input.viewport,
            culling: count > params.culling_threshold,
            sizes,
            last_known: None,
            queries: 0,
        };

        let (axis, row_len) = match params.mode {
            LayoutMode::SinglePage => (Axis::Vertical, 1),
            LayoutMode::TilesLine => (Axis::Vertical, tiles),
            mode => (mode.stacking_axis(), tiles),
        };
        let extent = self.layout_grid(&mut pass, displayed.clone(), axis, row_len);

        if params.mode.is_single() {
            self.park_hidden_pages(&displayed, params);
        }

        let derived = if params.sizing.is_fit() {
            self.rects
                .get(active)
                .filter(|rect| rect.is_computed)
                .and_then(|rect| {
                    self.intrinsic_size(active)
                        .and_then(|intrinsic| derived_zoom(intrinsic, rect.rect.size()))
                })
        } else {
            None
        };

        debug!(
            "layout {}: {} pages, extent {:.1}x{:.1}, {} size queries",
            params.mode.as_str(),
            count,
            extent.width,
            extent.height,
            pass.queries
        );

        self.extent = extent;
        self.displayed = displayed.clone();
        LayoutOutcome {
            extent,
            displayed,
            derived_zoom: derived,
            size_queries: pass.queries,
        }
    }

    /// Intrinsic size for a page and whether it is exact.
    fn measure(&mut self, page: usize, exact: bool, pass: &mut Pass<'_>) -> (SizeF, bool) {
        if let Some(size) = self.intrinsic[page] {
            pass.last_known = Some(size);
            return (size, true);
        }
        match pass.last_known {
            Some(known) if !exact => (known, false),
            _ => {
                let size = (pass.sizes)(page).sanitized();
                pass.queries += 1;
                self.intrinsic[page] = Some(size);
                pass.last_known = Some(size);
                (size, true)
            }
        }
    }

    fn layout_grid(
        &mut self,
        pass: &mut Pass<'_>,
        pages: Range<usize>,
        main: Axis,
        tiles: usize,
    ) -> SizeF {
        let params = pass.params;
        let cross = main.cross();
        let margin = params.page_margin.clamped();
        let padding = params.padding.clamped();
        let available = available_size(params, pass.viewport.size(), cross, tiles);

        let mut rows: Vec<Row> = Vec::new();
        let mut cursor = padding.leading(main);
        let mut row_start = pages.start;
        while row_start < pages.end {
            let row_end = (row_start + tiles).min(pages.end);
            let main_pos = cursor + margin.leading(main);
            let mut cross_cursor = padding.leading(cross);
            let mut main_len: f32 = 0.0;

            for page in row_start..row_end {
                let cross_pos = cross_cursor + margin.leading(cross);
                let mut exact = !pass.culling;
                let mut placed = PageRect::default();
                for _attempt in 0..2 {
                    let (intrinsic, is_exact) = self.measure(page, exact, pass);
                    let size = render_size(intrinsic, available, params.sizing, params.zoom);
                    let rect = compose(main, main_pos, cross_pos, size);
                    placed = PageRect {
                        rect,
                        is_computed: is_exact,
                    };
                    if is_exact || !overlaps(rect.span(main), pass.viewport.span(main)) {
                        break;
                    }
                    trace!("page {page} became visible with a placeholder size, measuring");
                    exact = true;
                }
                self.rects[page] = placed;
                cross_cursor = cross_pos + placed.rect.size().get(cross);
                main_len = main_len.max(placed.rect.size().get(main));
            }

            rows.push(Row {
                pages: row_start..row_end,
                main_len,
                cross_len: cross_cursor + margin.trailing(cross) + padding.trailing(cross),
            });
            cursor = main_pos + main_len;
            row_start = row_end;
        }

        let main_extent = cursor + padding.trailing(main);
        let cross_extent = rows
            .iter()
            .map(|row| row.cross_len)
            .fold(padding.leading(cross) + padding.trailing(cross), f32::max);

        // Pages inside their row, then rows against the widest row.
        let main_factor = params.alignment.factor(main);
        let cross_factor = params.alignment.factor(cross);
        for row in &rows {
            let row_shift = (cross_extent - row.cross_len) * cross_factor;
            for page in row.pages.clone() {
                let rect = &mut self.rects[page].rect;
                let page_shift = (row.main_len - rect.size().get(main)) * main_factor;
                *rect = shift(shift(*rect, main, page_shift), cross, row_shift);
            }
        }

        let extent = compose_size(main, main_extent, cross_extent);
        let viewport = pass.viewport.size();
        let dx = free_space(viewport.width, extent.width) * params.alignment.factor(Axis::Horizontal);
        let dy = free_space(viewport.height, extent.height) * params.alignment.factor(Axis::Vertical);
        if dx > 0.0 || dy > 0.0 {
            for page in pages {
                let rect = &mut self.rects[page].rect;
                *rect = rect.translated(dx, dy);
            }
        }

        extent
    }

    /// Give pages outside the displayed group a stale rectangle at the
    /// group origin, keeping their last-known size.
    fn park_hidden_pages(&mut self, displayed: &Range<usize>, params: &LayoutParams) {
        let origin = self.rects[displayed.start].rect.origin();
        for page in (0..self.rects.len()).filter(|p| !displayed.contains(p)) {
            let last = self.rects[page].rect.size();
            let size = if last.is_empty() {
                self.intrinsic[page]
                    .map(|s| s.scaled(params.zoom))
                    .unwrap_or(SizeF::ZERO)
            } else {
                last
            };
            self.rects[page] = PageRect::placeholder(RectF::from_origin_size(origin, size));
        }
    }
}

/// Room available to a single page
fn available_size(params: &LayoutParams, viewport: SizeF, tiled_axis: Axis, tiles: usize) -> SizeF {
    let margin = params.page_margin.clamped();
    let padding = params.padding.clamped();
    let mut width = viewport.width - padding.horizontal();
    let mut height = viewport.height - padding.vertical();
    if tiles > 1 {
        match tiled_axis {
            Axis::Horizontal => width /= tiles as f32,
            Axis::Vertical => height /= tiles as f32,
        }
    }
    width -= margin.horizontal();
    height -= margin.vertical();
    SizeF::new(width, height).sanitized()
}

fn compose(main: Axis, main_pos: f32, cross_pos: f32, size: SizeF) -> RectF {
    let origin = match main {
        Axis::Vertical => PointF::new(cross_pos, main_pos),
        Axis::Horizontal => PointF::new(main_pos, cross_pos),
    };
    RectF::from_origin_size(origin, size)
}

fn compose_size(main: Axis, main_len: f32, cross_len: f32) -> SizeF {
    match main {
        Axis::Vertical => SizeF::new(cross_len, main_len),
        Axis::Horizontal => SizeF::new(main_len, cross_len),
    }
}

fn shift(rect: RectF, axis: Axis, by: f32) -> RectF {
    match axis {
        Axis::Horizontal => rect.translated(by, 0.0),
        Axis::Vertical => rect.translated(0.0, by),
    }
}

fn free_space(viewport: f32, content: f32) -> f32 {
    if viewport > content { viewport - content } else { 0.0 }
}

/// Open-interval overlap; a zero-length span strictly inside still counts
pub(crate) fn overlaps(a: (f32, f32), b: (f32, f32)) -> bool {
    (a.0 < b.1 && b.0 < a.1) || (a.0 == a.1 && a.0 > b.0 && a.0 < b.1)
}
