//! Document viewer state
//!
//! Ties the layout engine, scroll model, render scheduler and selection
//! state to one document engine. Navigation, painting and text queries
//! live in sibling modules as further `impl` blocks.

use std::ops::RangeInclusive;

use log::{debug, info, warn};

use crate::document::{DocumentChange, DocumentEngine, LoadFault};
use crate::error::Result;
use crate::settings::Settings;
use crate::view::{
    CharPosition, Command, DeviceMapping, Effect, EventQueue, HighlightStore, LayoutEngine,
    LayoutInput, PageCache, PageGeometry, PageRect, RenderScheduler, SelectionSpan, SizeF,
    TextSelection, ViewState, ViewerEvent, ViewportState,
};

/// Holds at most one document; attaching a new one hands back the old one
#[derive(Debug)]
pub struct DocumentSlot<E> {
    engine: Option<E>,
}

impl<E> Default for DocumentSlot<E> {
    fn default() -> Self {
        Self { engine: None }
    }
}

impl<E: DocumentEngine> DocumentSlot<E> {
    /// Attach `engine`, returning the previously attached one
    pub fn attach(&mut self, engine: E) -> Option<E> {
        self.engine.replace(engine)
    }

    pub fn detach(&mut self) -> Option<E> {
        self.engine.take()
    }

    pub fn get(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    pub fn is_attached(&self) -> bool {
        self.engine.is_some()
    }
}

/// Interactive view over one paginated document
pub struct DocumentViewer<E: DocumentEngine = Box<dyn DocumentEngine>> {
    pub(super) slot: DocumentSlot<E>,
    pub(super) state: ViewState,
    pub(super) layout: LayoutEngine,
    pub(super) viewport: ViewportState,
    pub(super) scheduler: RenderScheduler,
    pub(super) cache: PageCache,
    pub(super) selection: TextSelection,
    /// Character under the pointer when the current drag began
    pub(super) drag_anchor: Option<CharPosition>,
    pub(super) highlights: HighlightStore,
    pub(super) events: EventQueue,
    pub(super) layout_valid: bool,
}

impl<E: DocumentEngine> Default for DocumentViewer<E> {
    fn default() -> Self {
        Self::new(ViewState::default())
    }
}

impl<E: DocumentEngine> DocumentViewer<E> {
    #[must_use]
    pub fn new(state: ViewState) -> Self {
        let mut scheduler = RenderScheduler::new(state.progressive);
        scheduler.set_flags(state.render_flags);
        Self {
            slot: DocumentSlot::default(),
            viewport: ViewportState::new(state.content_viewport()),
            scheduler,
            state,
            layout: LayoutEngine::default(),
            cache: PageCache::default(),
            selection: TextSelection::new(),
            drag_anchor: None,
            highlights: HighlightStore::new(),
            events: EventQueue::default(),
            layout_valid: false,
        }
    }

    #[must_use]
    pub fn with_settings(settings: &Settings) -> Self {
        let mut viewer = Self::new(settings.view_state());
        viewer.cache.set_capacity(settings.page_cache);
        viewer
    }

    /// Show `engine`, releasing any previously open document
    pub fn open(&mut self, engine: E) {
        if self.slot.attach(engine).is_some() {
            debug!("previous document released");
            self.events.push(ViewerEvent::DocumentClosed);
        }
        self.reset_document_state();

        let page_count = match self.slot.get_mut() {
            Some(engine) => {
                // Changes made before the viewer saw the document are moot
                engine.drain_changes();
                engine.page_count()
            }
            None => 0,
        };
        self.state.active_page = 0;
        let effects = self.state.apply(Command::SetPageCount(page_count));
        self.run_effects(effects);

        info!("document opened with {page_count} pages");
        self.events.push(ViewerEvent::DocumentLoaded { page_count });
    }

    /// Open the document produced by `loader`. On failure the viewer is
    /// left without a document.
    pub fn load(&mut self, loader: impl FnOnce() -> Result<E, LoadFault>) -> Result<()> {
        match loader() {
            Ok(engine) => {
                self.open(engine);
                Ok(())
            }
            Err(fault) => {
                warn!("failed to load document: {fault}");
                self.close();
                Err(fault.into())
            }
        }
    }

    /// Release the current document, handing it back
    pub fn close(&mut self) -> Option<E> {
        let engine = self.slot.detach()?;
        self.reset_document_state();
        let effects = self.state.apply(Command::SetPageCount(0));
        self.run_effects(effects);
        info!("document closed");
        self.events.push(ViewerEvent::DocumentClosed);
        Some(engine)
    }

    fn reset_document_state(&mut self) {
        self.selection.clear();
        self.drag_anchor = None;
        self.highlights.clear();
        self.scheduler.invalidate();
        self.cache.invalidate_all();
        self.layout.reset(0);
        self.viewport = ViewportState::new(self.state.content_viewport());
        self.layout_valid = false;
    }

    pub fn has_document(&self) -> bool {
        self.slot.is_attached()
    }

    pub fn engine(&self) -> Option<&E> {
        self.slot.get()
    }

    /// Mutable access to the engine; changes it reports are picked up by
    /// the next viewer call
    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.slot.get_mut()
    }

    pub fn page_count(&self) -> usize {
        self.slot.get().map_or(0, |engine| engine.page_count())
    }

    pub fn view_state(&self) -> &ViewState {
        &self.state
    }

    pub fn current_page(&self) -> usize {
        self.state.active_page
    }

    pub fn extent(&mut self) -> SizeF {
        self.ensure_layout();
        self.viewport.extent()
    }

    pub fn page_rects(&mut self) -> &[PageRect] {
        self.ensure_layout();
        self.layout.rects()
    }

    /// Contiguous span of displayed pages intersecting the viewport
    pub fn visible_range(&mut self) -> Option<RangeInclusive<usize>> {
        self.ensure_layout();
        self.viewport
            .visible_range(self.layout.rects(), self.layout.displayed())
    }

    pub fn highlights(&self) -> &HighlightStore {
        &self.highlights
    }

    /// Raw selection in the order it was made
    pub fn selection(&self) -> Option<SelectionSpan> {
        self.selection.span()
    }

    /// Change a view setting
    pub fn apply(&mut self, cmd: Command) {
        let effects = self.state.apply(cmd);
        self.run_effects(effects);
        self.scheduler.set_progressive(self.state.progressive);
        self.scheduler.set_flags(self.state.render_flags);
    }

    pub fn take_events(&mut self) -> Vec<ViewerEvent> {
        self.events.take()
    }

    pub(super) fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ResetPageRects => self.layout.reset(self.state.page_count),
                Effect::InvalidateLayout => {
                    self.layout.invalidate_all();
                    self.layout_valid = false;
                }
                Effect::InvalidateCanvas => self.scheduler.invalidate(),
                Effect::Emit(event) => self.events.push(event),
            }
        }
    }

    /// Apply structural changes reported by the engine since the last call
    pub(super) fn sync_document(&mut self) -> bool {
        let Some(engine) = self.slot.get_mut() else {
            return false;
        };
        let changes = engine.drain_changes();
        if changes.is_empty() {
            return false;
        }
        let page_count = engine.page_count();
        debug!("document changed: {changes:?}");

        let mut structural = false;
        let mut highlights_moved = false;
        for change in changes {
            match change {
                DocumentChange::PagesInserted { index, count } => {
                    structural = true;
                    highlights_moved |= self.highlights.pages().any(|p| p >= index);
                    self.highlights.pages_inserted(index, count);
                }
                DocumentChange::PagesRemoved { index, count } => {
                    structural = true;
                    highlights_moved |= self.highlights.pages().any(|p| p >= index);
                    self.highlights.pages_removed(index, count);
                }
                DocumentChange::PageRotated(page) | DocumentChange::PageContentChanged(page) => {
                    self.layout.invalidate_page(page);
                    self.cache.invalidate_page(page);
                    self.scheduler.invalidate_page(page);
                }
            }
        }

        if structural {
            self.cache.invalidate_all();
            self.scheduler.invalidate();
            let effects = self.state.apply(Command::SetPageCount(page_count));
            self.run_effects(effects);
        }
        self.drag_anchor = None;
        if self.selection.clear() {
            self.events.push(ViewerEvent::SelectionChanged);
        }
        if highlights_moved {
            self.events.push(ViewerEvent::HighlightedTextChanged);
        }
        self.layout_valid = false;
        true
    }

    /// Bring page rectangles, extent and current page up to date
    pub(super) fn ensure_layout(&mut self) {
        self.sync_document();
        let viewport_changed = self
            .viewport
            .set_viewport_size(self.state.content_viewport());
        let Some(engine) = self.slot.get_mut() else {
            return;
        };
        if self.layout_valid && !self.layout.needs_relayout(&self.viewport.visible_rect()) {
            if viewport_changed {
                self.scheduler.invalidate();
            }
            return;
        }

        let before = self.layout.rects().to_vec();
        let mut derived = None;
        let mut offset_moved = viewport_changed;
        // A placeholder that lands in view is measured; one more pass settles it
        for _attempt in 0..2 {
            let input = LayoutInput {
                viewport: self.viewport.visible_rect(),
                active_page: self.state.active_page,
            };
            let outcome =
                self.layout
                    .layout(&self.state.layout, input, &mut |page| engine.page_size(page));
            offset_moved |= self.viewport.set_extent(outcome.extent);
            derived = outcome.derived_zoom;
            if !self.layout.needs_relayout(&self.viewport.visible_rect()) {
                break;
            }
        }
        self.layout_valid = true;
        // Pages painted at their old place are stale once anything moved
        if offset_moved || self.layout.rects() != before.as_slice() {
            self.scheduler.invalidate();
        }

        if let Some(zoom) = derived {
            let echo = self.state.echo().clone();
            let _guard = echo.enter();
            let effects = self.state.apply(Command::SetZoom(zoom));
            self.run_effects(effects);
        }
        self.update_current_page();
    }

    pub(super) fn update_current_page(&mut self) {
        if self.state.layout.mode.is_single() {
            return;
        }
        let current = self
            .viewport
            .current_page(self.layout.rects(), self.layout.displayed());
        if let Some(page) = current {
            let effects = self.state.apply(Command::SetActivePage(page));
            self.run_effects(effects);
        }
    }

    pub(super) fn mapping(&self) -> DeviceMapping {
        DeviceMapping {
            scroll_offset: self.viewport.offset(),
            pixels_per_unit: self.state.pixels_per_unit,
        }
    }

    pub(super) fn geometry(&mut self, page: usize) -> Option<PageGeometry> {
        let rect = self.layout.rect(page)?;
        let cached = self.layout.intrinsic_size(page);
        let engine = self.slot.get_mut()?;
        let page_size = cached.unwrap_or_else(|| engine.page_size(page));
        Some(PageGeometry {
            rect: rect.rect,
            page_size,
            rotation: engine.page_rotation(page).effective(),
        })
    }
}
