//! View state management

use log::warn;

use crate::document::RenderFlags;

use super::events::ViewerEvent;
use super::layout::{Alignment, LayoutMode, LayoutParams};
use super::types::{SizeF, Thickness};
use super::zoom::{EchoSuppressor, SizingPolicy, Zoom};

/// Everything the host can configure about the view
#[derive(Clone, Debug)]
pub struct ViewState {
    /// Parameters handed to the layout engine
    pub layout: LayoutParams,

    /// Viewport size in device pixels
    pub viewport: SizeF,

    /// Device pixels per content unit
    pub pixels_per_unit: f32,

    /// Render pages over several paint passes
    pub progressive: bool,

    /// Options passed with every render request
    pub render_flags: RenderFlags,

    /// Coalesce selection rectangles into line bands
    pub smooth_selection: bool,

    /// Page shown by the single-page modes and reported as current
    pub active_page: usize,

    /// Total page count
    pub page_count: usize,

    echo: EchoSuppressor,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            layout: LayoutParams::default(),
            viewport: SizeF::ZERO,
            pixels_per_unit: 1.0,
            progressive: true,
            render_flags: RenderFlags::default(),
            smooth_selection: false,
            active_page: 0,
            page_count: 0,
            echo: EchoSuppressor::default(),
        }
    }
}

impl ViewState {
    #[must_use]
    pub fn new(layout: LayoutParams) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Guard used while recording a zoom derived by layout
    pub fn echo(&self) -> &EchoSuppressor {
        &self.echo
    }

    /// Viewport size in content units
    #[must_use]
    pub fn content_viewport(&self) -> SizeF {
        SizeF::new(
            self.viewport.width / self.pixels_per_unit,
            self.viewport.height / self.pixels_per_unit,
        )
        .sanitized()
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::SetMode(mode) => {
                if self.layout.mode == mode {
                    return vec![];
                }
                self.layout.mode = mode;
                vec![
                    Effect::ResetPageRects,
                    Effect::InvalidateLayout,
                    Effect::InvalidateCanvas,
                    Effect::Emit(ViewerEvent::ViewModeChanged(mode)),
                ]
            }

            Command::SetSizing(sizing) => {
                if self.layout.sizing == sizing {
                    return vec![];
                }
                self.layout.sizing = sizing;
                vec![Effect::InvalidateLayout, Effect::InvalidateCanvas]
            }

            Command::SetZoom(zoom) => self.set_zoom(Zoom::clamp_factor(zoom)),

            Command::ZoomIn => {
                let mut zoom = Zoom::new(self.layout.zoom);
                zoom.step_in();
                self.set_zoom(zoom.factor())
            }

            Command::ZoomOut => {
                let mut zoom = Zoom::new(self.layout.zoom);
                zoom.step_out();
                self.set_zoom(zoom.factor())
            }

            Command::SetPageMargin(margin) => {
                let margin = clamp_thickness("page margin", margin);
                Self::relayout_if(&mut self.layout.page_margin, margin)
            }

            Command::SetPadding(padding) => {
                let padding = clamp_thickness("padding", padding);
                Self::relayout_if(&mut self.layout.padding, padding)
            }

            Command::SetAlignment(alignment) => {
                Self::relayout_if(&mut self.layout.alignment, alignment)
            }

            Command::SetTileCount(count) => {
                Self::relayout_if(&mut self.layout.tile_count, count.max(1))
            }

            Command::SetCullingThreshold(threshold) => {
                Self::relayout_if(&mut self.layout.culling_threshold, threshold)
            }

            Command::SetViewportSize(size) => {
                Self::relayout_if(&mut self.viewport, size.sanitized())
            }

            Command::SetPixelsPerUnit(ppu) => {
                let ppu = if ppu.is_finite() && ppu > 0.0 {
                    ppu
                } else {
                    warn!("ignoring pixels per unit {ppu}");
                    return vec![];
                };
                Self::relayout_if(&mut self.pixels_per_unit, ppu)
            }

            Command::SetProgressive(progressive) => {
                if self.progressive == progressive {
                    return vec![];
                }
                self.progressive = progressive;
                vec![Effect::InvalidateCanvas]
            }

            Command::SetRenderFlags(flags) => {
                if self.render_flags == flags {
                    return vec![];
                }
                self.render_flags = flags;
                vec![Effect::InvalidateCanvas]
            }

            Command::SetSmoothSelection(smooth) => {
                if self.smooth_selection == smooth {
                    return vec![];
                }
                self.smooth_selection = smooth;
                vec![Effect::Emit(ViewerEvent::SelectionChanged)]
            }

            Command::SetActivePage(page) => {
                let clamped = page.min(self.page_count.saturating_sub(1));
                if self.active_page == clamped {
                    return vec![];
                }
                self.active_page = clamped;
                let mut effects = vec![];
                if self.layout.mode.is_single() {
                    effects.push(Effect::InvalidateLayout);
                    effects.push(Effect::InvalidateCanvas);
                }
                effects.push(Effect::Emit(ViewerEvent::CurrentPageChanged(clamped)));
                effects
            }

            Command::SetPageCount(count) => {
                self.page_count = count;
                if self.active_page >= count {
                    self.active_page = count.saturating_sub(1);
                }
                vec![
                    Effect::ResetPageRects,
                    Effect::InvalidateLayout,
                    Effect::InvalidateCanvas,
                ]
            }
        }
    }

    fn set_zoom(&mut self, zoom: f32) -> Vec<Effect> {
        let unchanged = (self.layout.zoom - zoom).abs() <= f32::EPSILON;

        // Recorded from a fit layout: report it, nothing to recompute
        if self.echo.is_active() {
            if unchanged {
                return vec![];
            }
            self.layout.zoom = zoom;
            return vec![Effect::Emit(ViewerEvent::ZoomChanged(zoom))];
        }

        if unchanged && !self.layout.sizing.is_fit() {
            return vec![];
        }
        self.layout.zoom = zoom;
        self.layout.sizing = SizingPolicy::FixedZoom;
        vec![
            Effect::InvalidateLayout,
            Effect::InvalidateCanvas,
            Effect::Emit(ViewerEvent::ZoomChanged(zoom)),
        ]
    }

    fn relayout_if<T: PartialEq>(slot: &mut T, value: T) -> Vec<Effect> {
        if *slot == value {
            return vec![];
        }
        *slot = value;
        vec![Effect::InvalidateLayout, Effect::InvalidateCanvas]
    }
}

fn clamp_thickness(what: &str, value: Thickness) -> Thickness {
    let clamped = value.clamped();
    if clamped != value {
        warn!("negative {what} {value:?} clamped to zero");
    }
    clamped
}

/// Commands that modify view state
#[derive(Clone, Debug)]
pub enum Command {
    SetMode(LayoutMode),
    SetSizing(SizingPolicy),
    /// Explicit zoom; switches sizing to [`SizingPolicy::FixedZoom`]
    SetZoom(f32),
    ZoomIn,
    ZoomOut,
    SetPageMargin(Thickness),
    SetPadding(Thickness),
    SetAlignment(Alignment),
    SetTileCount(usize),
    SetCullingThreshold(usize),
    /// Viewport size in device pixels
    SetViewportSize(SizeF),
    SetPixelsPerUnit(f32),
    SetProgressive(bool),
    SetRenderFlags(RenderFlags),
    SetSmoothSelection(bool),
    SetActivePage(usize),
    SetPageCount(usize),
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Recreate the page rectangle array
    ResetPageRects,
    /// Page rectangles must be recomputed before the next paint
    InvalidateLayout,
    /// Discard the render canvas and all render progress
    InvalidateCanvas,
    /// Notify the host
    Emit(ViewerEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> ViewState {
        let mut state = ViewState::default();
        let _ = state.apply(Command::SetPageCount(5));
        state
    }

    #[test]
    fn mode_change_resets_rects_and_notifies() {
        let mut state = test_state();
        let effects = state.apply(Command::SetMode(LayoutMode::TilesVertical));
        assert_eq!(
            effects,
            vec![
                Effect::ResetPageRects,
                Effect::InvalidateLayout,
                Effect::InvalidateCanvas,
                Effect::Emit(ViewerEvent::ViewModeChanged(LayoutMode::TilesVertical)),
            ]
        );
        assert!(state.apply(Command::SetMode(LayoutMode::TilesVertical)).is_empty());
    }

    #[test]
    fn explicit_zoom_switches_to_fixed_zoom() {
        let mut state = test_state();
        assert!(state.layout.sizing.is_fit());
        let effects = state.apply(Command::SetZoom(2.0));
        assert_eq!(state.layout.sizing, SizingPolicy::FixedZoom);
        assert!(effects.contains(&Effect::InvalidateLayout));
        assert!(effects.contains(&Effect::Emit(ViewerEvent::ZoomChanged(2.0))));
    }

    #[test]
    fn derived_zoom_under_guard_does_not_invalidate() {
        let mut state = test_state();
        let echo = state.echo().clone();
        let guard = echo.enter().unwrap();
        let effects = state.apply(Command::SetZoom(0.75));
        drop(guard);
        assert_eq!(effects, vec![Effect::Emit(ViewerEvent::ZoomChanged(0.75))]);
        assert!(state.layout.sizing.is_fit());
        assert_eq!(state.layout.zoom, 0.75);
    }

    #[test]
    fn zoom_steps_use_asymmetric_rates() {
        let mut state = test_state();
        let _ = state.apply(Command::ZoomIn);
        assert!((state.layout.zoom - 1.1).abs() < 1e-6);
        let _ = state.apply(Command::ZoomOut);
        assert!((state.layout.zoom - 1.1 / 1.05).abs() < 1e-6);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut state = test_state();
        let _ = state.apply(Command::SetZoom(0.0));
        assert_eq!(state.layout.zoom, Zoom::MIN_SCALE);
        let _ = state.apply(Command::SetZoom(f32::NAN));
        assert_eq!(state.layout.zoom, 1.0);
    }

    #[test]
    fn negative_margin_is_clamped() {
        let mut state = test_state();
        let _ = state.apply(Command::SetPageMargin(Thickness::uniform(-4.0)));
        assert_eq!(state.layout.page_margin, Thickness::uniform(0.0));
    }

    #[test]
    fn active_page_is_clamped_to_page_count() {
        let mut state = test_state();
        let effects = state.apply(Command::SetActivePage(99));
        assert_eq!(state.active_page, 4);
        assert!(effects.contains(&Effect::Emit(ViewerEvent::CurrentPageChanged(4))));

        let _ = state.apply(Command::SetPageCount(2));
        assert_eq!(state.active_page, 1);
    }

    #[test]
    fn progressive_toggle_invalidates_canvas_only() {
        let mut state = test_state();
        assert_eq!(
            state.apply(Command::SetProgressive(false)),
            vec![Effect::InvalidateCanvas]
        );
        assert!(state.apply(Command::SetProgressive(false)).is_empty());
    }

    #[test]
    fn render_flags_change_repaints() {
        let mut state = test_state();
        let flags = RenderFlags {
            grayscale: true,
            ..RenderFlags::default()
        };
        assert_eq!(
            state.apply(Command::SetRenderFlags(flags)),
            vec![Effect::InvalidateCanvas]
        );
        assert!(state.apply(Command::SetRenderFlags(flags)).is_empty());
        assert!(state.render_flags.grayscale);
    }

    #[test]
    fn content_viewport_divides_by_pixel_ratio() {
        let mut state = test_state();
        let _ = state.apply(Command::SetViewportSize(SizeF::new(200.0, 100.0)));
        let _ = state.apply(Command::SetPixelsPerUnit(2.0));
        assert_eq!(state.content_viewport(), SizeF::new(100.0, 50.0));
        assert!(state.apply(Command::SetPixelsPerUnit(-1.0)).is_empty());
    }
}
