//! Zoom factor and sizing policy
//!
//! Computes rendered page sizes per sizing policy and holds the guard that
//! keeps a zoom value derived by layout from feeding back into layout.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::types::SizeF;

/// How a page's rendered size is chosen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingPolicy {
    /// Scale pages to the available width
    FitWidth,
    /// Scale pages to the available height
    FitHeight,
    /// Largest size that fits both bounds
    #[default]
    FitBoth,
    /// Intrinsic size times the zoom factor
    FixedZoom,
}

impl SizingPolicy {
    pub fn is_fit(self) -> bool {
        !matches!(self, Self::FixedZoom)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizingPolicy::FitWidth => "fit_width",
            SizingPolicy::FitHeight => "fit_height",
            SizingPolicy::FitBoth => "fit_both",
            SizingPolicy::FixedZoom => "fixed_zoom",
        }
    }
}

/// Zoom factor state
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Zoom {
    /// Current zoom factor (1.0 = 100%)
    pub factor: f32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

impl Zoom {
    /// Zoom in rate multiplier per step - 10%
    pub const ZOOM_IN_RATE: f32 = 1.1;
    /// Zoom out rate divisor per step - 5%
    pub const ZOOM_OUT_RATE: f32 = 1.05;
    /// Minimum allowed zoom factor
    pub const MIN_SCALE: f32 = 0.1;
    /// Maximum allowed zoom factor
    pub const MAX_SCALE: f32 = 64.0;

    pub fn new(factor: f32) -> Self {
        Self {
            factor: Self::clamp_factor(factor),
        }
    }

    /// Returns the current zoom factor
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Zoom in by one step
    pub fn step_in(&mut self) {
        self.factor = Self::clamp_factor(self.factor * Self::ZOOM_IN_RATE);
    }

    /// Zoom out by one step
    pub fn step_out(&mut self) {
        self.factor = Self::clamp_factor(self.factor / Self::ZOOM_OUT_RATE);
    }

    /// Clamp factor to valid range, handling NaN/Inf
    pub fn clamp_factor(factor: f32) -> f32 {
        if !factor.is_finite() {
            1.0
        } else {
            factor.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
        }
    }
}

/// Rendered size of a page with the given intrinsic size.
///
/// `available` is the room one page may take; it only matters for the fit
/// policies. Degenerate inputs produce a zero size rather than NaN.
#[must_use]
pub fn render_size(intrinsic: SizeF, available: SizeF, policy: SizingPolicy, zoom: f32) -> SizeF {
    let intrinsic = intrinsic.sanitized();
    let available = available.sanitized();
    if intrinsic.is_empty() {
        return SizeF::ZERO;
    }

    let width_scale = available.width / intrinsic.width;
    let height_scale = available.height / intrinsic.height;
    let scale = match policy {
        SizingPolicy::FitWidth => width_scale,
        SizingPolicy::FitHeight => height_scale,
        SizingPolicy::FitBoth => width_scale.min(height_scale),
        SizingPolicy::FixedZoom => Zoom::clamp_factor(zoom),
    };
    intrinsic.scaled(scale)
}

/// Zoom factor implied by a rendered size, for zoom readouts in fit modes
#[must_use]
pub fn derived_zoom(intrinsic: SizeF, rendered: SizeF) -> Option<f32> {
    let intrinsic = intrinsic.sanitized();
    if intrinsic.width <= 0.0 {
        return None;
    }
    let factor = rendered.sanitized().width / intrinsic.width;
    (factor > 0.0).then_some(factor)
}

/// Scoped suppression of zoom echoes.
///
/// While an [`EchoGuard`] is alive, zoom values recorded by the layout pass
/// must not invalidate layout again.
#[derive(Clone, Debug, Default)]
pub struct EchoSuppressor {
    active: Rc<Cell<bool>>,
}

impl EchoSuppressor {
    /// Enter the guarded scope; `None` if a guard is already alive
    pub fn enter(&self) -> Option<EchoGuard> {
        if self.active.replace(true) {
            return None;
        }
        Some(EchoGuard {
            active: Rc::clone(&self.active),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

/// Releases the suppression when dropped
#[derive(Debug)]
pub struct EchoGuard {
    active: Rc<Cell<bool>>,
}

impl Drop for EchoGuard {
    fn drop(&mut self) {
        self.active.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_both_never_exceeds_either_bound() {
        let size = render_size(
            SizeF::new(100.0, 200.0),
            SizeF::new(300.0, 300.0),
            SizingPolicy::FitBoth,
            1.0,
        );
        assert_eq!(size, SizeF::new(150.0, 300.0));
    }

    #[test]
    fn fit_width_and_height_scale_one_axis() {
        let page = SizeF::new(100.0, 200.0);
        let room = SizeF::new(50.0, 100.0);
        assert_eq!(
            render_size(page, room, SizingPolicy::FitWidth, 1.0),
            SizeF::new(50.0, 100.0)
        );
        assert_eq!(
            render_size(page, SizeF::new(1000.0, 100.0), SizingPolicy::FitHeight, 1.0),
            SizeF::new(50.0, 100.0)
        );
    }

    #[test]
    fn fixed_zoom_multiplies_intrinsic_size() {
        let size = render_size(
            SizeF::new(100.0, 50.0),
            SizeF::ZERO,
            SizingPolicy::FixedZoom,
            2.0,
        );
        assert_eq!(size, SizeF::new(200.0, 100.0));
    }

    #[test]
    fn degenerate_page_renders_as_zero() {
        for policy in [
            SizingPolicy::FitWidth,
            SizingPolicy::FitHeight,
            SizingPolicy::FitBoth,
            SizingPolicy::FixedZoom,
        ] {
            let size = render_size(SizeF::new(0.0, 100.0), SizeF::new(10.0, 10.0), policy, 1.0);
            assert_eq!(size, SizeF::ZERO);
            let size = render_size(SizeF::new(f32::NAN, 1.0), SizeF::new(10.0, 10.0), policy, 1.0);
            assert_eq!(size, SizeF::ZERO);
        }
    }

    #[test]
    fn derived_zoom_matches_fit_scale() {
        let intrinsic = SizeF::new(200.0, 100.0);
        let rendered = render_size(intrinsic, SizeF::new(100.0, 100.0), SizingPolicy::FitWidth, 1.0);
        assert_eq!(derived_zoom(intrinsic, rendered), Some(0.5));
        assert_eq!(derived_zoom(SizeF::ZERO, rendered), None);
    }

    #[test]
    fn zoom_steps_are_clamped() {
        let mut zoom = Zoom::new(Zoom::MIN_SCALE);
        zoom.step_out();
        assert_eq!(zoom.factor(), Zoom::MIN_SCALE);
        zoom.step_in();
        assert!(zoom.factor() > Zoom::MIN_SCALE);
        assert_eq!(Zoom::clamp_factor(f32::INFINITY), 1.0);
    }

    #[test]
    fn echo_guard_is_scoped_and_not_reentrant() {
        let echo = EchoSuppressor::default();
        {
            let guard = echo.enter();
            assert!(guard.is_some());
            assert!(echo.is_active());
            assert!(echo.enter().is_none());
        }
        assert!(!echo.is_active());
        assert!(echo.enter().is_some());
    }

    #[test]
    fn clones_share_one_guard() {
        let echo = EchoSuppressor::default();
        let copy = echo.clone();
        let guard = copy.enter();
        assert!(echo.is_active());
        drop(guard);
        assert!(!echo.is_active());
    }
}
