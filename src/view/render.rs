//! Progressive render scheduler
//!
//! Owns the shared canvas and the per-page render status. Each paint pass
//! gives every unfinished visible page one render increment (or renders it
//! to completion when progressive rendering is off). The engine may mutate
//! the document from inside a render call; a changed revision makes the
//! canvas stale and the pass starts over on a fresh one.

use std::collections::{HashMap, VecDeque};

use log::{debug, warn};

use crate::document::{DocumentEngine, EngineFault, RenderFlags, RenderProgress, RenderRequest};

use super::canvas::Canvas;
use super::transform::Rotation;
use super::types::{Color, RectF};

/// Times a pass may restart after the document changed under it
const MAX_RESTARTS: usize = 2;

/// Render calls spent on one page when progressive rendering is off
const MAX_BLOCKING_STEPS: usize = 256;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PageRenderStatus {
    #[default]
    NotStarted,
    Rendering,
    Paused,
    Done,
}

/// One visible page to paint
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaintTarget {
    pub page: usize,
    /// Page rectangle in device pixels
    pub dest: RectF,
    pub rotation: Rotation,
}

/// Result of a paint pass
#[derive(Debug, Default, PartialEq)]
pub struct PaintReport {
    /// The host must call paint again on its next idle tick
    pub needs_tick: bool,
    /// Every target page is done
    pub complete: bool,
    /// Pages that received a render increment, in order
    pub rendered: Vec<usize>,
    /// Restarts caused by document changes during the pass
    pub restarts: usize,
    /// Pages the engine failed to render; they are not retried
    pub failures: Vec<(usize, EngineFault)>,
}

enum PageOutcome {
    Progress(RenderProgress),
    Failed(EngineFault),
    Stale,
}

#[derive(Debug)]
pub struct RenderScheduler {
    canvas: Option<Canvas>,
    status: HashMap<usize, PageRenderStatus>,
    /// Paused pages, resumed first on the next pass
    paused: VecDeque<usize>,
    progressive: bool,
    flags: RenderFlags,
    background: Color,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RenderScheduler {
    #[must_use]
    pub fn new(progressive: bool) -> Self {
        Self {
            canvas: None,
            status: HashMap::new(),
            paused: VecDeque::new(),
            progressive,
            flags: RenderFlags::default(),
            background: Color::WHITE,
        }
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn status(&self, page: usize) -> PageRenderStatus {
        self.status.get(&page).copied().unwrap_or_default()
    }

    pub fn is_progressive(&self) -> bool {
        self.progressive
    }

    /// Switching modes discards the canvas
    pub fn set_progressive(&mut self, progressive: bool) {
        if self.progressive != progressive {
            self.progressive = progressive;
            self.invalidate();
        }
    }

    pub fn set_flags(&mut self, flags: RenderFlags) {
        if self.flags != flags {
            self.flags = flags;
            self.invalidate();
        }
    }

    /// Drop the canvas and every page's progress
    pub fn invalidate(&mut self) {
        if self.canvas.is_some() {
            debug!("render canvas released");
        }
        self.canvas = None;
        self.status.clear();
        self.paused.clear();
    }

    /// Restart one page on the next pass
    pub fn invalidate_page(&mut self, page: usize) {
        self.status.remove(&page);
        self.paused.retain(|&p| p != page);
    }

    /// Interrupt a page that is mid-render
    pub fn pause(&mut self, page: usize) -> bool {
        match self.status.get_mut(&page) {
            Some(status) if *status == PageRenderStatus::Rendering => {
                *status = PageRenderStatus::Paused;
                self.paused.push_back(page);
                true
            }
            _ => false,
        }
    }

    pub fn pause_all(&mut self) {
        let mut rendering: Vec<usize> = self
            .status
            .iter()
            .filter(|(_, s)| **s == PageRenderStatus::Rendering)
            .map(|(&page, _)| page)
            .collect();
        rendering.sort_unstable();
        for page in rendering {
            self.pause(page);
        }
    }

    /// True once every target page is done
    pub fn is_complete(&self, targets: &[PaintTarget]) -> bool {
        self.canvas.is_some()
            && targets
                .iter()
                .all(|t| self.status(t.page) == PageRenderStatus::Done)
    }

    /// Run one paint pass over the visible pages.
    ///
    /// `size` is the canvas size in device pixels. A canvas of another size
    /// is replaced whole, which restarts every page.
    pub fn paint(
        &mut self,
        engine: &mut dyn DocumentEngine,
        size: (u32, u32),
        targets: &[PaintTarget],
    ) -> PaintReport {
        let mut report = PaintReport::default();

        'pass: loop {
            self.ensure_canvas(size);
            let revision = engine.revision();
            report.rendered.clear();
            report.failures.clear();

            for target in self.order(targets) {
                let status = self.status(target.page);
                if status == PageRenderStatus::Done {
                    continue;
                }

                match self.render_page(engine, &target, status, revision) {
                    PageOutcome::Stale => {
                        report.restarts += 1;
                        self.invalidate();
                        if report.restarts > MAX_RESTARTS {
                            warn!(
                                "document kept changing during paint, giving up after {} restarts",
                                MAX_RESTARTS
                            );
                            report.needs_tick = true;
                            return report;
                        }
                        debug!("document changed while painting page {}, restarting pass", target.page);
                        continue 'pass;
                    }
                    PageOutcome::Failed(fault) => {
                        warn!("{fault}");
                        self.status.insert(target.page, PageRenderStatus::Done);
                        report.failures.push((target.page, fault));
                    }
                    PageOutcome::Progress(progress) => {
                        let next = match progress {
                            RenderProgress::Done => PageRenderStatus::Done,
                            RenderProgress::NeedsMore => PageRenderStatus::Rendering,
                        };
                        self.status.insert(target.page, next);
                        report.rendered.push(target.page);
                    }
                }
            }
            break;
        }

        let status = &self.status;
        self.paused
            .retain(|page| status.get(page) == Some(&PageRenderStatus::Paused));
        report.complete = self.is_complete(targets);
        report.needs_tick = !report.complete;
        report
    }

    fn ensure_canvas(&mut self, (width, height): (u32, u32)) {
        let fits = self
            .canvas
            .as_ref()
            .is_some_and(|c| c.dimensions() == (width, height));
        if !fits {
            self.invalidate();
            debug!("render canvas allocated {width}x{height}");
            self.canvas = Some(Canvas::new(width, height, self.background));
        }
    }

    /// Paused pages first, then the rest in target order
    fn order(&self, targets: &[PaintTarget]) -> Vec<PaintTarget> {
        let mut ordered: Vec<PaintTarget> = self
            .paused
            .iter()
            .filter_map(|&page| targets.iter().find(|t| t.page == page).copied())
            .collect();
        ordered.extend(
            targets
                .iter()
                .filter(|t| !self.paused.contains(&t.page))
                .copied(),
        );
        ordered
    }

    fn render_page(
        &mut self,
        engine: &mut dyn DocumentEngine,
        target: &PaintTarget,
        status: PageRenderStatus,
        revision: u64,
    ) -> PageOutcome {
        let Some(canvas) = self.canvas.as_mut() else {
            return PageOutcome::Stale;
        };
        let mut request = RenderRequest {
            page: target.page,
            dest: target.dest,
            rotation: target.rotation,
            flags: self.flags,
            resume: matches!(
                status,
                PageRenderStatus::Rendering | PageRenderStatus::Paused
            ),
        };
        if !request.resume {
            canvas.fill_rect(&target.dest, self.background);
        }

        let steps = if self.progressive { 1 } else { MAX_BLOCKING_STEPS };
        let mut progress = RenderProgress::NeedsMore;
        for _ in 0..steps {
            progress = match engine.render(&request, canvas) {
                Ok(progress) => progress,
                Err(fault) => return PageOutcome::Failed(fault),
            };
            if engine.revision() != revision {
                return PageOutcome::Stale;
            }
            if progress == RenderProgress::Done {
                break;
            }
            request.resume = true;
        }

        if !self.progressive && progress == RenderProgress::NeedsMore {
            warn!(
                "page {} not finished after {} render steps",
                target.page, MAX_BLOCKING_STEPS
            );
        }
        PageOutcome::Progress(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FixtureDocument;

    fn targets(pages: &[usize]) -> Vec<PaintTarget> {
        pages
            .iter()
            .map(|&page| PaintTarget {
                page,
                dest: RectF::new(0.0, page as f32 * 10.0, 20.0, 10.0),
                rotation: Rotation::None,
            })
            .collect()
    }

    #[test]
    fn progressive_pass_gives_one_increment_per_page() {
        let mut doc = FixtureDocument::uniform(2, 20.0, 10.0).with_render_steps(3);
        let mut scheduler = RenderScheduler::new(true);
        let visible = targets(&[0, 1]);

        let report = scheduler.paint(&mut doc, (20, 20), &visible);
        assert_eq!(report.rendered, vec![0, 1]);
        assert!(report.needs_tick);
        assert_eq!(scheduler.status(0), PageRenderStatus::Rendering);

        scheduler.paint(&mut doc, (20, 20), &visible);
        let report = scheduler.paint(&mut doc, (20, 20), &visible);
        assert!(report.complete);
        assert!(!report.needs_tick);

        let report = scheduler.paint(&mut doc, (20, 20), &visible);
        assert!(report.rendered.is_empty());
    }

    #[test]
    fn blocking_mode_finishes_in_one_pass() {
        let mut doc = FixtureDocument::uniform(2, 20.0, 10.0).with_render_steps(5);
        let mut scheduler = RenderScheduler::new(false);
        let report = scheduler.paint(&mut doc, (20, 20), &targets(&[0, 1]));
        assert!(report.complete);
        assert_eq!(doc.render_log().len(), 10);
    }

    #[test]
    fn paused_page_resumes_first() {
        let mut doc = FixtureDocument::uniform(3, 20.0, 10.0).with_render_steps(3);
        let mut scheduler = RenderScheduler::new(true);
        let visible = targets(&[0, 1, 2]);
        scheduler.paint(&mut doc, (20, 30), &visible);

        assert!(scheduler.pause(2));
        assert_eq!(scheduler.status(2), PageRenderStatus::Paused);
        let report = scheduler.paint(&mut doc, (20, 30), &visible);
        assert_eq!(report.rendered, vec![2, 0, 1]);
        assert!(doc.render_log().last().is_some_and(|r| r.resume));
    }

    #[test]
    fn pause_all_only_touches_rendering_pages() {
        let mut doc = FixtureDocument::uniform(2, 20.0, 10.0).with_render_steps(2);
        let mut scheduler = RenderScheduler::new(true);
        scheduler.paint(&mut doc, (20, 20), &targets(&[0]));
        scheduler.pause_all();
        assert_eq!(scheduler.status(0), PageRenderStatus::Paused);
        assert_eq!(scheduler.status(1), PageRenderStatus::NotStarted);
        assert!(!scheduler.pause(1));
    }

    #[test]
    fn resize_reallocates_and_restarts() {
        let mut doc = FixtureDocument::uniform(1, 20.0, 10.0).with_render_steps(2);
        let mut scheduler = RenderScheduler::new(true);
        scheduler.paint(&mut doc, (20, 10), &targets(&[0]));
        scheduler.paint(&mut doc, (40, 10), &targets(&[0]));
        assert_eq!(scheduler.canvas().map(Canvas::dimensions), Some((40, 10)));
        assert!(!doc.render_log()[1].resume);
    }

    #[test]
    fn mutation_during_render_restarts_on_fresh_canvas() {
        let mut doc = FixtureDocument::uniform(2, 20.0, 10.0);
        doc.mutate_while_rendering(1);
        let mut scheduler = RenderScheduler::new(true);
        let report = scheduler.paint(&mut doc, (20, 20), &targets(&[0, 1]));
        assert_eq!(report.restarts, 1);
        assert!(report.complete);
        assert_eq!(report.rendered, vec![0, 1]);
        // 0, 1 (stale), then 0 and 1 again
        assert_eq!(doc.render_log().len(), 4);
    }

    #[test]
    fn turning_progressive_off_discards_canvas() {
        let mut doc = FixtureDocument::uniform(1, 20.0, 10.0);
        let mut scheduler = RenderScheduler::new(true);
        scheduler.paint(&mut doc, (20, 10), &targets(&[0]));
        assert!(scheduler.canvas().is_some());
        scheduler.set_progressive(false);
        assert!(scheduler.canvas().is_none());
        assert_eq!(scheduler.status(0), PageRenderStatus::NotStarted);
    }

    #[test]
    fn engine_failure_is_reported_not_retried() {
        let mut doc = FixtureDocument::uniform(1, 20.0, 10.0);
        let mut scheduler = RenderScheduler::new(true);
        let report = scheduler.paint(&mut doc, (20, 20), &targets(&[0, 7]));
        assert_eq!(report.failures, vec![(7, EngineFault::NoSuchPage(7))]);
        assert!(report.complete);
    }

    #[test]
    fn failures_from_an_aborted_attempt_are_not_repeated() {
        let mut doc = FixtureDocument::uniform(1, 20.0, 10.0);
        doc.mutate_while_rendering(0);
        let mut scheduler = RenderScheduler::new(true);
        let report = scheduler.paint(&mut doc, (20, 20), &targets(&[7, 0]));
        assert_eq!(report.restarts, 1);
        assert_eq!(report.failures, vec![(7, EngineFault::NoSuchPage(7))]);
        assert!(report.complete);
    }
}
