//! Character spans to rectangles
//!
//! Works in page space on the glyph boxes reported by the engine.
//! Whitespace never produces a box. Plain mode returns one rectangle per
//! run of glyphs sharing the same vertical bounds; smooth mode coalesces
//! glyphs into line bands and closes the gaps toward neighboring words so
//! a selection reads as a continuous block across wrapped lines.

use std::ops::Range;

use super::layout::overlaps;
use super::types::{Axis, RectF};

const EPS: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub rect: RectF,
}

impl Glyph {
    #[must_use]
    pub fn new(ch: char, rect: RectF) -> Self {
        Self { ch, rect }
    }

    fn is_blank(&self) -> bool {
        self.ch.is_whitespace()
    }
}

/// Rectangles covering `range`, in page space
pub fn span_rects(
    range: Range<usize>,
    char_count: usize,
    smooth: bool,
    glyph_at: &mut dyn FnMut(usize) -> Option<Glyph>,
) -> Vec<RectF> {
    let range = range.start.min(char_count)..range.end.min(char_count);
    if range.is_empty() {
        return Vec::new();
    }
    let glyphs: Vec<Option<Glyph>> = range.clone().map(&mut *glyph_at).collect();

    if !smooth {
        return plain_runs(&glyphs);
    }

    let mut bands = line_bands(glyphs.iter().flatten());
    let before = fragment_before(range.start, glyph_at);
    let after = fragment_after(range.end, char_count, glyph_at);
    pad_bands(&mut bands, before, after);
    bands
}

/// Runs of consecutive visible glyphs with identical vertical bounds
fn plain_runs(glyphs: &[Option<Glyph>]) -> Vec<RectF> {
    let mut runs: Vec<RectF> = Vec::new();
    let mut open = false;
    for glyph in glyphs {
        let Some(glyph) = glyph.filter(|g| !g.is_blank()) else {
            open = false;
            continue;
        };
        match runs.last_mut() {
            Some(run) if open && same_vertical(run, &glyph.rect) => *run = run.union(&glyph.rect),
            _ => runs.push(glyph.rect),
        }
        open = true;
    }
    runs
}

fn same_vertical(a: &RectF, b: &RectF) -> bool {
    (a.y - b.y).abs() < EPS && (a.bottom() - b.bottom()).abs() < EPS
}

/// Coalesce glyph boxes into row bands
///
/// A glyph joins the running band when it overlaps the band vertically by
/// at least half the band's height; otherwise it starts a new band.
fn line_bands<'a>(glyphs: impl Iterator<Item = &'a Glyph>) -> Vec<RectF> {
    let mut bands: Vec<RectF> = Vec::new();
    for glyph in glyphs.filter(|g| !g.is_blank()) {
        match bands.last_mut() {
            Some(band) if joins_band(band, &glyph.rect) => *band = band.union(&glyph.rect),
            _ => bands.push(glyph.rect),
        }
    }
    bands
}

fn joins_band(band: &RectF, glyph: &RectF) -> bool {
    let overlap = band.bottom().min(glyph.bottom()) - band.y.max(glyph.y);
    overlap >= band.height * 0.5
}

/// Bounding box of the word preceding `index`, skipping blanks
fn fragment_before(
    index: usize,
    glyph_at: &mut dyn FnMut(usize) -> Option<Glyph>,
) -> Option<RectF> {
    let mut i = index;
    let mut fragment: Option<RectF> = None;
    while i > 0 {
        i -= 1;
        let Some(glyph) = glyph_at(i) else {
            break;
        };
        if glyph.is_blank() {
            if fragment.is_some() {
                break;
            }
            continue;
        }
        fragment = Some(fragment.map_or(glyph.rect, |f| f.union(&glyph.rect)));
    }
    fragment
}

/// Bounding box of the word following `index`, skipping blanks
fn fragment_after(
    index: usize,
    char_count: usize,
    glyph_at: &mut dyn FnMut(usize) -> Option<Glyph>,
) -> Option<RectF> {
    let mut fragment: Option<RectF> = None;
    for i in index..char_count {
        let Some(glyph) = glyph_at(i) else {
            break;
        };
        if glyph.is_blank() {
            if fragment.is_some() {
                break;
            }
            continue;
        }
        fragment = Some(fragment.map_or(glyph.rect, |f| f.union(&glyph.rect)));
    }
    fragment
}

/// Stretch the outer bands toward the neighboring words that share
/// their line: vertical bounds are unioned and the horizontal gap is
/// closed up to its midpoint.
fn pad_bands(bands: &mut [RectF], before: Option<RectF>, after: Option<RectF>) {
    if let (Some(first), Some(prev)) = (bands.first_mut(), before) {
        if overlaps(first.span(Axis::Vertical), prev.span(Axis::Vertical)) {
            let (y0, y1) = (first.y.min(prev.y), first.bottom().max(prev.bottom()));
            let x0 = if prev.right() <= first.x {
                (prev.right() + first.x) * 0.5
            } else {
                first.x
            };
            *first = RectF::new(x0, y0, first.right() - x0, y1 - y0);
        }
    }
    if let (Some(last), Some(next)) = (bands.last_mut(), after) {
        if overlaps(last.span(Axis::Vertical), next.span(Axis::Vertical)) {
            let (y0, y1) = (last.y.min(next.y), last.bottom().max(next.bottom()));
            let x1 = if next.x >= last.right() {
                (last.right() + next.x) * 0.5
            } else {
                last.right()
            };
            *last = RectF::new(last.x, y0, x1 - last.x, y1 - y0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "ab cd" on one line, "ef" on the next, 10 units per glyph
    fn two_lines() -> Vec<Glyph> {
        let row = |ch, col: usize, line: usize| {
            Glyph::new(ch, RectF::new(col as f32 * 10.0, 100.0 - line as f32 * 20.0, 10.0, 12.0))
        };
        vec![
            row('a', 0, 0),
            row('b', 1, 0),
            row(' ', 2, 0),
            row('c', 3, 0),
            row('d', 4, 0),
            row(' ', 5, 0),
            row('e', 0, 1),
            row('f', 1, 1),
        ]
    }

    fn rects(glyphs: &[Glyph], range: Range<usize>, smooth: bool) -> Vec<RectF> {
        span_rects(range, glyphs.len(), smooth, &mut |i| glyphs.get(i).copied())
    }

    #[test]
    fn plain_mode_yields_one_rect_per_word() {
        let glyphs = two_lines();
        let r = rects(&glyphs, 0..8, false);
        assert_eq!(
            r,
            vec![
                RectF::new(0.0, 100.0, 20.0, 12.0),
                RectF::new(30.0, 100.0, 20.0, 12.0),
                RectF::new(0.0, 80.0, 20.0, 12.0),
            ]
        );
    }

    #[test]
    fn whitespace_alone_has_no_rects() {
        let glyphs = two_lines();
        assert!(rects(&glyphs, 2..3, false).is_empty());
        assert!(rects(&glyphs, 5..6, true).is_empty());
    }

    #[test]
    fn smooth_mode_makes_one_band_per_line() {
        let glyphs = two_lines();
        let r = rects(&glyphs, 0..8, true);
        assert_eq!(
            r,
            vec![
                RectF::new(0.0, 100.0, 50.0, 12.0),
                RectF::new(0.0, 80.0, 20.0, 12.0),
            ]
        );
    }

    #[test]
    fn smooth_mode_pads_toward_neighbor_words() {
        let glyphs = two_lines();
        // just "cd": "ab" sits to its left on the same line
        let r = rects(&glyphs, 3..5, true);
        assert_eq!(r, vec![RectF::new(25.0, 100.0, 25.0, 12.0)]);
        // just "ab": "cd" follows on the same line
        let r = rects(&glyphs, 0..2, true);
        assert_eq!(r, vec![RectF::new(0.0, 100.0, 25.0, 12.0)]);
    }

    #[test]
    fn missing_glyph_ends_the_preceding_word() {
        let glyphs = two_lines();
        // 'a' has no box; "b" still pads "cd" on the left
        let r = span_rects(3..5, glyphs.len(), true, &mut |i| {
            (i != 0).then(|| glyphs[i])
        });
        assert_eq!(r, vec![RectF::new(25.0, 100.0, 25.0, 12.0)]);
    }

    #[test]
    fn neighbor_on_another_line_is_ignored() {
        let glyphs = two_lines();
        let r = rects(&glyphs, 6..8, true);
        assert_eq!(r, vec![RectF::new(0.0, 80.0, 20.0, 12.0)]);
    }

    #[test]
    fn slightly_offset_glyph_joins_band_but_not_run() {
        let glyphs = vec![
            Glyph::new('x', RectF::new(0.0, 0.0, 10.0, 10.0)),
            Glyph::new('y', RectF::new(10.0, 3.0, 10.0, 10.0)),
        ];
        assert_eq!(rects(&glyphs, 0..2, false).len(), 2);
        assert_eq!(
            rects(&glyphs, 0..2, true),
            vec![RectF::new(0.0, 0.0, 20.0, 13.0)]
        );
    }
}
