//! Text selection state across pages

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A character position: page first, then index within the page
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CharPosition {
    pub page: usize,
    pub index: usize,
}

impl CharPosition {
    #[must_use]
    pub const fn new(page: usize, index: usize) -> Self {
        Self { page, index }
    }
}

/// Selected run of text, in the order the user produced it
///
/// `end.index` is exclusive on `end.page`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSpan {
    pub start: CharPosition,
    pub end: CharPosition,
}

impl SelectionSpan {
    #[must_use]
    pub const fn new(start: CharPosition, end: CharPosition) -> Self {
        Self { start, end }
    }

    /// Span with `start <= end`
    #[must_use]
    pub fn normalized(&self) -> Self {
        if self.start <= self.end {
            *self
        } else {
            Self::new(self.end, self.start)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub fn pages(&self) -> Range<usize> {
        let n = self.normalized();
        n.start.page..n.end.page + 1
    }

    #[must_use]
    pub fn touches_page(&self, page: usize) -> bool {
        self.pages().contains(&page)
    }

    /// Character range covered on `page`, clamped to `char_count`
    pub fn range_on_page(&self, page: usize, char_count: usize) -> Option<Range<usize>> {
        let n = self.normalized();
        if !n.touches_page(page) {
            return None;
        }
        let start = if page == n.start.page { n.start.index } else { 0 };
        let end = if page == n.end.page {
            n.end.index
        } else {
            char_count
        };
        let start = start.min(char_count);
        let end = end.min(char_count);
        (start < end).then_some(start..end)
    }
}

/// Text selection state
#[derive(Clone, Debug, Default)]
pub struct TextSelection {
    span: Option<SelectionSpan>,
    /// Whether a drag is in progress
    pub is_selecting: bool,
}

impl TextSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start selection at a point
    pub fn start_at(&mut self, at: CharPosition) {
        self.span = Some(SelectionSpan::new(at, at));
        self.is_selecting = true;
    }

    /// Replace both ends while a drag is in progress
    pub fn update_span(&mut self, span: SelectionSpan) -> bool {
        if !self.is_selecting || self.span == Some(span) {
            return false;
        }
        self.span = Some(span);
        true
    }

    /// Finish selection
    pub fn finish(&mut self) {
        self.is_selecting = false;
    }

    /// Replace the selection wholesale
    pub fn set(&mut self, span: SelectionSpan) {
        self.span = Some(span);
        self.is_selecting = false;
    }

    /// Clear selection; returns whether anything was selected
    pub fn clear(&mut self) -> bool {
        self.is_selecting = false;
        self.span.take().is_some()
    }

    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.span.is_some_and(|s| !s.is_empty())
    }

    /// Raw span in drag order
    #[must_use]
    pub fn span(&self) -> Option<SelectionSpan> {
        self.span
    }

    /// Get ordered selection bounds (start before end)
    #[must_use]
    pub fn get_ordered_bounds(&self) -> Option<SelectionSpan> {
        self.span.map(|s| s.normalized())
    }
}
