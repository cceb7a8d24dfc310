//! Per-page highlight intervals
//!
//! Each page keeps a list of non-overlapping half-open character ranges
//! sorted by start. A new interval cuts away whatever it overlaps; removing
//! is the same operation without inserting anything afterwards.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::types::{Color, Thickness};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HighlightEntry {
    pub char_index: usize,
    pub char_count: usize,
    pub color: Color,
    /// Extra margin around each derived rectangle
    #[serde(default)]
    pub inflate: Thickness,
}

impl HighlightEntry {
    #[must_use]
    pub fn new(char_index: usize, char_count: usize, color: Color) -> Self {
        Self {
            char_index,
            char_count,
            color,
            inflate: Thickness::default(),
        }
    }

    #[must_use]
    pub fn with_inflate(mut self, inflate: Thickness) -> Self {
        self.inflate = inflate;
        self
    }

    pub fn end(&self) -> usize {
        self.char_index + self.char_count
    }

    pub fn range(&self) -> Range<usize> {
        self.char_index..self.end()
    }

    fn with_range(&self, range: Range<usize>) -> Self {
        Self {
            char_index: range.start,
            char_count: range.end - range.start,
            ..*self
        }
    }
}

/// What a stored entry becomes once `cut` is carved out of it
fn carve(entry: &HighlightEntry, cut: &Range<usize>, out: &mut Vec<HighlightEntry>) {
    let (start, end) = (entry.char_index, entry.end());
    if end <= cut.start || start >= cut.end {
        out.push(*entry);
        return;
    }
    if start < cut.start {
        out.push(entry.with_range(start..cut.start));
    }
    if end > cut.end {
        out.push(entry.with_range(cut.end..end));
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightStore {
    pages: BTreeMap<usize, Vec<HighlightEntry>>,
}

impl HighlightStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Highlight `[char_index, char_index + char_count)` on `page`, or clear
    /// it when `color` is `None`. Returns whether the page's list changed.
    pub fn apply(
        &mut self,
        page: usize,
        char_index: usize,
        char_count: usize,
        color: Option<Color>,
        inflate: Thickness,
    ) -> bool {
        if char_count == 0 {
            return false;
        }
        let cut = char_index..char_index.saturating_add(char_count);
        let existing = self.pages.remove(&page).unwrap_or_default();

        let mut next = Vec::with_capacity(existing.len() + 2);
        for entry in &existing {
            carve(entry, &cut, &mut next);
        }
        if let Some(color) = color {
            let entry = HighlightEntry {
                char_index,
                char_count: cut.end - cut.start,
                color,
                inflate,
            };
            let at = next.partition_point(|e| e.char_index < entry.char_index);
            next.insert(at, entry);
        }

        let changed = next != existing;
        if !next.is_empty() {
            self.pages.insert(page, next);
        }
        changed
    }

    pub fn insert(&mut self, page: usize, entry: HighlightEntry) -> bool {
        self.apply(
            page,
            entry.char_index,
            entry.char_count,
            Some(entry.color),
            entry.inflate,
        )
    }

    pub fn remove(&mut self, page: usize, char_index: usize, char_count: usize) -> bool {
        self.apply(page, char_index, char_count, None, Thickness::default())
    }

    pub fn clear_page(&mut self, page: usize) -> bool {
        self.pages.remove(&page).is_some()
    }

    pub fn clear(&mut self) -> bool {
        let had_any = !self.pages.is_empty();
        self.pages.clear();
        had_any
    }

    pub fn entries(&self, page: usize) -> &[HighlightEntry] {
        self.pages.get(&page).map_or(&[], Vec::as_slice)
    }

    /// Pages carrying at least one highlight, ascending
    pub fn pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages.keys().copied()
    }

    pub fn has_page(&self, page: usize) -> bool {
        self.pages.contains_key(&page)
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Renumber pages after `count` pages were inserted at `index`
    pub fn pages_inserted(&mut self, index: usize, count: usize) {
        let moved = self.pages.split_off(&index);
        self.pages
            .extend(moved.into_iter().map(|(page, list)| (page + count, list)));
    }

    /// Drop highlights of removed pages and renumber the rest
    pub fn pages_removed(&mut self, index: usize, count: usize) {
        let mut tail = self.pages.split_off(&index);
        let after = tail.split_off(&index.saturating_add(count));
        self.pages
            .extend(after.into_iter().map(|(page, list)| (page - count, list)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color(0xFFFF_0000);
    const BLUE: Color = Color(0xFF00_00FF);

    fn ranges(store: &HighlightStore, page: usize) -> Vec<(usize, usize)> {
        store
            .entries(page)
            .iter()
            .map(|e| (e.char_index, e.end()))
            .collect()
    }

    #[test]
    fn inner_interval_splits_existing_in_three() {
        let mut store = HighlightStore::new();
        store.insert(0, HighlightEntry::new(0, 20, RED));
        store.insert(0, HighlightEntry::new(5, 5, BLUE));
        assert_eq!(ranges(&store, 0), vec![(0, 5), (5, 10), (10, 20)]);
        let colors: Vec<_> = store.entries(0).iter().map(|e| e.color).collect();
        assert_eq!(colors, vec![RED, BLUE, RED]);
    }

    #[test]
    fn overlapping_tail_is_truncated() {
        let mut store = HighlightStore::new();
        store.insert(0, HighlightEntry::new(0, 5, RED));
        store.insert(0, HighlightEntry::new(3, 5, RED));
        assert_eq!(ranges(&store, 0), vec![(0, 3), (3, 8)]);
    }

    #[test]
    fn overlapping_head_is_truncated() {
        let mut store = HighlightStore::new();
        store.insert(0, HighlightEntry::new(6, 10, RED));
        store.insert(0, HighlightEntry::new(2, 6, BLUE));
        assert_eq!(ranges(&store, 0), vec![(2, 8), (8, 16)]);
    }

    #[test]
    fn contained_entries_are_replaced() {
        let mut store = HighlightStore::new();
        store.insert(0, HighlightEntry::new(2, 2, RED));
        store.insert(0, HighlightEntry::new(6, 2, RED));
        store.insert(0, HighlightEntry::new(0, 10, BLUE));
        assert_eq!(ranges(&store, 0), vec![(0, 10)]);
    }

    #[test]
    fn inserting_twice_is_idempotent() {
        let mut store = HighlightStore::new();
        store.insert(0, HighlightEntry::new(0, 20, RED));
        assert!(store.insert(0, HighlightEntry::new(5, 5, BLUE)));
        let before = store.clone();
        assert!(!store.insert(0, HighlightEntry::new(5, 5, BLUE)));
        assert_eq!(store, before);
    }

    #[test]
    fn insert_then_remove_restores() {
        let mut store = HighlightStore::new();
        store.insert(1, HighlightEntry::new(0, 4, RED));
        store.insert(1, HighlightEntry::new(10, 4, RED));
        let before = store.clone();
        store.insert(1, HighlightEntry::new(5, 3, BLUE));
        store.remove(1, 5, 3);
        assert_eq!(store, before);
    }

    #[test]
    fn removing_last_entry_drops_page() {
        let mut store = HighlightStore::new();
        store.insert(3, HighlightEntry::new(0, 4, RED));
        store.remove(3, 0, 4);
        assert!(!store.has_page(3));
        assert!(store.is_empty());
    }

    #[test]
    fn zero_length_is_a_no_op() {
        let mut store = HighlightStore::new();
        assert!(!store.apply(0, 4, 0, Some(RED), Thickness::default()));
        assert!(store.is_empty());
    }

    #[test]
    fn page_structure_changes_renumber() {
        let mut store = HighlightStore::new();
        for page in [0, 2, 5] {
            store.insert(page, HighlightEntry::new(0, 1, RED));
        }
        store.pages_inserted(2, 1);
        assert_eq!(store.pages().collect::<Vec<_>>(), vec![0, 3, 6]);
        store.pages_removed(2, 2);
        assert_eq!(store.pages().collect::<Vec<_>>(), vec![0, 4]);
    }
}
