//! LRU bookkeeping of pages loaded in the document engine

use std::ops::RangeInclusive;

use log::debug;
use lru::LruCache;

/// Default number of pages kept loaded outside the visible range
pub const DEFAULT_CAPACITY: usize = 16;

/// Pages the engine holds data for, in least-recently-used order
///
/// The cache itself never evicts: eviction happens only through
/// [`PageCache::release_offscreen`], which knows which pages are visible or
/// pinned and must stay.
pub struct PageCache {
    pages: LruCache<usize, ()>,
    capacity: usize,
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PageCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            pages: LruCache::unbounded(),
            capacity: capacity.max(1),
        }
    }

    /// Record a use of `page`, promoting it in the LRU order
    pub fn touch(&mut self, page: usize) {
        self.pages.put(page, ());
    }

    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        self.pages.contains(&page)
    }

    /// Evict least-recently-used pages outside `visible` until the cache is
    /// within capacity. Pages for which `pinned` returns true are skipped.
    /// Returns the evicted pages in eviction order.
    pub fn release_offscreen(
        &mut self,
        visible: Option<RangeInclusive<usize>>,
        pinned: impl Fn(usize) -> bool,
    ) -> Vec<usize> {
        let excess = self.pages.len().saturating_sub(self.capacity);
        if excess == 0 {
            return Vec::new();
        }

        // iter() runs most recent first
        let evicted: Vec<usize> = self
            .pages
            .iter()
            .rev()
            .map(|(&page, _)| page)
            .filter(|page| !visible.as_ref().is_some_and(|v| v.contains(page)))
            .filter(|&page| !pinned(page))
            .take(excess)
            .collect();

        for page in &evicted {
            self.pages.pop(page);
        }
        if !evicted.is_empty() {
            debug!("page cache: released {} pages {:?}", evicted.len(), evicted);
        }
        evicted
    }

    /// Forget a page without releasing it
    pub fn invalidate_page(&mut self, page: usize) {
        self.pages.pop(&page);
    }

    /// Clear all cached pages
    pub fn invalidate_all(&mut self) {
        self.pages.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_capacity_nothing_is_released() {
        let mut cache = PageCache::new(4);
        for page in 0..4 {
            cache.touch(page);
        }
        assert!(cache.release_offscreen(None, |_| false).is_empty());
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn oldest_offscreen_pages_go_first() {
        let mut cache = PageCache::new(2);
        for page in 0..5 {
            cache.touch(page);
        }
        // 0 and 1 are the oldest but 1 is visible
        let released = cache.release_offscreen(Some(1..=1), |_| false);
        assert_eq!(released, vec![0, 2, 3]);
        assert!(cache.contains(1));
        assert!(cache.contains(4));
    }

    #[test]
    fn pinned_pages_survive() {
        let mut cache = PageCache::new(1);
        for page in 0..3 {
            cache.touch(page);
        }
        let released = cache.release_offscreen(None, |page| page == 0);
        assert_eq!(released, vec![1]);
        assert!(cache.contains(0));
        assert!(cache.contains(2));
    }

    #[test]
    fn touch_promotes() {
        let mut cache = PageCache::new(2);
        cache.touch(0);
        cache.touch(1);
        cache.touch(2);
        cache.touch(0);
        assert_eq!(cache.release_offscreen(None, |_| false), vec![1]);
    }

    #[test]
    fn invalidate_page_forgets_it() {
        let mut cache = PageCache::new(2);
        cache.touch(3);
        cache.invalidate_page(3);
        assert!(cache.is_empty());
    }
}
