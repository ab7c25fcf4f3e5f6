//! Fixed-height row windowing
//!
//! Only rows intersecting the viewport, plus `overscan` rows either side,
//! are laid out. The window is cached and recomputed lazily after any
//! input changes.

use std::ops::RangeInclusive;

/// One laid-out row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualItem {
    pub index: usize,
    pub start: f32,
    pub size: f32,
    pub end: f32,
}

#[derive(Debug, Clone)]
pub struct Virtualizer {
    count: usize,
    row_height: f32,
    overscan: usize,
    viewport_height: f32,
    scroll_offset: f32,
    window: Option<Option<RangeInclusive<usize>>>,
}

impl Virtualizer {
    pub fn new(count: usize, row_height: f32, overscan: usize) -> Self {
        Self {
            count,
            row_height: row_height.max(1.0),
            overscan,
            viewport_height: 0.0,
            scroll_offset: 0.0,
            window: None,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    /// Height of all rows together
    pub fn total_height(&self) -> f32 {
        self.count as f32 * self.row_height
    }

    /// Largest valid scroll offset
    pub fn max_scroll(&self) -> f32 {
        (self.total_height() - self.viewport_height).max(0.0)
    }

    pub fn set_count(&mut self, count: usize) {
        if count != self.count {
            self.count = count;
            self.scroll_offset = self.scroll_offset.clamp(0.0, self.max_scroll());
            self.window = None;
        }
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        let height = height.max(0.0);
        if height != self.viewport_height {
            self.viewport_height = height;
            self.scroll_offset = self.scroll_offset.clamp(0.0, self.max_scroll());
            self.window = None;
        }
    }

    /// Scroll to `offset`, clamped to `[0, max_scroll]`
    pub fn set_scroll_offset(&mut self, offset: f32) {
        let offset = if offset.is_finite() { offset } else { 0.0 };
        let offset = offset.clamp(0.0, self.max_scroll());
        if offset != self.scroll_offset {
            self.scroll_offset = offset;
            self.window = None;
        }
    }

    /// Inclusive index range currently laid out, `None` when empty
    pub fn window(&mut self) -> Option<RangeInclusive<usize>> {
        if let Some(window) = &self.window {
            return window.clone();
        }
        let window = self.compute_window();
        self.window = Some(window.clone());
        window
    }

    fn compute_window(&self) -> Option<RangeInclusive<usize>> {
        if self.count == 0 {
            return None;
        }
        let last_index = self.count - 1;
        let first_visible =
            ((self.scroll_offset / self.row_height).floor() as usize).min(last_index);

        let bottom = self.scroll_offset + self.viewport_height;
        // A row starting exactly at the bottom edge does not intersect.
        let last_visible = if self.viewport_height <= 0.0 {
            first_visible
        } else {
            ((bottom / self.row_height).ceil() as usize)
                .saturating_sub(1)
                .clamp(first_visible, last_index)
        };

        let first = first_visible.saturating_sub(self.overscan);
        let last = (last_visible + self.overscan).min(last_index);
        Some(first..=last)
    }

    /// Items of the current window, in index order
    pub fn items(&mut self) -> Vec<VirtualItem> {
        match self.window() {
            Some(range) => range.map(|index| self.item(index)).collect(),
            None => Vec::new(),
        }
    }

    pub fn item(&self, index: usize) -> VirtualItem {
        let start = index as f32 * self.row_height;
        VirtualItem {
            index,
            start,
            size: self.row_height,
            end: start + self.row_height,
        }
    }

    /// Whether the window is cached
    pub fn is_cached(&self) -> bool {
        self.window.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clinical(count: usize) -> Virtualizer {
        let mut v = Virtualizer::new(count, 56.0, 8);
        v.set_viewport_height(560.0);
        v
    }

    #[test]
    fn test_window_at_top() {
        let mut v = clinical(10_000);
        assert_eq!(v.window(), Some(0..=17));
        assert_eq!(v.total_height(), 560_000.0);
    }

    #[test]
    fn test_window_mid_scroll() {
        let mut v = clinical(10_000);
        v.set_scroll_offset(5_600.0);
        // Rows 100..=109 are visible, widened by 8 each side.
        assert_eq!(v.window(), Some(92..=117));

        v.set_scroll_offset(5_620.0);
        assert_eq!(v.window(), Some(92..=118));
    }

    #[test]
    fn test_window_at_bottom() {
        let mut v = clinical(10_000);
        v.set_scroll_offset(1e9);
        assert_eq!(v.scroll_offset(), 560_000.0 - 560.0);
        assert_eq!(v.window(), Some(9_982..=9_999));
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut v = clinical(5);
        v.set_scroll_offset(100.0);
        assert_eq!(v.scroll_offset(), 0.0);
        v.set_scroll_offset(-10.0);
        assert_eq!(v.scroll_offset(), 0.0);
        assert_eq!(v.window(), Some(0..=4));
    }

    #[test]
    fn test_empty_count() {
        let mut v = clinical(0);
        assert_eq!(v.window(), None);
        assert!(v.items().is_empty());
        assert_eq!(v.total_height(), 0.0);
    }

    #[test]
    fn test_items_geometry() {
        let mut v = clinical(3);
        let items = v.items();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2], VirtualItem { index: 2, start: 112.0, size: 56.0, end: 168.0 });
    }

    #[test]
    fn test_cache_invalidation() {
        let mut v = clinical(100);
        v.window();
        assert!(v.is_cached());
        v.set_scroll_offset(0.0);
        assert!(v.is_cached());
        v.set_count(50);
        assert!(!v.is_cached());
        v.window();
        v.set_viewport_height(300.0);
        assert!(!v.is_cached());
    }

    #[test]
    fn test_window_follows_viewport_height() {
        let mut v = clinical(10_000);
        v.set_scroll_offset(5_600.0);
        assert_eq!(v.window(), Some(92..=117));

        v.set_viewport_height(280.0);
        assert_eq!(v.window(), Some(92..=112));

        v.set_viewport_height(1_120.0);
        assert_eq!(v.window(), Some(92..=127));
        assert_eq!(v.scroll_offset(), 5_600.0);
    }

    #[test]
    fn test_shrinking_count_clamps_scroll() {
        let mut v = clinical(1_000);
        v.set_scroll_offset(50_000.0);
        v.set_count(20);
        assert_eq!(v.scroll_offset(), 20.0 * 56.0 - 560.0);
        assert_eq!(v.window(), Some(2..=19));
    }
}
