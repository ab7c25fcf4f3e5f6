//! Memoized filter/sort pipeline

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use td_core::RowSet;

use crate::filter::{filter_indices, FilterState};
use crate::sort::{sort_indices, SortKindLookup, SortState};

#[derive(Debug, Clone, PartialEq)]
struct FilterKey {
    revision: u64,
    filter: FilterState,
    today: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
struct ViewKey {
    filter: FilterKey,
    sort: SortState,
}

/// Caches the visible row indices of one table.
///
/// Two levels: the filtered indices are kept separately so that a sort
/// change reuses them. Both entries are replaced whenever any of their
/// inputs changes.
pub struct ViewCache {
    filtered: RwLock<Option<(FilterKey, Arc<Vec<usize>>)>>,
    sorted: RwLock<Option<(ViewKey, Arc<Vec<usize>>)>>,
    stats: RwLock<CacheStats>,
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl ViewCache {
    pub fn new() -> Self {
        Self {
            filtered: RwLock::new(None),
            sorted: RwLock::new(None),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Visible indices for the given inputs, recomputed only when one of
    /// them differs from the previous call.
    pub fn view(
        &self,
        rows: &RowSet,
        filter: &FilterState,
        sort: &SortState,
        today: NaiveDate,
        kinds: &dyn SortKindLookup,
    ) -> Arc<Vec<usize>> {
        let filter_key = FilterKey {
            revision: rows.revision(),
            filter: filter.clone(),
            today,
        };
        let key = ViewKey {
            filter: filter_key.clone(),
            sort: sort.clone(),
        };

        if let Some((cached_key, indices)) = self.sorted.read().as_ref() {
            if *cached_key == key {
                self.stats.write().hits += 1;
                return indices.clone();
            }
        }
        self.stats.write().misses += 1;

        let filtered = self.filtered(rows, filter_key);
        let sorted = if sort.is_empty() {
            filtered
        } else {
            Arc::new(sort_indices(rows.rows(), filtered.as_ref().clone(), sort, kinds))
        };
        tracing::debug!(
            "View recomputed: {} of {} rows visible",
            sorted.len(),
            rows.len()
        );

        *self.sorted.write() = Some((key, sorted.clone()));
        sorted
    }

    fn filtered(&self, rows: &RowSet, key: FilterKey) -> Arc<Vec<usize>> {
        if let Some((cached_key, indices)) = self.filtered.read().as_ref() {
            if *cached_key == key {
                return indices.clone();
            }
        }
        let indices = Arc::new(filter_indices(rows.rows(), &key.filter, key.today));
        *self.filtered.write() = Some((key, indices.clone()));
        indices
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.read()
    }

    /// Drop both entries
    pub fn clear(&self) {
        *self.filtered.write() = None;
        *self.sorted.write() = None;
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ColumnFilter;
    use crate::sort::{DefaultSortKinds, SortKey};
    use td_core::Row;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn rows() -> RowSet {
        RowSet::new(vec![
            Row::new().with("name", "b"),
            Row::new().with("name", "a"),
            Row::new().with("name", "c"),
        ])
    }

    #[test]
    fn test_unchanged_inputs_hit() {
        let cache = ViewCache::new();
        let rows = rows();
        let filter = FilterState::new();
        let sort = SortState::by(SortKey::ascending("name"));

        let first = cache.view(&rows, &filter, &sort, today(), &DefaultSortKinds);
        let second = cache.view(&rows, &filter, &sort, today(), &DefaultSortKinds);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, vec![1, 0, 2]);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_changed_inputs_recompute() {
        let cache = ViewCache::new();
        let rows = rows();
        let sort = SortState::new();
        let filter = FilterState::new();
        assert_eq!(cache.view(&rows, &filter, &sort, today(), &DefaultSortKinds).len(), 3);

        let filter = FilterState::new().with("name", ColumnFilter::Text("a".into()));
        assert_eq!(*cache.view(&rows, &filter, &sort, today(), &DefaultSortKinds), vec![1]);

        // A new row set has a new revision even with identical content.
        let reloaded = RowSet::new(rows.rows().to_vec());
        cache.view(&reloaded, &filter, &sort, today(), &DefaultSortKinds);

        let tomorrow = today().succ_opt().unwrap();
        cache.view(&reloaded, &filter, &sort, tomorrow, &DefaultSortKinds);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 4 });
    }
}
