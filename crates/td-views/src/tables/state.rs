//! Table state without any drawing
//!
//! Everything the table remembers between frames lives here so it can be
//! driven and tested without an egui context: filters, sort, widths, the
//! open popover and the memoized visible rows.

use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::IndexMap;
use td_core::{EnrollmentFilterPolicy, EnrollmentStatus, RowSet, TableSettings};
use td_data::{unique_values, ColumnFilter, FilterState, SortDirection, SortState, ViewCache};

use super::columns::{clinical_columns, columns_from_rows, ColumnDef, ColumnKind, ColumnSortKinds};

/// Gap kept between a popover and the right edge of the viewport
pub const POPOVER_EDGE_MARGIN: f32 = 16.0;

/// Row height of the generic table
pub const GENERIC_ROW_HEIGHT: f32 = 40.0;

/// Which edge of the filter button a popover hangs from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverAlign {
    Left,
    Right,
}

/// Right-align when a left-aligned popover would run past the viewport.
pub fn popover_alignment(
    button_left: f32,
    popover_width: f32,
    viewport_width: f32,
) -> PopoverAlign {
    if button_left + popover_width > viewport_width - POPOVER_EDGE_MARGIN {
        PopoverAlign::Right
    } else {
        PopoverAlign::Left
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPopover {
    pub column: String,
    pub align: PopoverAlign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableVariant {
    /// Fixed trial columns with badges and enrollment progress
    Clinical,
    /// Text columns from the first row
    Generic,
}

pub struct TableState {
    variant: TableVariant,
    columns: Vec<ColumnDef>,
    filters: FilterState,
    sort: SortState,
    widths: IndexMap<String, f32>,
    popover: Option<OpenPopover>,
    enrollment_policy: EnrollmentFilterPolicy,
    row_height: f32,
    overscan: usize,
    cache: ViewCache,
}

impl TableState {
    pub fn clinical(settings: &TableSettings) -> Self {
        Self::with_columns(
            TableVariant::Clinical,
            clinical_columns(),
            settings.row_height,
            settings,
        )
    }

    pub fn generic(settings: &TableSettings) -> Self {
        Self::with_columns(TableVariant::Generic, Vec::new(), GENERIC_ROW_HEIGHT, settings)
    }

    fn with_columns(
        variant: TableVariant,
        columns: Vec<ColumnDef>,
        row_height: f32,
        settings: &TableSettings,
    ) -> Self {
        Self {
            variant,
            columns,
            filters: FilterState::new(),
            sort: SortState::new(),
            widths: IndexMap::new(),
            popover: None,
            enrollment_policy: settings.enrollment_filter,
            row_height,
            overscan: settings.overscan,
            cache: ViewCache::new(),
        }
    }

    pub fn variant(&self) -> TableVariant {
        self.variant
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    /// Rebuild generic columns when the first row's keys change. Filters,
    /// sort keys and widths of vanished columns are dropped.
    pub fn sync_columns(&mut self, rows: &RowSet) {
        if self.variant != TableVariant::Generic {
            return;
        }
        let columns = columns_from_rows(rows.rows());
        let same = columns.len() == self.columns.len()
            && columns.iter().zip(&self.columns).all(|(a, b)| a.key == b.key);
        if same {
            return;
        }

        tracing::debug!("Table columns changed: {} columns", columns.len());
        let stale: Vec<String> = self
            .columns
            .iter()
            .filter(|old| !columns.iter().any(|c| c.key == old.key))
            .map(|c| c.key.clone())
            .collect();
        for key in &stale {
            self.filters.clear_column(key);
            self.widths.shift_remove(key);
            if self.sort.direction_of(key).is_some() {
                self.sort.clear();
            }
        }
        if matches!(&self.popover, Some(p) if stale.contains(&p.column)) {
            self.popover = None;
        }
        self.columns = columns;
    }

    // Widths

    pub fn width(&self, key: &str) -> f32 {
        match (self.widths.get(key), self.column(key)) {
            (Some(w), _) => *w,
            (None, Some(column)) => column.width,
            (None, None) => 150.0,
        }
    }

    /// Set a column's width, clamped to its bounds. Returns the width
    /// actually applied.
    pub fn resize(&mut self, key: &str, width: f32) -> f32 {
        let Some(column) = self.column(key) else {
            return width;
        };
        let width = column.clamp_width(width);
        self.widths.insert(key.to_string(), width);
        width
    }

    /// Widths changed by the user, by column key
    pub fn custom_widths(&self) -> &IndexMap<String, f32> {
        &self.widths
    }

    pub fn total_width(&self) -> f32 {
        self.columns.iter().map(|c| self.width(&c.key)).sum()
    }

    // Sorting

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn toggle_sort(&mut self, key: &str) {
        self.sort.toggle(key);
    }

    pub fn sort_marker(&self, key: &str) -> &'static str {
        self.sort.direction_of(key).map(|d| d.arrow()).unwrap_or("")
    }

    pub fn sort_direction(&self, key: &str) -> Option<SortDirection> {
        self.sort.direction_of(key)
    }

    // Filters

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterState {
        &mut self.filters
    }

    pub fn set_filter(&mut self, key: &str, filter: ColumnFilter) {
        self.filters.set(key, filter);
    }

    pub fn clear_filter(&mut self, key: &str) {
        self.filters.clear_column(key);
    }

    pub fn is_filtered(&self, key: &str) -> bool {
        self.filters.is_active(key)
    }

    pub fn enrollment_policy(&self) -> EnrollmentFilterPolicy {
        self.enrollment_policy
    }

    /// Switching policy drops the other policy's filter value.
    pub fn set_enrollment_policy(&mut self, policy: EnrollmentFilterPolicy) {
        if policy == self.enrollment_policy {
            return;
        }
        self.enrollment_policy = policy;
        let enrollment_keys: Vec<String> = self
            .columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Enrollment)
            .map(|c| c.key.clone())
            .collect();
        for key in enrollment_keys {
            self.filters.clear_column(&key);
        }
    }

    pub fn toggle_status(&mut self, key: &str, status: EnrollmentStatus) {
        self.filters.toggle_status(key, status);
    }

    pub fn set_min_percent(&mut self, key: &str, percent: u32) {
        self.filters.set(key, ColumnFilter::MinPercent(percent.min(100)));
    }

    /// Checklist options for a categorical column
    pub fn options(&self, rows: &RowSet, key: &str) -> Vec<String> {
        unique_values(rows.rows(), key)
    }

    // Popover

    pub fn popover(&self) -> Option<&OpenPopover> {
        self.popover.as_ref()
    }

    pub fn is_popover_open(&self, key: &str) -> bool {
        matches!(&self.popover, Some(p) if p.column == key)
    }

    /// Filter button click: opens this column's popover, or closes it
    /// when it is already open. Opening one closes any other.
    pub fn toggle_popover(&mut self, key: &str, button_left: f32, viewport_width: f32) {
        if self.is_popover_open(key) {
            self.popover = None;
            return;
        }
        let width = self.column(key).map(ColumnDef::popover_width).unwrap_or(180.0);
        self.popover = Some(OpenPopover {
            column: key.to_string(),
            align: popover_alignment(button_left, width, viewport_width),
        });
    }

    pub fn close_popover(&mut self) {
        self.popover = None;
    }

    /// Pointer pressed somewhere. A press outside the open popover
    /// closes it; presses on a filter button are handled by
    /// [`Self::toggle_popover`] instead.
    pub fn pointer_down(&mut self, inside_popover: bool, on_filter_button: bool) {
        if !inside_popover && !on_filter_button {
            self.popover = None;
        }
    }

    // Pipeline

    /// Visible row indices after filtering and sorting, memoized
    pub fn visible_rows(&self, rows: &RowSet, today: NaiveDate) -> Arc<Vec<usize>> {
        self.cache
            .view(rows, &self.filters, &self.sort, today, &ColumnSortKinds(&self.columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::{fields, Row};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_popover_alignment() {
        assert_eq!(popover_alignment(100.0, 180.0, 1000.0), PopoverAlign::Left);
        assert_eq!(popover_alignment(810.0, 180.0, 1000.0), PopoverAlign::Right);
        // Exactly at the margin still fits.
        assert_eq!(popover_alignment(804.0, 180.0, 1000.0), PopoverAlign::Left);
    }

    #[test]
    fn test_single_popover() {
        let mut table = TableState::clinical(&TableSettings::default());
        table.toggle_popover(fields::PHASE, 100.0, 1000.0);
        assert!(table.is_popover_open(fields::PHASE));

        table.toggle_popover(fields::START_DATE, 790.0, 1000.0);
        assert!(!table.is_popover_open(fields::PHASE));
        assert_eq!(table.popover().unwrap().align, PopoverAlign::Right);

        table.toggle_popover(fields::START_DATE, 790.0, 1000.0);
        assert!(table.popover().is_none());
    }

    #[test]
    fn test_click_outside_closes() {
        let mut table = TableState::clinical(&TableSettings::default());
        table.toggle_popover(fields::STATUS, 0.0, 1000.0);
        table.pointer_down(true, false);
        assert!(table.popover().is_some());
        table.pointer_down(false, true);
        assert!(table.popover().is_some());
        table.pointer_down(false, false);
        assert!(table.popover().is_none());
    }

    #[test]
    fn test_resize_clamps() {
        let mut table = TableState::clinical(&TableSettings::default());
        assert_eq!(table.width(fields::TITLE), 240.0);
        assert_eq!(table.resize(fields::TITLE, 1000.0), 360.0);
        assert_eq!(table.resize(fields::TITLE, 10.0), 120.0);
        assert_eq!(table.width(fields::TITLE), 120.0);
    }

    #[test]
    fn test_policy_switch_drops_enrollment_filter() {
        let mut table = TableState::clinical(&TableSettings::default());
        table.toggle_status(fields::ENROLLMENT, EnrollmentStatus::Critical);
        assert!(table.is_filtered(fields::ENROLLMENT));

        table.set_enrollment_policy(EnrollmentFilterPolicy::MinPercentage);
        assert!(!table.is_filtered(fields::ENROLLMENT));
        table.set_min_percent(fields::ENROLLMENT, 150);
        assert_eq!(table.filters().min_percent(fields::ENROLLMENT), 100);
    }

    #[test]
    fn test_visible_rows_pipeline() {
        let mut table = TableState::clinical(&TableSettings::default());
        let rows = RowSet::new(vec![
            Row::new().with(fields::STUDY_ID, "B").with(fields::PHASE, "Phase 2"),
            Row::new().with(fields::STUDY_ID, "A").with(fields::PHASE, "Phase 2"),
            Row::new().with(fields::STUDY_ID, "C").with(fields::PHASE, "Phase 1"),
        ]);
        assert_eq!(table.options(&rows, fields::PHASE), vec!["Phase 2", "Phase 1"]);

        table.filters_mut().toggle_value(fields::PHASE, "Phase 2");
        table.toggle_sort(fields::STUDY_ID);
        assert_eq!(*table.visible_rows(&rows, today()), vec![1, 0]);
        assert_eq!(table.sort_marker(fields::STUDY_ID), "↑");
    }

    #[test]
    fn test_generic_columns_follow_rows() {
        let mut table = TableState::generic(&TableSettings::default());
        assert_eq!(table.row_height(), GENERIC_ROW_HEIGHT);

        table.sync_columns(&RowSet::new(vec![Row::new().with("site", "X").with("arm", "A")]));
        assert_eq!(table.columns().len(), 2);
        table.set_filter("arm", ColumnFilter::Text("a".into()));
        table.toggle_sort("arm");

        table.sync_columns(&RowSet::new(vec![Row::new().with("site", "X")]));
        assert_eq!(table.columns().len(), 1);
        assert!(!table.is_filtered("arm"));
        assert!(table.sort().is_empty());
    }
}
