use chrono::NaiveDate;
use td_core::{fields, EnrollmentFilterPolicy, EnrollmentStatus, Row, RowSet, TableSettings};
use td_data::ColumnFilter;
use td_views::{TableState, Virtualizer};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Trials with varied enrollment; every tenth has no target.
fn trials(n: usize) -> RowSet {
    let rows = (0..n)
        .map(|i| {
            let row = Row::new()
                .with(fields::STUDY_ID, format!("NCT-{:05}", i))
                .with(fields::TITLE, format!("Study of compound {}", i % 37))
                .with(fields::PHASE, format!("Phase {}", i % 4 + 1))
                .with(fields::STATUS, if i % 3 == 0 { "Recruiting" } else { "Completed" })
                .with(fields::CURRENT_ENROLLMENT, (i % 120) as f64)
                .with(
                    fields::PLANNED_END_DATE,
                    if i % 2 == 0 { "08/15/2024" } else { "12/31/2026" },
                );
            if i % 10 == 0 {
                row
            } else {
                row.with(fields::ENROLLMENT_TARGET, 100.0)
            }
        })
        .collect();
    RowSet::new(rows)
}

#[test]
fn test_filter_sort_window() {
    let rows = trials(10_000);
    let mut table = TableState::clinical(&TableSettings::default());

    table.toggle_status(fields::ENROLLMENT, EnrollmentStatus::Critical);
    table.toggle_sort(fields::ENROLLMENT);
    table.toggle_sort(fields::ENROLLMENT);

    let visible = table.visible_rows(&rows, today());
    assert!(!visible.is_empty());
    for &i in visible.iter() {
        let progress = td_core::EnrollmentProgress::from_row(rows.get(i).unwrap(), today());
        assert_eq!(progress.status, EnrollmentStatus::Critical);
    }
    // Descending by enrollment ratio.
    let ratios: Vec<f64> = visible
        .iter()
        .map(|&i| {
            let row = rows.get(i).unwrap();
            row.number(fields::CURRENT_ENROLLMENT).unwrap_or(0.0)
                / row.number(fields::ENROLLMENT_TARGET).unwrap_or(1.0)
        })
        .collect();
    assert!(ratios.windows(2).all(|w| w[0] >= w[1]));

    let mut virtualizer = Virtualizer::new(visible.len(), table.row_height(), table.overscan());
    virtualizer.set_viewport_height(560.0);
    virtualizer.set_scroll_offset(5_600.0);
    assert_eq!(virtualizer.window(), Some(92..=117));
}

#[test]
fn test_memoized_view_survives_unrelated_changes() {
    let rows = trials(500);
    let mut table = TableState::clinical(&TableSettings::default());
    table.set_filter(fields::TITLE, ColumnFilter::Text("compound 3".into()));

    let first = table.visible_rows(&rows, today());
    table.resize(fields::TITLE, 300.0);
    table.toggle_popover(fields::PHASE, 10.0, 1_200.0);
    let second = table.visible_rows(&rows, today());
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    table.clear_filter(fields::TITLE);
    assert_eq!(table.visible_rows(&rows, today()).len(), 500);
}

#[test]
fn test_min_percent_policy() {
    let rows = trials(240);
    let settings = TableSettings {
        enrollment_filter: EnrollmentFilterPolicy::MinPercentage,
        ..TableSettings::default()
    };
    let mut table = TableState::clinical(&settings);
    table.set_min_percent(fields::ENROLLMENT, 90);

    let visible = table.visible_rows(&rows, today());
    assert!(!visible.is_empty());
    for &i in visible.iter() {
        let progress = td_core::EnrollmentProgress::from_row(rows.get(i).unwrap(), today());
        assert!(progress.percent >= 90);
    }
}

#[test]
fn test_empty_result() {
    let rows = trials(50);
    let mut table = TableState::clinical(&TableSettings::default());
    table.set_filter(fields::STUDY_ID, ColumnFilter::Text("no such study".into()));
    assert!(table.visible_rows(&rows, today()).is_empty());

    let mut virtualizer = Virtualizer::new(0, table.row_height(), table.overscan());
    assert_eq!(virtualizer.window(), None);
}
