//! Derived enrollment status
//!
//! A trial's enrollment health is never stored; it is recomputed from
//! `currentEnrollment`, `enrollmentTarget` and the months left until
//! `plannedEndDate` whenever a filter, sort or cell needs it.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::row::{fields, Row};
use crate::value::format_number;

/// Months-to-end at or below which an unfinished trial is critical
pub const CRITICAL_MONTHS: i32 = 3;
/// Months-to-end at or below which a slow trial is at risk
pub const AT_RISK_MONTHS: i32 = 6;
/// Percentage below which a trial near its end is at risk
pub const AT_RISK_PERCENT: u32 = 70;
/// Percentage below which an on-track trial gets the "very low" marker
pub const VERY_LOW_PERCENT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    #[serde(rename = "No Enrollment")]
    NoEnrollment,
    #[serde(rename = "On Track")]
    OnTrack,
    #[serde(rename = "At Risk")]
    AtRisk,
    Critical,
    Completed,
}

impl EnrollmentStatus {
    /// All statuses in the order the filter checklist shows them
    pub const ALL: [EnrollmentStatus; 5] = [
        EnrollmentStatus::NoEnrollment,
        EnrollmentStatus::OnTrack,
        EnrollmentStatus::AtRisk,
        EnrollmentStatus::Critical,
        EnrollmentStatus::Completed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EnrollmentStatus::NoEnrollment => "No Enrollment",
            EnrollmentStatus::OnTrack => "On Track",
            EnrollmentStatus::AtRisk => "At Risk",
            EnrollmentStatus::Critical => "Critical",
            EnrollmentStatus::Completed => "Completed",
        }
    }

    pub fn tooltip(&self) -> &'static str {
        match self {
            EnrollmentStatus::NoEnrollment => "No participants enrolled yet!",
            EnrollmentStatus::OnTrack => "Enrollment is progressing as expected.",
            EnrollmentStatus::AtRisk => "Enrollment is behind schedule!",
            EnrollmentStatus::Critical => "Trial is ending soon and not fully enrolled!",
            EnrollmentStatus::Completed => "Enrollment complete!",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    /// Statuses drawn with the warning icon
    pub fn is_alarming(&self) -> bool {
        matches!(
            self,
            EnrollmentStatus::NoEnrollment | EnrollmentStatus::Critical | EnrollmentStatus::AtRisk
        )
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rounded enrollment percentage capped at 100. A missing, zero or
/// non-numeric target yields 0.
pub fn enrollment_percent(current: Option<f64>, target: Option<f64>) -> u32 {
    let target = match target {
        Some(t) if t != 0.0 => t,
        _ => return 0,
    };
    let current = current.unwrap_or(0.0);
    // Half-up rounding, matching how the percentage is displayed.
    let pct = (current / target * 100.0 + 0.5).floor();
    pct.clamp(0.0, 100.0) as u32
}

/// Raw `current / target` ratio used for sorting; 0 without a target.
pub fn enrollment_ratio(current: Option<f64>, target: Option<f64>) -> f64 {
    match target {
        Some(t) if t != 0.0 => current.unwrap_or(0.0) / t,
        _ => 0.0,
    }
}

/// Whole-month difference using year/month arithmetic only; the day of
/// month is ignored.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

/// Classify in fixed precedence order. The order matters: a trial with no
/// enrollment is never "Critical", and a fully enrolled one is
/// "Completed" even past its end date.
pub fn classify(percent: u32, months_to_end: Option<i32>) -> EnrollmentStatus {
    if percent == 0 {
        return EnrollmentStatus::NoEnrollment;
    }
    if percent >= 100 {
        return EnrollmentStatus::Completed;
    }
    match months_to_end {
        None => EnrollmentStatus::OnTrack,
        Some(m) if m > AT_RISK_MONTHS => EnrollmentStatus::OnTrack,
        Some(m) if m <= CRITICAL_MONTHS => EnrollmentStatus::Critical,
        Some(_) if percent < AT_RISK_PERCENT => EnrollmentStatus::AtRisk,
        Some(_) => EnrollmentStatus::OnTrack,
    }
}

/// Everything the enrollment cell, filter and sort need for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentProgress {
    pub current: Option<f64>,
    pub target: Option<f64>,
    pub percent: u32,
    pub months_to_end: Option<i32>,
    pub status: EnrollmentStatus,
}

impl EnrollmentProgress {
    pub fn compute(
        current: Option<f64>,
        target: Option<f64>,
        planned_end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Self {
        let percent = enrollment_percent(current, target);
        let months_to_end = planned_end.map(|end| months_between(today, end));
        Self {
            current,
            target,
            percent,
            months_to_end,
            status: classify(percent, months_to_end),
        }
    }

    pub fn from_row(row: &Row, today: NaiveDate) -> Self {
        Self::compute(
            row.number(fields::CURRENT_ENROLLMENT),
            row.number(fields::ENROLLMENT_TARGET),
            row.date(fields::PLANNED_END_DATE),
            today,
        )
    }

    /// On track overall but below 10%
    pub fn is_very_low(&self) -> bool {
        self.status == EnrollmentStatus::OnTrack && self.percent < VERY_LOW_PERCENT
    }

    /// `current / target (pct%)`
    pub fn caption(&self) -> String {
        let show = |v: Option<f64>| v.map(format_number).unwrap_or_else(|| "-".to_string());
        format!("{} / {} ({}%)", show(self.current), show(self.target), self.percent)
    }
}

/// Status of one row as of `today`
pub fn status_of(row: &Row, today: NaiveDate) -> EnrollmentStatus {
    EnrollmentProgress::from_row(row, today).status
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Months;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn progress(current: f64, target: f64, end: Option<NaiveDate>) -> EnrollmentProgress {
        EnrollmentProgress::compute(Some(current), Some(target), end, today())
    }

    fn months_out(n: u32) -> Option<NaiveDate> {
        today().checked_add_months(Months::new(n))
    }

    #[test]
    fn test_zero_enrollment_wins_over_critical() {
        let p = progress(0.0, 100.0, months_out(1));
        assert_eq!(p.status, EnrollmentStatus::NoEnrollment);
        let p = progress(0.0, 100.0, None);
        assert_eq!(p.status, EnrollmentStatus::NoEnrollment);
    }

    #[test]
    fn test_full_enrollment_is_completed_even_when_past_end() {
        let past = today().checked_sub_months(Months::new(4));
        let p = progress(100.0, 100.0, past);
        assert_eq!(p.status, EnrollmentStatus::Completed);
        assert_eq!(progress(150.0, 100.0, None).percent, 100);
    }

    #[test]
    fn test_status_by_months_remaining() {
        assert_eq!(progress(50.0, 100.0, months_out(2)).status, EnrollmentStatus::Critical);
        assert_eq!(progress(50.0, 100.0, months_out(5)).status, EnrollmentStatus::AtRisk);
        assert_eq!(progress(50.0, 100.0, months_out(8)).status, EnrollmentStatus::OnTrack);
        assert_eq!(progress(80.0, 100.0, months_out(5)).status, EnrollmentStatus::OnTrack);
        assert_eq!(progress(50.0, 100.0, None).status, EnrollmentStatus::OnTrack);
    }

    #[test]
    fn test_percent_fallbacks() {
        assert_eq!(enrollment_percent(Some(5.0), None), 0);
        assert_eq!(enrollment_percent(Some(5.0), Some(0.0)), 0);
        assert_eq!(enrollment_percent(None, Some(10.0)), 0);
        assert_eq!(enrollment_percent(Some(1.0), Some(8.0)), 13);
        assert_eq!(enrollment_percent(Some(1.0), Some(200.0)), 1);
    }

    #[test]
    fn test_months_ignore_day_of_month() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(months_between(from, to), 1);
        let to = NaiveDate::from_ymd_opt(2023, 11, 1).unwrap();
        assert_eq!(months_between(from, to), -2);
    }

    #[test]
    fn test_very_low_marker_and_caption() {
        let p = progress(5.0, 100.0, None);
        assert!(p.is_very_low());
        assert_eq!(p.caption(), "5 / 100 (5%)");
        assert!(!progress(5.0, 100.0, months_out(1)).is_very_low());
    }

    #[test]
    fn test_label_round_trip() {
        for status in EnrollmentStatus::ALL {
            assert_eq!(EnrollmentStatus::from_label(status.label()), Some(status));
        }
    }
}
