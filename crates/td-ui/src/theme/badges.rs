//! Badge and chart palette

use egui::Color32;
use td_core::EnrollmentStatus;

use super::{accent_color, info_color, success_color, warning_color};

/// Series colours, cycled by series index
pub const CHART_COLORS: [Color32; 11] = [
    Color32::from_rgb(0x88, 0x84, 0xd8),
    Color32::from_rgb(0x82, 0xca, 0x9d),
    Color32::from_rgb(0xff, 0xc6, 0x58),
    Color32::from_rgb(0xff, 0x80, 0x42),
    Color32::from_rgb(0x8d, 0xd1, 0xe1),
    Color32::from_rgb(0xa4, 0xde, 0x6c),
    Color32::from_rgb(0xd0, 0xed, 0x57),
    Color32::from_rgb(0xfa, 0x80, 0x72),
    Color32::from_rgb(0xa2, 0x8b, 0xe2),
    Color32::from_rgb(0x60, 0xd3, 0x94),
    Color32::from_rgb(0xee, 0x60, 0x55),
];

const DEEP_RED: Color32 = Color32::from_rgb(185, 28, 28);
const PRIMARY: Color32 = Color32::from_rgb(87, 13, 248);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BadgeStyle {
    pub fill: Color32,
    pub text: Color32,
    /// Warning triangle before the label
    pub icon: bool,
}

impl BadgeStyle {
    const fn solid(fill: Color32) -> Self {
        Self {
            fill,
            text: Color32::WHITE,
            icon: false,
        }
    }
}

/// Badge for the registry status column; `None` renders plain text.
pub fn trial_status_badge(value: &str) -> Option<BadgeStyle> {
    match value {
        "Completed" => Some(BadgeStyle::solid(success_color())),
        "Not yet recruiting" => Some(BadgeStyle {
            text: Color32::BLACK,
            ..BadgeStyle::solid(warning_color())
        }),
        "Recruiting" => Some(BadgeStyle::solid(info_color())),
        _ => None,
    }
}

pub fn phase_badge(value: &str) -> Option<BadgeStyle> {
    match value {
        "Phase 1" => Some(BadgeStyle::solid(info_color())),
        "Phase 2" => Some(BadgeStyle::solid(PRIMARY)),
        "Phase 3" => Some(BadgeStyle::solid(success_color())),
        "Phase 4" => Some(BadgeStyle::solid(accent_color())),
        _ => None,
    }
}

/// Badge for a derived enrollment status
pub fn enrollment_badge(status: EnrollmentStatus) -> BadgeStyle {
    let style = match status {
        EnrollmentStatus::NoEnrollment | EnrollmentStatus::Critical => BadgeStyle::solid(DEEP_RED),
        EnrollmentStatus::AtRisk => BadgeStyle {
            text: Color32::BLACK,
            ..BadgeStyle::solid(warning_color())
        },
        EnrollmentStatus::Completed => BadgeStyle::solid(success_color()),
        EnrollmentStatus::OnTrack => BadgeStyle::solid(info_color()),
    };
    BadgeStyle {
        icon: status.is_alarming(),
        ..style
    }
}

/// Fill of the enrollment progress bar
pub fn enrollment_bar_color(status: EnrollmentStatus) -> Color32 {
    match status {
        EnrollmentStatus::NoEnrollment | EnrollmentStatus::Critical => DEEP_RED,
        EnrollmentStatus::AtRisk => Color32::from_rgb(250, 204, 21),
        EnrollmentStatus::Completed => Color32::from_rgb(22, 163, 74),
        EnrollmentStatus::OnTrack => Color32::from_rgb(2, 132, 199),
    }
}
