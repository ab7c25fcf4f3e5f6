use std::collections::BTreeMap;

use egui::{Color32, Context, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};
use td_core::{EnrollmentStatus, ThemeSettings};

mod badges;

pub use badges::{
    enrollment_badge, enrollment_bar_color, phase_badge, trial_status_badge, BadgeStyle,
    CHART_COLORS,
};

/// Theme configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub dark_mode: bool,
    pub scale_factor: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_settings(&ThemeSettings::default())
    }
}

impl Theme {
    pub fn from_settings(settings: &ThemeSettings) -> Self {
        Self {
            name: if settings.dark_mode { "Trial Dark" } else { "Trial Light" }.to_string(),
            dark_mode: settings.dark_mode,
            scale_factor: settings.scale_factor.clamp(0.5, 3.0),
        }
    }
}

/// Apply the application theme
pub fn apply_theme(ctx: &Context, theme: &Theme) {
    let mut style = Style::default();
    let mut visuals = if theme.dark_mode { Visuals::dark() } else { Visuals::light() };

    let (bg_color, panel_bg, widget_bg, hover_color, active_color, text_color, border) =
        if theme.dark_mode {
            (
                Color32::from_rgb(22, 24, 29),
                Color32::from_rgb(29, 32, 38),
                Color32::from_rgb(38, 42, 50),
                Color32::from_rgb(48, 53, 63),
                Color32::from_rgb(58, 64, 76),
                Color32::from_rgb(222, 226, 232),
                Color32::from_rgb(62, 68, 80),
            )
        } else {
            (
                Color32::from_rgb(248, 249, 251),
                Color32::from_rgb(240, 242, 246),
                Color32::from_rgb(229, 232, 238),
                Color32::from_rgb(218, 222, 230),
                Color32::from_rgb(205, 210, 220),
                Color32::from_rgb(33, 37, 45),
                Color32::from_rgb(196, 201, 212),
            )
        };
    let accent = accent_color();

    visuals.window_fill = panel_bg;
    visuals.panel_fill = panel_bg;
    visuals.extreme_bg_color = bg_color;
    visuals.faint_bg_color = widget_bg;

    for (widget, fill) in [
        (&mut visuals.widgets.noninteractive, widget_bg),
        (&mut visuals.widgets.inactive, widget_bg),
        (&mut visuals.widgets.hovered, hover_color),
    ] {
        widget.bg_fill = fill;
        widget.weak_bg_fill = fill;
        widget.bg_stroke = Stroke::new(1.0, border);
        widget.fg_stroke = Stroke::new(1.0, text_color);
        widget.rounding = Rounding::same(6.0);
    }

    visuals.widgets.active.bg_fill = active_color;
    visuals.widgets.active.weak_bg_fill = active_color;
    visuals.widgets.active.bg_stroke = Stroke::new(1.0, accent);
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, text_color);
    visuals.widgets.active.rounding = Rounding::same(6.0);

    visuals.selection.bg_fill = accent.linear_multiply(0.3);
    visuals.selection.stroke = Stroke::new(1.0, accent);
    visuals.hyperlink_color = accent;

    visuals.window_shadow.extrusion = 8.0;
    visuals.popup_shadow.extrusion = 6.0;

    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    style.spacing.menu_margin = egui::Margin::same(8.0);
    style.spacing.indent = 18.0;

    let mut font_sizes = BTreeMap::new();
    font_sizes.insert(TextStyle::Small, FontId::new(11.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Body, FontId::new(13.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Button, FontId::new(13.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional));
    font_sizes.insert(TextStyle::Monospace, FontId::new(12.0, FontFamily::Monospace));
    style.text_styles = font_sizes;

    ctx.set_style(style);
    ctx.set_visuals(visuals);
    ctx.set_pixels_per_point(theme.scale_factor);
}

pub fn accent_color() -> Color32 {
    Color32::from_rgb(99, 132, 246)
}

pub fn error_color() -> Color32 {
    Color32::from_rgb(220, 70, 70)
}

pub fn warning_color() -> Color32 {
    Color32::from_rgb(240, 190, 60)
}

pub fn success_color() -> Color32 {
    Color32::from_rgb(60, 170, 90)
}

pub fn info_color() -> Color32 {
    Color32::from_rgb(56, 150, 210)
}

/// Colour of the "very low enrollment" dot
pub fn very_low_dot_color() -> Color32 {
    Color32::from_rgb(239, 68, 68)
}

/// Badge fill used in the status legend
pub fn status_legend_color(status: EnrollmentStatus) -> Color32 {
    enrollment_badge(status).fill
}
