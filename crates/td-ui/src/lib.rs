//! User interface components for the clinical trial dashboard
//!
//! Theme and badge palette, egui id helpers, and the application shell
//! (header with the upload control, sidebar with navigation and the
//! stored file list).

pub mod ids;
pub mod shell;
pub mod theme;

use std::time::{Duration, Instant};

pub use ids::{popover_id, widget_key, ScrollAreaExt, UiKey};
pub use shell::{central_panel, header, sidebar, Page, ShellAction};
pub use theme::{apply_theme, Theme};

/// How long a transient error stays on screen
pub const ERROR_TTL: Duration = Duration::from_secs(10);

/// UI state that persists across frames
#[derive(Default)]
pub struct UiState {
    /// Page shown in the central panel
    pub page: Page,

    /// Transient error messages
    pub error_messages: Vec<ErrorMessage>,
}

impl UiState {
    pub fn push_error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.error_messages.push(ErrorMessage {
            title: title.into(),
            message: message.into(),
            timestamp: Instant::now(),
        });
    }

    /// Drop messages older than [`ERROR_TTL`]
    pub fn expire_errors(&mut self, now: Instant) {
        self.error_messages
            .retain(|msg| now.duration_since(msg.timestamp) < ERROR_TTL);
    }
}

/// Error message to display
pub struct ErrorMessage {
    pub title: String,
    pub message: String,
    pub timestamp: Instant,
}

pub fn icon_button(ui: &mut egui::Ui, icon: &str, tooltip: &str) -> egui::Response {
    ui.add(egui::Button::new(icon)).on_hover_text(tooltip)
}

pub mod icons {
    pub const UPLOAD: &str = "⬆";
    pub const FILE: &str = "📄";
    pub const DELETE: &str = "🗑";
    pub const REFRESH: &str = "⟳";
    pub const CHART: &str = "📊";
    pub const TABLE: &str = "📋";
    pub const HOME: &str = "🏠";
    pub const EDIT: &str = "✏";
    pub const CLOSE: &str = "✖";
    pub const FILTER: &str = "⏷";
    pub const WARNING: &str = "⚠";
}
