//! Space view abstraction - base trait for the table and the widget grid

use egui::Ui;
use serde_json::Value;
use uuid::Uuid;

use crate::ViewerContext;

/// Unique identifier for a space view
pub type SpaceViewId = Uuid;

/// Base trait for the views shown in the central panel
pub trait SpaceView {
    /// Get the unique ID of this view
    fn id(&self) -> SpaceViewId;

    /// Get the display name
    fn display_name(&self) -> &str;

    /// Get the view type (for serialization)
    fn view_type(&self) -> &str;

    /// Draw the UI
    fn ui(&mut self, ctx: &ViewerContext, ui: &mut Ui);

    /// Save configuration
    fn save_config(&self) -> Value;

    /// Load configuration; unknown or malformed fields are ignored
    fn load_config(&mut self, config: Value);
}
