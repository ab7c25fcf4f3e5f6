//! View system for the clinical trial dashboard
//!
//! The trial table (pure [`TableState`] plus its egui [`TableView`]), the
//! row [`Virtualizer`] behind it, and the widget grid.

pub mod dashboard;
mod space_view;
pub mod tables;
pub mod virtualizer;
pub mod widgets;

pub use dashboard::{
    compact_vertical, Dashboard, DashboardView, JsonFileLayoutStore, LayoutError, LayoutStore,
    MemoryLayoutStore,
};
pub use space_view::{SpaceView, SpaceViewId};
pub use tables::{ColumnDef, ColumnKind, PopoverAlign, TableState, TableVariant, TableView};
pub use virtualizer::{VirtualItem, Virtualizer};
pub use widgets::{default_widgets, EditorOutcome, GridRect, WidgetConfig, WidgetEditor};

use std::sync::Arc;

use chrono::NaiveDate;
use td_core::{AppState, RowSet};

/// Context passed to views during rendering
#[derive(Clone)]
pub struct ViewerContext {
    /// Shared application state
    pub state: Arc<AppState>,

    /// Rows as of the start of the frame
    pub rows: RowSet,

    /// Date derived enrollment statuses are computed against
    pub today: NaiveDate,
}

impl ViewerContext {
    pub fn new(state: Arc<AppState>, today: NaiveDate) -> Self {
        let rows = state.rows();
        Self { state, rows, today }
    }

    /// Context over the local calendar date
    pub fn now(state: Arc<AppState>) -> Self {
        Self::new(state, chrono::Local::now().date_naive())
    }
}
