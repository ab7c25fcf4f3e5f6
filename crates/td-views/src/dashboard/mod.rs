//! Widget grid
//!
//! Widgets sit on a grid of fixed-width columns and fixed-height rows.
//! Every mutation is followed by vertical compaction and a save to the
//! layout store.

mod view;

pub use view::DashboardView;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use td_core::events::{Event, LayoutChanged, WidgetAdded, WidgetRemoved};
use td_core::EventBus;
use td_data::ChartKind;
use thiserror::Error;

use crate::widgets::{default_widgets, GridRect, WidgetConfig};

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Layout file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown widget: {0}")]
    UnknownWidget(String),
}

/// Where the widget list is kept between runs
pub trait LayoutStore: Send + Sync {
    /// Saved widgets, or `None` when nothing has been saved yet
    fn load(&self) -> Result<Option<Vec<WidgetConfig>>, LayoutError>;

    fn save(&self, widgets: &[WidgetConfig]) -> Result<(), LayoutError>;
}

/// Widget list as a pretty-printed JSON file
pub struct JsonFileLayoutStore {
    path: PathBuf,
}

impl JsonFileLayoutStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LayoutStore for JsonFileLayoutStore {
    fn load(&self) -> Result<Option<Vec<WidgetConfig>>, LayoutError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save(&self, widgets: &[WidgetConfig]) -> Result<(), LayoutError> {
        let text = serde_json::to_string_pretty(widgets)?;
        std::fs::write(&self.path, text)?;
        tracing::debug!("Saved {} widgets to {}", widgets.len(), self.path.display());
        Ok(())
    }
}

/// In-memory store, counting saves
#[derive(Default)]
pub struct MemoryLayoutStore {
    widgets: Mutex<Option<Vec<WidgetConfig>>>,
    saves: Mutex<usize>,
}

impl MemoryLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_widgets(widgets: Vec<WidgetConfig>) -> Self {
        Self {
            widgets: Mutex::new(Some(widgets)),
            saves: Mutex::new(0),
        }
    }

    pub fn saved(&self) -> Option<Vec<WidgetConfig>> {
        self.widgets.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl LayoutStore for MemoryLayoutStore {
    fn load(&self) -> Result<Option<Vec<WidgetConfig>>, LayoutError> {
        Ok(self.widgets.lock().clone())
    }

    fn save(&self, widgets: &[WidgetConfig]) -> Result<(), LayoutError> {
        *self.widgets.lock() = Some(widgets.to_vec());
        *self.saves.lock() += 1;
        Ok(())
    }
}

impl<S: LayoutStore + ?Sized> LayoutStore for Arc<S> {
    fn load(&self) -> Result<Option<Vec<WidgetConfig>>, LayoutError> {
        (**self).load()
    }

    fn save(&self, widgets: &[WidgetConfig]) -> Result<(), LayoutError> {
        (**self).save(widgets)
    }
}

fn collides(rect: &GridRect, placed: &[GridRect]) -> Option<GridRect> {
    placed.iter().find(|other| rect.overlaps(other)).copied()
}

/// Vertical compaction. Items are visited in `(y, x)` order (`first`
/// wins ties) and each is moved up until it would hit an item placed
/// before it, then below anything it still overlaps.
pub fn compact_vertical(widgets: &mut [WidgetConfig], first: Option<&str>) {
    let mut order: Vec<usize> = (0..widgets.len()).collect();
    order.sort_by_key(|&i| {
        let w = &widgets[i];
        (w.rect.y, w.rect.x, Some(w.id.as_str()) != first)
    });

    let mut placed: Vec<GridRect> = Vec::with_capacity(widgets.len());
    for i in order {
        let mut rect = widgets[i].rect;
        while rect.y > 0 {
            let up = GridRect { y: rect.y - 1, ..rect };
            if collides(&up, &placed).is_some() {
                break;
            }
            rect = up;
        }
        while let Some(other) = collides(&rect, &placed) {
            rect.y = other.bottom();
        }
        widgets[i].rect = rect;
        placed.push(rect);
    }
}

pub struct Dashboard {
    widgets: Vec<WidgetConfig>,
    columns: u32,
    store: Box<dyn LayoutStore>,
    event_bus: Option<Arc<EventBus>>,
}

impl Dashboard {
    /// Load the saved layout, or the default widgets when there is none.
    /// A store that fails to load is logged and treated as empty.
    pub fn new(columns: u32, store: Box<dyn LayoutStore>) -> Self {
        let columns = columns.max(1);
        let widgets = match store.load() {
            Ok(Some(widgets)) => {
                tracing::info!("Restored {} dashboard widgets", widgets.len());
                widgets
            }
            Ok(None) => default_widgets(),
            Err(e) => {
                tracing::warn!("Could not load dashboard layout, using defaults: {}", e);
                default_widgets()
            }
        };

        let mut dashboard = Self {
            widgets,
            columns,
            store,
            event_bus: None,
        };
        for widget in &mut dashboard.widgets {
            widget.rect = dashboard_clamp(widget.rect, columns);
        }
        compact_vertical(&mut dashboard.widgets, None);
        dashboard
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn widgets(&self) -> &[WidgetConfig] {
        &self.widgets
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetConfig> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// First free row below every widget
    pub fn bottom(&self) -> u32 {
        self.widgets.iter().map(|w| w.rect.bottom()).max().unwrap_or(0)
    }

    /// Add a widget of `kind` from its template. Returns the new id.
    pub fn add_widget(&mut self, kind: ChartKind) -> String {
        let widget = WidgetConfig::template(kind, self.bottom());
        let id = widget.id.clone();
        self.add(widget);
        id
    }

    /// Add `widget` below all existing ones
    pub fn add(&mut self, mut widget: WidgetConfig) {
        widget.rect = dashboard_clamp(widget.rect, self.columns);
        widget.rect.y = self.bottom();
        tracing::info!("Added {} widget {}", widget.kind().label(), widget.id);

        self.publish(WidgetAdded {
            widget_id: widget.id.clone(),
            kind: widget.kind().label().to_string(),
        });
        self.widgets.push(widget);
        self.commit(None);
    }

    /// Replace the widget with the same id; its rectangle is kept.
    pub fn update_widget(&mut self, widget: WidgetConfig) -> Result<(), LayoutError> {
        let slot = self.slot(&widget.id)?;
        let rect = slot.rect;
        *slot = WidgetConfig { rect, ..widget };
        self.persist();
        Ok(())
    }

    pub fn delete_widget(&mut self, id: &str) -> Result<(), LayoutError> {
        let index = self
            .widgets
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| LayoutError::UnknownWidget(id.to_string()))?;
        self.widgets.remove(index);
        tracing::info!("Removed widget {}", id);

        self.publish(WidgetRemoved {
            widget_id: id.to_string(),
        });
        self.commit(None);
        Ok(())
    }

    /// Move a widget's top-left cell. `x` is clamped so the widget stays
    /// inside the grid; other widgets make room.
    pub fn move_widget(&mut self, id: &str, x: u32, y: u32) -> Result<(), LayoutError> {
        let columns = self.columns;
        let slot = self.slot(id)?;
        slot.rect.x = x.min(columns.saturating_sub(slot.rect.w));
        slot.rect.y = y;
        self.commit(Some(id));
        Ok(())
    }

    /// Resize a widget, keeping at least one cell each way and its right
    /// edge inside the grid.
    pub fn resize_widget(&mut self, id: &str, w: u32, h: u32) -> Result<(), LayoutError> {
        let columns = self.columns;
        let slot = self.slot(id)?;
        slot.rect.w = w.clamp(1, columns.saturating_sub(slot.rect.x).max(1));
        slot.rect.h = h.max(1);
        self.commit(Some(id));
        Ok(())
    }

    fn slot(&mut self, id: &str) -> Result<&mut WidgetConfig, LayoutError> {
        self.widgets
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| LayoutError::UnknownWidget(id.to_string()))
    }

    fn commit(&mut self, moved: Option<&str>) {
        compact_vertical(&mut self.widgets, moved);
        self.publish(LayoutChanged {
            widget_count: self.widgets.len(),
        });
        self.persist();
    }

    /// Save failures are logged; the in-memory layout stays authoritative.
    fn persist(&self) {
        if let Err(e) = self.store.save(&self.widgets) {
            tracing::warn!("Failed to save dashboard layout: {}", e);
        }
    }

    fn publish<E: Event>(&self, event: E) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}

fn dashboard_clamp(rect: GridRect, columns: u32) -> GridRect {
    let w = rect.w.clamp(1, columns);
    GridRect {
        x: rect.x.min(columns - w),
        y: rect.y,
        w,
        h: rect.h.max(1),
    }
}
