//! egui rendering of the widget grid with drag and resize

use egui::{
    vec2, Align, CursorIcon, Frame, Layout, Pos2, Rect, RichText, ScrollArea, Sense, Stroke, Ui,
    Vec2,
};
use indexmap::IndexMap;
use serde_json::{json, Value};
use td_data::{shape_widget, ChartData, ChartKind, ChartSpec};
use td_ui::{icon_button, icons, widget_key, ScrollAreaExt, UiKey};
use uuid::Uuid;

use super::Dashboard;
use crate::widgets::{show_chart, EditorOutcome, GridRect, WidgetConfig, WidgetEditor};
use crate::{SpaceView, SpaceViewId, ViewerContext};

const GAP: f32 = 8.0;
const TITLE_HEIGHT: f32 = 24.0;
const RESIZE_GRIP: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragMode {
    Move,
    Resize,
}

#[derive(Debug, Clone)]
struct Drag {
    widget_id: String,
    mode: DragMode,
    origin: GridRect,
    offset: Vec2,
}

/// Shaped data of one widget and the inputs it was shaped from
struct ShapedEntry {
    revision: u64,
    chart: ChartSpec,
    data: ChartData,
}

pub struct DashboardView {
    id: SpaceViewId,
    dashboard: Dashboard,
    row_height: f32,
    editor: Option<WidgetEditor>,
    drag: Option<Drag>,
    shaped: IndexMap<String, ShapedEntry>,
}

impl DashboardView {
    pub fn new(dashboard: Dashboard, row_height: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            dashboard,
            row_height: row_height.max(1.0),
            editor: None,
            drag: None,
            shaped: IndexMap::new(),
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn dashboard_mut(&mut self) -> &mut Dashboard {
        &mut self.dashboard
    }

    /// Chart data for a widget, reshaped only when the rows or the
    /// widget's bindings changed.
    fn chart_data(
        &mut self,
        ctx: &ViewerContext,
        widget_id: &str,
        chart: &ChartSpec,
    ) -> &ChartData {
        let revision = ctx.rows.revision();
        let shape = || {
            tracing::debug!("Shaping widget {}", widget_id);
            ShapedEntry {
                revision,
                chart: chart.clone(),
                data: shape_widget(chart, ctx.rows.rows()),
            }
        };
        let entry = self.shaped.entry(widget_id.to_string()).or_insert_with(shape);
        if entry.revision != revision || entry.chart != *chart {
            *entry = shape();
        }
        &entry.data
    }

    fn toolbar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading("Overview");
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.menu_button(format!("{} Add widget", icons::CHART), |ui| {
                    for kind in ChartKind::ALL {
                        if ui.button(kind.label()).clicked() {
                            self.dashboard.add_widget(kind);
                            ui.close_menu();
                        }
                    }
                });
            });
        });
    }

    fn cell_rect(&self, origin: Pos2, column_width: f32, rect: GridRect) -> Rect {
        Rect::from_min_size(
            origin + vec2(rect.x as f32 * column_width, rect.y as f32 * self.row_height),
            vec2(rect.w as f32 * column_width, rect.h as f32 * self.row_height),
        )
        .shrink(GAP / 2.0)
    }

    /// Grid rectangle a drag would produce
    fn dropped_rect(&self, drag: &Drag, column_width: f32) -> GridRect {
        let dx = (drag.offset.x / column_width).round() as i64;
        let dy = (drag.offset.y / self.row_height).round() as i64;
        let shift = |v: u32, d: i64| (v as i64 + d).max(0) as u32;
        let mut rect = drag.origin;
        match drag.mode {
            DragMode::Move => {
                rect.x = shift(rect.x, dx);
                rect.y = shift(rect.y, dy);
            }
            DragMode::Resize => {
                rect.w = shift(rect.w, dx).max(1);
                rect.h = shift(rect.h, dy).max(1);
            }
        }
        rect
    }

    fn finish_drag(&mut self, column_width: f32) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let rect = self.dropped_rect(&drag, column_width);
        let result = match drag.mode {
            DragMode::Move => self.dashboard.move_widget(&drag.widget_id, rect.x, rect.y),
            DragMode::Resize => self.dashboard.resize_widget(&drag.widget_id, rect.w, rect.h),
        };
        if let Err(e) = result {
            tracing::warn!("Dropped drag of {}: {}", drag.widget_id, e);
        }
    }

    fn grid(&mut self, ui: &mut Ui, ctx: &ViewerContext) {
        let columns = self.dashboard.columns();
        let column_width = (ui.available_width() / columns as f32).max(1.0);
        let height = (self.dashboard.bottom() + 2) as f32 * self.row_height;
        let (area, _) = ui.allocate_exact_size(vec2(ui.available_width(), height), Sense::hover());
        let origin = area.min;

        let widgets = self.dashboard.widgets().to_vec();
        let mut pending: Option<(String, WidgetAction)> = None;

        for widget in &widgets {
            let rect = self.cell_rect(origin, column_width, widget.rect);
            let key = widget_key(&widget.id, "frame");

            let mut child = ui.child_ui(rect, Layout::top_down(Align::Min));
            let frame = Frame::group(child.style()).fill(child.visuals().panel_fill);
            frame.show(&mut child, |ui| {
                ui.set_min_size(rect.size() - vec2(12.0, 12.0));
                ui.set_max_size(rect.size() - vec2(12.0, 12.0));

                let (title_rect, title) = ui
                    .allocate_exact_size(vec2(ui.available_width(), TITLE_HEIGHT), Sense::drag());
                let mut title_ui = ui.child_ui(title_rect, Layout::left_to_right(Align::Center));
                title_ui.label(RichText::new(&widget.title).strong());
                title_ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if icon_button(ui, icons::DELETE, "Delete Widget").clicked() {
                        pending = Some((widget.id.clone(), WidgetAction::Delete));
                    }
                    if icon_button(ui, icons::EDIT, "Edit Chart").clicked() {
                        pending = Some((widget.id.clone(), WidgetAction::Edit));
                    }
                });
                if title.hovered() {
                    ui.ctx().set_cursor_icon(CursorIcon::Grab);
                }
                if title.drag_started() {
                    self.drag = Some(Drag {
                        widget_id: widget.id.clone(),
                        mode: DragMode::Move,
                        origin: widget.rect,
                        offset: Vec2::ZERO,
                    });
                }
                if title.dragged() {
                    if let Some(drag) = self.drag.as_mut().filter(|d| d.widget_id == widget.id) {
                        drag.offset += title.drag_delta();
                    }
                }
                if title.drag_released() {
                    pending = Some((widget.id.clone(), WidgetAction::Drop));
                }
                ui.separator();

                let editing = matches!(&self.editor, Some(e) if e.widget_id() == widget.id);
                if editing {
                    let outcome = ScrollArea::vertical()
                        .id_key(key.clone().with("editor"))
                        .show(ui, |ui| self.editor.as_mut().and_then(|e| e.ui(ui)))
                        .inner;
                    match outcome {
                        Some(EditorOutcome::Save(config)) => {
                            pending = Some((widget.id.clone(), WidgetAction::Save(config)));
                        }
                        Some(EditorOutcome::Cancel) => self.editor = None,
                        None => {}
                    }
                } else {
                    let data = self.chart_data(ctx, &widget.id, &widget.chart);
                    show_chart(ui, &key, data);
                }
            });

            let grip_size = vec2(RESIZE_GRIP, RESIZE_GRIP);
            let grip = Rect::from_min_size(rect.max - grip_size, grip_size);
            let resize = ui.interact(grip, key.clone().with("resize").id(), Sense::drag());
            ui.painter().line_segment(
                [grip.left_bottom(), grip.right_top()],
                Stroke::new(1.5, ui.visuals().weak_text_color()),
            );
            if resize.hovered() {
                ui.ctx().set_cursor_icon(CursorIcon::ResizeNwSe);
            }
            if resize.drag_started() {
                self.drag = Some(Drag {
                    widget_id: widget.id.clone(),
                    mode: DragMode::Resize,
                    origin: widget.rect,
                    offset: Vec2::ZERO,
                });
            }
            if resize.dragged() {
                if let Some(drag) = self.drag.as_mut().filter(|d| d.widget_id == widget.id) {
                    drag.offset += resize.drag_delta();
                }
            }
            if resize.drag_released() {
                pending = Some((widget.id.clone(), WidgetAction::Drop));
            }
        }

        // Outline where the dragged widget would land.
        if let Some(drag) = &self.drag {
            let dropped = self.dropped_rect(drag, column_width);
            let target = self.cell_rect(origin, column_width, dropped);
            ui.painter()
                .rect_stroke(target, 4.0, Stroke::new(2.0, ui.visuals().selection.bg_fill));
        }

        if let Some((id, action)) = pending {
            self.apply(ctx, &id, action, column_width);
        }
    }

    fn apply(&mut self, ctx: &ViewerContext, id: &str, action: WidgetAction, column_width: f32) {
        let result = match action {
            WidgetAction::Edit => {
                if let Some(widget) = self.dashboard.widget(id) {
                    self.editor = Some(WidgetEditor::new(widget, ctx.rows.rows()));
                }
                Ok(())
            }
            WidgetAction::Save(config) => {
                self.editor = None;
                self.dashboard.update_widget(config)
            }
            WidgetAction::Delete => {
                self.shaped.shift_remove(id);
                if matches!(&self.editor, Some(e) if e.widget_id() == id) {
                    self.editor = None;
                }
                self.dashboard.delete_widget(id)
            }
            WidgetAction::Drop => {
                self.finish_drag(column_width);
                Ok(())
            }
        };
        if let Err(e) = result {
            tracing::warn!("Widget action on {} failed: {}", id, e);
        }
    }
}

enum WidgetAction {
    Edit,
    Save(WidgetConfig),
    Delete,
    Drop,
}

impl SpaceView for DashboardView {
    fn id(&self) -> SpaceViewId {
        self.id
    }

    fn display_name(&self) -> &str {
        "Overview"
    }

    fn view_type(&self) -> &str {
        "Dashboard"
    }

    fn ui(&mut self, ctx: &ViewerContext, ui: &mut Ui) {
        self.toolbar(ui);
        ui.add_space(4.0);
        ScrollArea::vertical()
            .id_key(UiKey::new("dashboard").with(self.id))
            .auto_shrink([false, false])
            .show(ui, |ui| self.grid(ui, ctx));
    }

    fn save_config(&self) -> Value {
        json!({ "row_height": self.row_height })
    }

    fn load_config(&mut self, config: Value) {
        if let Some(row_height) = config.get("row_height").and_then(|v| v.as_f64()) {
            self.row_height = (row_height as f32).max(1.0);
        }
    }
}
