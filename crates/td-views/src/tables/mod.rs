//! Table view implementation
//!
//! Header with sort markers, filter buttons and resize handles; a single
//! filter popover; and a virtualized body that lays out only the rows in
//! the scroll viewport.

mod columns;
mod state;

pub use columns::{clinical_columns, columns_from_rows, ColumnDef, ColumnKind, ColumnSortKinds};
pub use state::{
    popover_alignment, OpenPopover, PopoverAlign, TableState, TableVariant, GENERIC_ROW_HEIGHT,
    POPOVER_EDGE_MARGIN,
};

use egui::{
    vec2, Align, Color32, CursorIcon, Frame, Layout, Margin, Order, Pos2, Rect, RichText, Rounding,
    ScrollArea, Sense, Slider, TextEdit, Ui,
};
use indexmap::IndexMap;
use serde_json::{json, Value};
use td_core::dates::format_date;
use td_core::{
    fields, parse_date, EnrollmentFilterPolicy, EnrollmentProgress, EnrollmentStatus, Row,
    TableSettings,
};
use td_data::{ColumnFilter, DateRange};
use td_ui::theme::{
    enrollment_badge, enrollment_bar_color, phase_badge, status_legend_color, trial_status_badge,
    very_low_dot_color, BadgeStyle,
};
use td_ui::{icons, popover_id, ScrollAreaExt, UiKey};
use uuid::Uuid;

use crate::virtualizer::Virtualizer;
use crate::{SpaceView, SpaceViewId, ViewerContext};

const HEADER_HEIGHT: f32 = 32.0;
const HANDLE_WIDTH: f32 = 6.0;
/// Popovers open this far below the top of the table
const POPOVER_TOP_OFFSET: f32 = 49.0;
const MAX_CELL_CHARS: usize = 60;

/// Text typed into a date popover, kept until it parses
#[derive(Debug, Clone, Default)]
struct DateDraft {
    from: String,
    to: String,
}

/// Table view over the current rows
pub struct TableView {
    id: SpaceViewId,
    title: String,
    state: TableState,
    virtualizer: Virtualizer,
    date_drafts: IndexMap<String, DateDraft>,
    /// Filter button rectangles of the last drawn header
    filter_buttons: IndexMap<String, Rect>,
}

impl TableView {
    /// Trial table with badges and derived enrollment status
    pub fn clinical(settings: &TableSettings) -> Self {
        Self::with_state("Clinical Trials", TableState::clinical(settings))
    }

    /// Plain text table over whatever columns the rows have
    pub fn generic(settings: &TableSettings) -> Self {
        Self::with_state("Data", TableState::generic(settings))
    }

    fn with_state(title: &str, state: TableState) -> Self {
        let virtualizer = Virtualizer::new(0, state.row_height(), state.overscan());
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            state,
            virtualizer,
            date_drafts: IndexMap::new(),
            filter_buttons: IndexMap::new(),
        }
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TableState {
        &mut self.state
    }

    /// Forget the open popover and half-typed dates. Filters and sort
    /// carry over to the new rows.
    pub fn dataset_replaced(&mut self) {
        self.state.close_popover();
        self.date_drafts.clear();
    }

    fn toolbar(&mut self, ui: &mut Ui, visible: usize, total: usize) {
        ui.horizontal(|ui| {
            ui.label(format!("Rows: {} of {}", visible, total));
            ui.separator();
            ui.label(format!("Columns: {}", self.state.columns().len()));

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let any_filter = !self.state.filters().is_empty();
                if ui.add_enabled(any_filter, egui::Button::new("Clear filters")).clicked() {
                    self.state.filters_mut().clear_all();
                    self.date_drafts.clear();
                }
            });
        });
    }

    fn header(&mut self, ui: &mut Ui) {
        let columns = self.state.columns().to_vec();
        let viewport_width = ui.ctx().screen_rect().width();
        self.filter_buttons.clear();

        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;
            for column in &columns {
                let width = self.state.width(&column.key);
                let cell_size = vec2((width - HANDLE_WIDTH).max(0.0), HEADER_HEIGHT);

                ui.allocate_ui_with_layout(cell_size, Layout::left_to_right(Align::Center), |ui| {
                    ui.set_min_size(cell_size);
                    ui.spacing_mut().item_spacing.x = 4.0;

                    let marker = self.state.sort_marker(&column.key);
                    let text = if marker.is_empty() {
                        column.header.clone()
                    } else {
                        format!("{} {}", column.header, marker)
                    };
                    let label = ui
                        .add(egui::Label::new(RichText::new(text).strong()).sense(Sense::click()))
                        .on_hover_text("Click to sort");
                    if label.clicked() {
                        self.state.toggle_sort(&column.key);
                    }

                    let filtered = self.state.is_filtered(&column.key);
                    let icon = if filtered {
                        RichText::new(icons::FILTER).color(ui.visuals().selection.bg_fill)
                    } else {
                        RichText::new(icons::FILTER)
                    };
                    let button = ui.add(egui::Button::new(icon).small().frame(false));
                    if button.clicked() {
                        self.state
                            .toggle_popover(&column.key, button.rect.left(), viewport_width);
                    }
                    self.filter_buttons.insert(column.key.clone(), button.rect);
                });

                let (handle_rect, handle) =
                    ui.allocate_exact_size(vec2(HANDLE_WIDTH, HEADER_HEIGHT), Sense::drag());
                let stroke = if handle.hovered() || handle.dragged() {
                    ui.ctx().set_cursor_icon(CursorIcon::ResizeHorizontal);
                    ui.visuals().widgets.active.bg_stroke
                } else {
                    ui.visuals().widgets.noninteractive.bg_stroke
                };
                ui.painter().vline(handle_rect.center().x, handle_rect.y_range(), stroke);
                if handle.dragged() {
                    self.state.resize(&column.key, width + handle.drag_delta().x);
                }
            }
        });
        ui.separator();
    }

    fn body(&mut self, ui: &mut Ui, ctx: &ViewerContext, visible: &[usize]) {
        let columns = self.state.columns().to_vec();
        let widths: Vec<f32> = columns.iter().map(|c| self.state.width(&c.key)).collect();
        let total_width = widths.iter().sum::<f32>();
        let variant = self.state.variant();

        self.virtualizer.set_count(visible.len());

        ScrollArea::vertical()
            .id_key(UiKey::new("table").with(self.id).with("body"))
            .auto_shrink([false, false])
            .show_viewport(ui, |ui, viewport| {
                ui.set_height(self.virtualizer.total_height());
                ui.set_width(total_width);

                self.virtualizer.set_viewport_height(viewport.height());
                self.virtualizer.set_scroll_offset(viewport.min.y);

                let origin = ui.max_rect().min;
                let faint = ui.visuals().faint_bg_color;

                for item in self.virtualizer.items() {
                    let Some(row) = visible.get(item.index).and_then(|&i| ctx.rows.get(i)) else {
                        continue;
                    };
                    let row_rect = Rect::from_min_size(
                        Pos2::new(origin.x, origin.y + item.start),
                        vec2(total_width, item.size),
                    );
                    if item.index % 2 == 1 {
                        ui.painter().rect_filled(row_rect, 0.0, faint);
                    }

                    let mut left = row_rect.left();
                    for (column, width) in columns.iter().zip(&widths) {
                        let cell_rect = Rect::from_min_size(
                            Pos2::new(left, row_rect.top()),
                            vec2(*width, item.size),
                        )
                        .shrink2(vec2(4.0, 2.0));
                        left += width;

                        ui.allocate_ui_at_rect(cell_rect, |ui| {
                            ui.set_clip_rect(cell_rect.intersect(ui.clip_rect()));
                            let layout = Layout::left_to_right(Align::Center);
                            ui.with_layout(layout, |ui| match variant {
                                TableVariant::Clinical => clinical_cell(ui, column, row, ctx),
                                TableVariant::Generic => text_cell(ui, row, &column.key),
                            });
                        });
                    }
                }
            });
    }

    fn popover(&mut self, ctx: &ViewerContext, ui: &Ui, table_top: f32) {
        let Some(open) = self.state.popover().cloned() else {
            return;
        };
        let (Some(column), Some(button)) = (
            self.state.column(&open.column).cloned(),
            self.filter_buttons.get(&open.column).copied(),
        ) else {
            self.state.close_popover();
            return;
        };

        let width = column.popover_width();
        let x = match open.align {
            PopoverAlign::Left => button.left(),
            PopoverAlign::Right => button.right() - width,
        };
        let pos = Pos2::new(x, table_top + POPOVER_TOP_OFFSET);

        let area = egui::Area::new(popover_id(self.id, &column.key))
            .order(Order::Foreground)
            .fixed_pos(pos)
            .show(ui.ctx(), |ui| {
                Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(width);
                    self.popover_contents(ui, ctx, &column);
                });
            });

        let pressed_at = ui
            .ctx()
            .input(|i| if i.pointer.any_pressed() { i.pointer.interact_pos() } else { None });
        if let Some(pos) = pressed_at {
            let inside = area.response.rect.contains(pos);
            let on_button = self.filter_buttons.values().any(|r| r.contains(pos));
            self.state.pointer_down(inside, on_button);
        }
    }

    fn popover_contents(&mut self, ui: &mut Ui, ctx: &ViewerContext, column: &ColumnDef) {
        let key = column.key.as_str();
        match column.kind {
            ColumnKind::Categorical => {
                let options = self.state.options(&ctx.rows, key);
                let selected = self.state.filters().selected_values(key);
                if options.is_empty() {
                    ui.weak("No options");
                } else {
                    ScrollArea::vertical()
                        .id_key(UiKey::new("table").with(self.id).with("options").with(key))
                        .max_height(200.0)
                        .show(ui, |ui| {
                            for option in &options {
                                let mut checked = selected.contains(option);
                                if ui.checkbox(&mut checked, option.as_str()).changed() {
                                    self.state.filters_mut().toggle_value(key, option);
                                }
                            }
                        });
                }
                ui.separator();
                if ui.button("Clear").clicked() {
                    self.state.clear_filter(key);
                }
            }
            ColumnKind::Text => {
                let mut text = self.state.filters().text(key);
                let edit = ui.add(TextEdit::singleline(&mut text).hint_text("Search…"));
                if edit.changed() {
                    self.state.set_filter(key, ColumnFilter::Text(text));
                }
            }
            ColumnKind::Date => self.date_controls(ui, key),
            ColumnKind::Enrollment => match self.state.enrollment_policy() {
                EnrollmentFilterPolicy::StatusSet => {
                    let selected = self.state.filters().selected_statuses(key);
                    for status in EnrollmentStatus::ALL {
                        ui.horizontal(|ui| {
                            let mut checked = selected.contains(&status);
                            if ui.checkbox(&mut checked, "").changed() {
                                self.state.toggle_status(key, status);
                            }
                            let (dot, _) = ui.allocate_exact_size(vec2(10.0, 10.0), Sense::hover());
                            ui.painter()
                                .circle_filled(dot.center(), 4.0, status_legend_color(status));
                            ui.label(status.label()).on_hover_text(status.tooltip());
                        });
                    }
                    ui.separator();
                    if ui.button("Clear").clicked() {
                        self.state.clear_filter(key);
                    }
                }
                EnrollmentFilterPolicy::MinPercentage => {
                    let mut percent = self.state.filters().min_percent(key);
                    ui.label("Minimum enrollment");
                    if ui.add(Slider::new(&mut percent, 0..=100).suffix("%")).changed() {
                        self.state.set_min_percent(key, percent);
                    }
                }
            },
        }
    }

    fn date_controls(&mut self, ui: &mut Ui, key: &str) {
        let range = self.state.filters().date_range(key);
        let draft = self.date_drafts.entry(key.to_string()).or_insert_with(|| DateDraft {
            from: range.from.map(format_date).unwrap_or_default(),
            to: range.to.map(format_date).unwrap_or_default(),
        });

        let mut changed = false;
        egui::Grid::new(UiKey::new("table").with(self.id).with("dates").with(key).id())
            .num_columns(2)
            .show(ui, |ui| {
                ui.label("From:");
                changed |= ui
                    .add(TextEdit::singleline(&mut draft.from).hint_text("MM/DD/YYYY"))
                    .changed();
                ui.end_row();
                ui.label("To:");
                changed |= ui
                    .add(TextEdit::singleline(&mut draft.to).hint_text("MM/DD/YYYY"))
                    .changed();
                ui.end_row();
            });

        if changed {
            let range = DateRange::new(parse_date(&draft.from), parse_date(&draft.to));
            self.state.set_filter(key, ColumnFilter::DateRange(range));
        }

        ui.separator();
        if ui.button("Clear").clicked() {
            self.state.clear_filter(key);
            self.date_drafts.shift_remove(key);
        }
    }
}

impl SpaceView for TableView {
    fn id(&self) -> SpaceViewId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.title
    }

    fn view_type(&self) -> &str {
        match self.state.variant() {
            TableVariant::Clinical => "ClinicalTable",
            TableVariant::Generic => "GenericTable",
        }
    }

    fn ui(&mut self, ctx: &ViewerContext, ui: &mut Ui) {
        self.state.sync_columns(&ctx.rows);
        let visible = self.state.visible_rows(&ctx.rows, ctx.today);

        self.toolbar(ui, visible.len(), ctx.rows.len());
        ui.add_space(4.0);

        let table_top = ui.cursor().top();
        ScrollArea::horizontal()
            .id_key(UiKey::new("table").with(self.id).with("hscroll"))
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    self.header(ui);
                    if visible.is_empty() {
                        ui.add_space(24.0);
                        ui.vertical_centered(|ui| ui.weak("No data found."));
                    } else {
                        self.body(ui, ctx, &visible);
                    }
                });
            });

        self.popover(ctx, ui, table_top);
    }

    fn save_config(&self) -> Value {
        let policy = serde_json::to_value(self.state.enrollment_policy()).unwrap_or(Value::Null);
        json!({
            "widths": self.state.custom_widths(),
            "enrollment_filter": policy,
        })
    }

    fn load_config(&mut self, config: Value) {
        if let Some(widths) = config.get("widths").and_then(|v| v.as_object()) {
            for (key, width) in widths {
                if let Some(width) = width.as_f64() {
                    self.state.resize(key, width as f32);
                }
            }
        }
        if let Some(policy) = config
            .get("enrollment_filter")
            .and_then(|v| serde_json::from_value::<EnrollmentFilterPolicy>(v.clone()).ok())
        {
            self.state.set_enrollment_policy(policy);
        }
    }
}

fn truncated(text: &str) -> String {
    if text.chars().count() > MAX_CELL_CHARS {
        let head: String = text.chars().take(MAX_CELL_CHARS).collect();
        format!("{}…", head)
    } else {
        text.to_string()
    }
}

fn text_cell(ui: &mut Ui, row: &Row, key: &str) {
    let Some(text) = row.text(key) else {
        return;
    };
    let short = truncated(&text);
    let response = ui.label(short.as_str());
    if short != text {
        response.on_hover_text(text);
    }
}

fn badge(ui: &mut Ui, text: &str, style: BadgeStyle) -> egui::Response {
    let label = if style.icon {
        format!("{} {}", icons::WARNING, text)
    } else {
        text.to_string()
    };
    Frame::none()
        .fill(style.fill)
        .rounding(Rounding::same(8.0))
        .inner_margin(Margin::symmetric(6.0, 2.0))
        .show(ui, |ui| ui.label(RichText::new(label).small().color(style.text)))
        .response
}

fn clinical_cell(ui: &mut Ui, column: &ColumnDef, row: &Row, ctx: &ViewerContext) {
    match column.kind {
        ColumnKind::Enrollment => enrollment_cell(ui, row, ctx),
        ColumnKind::Categorical => {
            let Some(value) = row.text(&column.key) else {
                return;
            };
            let style = match column.key.as_str() {
                fields::STATUS => trial_status_badge(&value),
                fields::PHASE => phase_badge(&value),
                _ => None,
            };
            match style {
                Some(style) => {
                    badge(ui, &value, style);
                }
                None => {
                    ui.label(value);
                }
            }
        }
        ColumnKind::Text | ColumnKind::Date => text_cell(ui, row, &column.key),
    }
}

fn enrollment_cell(ui: &mut Ui, row: &Row, ctx: &ViewerContext) {
    let progress = EnrollmentProgress::from_row(row, ctx.today);
    let status = progress.status;

    ui.vertical(|ui| {
        ui.spacing_mut().item_spacing.y = 2.0;
        ui.horizontal(|ui| {
            badge(ui, status.label(), enrollment_badge(status)).on_hover_text(status.tooltip());
            if progress.is_very_low() {
                let (dot, response) = ui.allocate_exact_size(vec2(8.0, 8.0), Sense::hover());
                ui.painter().circle_filled(dot.center(), 4.0, very_low_dot_color());
                response.on_hover_text("Very low enrollment");
            }
        });

        let bar_width = (ui.available_width() - 4.0).max(20.0);
        let (bar, _) = ui.allocate_exact_size(vec2(bar_width, 6.0), Sense::hover());
        ui.painter()
            .rect_filled(bar, Rounding::same(3.0), ui.visuals().extreme_bg_color);
        let color = enrollment_bar_color(status);
        // An empty trial shows a full, faded bar.
        let (fraction, fill) = if progress.percent == 0 {
            (1.0, color.gamma_multiply(0.5))
        } else {
            (progress.percent as f32 / 100.0, color)
        };
        let filled = Rect::from_min_size(bar.min, vec2(bar.width() * fraction, bar.height()));
        ui.painter().rect_filled(filled, Rounding::same(3.0), fill);

        ui.label(RichText::new(progress.caption()).small().color(Color32::GRAY));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_dataset_drops_popover_and_drafts() {
        let mut table = TableView::clinical(&TableSettings::default());
        table.state_mut().toggle_popover(fields::PLANNED_END_DATE, 400.0, 1280.0);
        table.date_drafts.insert(
            fields::PLANNED_END_DATE.to_string(),
            DateDraft { from: "01/0".into(), to: String::new() },
        );
        table.state_mut().filters_mut().set(
            fields::STATUS.to_string(),
            ColumnFilter::Values(["Recruiting".to_string()].into_iter().collect()),
        );

        table.dataset_replaced();

        assert!(table.state().popover().is_none());
        assert!(table.date_drafts.is_empty());
        assert!(!table.state().filters().is_empty());
    }
}
