//! Dashboard widgets: configuration, templates and the edit form

mod render;

pub use render::{chart_color, show_chart, DOT_LIMIT};

use egui::{ComboBox, TextEdit, Ui};
use serde::{Deserialize, Serialize};
use td_core::{fields, Row};
use td_data::{ChartKind, ChartSpec, KeyClasses};
use td_ui::UiKey;
use uuid::Uuid;

/// A widget's cell rectangle on the dashboard grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridRect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    pub fn overlaps(&self, other: &GridRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub id: String,
    pub title: String,
    pub chart: ChartSpec,
    pub rect: GridRect,
}

impl WidgetConfig {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        chart: ChartSpec,
        rect: GridRect,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            chart,
            rect,
        }
    }

    /// Fresh widget of `kind` with a unique id, placed at row `y`
    pub fn template(kind: ChartKind, y: u32) -> Self {
        let (title, rect) = match kind {
            ChartKind::Text => ("Text".to_string(), GridRect::new(0, y, 4, 4)),
            _ => (format!("New {} Chart", kind.label()), GridRect::new(0, y, 3, 8)),
        };
        Self::new(Uuid::new_v4().to_string(), title, ChartSpec::blank(kind), rect)
    }

    pub fn kind(&self) -> ChartKind {
        self.chart.kind()
    }
}

/// Widgets shown before anything has been saved
pub fn default_widgets() -> Vec<WidgetConfig> {
    let enrollment_keys = vec![
        fields::CURRENT_ENROLLMENT.to_string(),
        fields::ENROLLMENT_TARGET.to_string(),
    ];
    vec![
        WidgetConfig::new(
            "enrollmentProgress",
            "Enrollment Progress by Study",
            ChartSpec::Bar {
                x_key: fields::STUDY_ID.to_string(),
                y_keys: enrollment_keys,
                merge_duplicates: true,
            },
            GridRect::new(0, 0, 6, 8),
        ),
        WidgetConfig::new(
            "statusCountBar",
            "Trials by Status (Bar)",
            ChartSpec::Bar {
                x_key: fields::STATUS.to_string(),
                y_keys: Vec::new(),
                merge_duplicates: false,
            },
            GridRect::new(6, 0, 6, 8),
        ),
        WidgetConfig::new(
            "statusCountPie",
            "Trials by Status (Pie)",
            ChartSpec::Pie {
                group_key: fields::STATUS.to_string(),
                value_key: String::new(),
            },
            GridRect::new(0, 8, 6, 8),
        ),
        WidgetConfig::new(
            "enrollmentLine",
            "Enrollment Target vs Current (Line)",
            ChartSpec::Line {
                x_key: fields::STUDY_ID.to_string(),
                y_key: fields::CURRENT_ENROLLMENT.to_string(),
                merge_duplicates: false,
            },
            GridRect::new(6, 8, 6, 8),
        ),
    ]
}

/// Result of one frame of the edit form
#[derive(Debug, Clone, PartialEq)]
pub enum EditorOutcome {
    Save(WidgetConfig),
    Cancel,
}

/// Edit form over a local copy of a widget. Nothing reaches the
/// dashboard until the copy is saved.
#[derive(Debug, Clone)]
pub struct WidgetEditor {
    draft: WidgetConfig,
    keys: KeyClasses,
}

impl WidgetEditor {
    pub fn new(widget: &WidgetConfig, rows: &[Row]) -> Self {
        Self {
            draft: widget.clone(),
            keys: KeyClasses::detect(rows),
        }
    }

    pub fn widget_id(&self) -> &str {
        &self.draft.id
    }

    pub fn draft(&self) -> &WidgetConfig {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut WidgetConfig {
        &mut self.draft
    }

    pub fn keys(&self) -> &KeyClasses {
        &self.keys
    }

    /// Change the chart kind, keeping the x binding
    pub fn set_kind(&mut self, kind: ChartKind) {
        self.draft.chart = self.draft.chart.convert(kind);
    }

    pub fn save(self) -> WidgetConfig {
        self.draft
    }

    pub fn ui(&mut self, ui: &mut Ui) -> Option<EditorOutcome> {
        let base = UiKey::new("editor").with(&self.draft.id);

        ui.horizontal(|ui| {
            ui.label("Title");
            ui.add(TextEdit::singleline(&mut self.draft.title).desired_width(f32::INFINITY));
        });

        let mut kind = self.draft.kind();
        ComboBox::from_id_source(base.clone().with("kind").build())
            .selected_text(kind.label())
            .show_ui(ui, |ui| {
                for option in ChartKind::ALL {
                    ui.selectable_value(&mut kind, option, option.label());
                }
            });
        if kind != self.draft.kind() {
            self.set_kind(kind);
        }

        let KeyClasses {
            data_keys,
            string_keys,
            numeric_keys,
        } = &self.keys;

        match &mut self.draft.chart {
            ChartSpec::Pie { group_key, value_key } => {
                key_select(ui, &base, "Group by", group_key, string_keys, false);
                key_select(ui, &base, "Value", value_key, numeric_keys, true);
            }
            ChartSpec::Bar {
                x_key,
                y_keys,
                merge_duplicates,
            } => {
                key_select(ui, &base, "X axis", x_key, data_keys, false);
                ui.label("Y axis");
                for key in numeric_keys {
                    let mut checked = y_keys.contains(key);
                    if ui.checkbox(&mut checked, key.as_str()).changed() {
                        if checked {
                            y_keys.push(key.clone());
                        } else {
                            y_keys.retain(|k| k != key);
                        }
                    }
                }
                ui.checkbox(merge_duplicates, "Merge duplicates");
            }
            ChartSpec::Line {
                x_key,
                y_key,
                merge_duplicates,
            }
            | ChartSpec::Area {
                x_key,
                y_key,
                merge_duplicates,
            } => {
                key_select(ui, &base, "X axis", x_key, data_keys, false);
                key_select(ui, &base, "Y axis", y_key, numeric_keys, true);
                ui.checkbox(merge_duplicates, "Merge duplicates");
            }
            ChartSpec::Scatter { x_key, y_key } => {
                key_select(ui, &base, "X axis", x_key, numeric_keys, false);
                key_select(ui, &base, "Y axis", y_key, numeric_keys, false);
            }
            ChartSpec::Radar { x_key, y_key } => {
                key_select(ui, &base, "Category", x_key, string_keys, false);
                key_select(ui, &base, "Value", y_key, numeric_keys, true);
            }
            ChartSpec::Text { header, body } => {
                ui.add(TextEdit::singleline(header).hint_text("Enter header/title"));
                ui.add(TextEdit::multiline(body).hint_text("Enter text").desired_rows(4));
            }
        }

        let mut outcome = None;
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                outcome = Some(EditorOutcome::Save(self.draft.clone()));
            }
            if ui.button("Cancel").clicked() {
                outcome = Some(EditorOutcome::Cancel);
            }
        });
        outcome
    }
}

/// Combo box over `options`; `optional` adds a "None" entry mapping to
/// the empty key.
fn key_select(
    ui: &mut Ui,
    base: &UiKey,
    label: &str,
    value: &mut String,
    options: &[String],
    optional: bool,
) {
    ui.horizontal(|ui| {
        ui.label(label);
        let shown = if value.is_empty() { "Select…" } else { value.as_str() };
        ComboBox::from_id_source(base.clone().with(label).build())
            .selected_text(shown.to_string())
            .show_ui(ui, |ui| {
                if optional {
                    ui.selectable_value(value, String::new(), "None");
                }
                for option in options {
                    ui.selectable_value(value, option.clone(), option.as_str());
                }
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates() {
        let pie = WidgetConfig::template(ChartKind::Pie, 16);
        assert_eq!(pie.rect, GridRect::new(0, 16, 3, 8));
        assert_eq!(pie.title, "New Pie Chart");

        let text = WidgetConfig::template(ChartKind::Text, 0);
        assert_eq!((text.rect.w, text.rect.h), (4, 4));
        assert!(matches!(text.chart, ChartSpec::Text { ref body, .. } if !body.is_empty()));

        assert_ne!(pie.id, WidgetConfig::template(ChartKind::Pie, 16).id);
    }

    #[test]
    fn test_default_widgets_do_not_overlap() {
        let widgets = default_widgets();
        assert_eq!(widgets.len(), 4);
        for (i, a) in widgets.iter().enumerate() {
            for b in &widgets[i + 1..] {
                assert!(!a.rect.overlaps(&b.rect), "{} overlaps {}", a.id, b.id);
            }
        }
    }

    #[test]
    fn test_overlap() {
        let a = GridRect::new(0, 0, 6, 8);
        assert!(a.overlaps(&GridRect::new(5, 7, 2, 2)));
        assert!(!a.overlaps(&GridRect::new(6, 0, 6, 8)));
        assert!(!a.overlaps(&GridRect::new(0, 8, 6, 8)));
    }

    #[test]
    fn test_editor_works_on_a_copy() {
        let rows = vec![Row::new()
            .with(fields::STATUS, "Recruiting")
            .with(fields::CURRENT_ENROLLMENT, 4.0)];
        let original = default_widgets().remove(2);
        let mut editor = WidgetEditor::new(&original, &rows);
        assert_eq!(editor.keys().string_keys, vec![fields::STATUS]);

        editor.draft_mut().title = "Renamed".into();
        editor.set_kind(ChartKind::Bar);
        assert_eq!(original.title, "Trials by Status (Pie)");

        let saved = editor.save();
        assert_eq!(saved.id, original.id);
        assert_eq!(saved.chart.x_key(), Some(fields::STATUS));
        assert_eq!(saved.kind(), ChartKind::Bar);
    }

    #[test]
    fn test_widget_json_shape() {
        let widget = WidgetConfig::new(
            "w1",
            "Scatter",
            ChartSpec::Scatter {
                x_key: "a".into(),
                y_key: "b".into(),
            },
            GridRect::new(1, 2, 3, 4),
        );
        let json = serde_json::to_value(&widget).unwrap();
        assert_eq!(json["chart"]["type"], "scatter");
        assert_eq!(json["rect"]["w"], 3);
    }
}
