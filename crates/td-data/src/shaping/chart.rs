use serde::{Deserialize, Serialize};

/// Kinds of dashboard widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Bar,
    Line,
    Area,
    Scatter,
    Radar,
    Text,
}

impl ChartKind {
    pub const ALL: [ChartKind; 7] = [
        ChartKind::Pie,
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Area,
        ChartKind::Scatter,
        ChartKind::Radar,
        ChartKind::Text,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Pie => "Pie",
            ChartKind::Bar => "Bar",
            ChartKind::Line => "Line",
            ChartKind::Area => "Area",
            ChartKind::Scatter => "Scatter",
            ChartKind::Radar => "Radar",
            ChartKind::Text => "Text",
        }
    }
}

/// Field bindings of a widget. An empty key means "not chosen".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChartSpec {
    Pie {
        group_key: String,
        /// Empty counts rows instead of summing
        #[serde(default)]
        value_key: String,
    },
    Bar {
        x_key: String,
        /// Stacked series; none shows frequencies
        #[serde(default)]
        y_keys: Vec<String>,
        #[serde(default)]
        merge_duplicates: bool,
    },
    Line {
        x_key: String,
        #[serde(default)]
        y_key: String,
        #[serde(default)]
        merge_duplicates: bool,
    },
    Area {
        x_key: String,
        #[serde(default)]
        y_key: String,
        #[serde(default)]
        merge_duplicates: bool,
    },
    Scatter {
        x_key: String,
        y_key: String,
    },
    Radar {
        x_key: String,
        #[serde(default)]
        y_key: String,
    },
    Text {
        header: String,
        body: String,
    },
}

impl ChartSpec {
    /// Unbound spec as offered when a widget of `kind` is added
    pub fn blank(kind: ChartKind) -> Self {
        match kind {
            ChartKind::Pie => ChartSpec::Pie {
                group_key: String::new(),
                value_key: String::new(),
            },
            ChartKind::Bar => ChartSpec::Bar {
                x_key: String::new(),
                y_keys: Vec::new(),
                merge_duplicates: true,
            },
            ChartKind::Line => ChartSpec::Line {
                x_key: String::new(),
                y_key: String::new(),
                merge_duplicates: false,
            },
            ChartKind::Area => ChartSpec::Area {
                x_key: String::new(),
                y_key: String::new(),
                merge_duplicates: true,
            },
            ChartKind::Scatter => ChartSpec::Scatter {
                x_key: String::new(),
                y_key: String::new(),
            },
            ChartKind::Radar => ChartSpec::Radar {
                x_key: String::new(),
                y_key: String::new(),
            },
            ChartKind::Text => ChartSpec::Text {
                header: "Text Header".to_string(),
                body: "This is an example of a text widget. You can add any information here!".to_string(),
            },
        }
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            ChartSpec::Pie { .. } => ChartKind::Pie,
            ChartSpec::Bar { .. } => ChartKind::Bar,
            ChartSpec::Line { .. } => ChartKind::Line,
            ChartSpec::Area { .. } => ChartKind::Area,
            ChartSpec::Scatter { .. } => ChartKind::Scatter,
            ChartSpec::Radar { .. } => ChartKind::Radar,
            ChartSpec::Text { .. } => ChartKind::Text,
        }
    }

    /// Switch to another kind, carrying over the x binding where both
    /// kinds have one.
    pub fn convert(&self, kind: ChartKind) -> Self {
        if kind == self.kind() {
            return self.clone();
        }
        let x = self.x_key().unwrap_or_default().to_string();
        let mut next = ChartSpec::blank(kind);
        match &mut next {
            ChartSpec::Bar { x_key, .. }
            | ChartSpec::Line { x_key, .. }
            | ChartSpec::Area { x_key, .. }
            | ChartSpec::Scatter { x_key, .. }
            | ChartSpec::Radar { x_key, .. } => *x_key = x,
            ChartSpec::Pie { group_key, .. } => *group_key = x,
            ChartSpec::Text { .. } => {}
        }
        next
    }

    /// Category/x binding, the group key for pies
    pub fn x_key(&self) -> Option<&str> {
        match self {
            ChartSpec::Pie { group_key, .. } => Some(group_key),
            ChartSpec::Bar { x_key, .. }
            | ChartSpec::Line { x_key, .. }
            | ChartSpec::Area { x_key, .. }
            | ChartSpec::Scatter { x_key, .. }
            | ChartSpec::Radar { x_key, .. } => Some(x_key),
            ChartSpec::Text { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_defaults() {
        assert!(matches!(
            ChartSpec::blank(ChartKind::Bar),
            ChartSpec::Bar { merge_duplicates: true, .. }
        ));
        assert!(matches!(
            ChartSpec::blank(ChartKind::Line),
            ChartSpec::Line { merge_duplicates: false, .. }
        ));
        for kind in ChartKind::ALL {
            assert_eq!(ChartSpec::blank(kind).kind(), kind);
        }
    }

    #[test]
    fn test_convert_keeps_x() {
        let line = ChartSpec::Line {
            x_key: "phase".into(),
            y_key: "currentEnrollment".into(),
            merge_duplicates: true,
        };
        match line.convert(ChartKind::Pie) {
            ChartSpec::Pie { group_key, value_key } => {
                assert_eq!(group_key, "phase");
                assert!(value_key.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(ChartSpec::blank(ChartKind::Scatter)).unwrap();
        assert_eq!(json["type"], "scatter");
        assert_eq!(json["x_key"], "");
    }
}
