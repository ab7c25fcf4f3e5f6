//! egui id helpers
//!
//! Popovers, widget frames and scroll areas are repeated per column or
//! per widget, so their ids are built from those keys.

use std::fmt::Display;

use egui::{Id, ScrollArea};

/// Id builder joining parts with `/`
#[derive(Debug, Clone)]
pub struct UiKey {
    parts: Vec<String>,
}

impl UiKey {
    pub fn new(base: impl Display) -> Self {
        Self {
            parts: vec![base.to_string()],
        }
    }

    pub fn with(mut self, part: impl Display) -> Self {
        self.parts.push(part.to_string());
        self
    }

    pub fn build(&self) -> String {
        self.parts.join("/")
    }

    pub fn id(&self) -> Id {
        Id::new(self.build())
    }
}

pub trait ScrollAreaExt {
    fn id_key(self, key: UiKey) -> Self;
}

impl ScrollAreaExt for ScrollArea {
    fn id_key(self, key: UiKey) -> Self {
        self.id_source(key.build())
    }
}

/// Id of the filter popover of `column` in table `table`
pub fn popover_id(table: impl Display, column: &str) -> Id {
    UiKey::new("table").with(table).with("popover").with(column).id()
}

/// Key for something inside dashboard widget `widget`
pub fn widget_key(widget: impl Display, part: &str) -> UiKey {
    UiKey::new("widget").with(widget).with(part)
}
