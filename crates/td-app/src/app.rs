//! Main application state

use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui::{Align2, Color32, Context, FontId, Id, LayerId, Order};
use td_core::{fields, AppSettings, AppState};
use td_ui::{apply_theme, central_panel, header, shell, sidebar, Page, ShellAction, Theme, UiState};
use td_views::{Dashboard, DashboardView, JsonFileLayoutStore, SpaceView, TableView, ViewerContext};
use tokio::runtime::Handle;
use tracing::info;

use crate::events::AppEvents;
use crate::tasks::{apply_loaded, TaskMessage, Tasks};

const TABLE_CONFIG_KEY: &str = "trial_table";
const GENERIC_TABLE_CONFIG_KEY: &str = "generic_table";
const DASHBOARD_CONFIG_KEY: &str = "dashboard";

pub struct TrialDashApp {
    state: Arc<AppState>,
    ui_state: UiState,
    tasks: Tasks,
    events: AppEvents,
    dashboard: DashboardView,
    clinical_table: TableView,
    generic_table: TableView,
}

impl TrialDashApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: AppSettings, runtime: Handle) -> Self {
        apply_theme(&cc.egui_ctx, &Theme::from_settings(&settings.theme));

        let state = Arc::new(AppState::new(settings.clone()));
        let tasks = Tasks::new(runtime, state.clone(), cc.egui_ctx.clone());
        let events = AppEvents::subscribe(&state.event_bus);

        let store = JsonFileLayoutStore::new(&settings.dashboard.layout_path);
        let dashboard = Dashboard::new(settings.dashboard.columns, Box::new(store))
            .with_event_bus(state.event_bus.clone());

        let mut app = Self {
            state,
            ui_state: UiState::default(),
            tasks,
            events,
            dashboard: DashboardView::new(dashboard, settings.dashboard.row_height),
            clinical_table: TableView::clinical(&settings.table),
            generic_table: TableView::generic(&settings.table),
        };

        if let Some(storage) = cc.storage {
            app.restore_views(storage);
        }
        // No-op in local mode.
        app.tasks.refresh_files();
        app
    }

    fn restore_views(&mut self, storage: &dyn eframe::Storage) {
        let views = [
            (TABLE_CONFIG_KEY, &mut self.clinical_table as &mut dyn SpaceView),
            (GENERIC_TABLE_CONFIG_KEY, &mut self.generic_table as &mut dyn SpaceView),
            (DASHBOARD_CONFIG_KEY, &mut self.dashboard as &mut dyn SpaceView),
        ];
        for (key, view) in views {
            if let Some(config) = eframe::get_value::<serde_json::Value>(storage, key) {
                tracing::debug!("Restoring {} view settings", view.view_type());
                view.load_config(config);
            }
        }
    }

    fn pick_file(&self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Trial data", &["csv", "xlsx"])
            .pick_file()
        {
            self.upload(path);
        }
    }

    fn upload(&self, path: PathBuf) {
        info!("Selected {}", path.display());
        self.tasks.upload(path);
    }

    fn apply_action(&mut self, action: ShellAction) {
        match action {
            ShellAction::PickFile => self.pick_file(),
            ShellAction::OpenFile(id) => self.tasks.open_file(id),
            ShellAction::DeleteFile(id) => self.tasks.delete_file(id),
            ShellAction::RefreshFiles => self.tasks.refresh_files(),
            ShellAction::DismissUploadError => self.state.dismiss_upload_error(),
        }
    }

    fn apply_messages(&mut self) {
        for message in self.tasks.drain() {
            match message {
                TaskMessage::Loaded { source_name, rows } => {
                    apply_loaded(&self.state, &source_name, rows)
                }
                TaskMessage::Failed { title, message } => self.ui_state.push_error(title, message),
            }
        }
    }

    fn apply_events(&mut self) {
        if self.events.take_dataset_replaced() {
            self.clinical_table.dataset_replaced();
            self.generic_table.dataset_replaced();
        }
    }

    /// Files dropped onto the window this frame
    fn handle_dropped_files(&self, ctx: &Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if let Some(path) = dropped.into_iter().next() {
            self.upload(path);
        }
    }

    fn paint_drop_hint(&self, ctx: &Context) {
        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }
        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("drop_hint")));
        let screen = ctx.screen_rect();
        painter.rect_filled(screen, 0.0, Color32::from_black_alpha(160));
        painter.text(
            screen.center(),
            Align2::CENTER_CENTER,
            "Drop a CSV or XLSX file to upload",
            FontId::proportional(22.0),
            Color32::WHITE,
        );
    }

    /// Table variant matching the loaded rows
    fn table_mut(&mut self, ctx: &ViewerContext) -> &mut TableView {
        let clinical = ctx
            .rows
            .first()
            .map_or(true, |row| row.get(fields::STUDY_ID).is_some());
        if clinical {
            &mut self.clinical_table
        } else {
            &mut self.generic_table
        }
    }
}

impl eframe::App for TrialDashApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.apply_messages();
        self.apply_events();
        self.handle_dropped_files(ctx);

        let mut actions = header(ctx, &self.state);
        actions.extend(sidebar(ctx, &self.state, &mut self.ui_state, self.tasks.is_remote()));

        let viewer = ViewerContext::now(self.state.clone());
        let upload_enabled = !self.state.upload_status().is_pending();
        let page = self.ui_state.page;

        let mut ui_state = std::mem::take(&mut self.ui_state);
        central_panel(ctx, &mut ui_state, |ui| {
            if viewer.rows.is_empty() {
                if shell::show_welcome_screen(ui, upload_enabled) {
                    actions.push(ShellAction::PickFile);
                }
                return;
            }
            match page {
                Page::Overview => self.dashboard.ui(&viewer, ui),
                Page::Data => self.table_mut(&viewer).ui(&viewer, ui),
            }
        });
        self.ui_state = ui_state;

        for action in actions {
            self.apply_action(action);
        }
        self.paint_drop_hint(ctx);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, TABLE_CONFIG_KEY, &self.clinical_table.save_config());
        eframe::set_value(storage, GENERIC_TABLE_CONFIG_KEY, &self.generic_table.save_config());
        eframe::set_value(storage, DASHBOARD_CONFIG_KEY, &self.dashboard.save_config());
    }
}
