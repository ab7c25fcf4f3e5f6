use egui::{CentralPanel, Context, RichText, SidePanel, TopBottomPanel, Ui};
use td_core::{AppState, FileId, UploadStatus};

use crate::theme::error_color;
use crate::{icon_button, icons, UiState};

/// Page shown in the central panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    /// Widget grid
    #[default]
    Overview,
    /// Trial table
    Data,
}

/// Something the user asked the shell for; applied by the app
#[derive(Debug, Clone, PartialEq)]
pub enum ShellAction {
    PickFile,
    OpenFile(FileId),
    DeleteFile(FileId),
    RefreshFiles,
    DismissUploadError,
}

/// Top bar: title, dataset summary and the upload control
pub fn header(ctx: &Context, state: &AppState) -> Vec<ShellAction> {
    let mut actions = Vec::new();
    let upload = state.upload_status();
    let rows = state.rows();

    TopBottomPanel::top("header").show(ctx, |ui| {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.heading("Clinical Trial Dashboard");
            ui.separator();
            if rows.is_empty() {
                ui.weak("No data loaded");
            } else {
                ui.label(format!("{} rows", rows.len()));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let pending = upload.is_pending();
                let button = ui.add_enabled(
                    !pending,
                    egui::Button::new(format!("{} Upload CSV / XLSX", icons::UPLOAD)),
                );
                if button.clicked() {
                    actions.push(ShellAction::PickFile);
                }
                if let UploadStatus::Pending { file_name } = &upload {
                    ui.spinner();
                    ui.label(format!("Uploading {}…", file_name));
                }
                if let Some(message) = upload.error() {
                    if icon_button(ui, icons::CLOSE, "Dismiss").clicked() {
                        actions.push(ShellAction::DismissUploadError);
                    }
                    ui.label(RichText::new(message).color(error_color()));
                }
            });
        });
        ui.add_space(4.0);
    });
    actions
}

/// Left panel: navigation and the stored file list
pub fn sidebar(
    ctx: &Context,
    state: &AppState,
    ui_state: &mut UiState,
    show_files: bool,
) -> Vec<ShellAction> {
    let mut actions = Vec::new();
    let selected = state.selected_file();

    SidePanel::left("sidebar")
        .resizable(false)
        .exact_width(220.0)
        .show(ctx, |ui| {
            ui.add_space(8.0);
            ui.label(RichText::new("Analytics").small().weak());
            ui.selectable_value(
                &mut ui_state.page,
                Page::Overview,
                format!("{} Overview", icons::HOME),
            );
            ui.selectable_value(&mut ui_state.page, Page::Data, format!("{} Data", icons::TABLE));

            if !show_files {
                return;
            }

            ui.add_space(12.0);
            ui.horizontal(|ui| {
                ui.label(RichText::new("Files").small().weak());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if icon_button(ui, icons::REFRESH, "Reload file list").clicked() {
                        actions.push(ShellAction::RefreshFiles);
                    }
                });
            });

            let files = state.files();
            if files.is_empty() {
                ui.weak("No files uploaded");
            }
            egui::ScrollArea::vertical().id_source("sidebar_files").show(ui, |ui| {
                for file in files {
                    ui.horizontal(|ui| {
                        let is_selected = selected.as_ref() == Some(&file.id);
                        let label = format!("{} {}", icons::FILE, file.displayname);
                        if ui.selectable_label(is_selected, label).clicked() && !is_selected {
                            actions.push(ShellAction::OpenFile(file.id.clone()));
                        }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if icon_button(ui, icons::DELETE, "Delete file").clicked() {
                                actions.push(ShellAction::DeleteFile(file.id.clone()));
                            }
                        });
                    });
                }
            });
        });
    actions
}

/// Central panel with transient errors above the page contents
pub fn central_panel(ctx: &Context, ui_state: &mut UiState, add_contents: impl FnOnce(&mut Ui)) {
    CentralPanel::default().show(ctx, |ui| {
        ui_state.expire_errors(std::time::Instant::now());
        show_error_messages(ui, ui_state);
        add_contents(ui);
    });
}

pub fn show_error_messages(ui: &mut Ui, ui_state: &UiState) {
    for msg in &ui_state.error_messages {
        egui::Frame::none()
            .fill(error_color().linear_multiply(0.2))
            .stroke(egui::Stroke::new(1.0, error_color()))
            .rounding(4.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(icons::WARNING).color(error_color()));
                    ui.label(&msg.title);
                    ui.separator();
                    ui.label(&msg.message);
                });
            });
    }
}

/// Empty-state screen. Returns true when the upload button was clicked.
pub fn show_welcome_screen(ui: &mut Ui, upload_enabled: bool) -> bool {
    let mut clicked = false;
    ui.vertical_centered(|ui| {
        ui.add_space(100.0);
        ui.heading("No trial data loaded");
        ui.add_space(16.0);
        ui.label("Upload a CSV or XLSX file, or drop one onto the window.");
        ui.add_space(24.0);
        clicked = ui
            .add_enabled(
                upload_enabled,
                egui::Button::new(format!("{} Upload file", icons::UPLOAD)),
            )
            .clicked();
    });
    clicked
}
