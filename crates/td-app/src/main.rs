//! Clinical trial dashboard entry point

use anyhow::Result;
use eframe::egui;
use td_core::AppSettings;
use tracing::info;

mod app;
mod events;
mod tasks;

use app::TrialDashApp;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let settings = AppSettings::from_env();
    match &settings.api_base_url {
        Some(url) => info!("Starting trial dashboard against {}", url),
        None => info!("Starting trial dashboard in local mode"),
    }

    // Owned here so it outlives the event loop.
    let runtime = tokio::runtime::Runtime::new()?;
    let handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([900.0, 600.0])
            .with_drag_and_drop(true),
        default_theme: if settings.theme.dark_mode {
            eframe::Theme::Dark
        } else {
            eframe::Theme::Light
        },
        ..Default::default()
    };

    eframe::run_native(
        "Clinical Trial Dashboard",
        options,
        Box::new(move |cc| Box::new(TrialDashApp::new(cc, settings, handle))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    drop(runtime);
    Ok(())
}
