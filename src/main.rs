mod app;
mod ui;

use eframe::{NativeOptions, egui};
use app::FieldScopeApp;

fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1000.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "FieldScope",
        options,
        Box::new(|cc| Ok(Box::new(FieldScopeApp::new(cc)))),
    )
}
