// GUI-subsystem binary: no console window is ever allocated on Windows.
#![windows_subsystem = "windows"]
#![allow(clippy::too_many_arguments)]

mod app;
mod assets;
mod canvas;
mod components;
mod io;
pub mod logger;
mod ops;
mod viewport;

use app::RetouchApp;
use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    // Initialize session log (overwrites previous session log)
    logger::init();

    // Load application icon (window title bar, taskbar, Alt+Tab)
    let icon = load_app_icon();

    let options = eframe::NativeOptions {
        viewport: {
            let mut vp = egui::ViewportBuilder::default()
                .with_inner_size([1280.0, 720.0])
                .with_maximized(true)
                .with_title("Retouch");
            if let Some(icon_data) = icon {
                vp = vp.with_icon(std::sync::Arc::new(icon_data));
            }
            vp
        },
        ..Default::default()
    };

    eframe::run_native(
        "Retouch",
        options,
        Box::new(|cc| Box::new(RetouchApp::new(cc))),
    )
}

/// Decode the embedded PNG icon into raw RGBA for the egui viewport.
fn load_app_icon() -> Option<egui::viewport::IconData> {
    let png_bytes = include_bytes!("../assets/app_icon.png");
    let img = image::load_from_memory(png_bytes).ok()?.into_rgba8();
    let (w, h) = img.dimensions();
    Some(egui::viewport::IconData {
        rgba: img.into_raw(),
        width: w,
        height: h,
    })
}
