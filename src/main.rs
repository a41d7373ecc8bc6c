#![deny(missing_docs)]

//! Entry point for the digit drawing pad.
#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]
use digitpad::canvas::{Canvas, Pen};
use digitpad::egui_app::controller::DigitPadController;
use digitpad::egui_app::ui::{EguiApp, min_viewport_size};
use digitpad::{config, inference, logging};
use eframe::egui;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    let config = config::load_or_default().inspect_err(|err| error!("{err}"))?;
    let model_path = config.model.resolved_path()?;
    info!(
        model = %model_path.display(),
        backend = %config.model.backend,
        "Starting digit pad"
    );
    // The window never opens without a usable classifier.
    let classifier = inference::load_classifier(&model_path, &config.model)
        .inspect_err(|err| error!("{err}"))?;

    let canvas = Canvas::new(config.canvas.size, Pen::new(config.canvas.stroke_width));
    let controller = DigitPadController::new(canvas, Box::new(classifier), config.model.input_size);

    let min_size = min_viewport_size(config.canvas.size);
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Digit Pad")
            .with_inner_size(min_size)
            .with_min_inner_size(min_size),
        ..Default::default()
    };

    eframe::run_native(
        "Digit Pad",
        native_options,
        Box::new(move |_cc| Ok(Box::new(EguiApp::new(controller)))),
    )?;
    Ok(())
}
