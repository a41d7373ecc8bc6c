//! Library exports for the drawing-pad binary, tooling and tests.
/// Application directory resolution.
pub mod app_dirs;
/// Freehand drawing surface.
pub mod canvas;
/// TOML settings.
pub mod config;
/// Shared egui UI modules.
pub mod egui_app;
/// User-confirmed accuracy counters.
pub mod feedback;
/// Canvas preprocessing and classifier backends.
pub mod inference;
/// Tracing subscriber setup.
pub mod logging;
