//! egui front end: controller, display state and renderer.

pub mod controller;
pub mod state;
pub mod ui;
pub mod view_model;
