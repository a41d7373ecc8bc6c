//! Display state consumed by the egui renderer.

use std::time::Duration;

use egui::Color32;

use crate::egui_app::view_model;

/// Labels shown under the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct UiState {
    /// `Device: ...` line.
    pub device: String,
    /// `Prediction: ...` line.
    pub prediction: String,
    /// `Inference time: ...` line.
    pub inference_time: String,
    /// `Accuracy: ...` line.
    pub accuracy: String,
    pub status: StatusState,
}

impl UiState {
    pub fn new(device_label: &str) -> Self {
        Self {
            device: view_model::device_text(device_label),
            prediction: view_model::prediction_text(None),
            inference_time: view_model::inference_time_text(Duration::ZERO),
            accuracy: view_model::accuracy_text("N/A"),
            status: StatusState::idle(),
        }
    }
}

/// Severity of the status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTone {
    Idle,
    Info,
    Error,
}

impl StatusTone {
    pub fn color(self) -> Color32 {
        match self {
            StatusTone::Idle => Color32::from_rgb(150, 150, 150),
            StatusTone::Info => Color32::from_rgb(110, 200, 160),
            StatusTone::Error => Color32::from_rgb(230, 90, 80),
        }
    }
}

/// One-line status message below the labels.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusState {
    pub text: String,
    pub tone: StatusTone,
}

impl StatusState {
    /// Shown before anything has been drawn.
    pub fn idle() -> Self {
        Self {
            text: "Draw a digit, then press Predict".into(),
            tone: StatusTone::Idle,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: StatusTone::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: StatusTone::Error,
        }
    }
}

/// A prediction waiting for the user's yes/no answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub label: usize,
}
