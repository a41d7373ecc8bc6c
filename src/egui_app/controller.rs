//! Owns the canvas, classifier and counters and applies UI actions to them.

use egui::{PointerButton, Pos2};
use tracing::{error, info};

use crate::canvas::Canvas;
use crate::egui_app::state::{PendingConfirmation, StatusState, UiState};
use crate::egui_app::view_model;
use crate::feedback::{AccuracyTracker, Feedback};
use crate::inference::{self, Classifier};

/// Maintains app state and bridges the drawing/inference core to the egui UI.
///
/// While a confirmation is pending every other action is ignored, which keeps
/// the prompt modal regardless of what the renderer forwards.
pub struct DigitPadController {
    pub ui: UiState,
    canvas: Canvas,
    classifier: Box<dyn Classifier>,
    tracker: AccuracyTracker,
    input_size: u32,
    pending: Option<PendingConfirmation>,
}

impl DigitPadController {
    pub fn new(canvas: Canvas, classifier: Box<dyn Classifier>, input_size: u32) -> Self {
        let ui = UiState::new(&classifier.device_label());
        Self {
            ui,
            canvas,
            classifier,
            tracker: AccuracyTracker::new(),
            input_size,
            pending: None,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn tracker(&self) -> &AccuracyTracker {
        &self.tracker
    }

    /// Prediction awaiting a yes/no answer, if any.
    pub fn pending_confirmation(&self) -> Option<PendingConfirmation> {
        self.pending
    }

    pub fn is_modal(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume the canvas redraw request.
    pub fn take_canvas_redraw(&mut self) -> bool {
        self.canvas.take_redraw()
    }

    pub fn pointer_down(&mut self, pos: Pos2, button: PointerButton) {
        if !self.is_modal() {
            self.canvas.pointer_down(pos, button);
        }
    }

    pub fn pointer_move(&mut self, pos: Pos2, primary_held: bool) {
        if !self.is_modal() {
            self.canvas.pointer_move(pos, primary_held);
        }
    }

    pub fn pointer_up(&mut self, button: PointerButton) {
        // Releases always land so a stroke never stays stuck open.
        self.canvas.pointer_up(button);
    }

    /// Wipe the canvas.
    pub fn clear(&mut self) {
        if self.is_modal() {
            return;
        }
        self.canvas.clear();
        self.ui.status = StatusState::idle();
        info!("Canvas cleared");
    }

    /// Classify the canvas and open the confirmation prompt.
    ///
    /// Failures are logged and shown in the status line; the counters and the
    /// canvas are left untouched.
    pub fn predict(&mut self) {
        if self.pending.is_some() {
            return;
        }
        match inference::predict(self.classifier.as_ref(), self.canvas.image(), self.input_size) {
            Ok(prediction) => {
                let label = prediction.label;
                info!(
                    label,
                    scores = ?prediction.scores,
                    elapsed_ms = prediction.elapsed.as_secs_f64() * 1000.0,
                    "Prediction complete"
                );
                self.ui.prediction = view_model::prediction_text(Some(label));
                self.ui.inference_time = view_model::inference_time_text(prediction.elapsed);
                self.ui.status = StatusState::info(format!("Predicted {label}"));
                self.pending = Some(PendingConfirmation { label });
            }
            Err(err) => {
                error!("Prediction failed: {err}");
                self.ui.status = StatusState::error(format!("Prediction failed: {err}"));
            }
        }
    }

    /// Resolve the pending confirmation; ignored when nothing is pending.
    pub fn answer(&mut self, feedback: Feedback) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        self.tracker.record(feedback);
        let accuracy = self.tracker.accuracy_text();
        info!(
            label = pending.label,
            answer = ?feedback,
            total = self.tracker.total_predictions(),
            correct = self.tracker.correct_predictions(),
            "Feedback recorded"
        );
        self.ui.accuracy = view_model::accuracy_text(&accuracy);
        self.ui.status = StatusState::info(format!("Accuracy now {accuracy}"));
    }

    /// Closing the prompt without choosing counts as "No".
    pub fn dismiss_confirmation(&mut self) {
        self.answer(Feedback::Incorrect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BACKGROUND, Pen};
    use crate::inference::{InferenceError, InputTensor};
    use crate::egui_app::state::StatusTone;
    use egui::pos2;

    struct Scripted(Vec<f32>);

    impl Classifier for Scripted {
        fn device_label(&self) -> String {
            "scripted".into()
        }

        fn logits(&self, _input: &InputTensor) -> Result<Vec<f32>, InferenceError> {
            Ok(self.0.clone())
        }
    }

    fn controller(scores: Vec<f32>) -> DigitPadController {
        DigitPadController::new(Canvas::new(56, Pen::new(4.0)), Box::new(Scripted(scores)), 28)
    }

    fn draw(controller: &mut DigitPadController, from: Pos2, to: Pos2) {
        controller.pointer_down(from, PointerButton::Primary);
        controller.pointer_move(to, true);
        controller.pointer_up(PointerButton::Primary);
    }

    fn has_ink(controller: &DigitPadController) -> bool {
        controller.canvas().image().pixels().any(|px| *px != BACKGROUND)
    }

    #[test]
    fn initial_labels() {
        let controller = controller(vec![1.0]);
        assert_eq!(controller.ui.device, "Device: scripted");
        assert_eq!(controller.ui.accuracy, "Accuracy: N/A");
        assert_eq!(controller.ui.inference_time, "Inference time: 0.00ms");
        assert!(!controller.is_modal());
    }

    #[test]
    fn predict_opens_confirmation() {
        let mut controller = controller(vec![0.0, 0.5, 0.1]);
        controller.predict();
        assert_eq!(
            controller.pending_confirmation(),
            Some(PendingConfirmation { label: 1 })
        );
        assert_eq!(controller.ui.prediction, "Prediction: 1");
        assert_eq!(controller.ui.status.tone, StatusTone::Info);
        assert_eq!(controller.tracker().total_predictions(), 0);
    }

    #[test]
    fn modal_blocks_drawing_and_clearing() {
        let mut controller = controller(vec![1.0]);
        draw(&mut controller, pos2(5.0, 5.0), pos2(40.0, 40.0));
        controller.predict();

        controller.clear();
        assert!(has_ink(&controller));

        controller.answer(Feedback::Correct);
        controller.clear();
        assert!(!has_ink(&controller));

        controller.predict();
        draw(&mut controller, pos2(5.0, 5.0), pos2(40.0, 40.0));
        assert!(!has_ink(&controller));
    }

    #[test]
    fn dismiss_counts_as_incorrect() {
        let mut controller = controller(vec![1.0]);
        controller.predict();
        controller.dismiss_confirmation();
        assert_eq!(controller.tracker().total_predictions(), 1);
        assert_eq!(controller.tracker().correct_predictions(), 0);
        assert!(!controller.is_modal());
    }

    #[test]
    fn answer_without_prediction_is_ignored() {
        let mut controller = controller(vec![1.0]);
        controller.answer(Feedback::Correct);
        assert_eq!(controller.tracker().total_predictions(), 0);
        assert_eq!(controller.ui.accuracy, "Accuracy: N/A");
    }

    #[test]
    fn failed_prediction_reports_error_and_keeps_counters() {
        let mut controller = controller(Vec::new());
        controller.predict();
        assert_eq!(controller.ui.status.tone, StatusTone::Error);
        assert!(!controller.is_modal());
        assert_eq!(controller.tracker().total_predictions(), 0);
    }
}
