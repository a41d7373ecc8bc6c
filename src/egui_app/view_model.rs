//! Helpers to convert domain values into display strings.

use std::time::Duration;

pub fn device_text(device_label: &str) -> String {
    format!("Device: {device_label}")
}

pub fn prediction_text(label: Option<usize>) -> String {
    match label {
        Some(label) => format!("Prediction: {label}"),
        None => "Prediction: ".to_string(),
    }
}

/// Milliseconds with two decimals.
pub fn inference_time_text(elapsed: Duration) -> String {
    format!("Inference time: {:.2}ms", elapsed.as_secs_f64() * 1000.0)
}

pub fn accuracy_text(accuracy: &str) -> String {
    format!("Accuracy: {accuracy}")
}

/// Body of the confirmation prompt.
pub fn confirmation_text(label: usize) -> String {
    format!("Predicted digit: {label}\nIs this correct?")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_time_uses_milliseconds() {
        assert_eq!(
            inference_time_text(Duration::from_micros(1234)),
            "Inference time: 1.23ms"
        );
        assert_eq!(inference_time_text(Duration::ZERO), "Inference time: 0.00ms");
    }

    #[test]
    fn labels_include_values() {
        assert_eq!(device_text("cpu"), "Device: cpu");
        assert_eq!(prediction_text(Some(7)), "Prediction: 7");
        assert_eq!(prediction_text(None), "Prediction: ");
        assert_eq!(accuracy_text("50.00%"), "Accuracy: 50.00%");
        assert_eq!(confirmation_text(3), "Predicted digit: 3\nIs this correct?");
    }
}
