//! Canvas-to-label inference pipeline.
//!
//! [`predict`] turns the canvas bitmap into a normalized input tensor, runs it
//! through a [`Classifier`] and picks the highest-scoring class.

mod backend;
mod import;
mod model;
mod preprocess;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::RgbaImage;
use thiserror::Error;

pub use backend::{BurnClassifier, load_classifier, write_initial_weights};
pub use import::{WeightFormat, import_weights};
pub use model::{DigitNet, DigitNetConfig};
pub use preprocess::{InputTensor, canvas_to_input};

/// Failures while loading or writing the classifier record.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No record exists at the configured path.
    #[error(
        "Classifier model not found at {path}. Train one or run digitpad-model-init for untrained weights."
    )]
    NotFound { path: PathBuf },
    /// Refused to replace an existing record.
    #[error("Classifier model already exists at {path}; pass --force to overwrite")]
    AlreadyExists { path: PathBuf },
    /// The record could not be decoded into the configured network.
    #[error("Failed to load classifier model from {path}: {message}")]
    Load { path: PathBuf, message: String },
    /// The record could not be written.
    #[error("Failed to save classifier model to {path}: {message}")]
    Save { path: PathBuf, message: String },
    /// An external checkpoint could not be mapped onto the network.
    #[error("Failed to import weights from {path}: {message}")]
    Import { path: PathBuf, message: String },
    /// The checkpoint extension is not one the importer reads.
    #[error("Unsupported weight file {path}; expected .pt, .pth or .safetensors")]
    UnsupportedFormat { path: PathBuf },
    #[error("Failed to prepare model directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failures while turning a canvas into a prediction.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Canvas image is empty")]
    EmptyImage,
    #[error("Classifier input size must be positive, got {0}")]
    InvalidInputSize(u32),
    /// Pixel data does not fill a square of the declared side.
    #[error("Classifier input holds {actual} values, expected {expected}")]
    InputLength { expected: usize, actual: usize },
    /// The backend could not read the output tensor back.
    #[error("Failed to read classifier output: {0}")]
    Readback(String),
    /// The classifier produced no scores.
    #[error("Classifier returned no scores")]
    EmptyOutput,
}

/// Maps a preprocessed image to one score per class.
pub trait Classifier {
    /// Identifier of the device running inference, shown in the UI.
    fn device_label(&self) -> String;

    /// Raw class scores for a single input.
    fn logits(&self, input: &InputTensor) -> Result<Vec<f32>, InferenceError>;
}

/// Outcome of one predict action.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Index of the highest-scoring class.
    pub label: usize,
    pub scores: Vec<f32>,
    /// Wall-clock time from preprocessing through the forward pass.
    pub elapsed: Duration,
}

/// Classify the current canvas contents.
pub fn predict(
    classifier: &dyn Classifier,
    image: &RgbaImage,
    input_size: u32,
) -> Result<Prediction, InferenceError> {
    let started = Instant::now();
    let input = canvas_to_input(image, input_size)?;
    let scores = classifier.logits(&input)?;
    let label = argmax(&scores).ok_or(InferenceError::EmptyOutput)?;
    Ok(Prediction {
        label,
        scores,
        elapsed: started.elapsed(),
    })
}

/// Index of the largest score; ties go to the lowest index and NaNs are skipped.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::cell::Cell;

    struct FixedScores {
        scores: Vec<f32>,
        seen_len: Cell<usize>,
    }

    impl Classifier for FixedScores {
        fn device_label(&self) -> String {
            "test".into()
        }

        fn logits(&self, input: &InputTensor) -> Result<Vec<f32>, InferenceError> {
            self.seen_len.set(input.data().len());
            Ok(self.scores.clone())
        }
    }

    #[test]
    fn argmax_picks_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), Some(1));
        assert_eq!(argmax(&[f32::NAN, 0.5]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn blank_canvas_yields_label_and_duration() {
        let classifier = FixedScores {
            scores: vec![0.0, 0.0, 3.0, 1.0],
            seen_len: Cell::new(0),
        };
        let image = RgbaImage::from_pixel(280, 280, Rgba([0, 0, 0, 255]));

        let prediction = predict(&classifier, &image, 28).unwrap();
        assert_eq!(prediction.label, 2);
        assert_eq!(classifier.seen_len.get(), 28 * 28);
        assert!(prediction.elapsed >= Duration::ZERO);
    }

    #[test]
    fn empty_scores_are_an_error() {
        let classifier = FixedScores {
            scores: Vec::new(),
            seen_len: Cell::new(0),
        };
        let image = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        assert!(matches!(
            predict(&classifier, &image, 4),
            Err(InferenceError::EmptyOutput)
        ));
    }
}
