use std::path::{Path, PathBuf};
use std::time::Instant;

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::wgpu::WgpuDevice;
use burn::backend::{NdArray, Wgpu};
use burn::module::Module;
use burn::prelude::Backend;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::{Tensor, TensorData};
use tracing::info;

use super::model::{DigitNet, DigitNetConfig};
use super::preprocess::InputTensor;
use super::{Classifier, InferenceError, ModelError};
use crate::config::{BackendKind, ModelSettings};

pub(super) type CpuBackend = NdArray<f32>;
type GpuBackend = Wgpu;

/// Extension the named MessagePack recorder forces onto record paths.
const RECORD_EXTENSION: &str = "mpk";

enum ClassifierInner {
    Cpu {
        model: DigitNet<CpuBackend>,
        device: NdArrayDevice,
    },
    Wgpu {
        model: DigitNet<GpuBackend>,
        device: WgpuDevice,
    },
}

/// [`DigitNet`] loaded on a concrete burn backend.
///
/// Neither backend wraps autodiff, so forward passes never record gradients
/// and batch norm runs on its stored statistics.
pub struct BurnClassifier {
    inner: ClassifierInner,
}

impl Classifier for BurnClassifier {
    fn device_label(&self) -> String {
        match &self.inner {
            ClassifierInner::Cpu { .. } => BackendKind::Cpu.to_string(),
            ClassifierInner::Wgpu { device, .. } => format!("wgpu ({device:?})"),
        }
    }

    fn logits(&self, input: &InputTensor) -> Result<Vec<f32>, InferenceError> {
        match &self.inner {
            ClassifierInner::Cpu { model, device } => run_logits(model, device, input),
            ClassifierInner::Wgpu { model, device } => run_logits(model, device, input),
        }
    }
}

fn run_logits<B: Backend>(
    model: &DigitNet<B>,
    device: &B::Device,
    input: &InputTensor,
) -> Result<Vec<f32>, InferenceError> {
    let data = TensorData::new(input.data().to_vec(), input.shape());
    let output = model.forward(Tensor::<B, 4>::from_data(data, device));
    output
        .into_data()
        .to_vec::<f32>()
        .map_err(|err| InferenceError::Readback(format!("{err:?}")))
}

fn recorder() -> NamedMpkFileRecorder<FullPrecisionSettings> {
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
}

fn record_path(path: &Path) -> PathBuf {
    path.with_extension(RECORD_EXTENSION)
}

pub(super) fn network_config(settings: &ModelSettings) -> DigitNetConfig {
    DigitNetConfig::new(settings.num_classes).with_base_width(settings.base_width)
}

fn load_network<B: Backend>(
    path: &Path,
    settings: &ModelSettings,
    device: &B::Device,
) -> Result<DigitNet<B>, ModelError> {
    network_config(settings)
        .init::<B>(device)
        .load_file(path.to_path_buf(), &recorder(), device)
        .map_err(|err| ModelError::Load {
            path: path.to_path_buf(),
            message: format!("{err:?}"),
        })
}

/// Load the classifier record at `path` onto the configured backend.
///
/// The record must have been saved from a network with the same
/// `num_classes` and `base_width`.
pub fn load_classifier(
    path: &Path,
    settings: &ModelSettings,
) -> Result<BurnClassifier, ModelError> {
    let path = record_path(path);
    if !path.is_file() {
        return Err(ModelError::NotFound { path });
    }

    let started = Instant::now();
    let inner = match settings.backend {
        BackendKind::Cpu => {
            let device = NdArrayDevice::default();
            let model = load_network::<CpuBackend>(&path, settings, &device)?;
            ClassifierInner::Cpu { model, device }
        }
        BackendKind::Wgpu => {
            let device = WgpuDevice::default();
            let model = load_network::<GpuBackend>(&path, settings, &device)?;
            ClassifierInner::Wgpu { model, device }
        }
    };
    info!(
        path = %path.display(),
        backend = %settings.backend,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Classifier loaded"
    );
    Ok(BurnClassifier { inner })
}

/// Resolve the `.mpk` path a record will be written to, creating its parent.
pub(super) fn prepare_record_path(path: &Path, force: bool) -> Result<PathBuf, ModelError> {
    let path = record_path(path);
    if path.exists() && !force {
        return Err(ModelError::AlreadyExists { path });
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ModelError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(path)
}

pub(super) fn save_network(model: DigitNet<CpuBackend>, path: &Path) -> Result<(), ModelError> {
    model
        .save_file(path.to_path_buf(), &recorder())
        .map_err(|err| ModelError::Save {
            path: path.to_path_buf(),
            message: format!("{err:?}"),
        })
}

/// Write freshly initialized weights for the configured network to `path`.
///
/// Returns the path actually written, which always carries the `.mpk`
/// extension.
pub fn write_initial_weights(
    path: &Path,
    settings: &ModelSettings,
    force: bool,
) -> Result<PathBuf, ModelError> {
    let path = prepare_record_path(path, force)?;
    let device = NdArrayDevice::default();
    save_network(network_config(settings).init::<CpuBackend>(&device), &path)?;
    info!(path = %path.display(), "Wrote untrained classifier weights");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn small_settings() -> ModelSettings {
        ModelSettings {
            base_width: 2,
            ..ModelSettings::default()
        }
    }

    #[test]
    fn missing_record_is_not_found() {
        let dir = tempdir().unwrap();
        let err = load_classifier(&dir.path().join("absent.mpk"), &small_settings())
            .err()
            .unwrap();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }

    #[test]
    fn written_weights_load_and_classify() {
        let dir = tempdir().unwrap();
        let settings = small_settings();
        let path = write_initial_weights(&dir.path().join("net"), &settings, false).unwrap();
        assert_eq!(path, dir.path().join("net.mpk"));

        let classifier = load_classifier(&path, &settings).unwrap();
        assert_eq!(classifier.device_label(), "cpu");

        let input = InputTensor::new(vec![0.0; 28 * 28], 28).unwrap();
        let logits = classifier.logits(&input).unwrap();
        assert_eq!(logits.len(), settings.num_classes);
        assert!(logits.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn existing_record_needs_force() {
        let dir = tempdir().unwrap();
        let settings = small_settings();
        let target = dir.path().join("net.mpk");
        write_initial_weights(&target, &settings, false).unwrap();

        assert!(matches!(
            write_initial_weights(&target, &settings, false),
            Err(ModelError::AlreadyExists { .. })
        ));
        assert!(write_initial_weights(&target, &settings, true).is_ok());
    }
}
