//! Import of externally trained checkpoints into the classifier record.
//!
//! Checkpoints are expected in the torchvision ResNet layout (`conv1`, `bn1`,
//! `layerN.M`, `downsample.0/1`, `fc`) and are renamed onto [`DigitNet`]
//! before loading. Every parameter must be present and match in shape.

use std::path::{Path, PathBuf};

use burn::backend::ndarray::NdArrayDevice;
use burn_store::{KeyRemapper, ModuleSnapshot, PyTorchToBurnAdapter, PytorchStore, SafetensorsStore};
use tracing::{info, warn};

use super::ModelError;
use super::backend::{CpuBackend, network_config, prepare_record_path, save_network};
use super::model::{DigitNet, STAGE_BLOCKS};
use crate::config::ModelSettings;

/// Checkpoint container understood by [`import_weights`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFormat {
    /// `torch.save` of a state dict (`.pt` / `.pth`).
    Pytorch,
    Safetensors,
}

impl WeightFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pt" | "pth" => Some(Self::Pytorch),
            "safetensors" => Some(Self::Safetensors),
            _ => None,
        }
    }
}

/// Rename rules from torchvision ResNet parameter paths to [`DigitNet`] paths.
fn resnet_key_patterns() -> Vec<(String, String)> {
    let mut patterns = vec![
        (r"^conv1\.".to_string(), "stem.".to_string()),
        (r"^bn1\.".to_string(), "stem_bn.".to_string()),
    ];
    let mut block = 0;
    for (stage, &count) in STAGE_BLOCKS.iter().enumerate() {
        for index in 0..count {
            patterns.push((
                format!(r"^layer{}\.{index}\.", stage + 1),
                format!("blocks.{block}."),
            ));
            block += 1;
        }
    }
    patterns.push((r"\.downsample\.0\.".to_string(), ".downsample.conv.".to_string()));
    patterns.push((r"\.downsample\.1\.".to_string(), ".downsample.bn.".to_string()));
    patterns.push((r"^fc\.".to_string(), "head.".to_string()));
    patterns
}

fn import_error(path: &Path, message: impl ToString) -> ModelError {
    ModelError::Import {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn load_checkpoint(
    model: &mut DigitNet<CpuBackend>,
    source: &Path,
    format: WeightFormat,
) -> Result<(), ModelError> {
    let remapper = KeyRemapper::from_patterns(resnet_key_patterns())
        .map_err(|err| import_error(source, err))?;
    let result = match format {
        WeightFormat::Pytorch => {
            let mut store = PytorchStore::from_file(source)
                .remap(remapper)
                .allow_partial(false);
            model.load_from(&mut store).map_err(|err| import_error(source, err))?
        }
        WeightFormat::Safetensors => {
            let mut store = SafetensorsStore::from_file(source)
                .with_from_adapter(PyTorchToBurnAdapter)
                .remap(remapper)
                .allow_partial(false);
            model.load_from(&mut store).map_err(|err| import_error(source, err))?
        }
    };

    // `num_batches_tracked` has no counterpart in burn's batch norm.
    let unused: Vec<&String> = result
        .unused
        .iter()
        .filter(|name| !name.ends_with("num_batches_tracked"))
        .collect();
    if !unused.is_empty() {
        warn!(?unused, "Checkpoint tensors left unused");
    }
    info!(applied = result.applied.len(), "Checkpoint tensors applied");
    Ok(())
}

/// Convert an external checkpoint at `source` into the classifier record at
/// `dest`.
///
/// The network shape comes from `settings`, so `num_classes` and `base_width`
/// must describe the checkpoint. Returns the record path, which always
/// carries the `.mpk` extension.
pub fn import_weights(
    source: &Path,
    dest: &Path,
    settings: &ModelSettings,
    force: bool,
) -> Result<PathBuf, ModelError> {
    let format = WeightFormat::from_path(source).ok_or_else(|| ModelError::UnsupportedFormat {
        path: source.to_path_buf(),
    })?;
    if !source.is_file() {
        return Err(ModelError::NotFound {
            path: source.to_path_buf(),
        });
    }
    let dest = prepare_record_path(dest, force)?;

    let device = NdArrayDevice::default();
    let mut model = network_config(settings).init::<CpuBackend>(&device);
    load_checkpoint(&mut model, source, format)?;
    save_network(model, &dest)?;
    info!(
        source = %source.display(),
        dest = %dest.display(),
        format = ?format,
        "Imported classifier weights"
    );
    Ok(dest)
}
