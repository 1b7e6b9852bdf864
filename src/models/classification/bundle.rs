//! Model bundle loading and validation.
//!
//! A bundle is a directory with two files:
//!
//! * `model.onnx` - the EfficientNet-B0 classifier with its custom head,
//!   exported from an evaluation-mode graph (dropout disabled, batch
//!   normalization folded to running statistics).
//! * `bundle.json` - the ordered class labels and the declared architecture.
//!
//! ```json
//! {
//!   "class_names": ["babesia", "healthy", "malaria"],
//!   "architecture": {
//!     "backbone": "efficientnet_b0",
//!     "input_size": 224,
//!     "feature_dim": 1280,
//!     "hidden_dim": 512,
//!     "num_classes": 3
//!   },
//!   "output": "logits"
//! }
//! ```

use crate::core::constants::{HEAD_HIDDEN_DIM, INPUT_SIZE, MANIFEST_FILE_NAME, MODEL_FILE_NAME};
use crate::core::errors::{AnalysisError, AnalysisResult};
use crate::domain::{ClassLabel, LabelSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What the graph's output tensor holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Raw class scores; softmax is applied by the engine.
    #[default]
    Logits,
    /// Already a probability distribution; only renormalized.
    Probabilities,
}

/// Architecture parameters declared by the bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    /// Convolutional feature extractor.
    #[serde(default = "default_backbone")]
    pub backbone: String,
    /// Side length of the square input.
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    /// Width of the backbone's pooled features.
    #[serde(default)]
    pub feature_dim: Option<usize>,
    /// Width of the head's hidden layer.
    #[serde(default = "default_hidden_dim")]
    pub hidden_dim: usize,
    /// Number of output classes, when declared.
    #[serde(default)]
    pub num_classes: Option<usize>,
}

fn default_backbone() -> String {
    "efficientnet_b0".to_string()
}

fn default_input_size() -> u32 {
    INPUT_SIZE
}

fn default_hidden_dim() -> usize {
    HEAD_HIDDEN_DIM
}

impl Default for Architecture {
    fn default() -> Self {
        Self {
            backbone: default_backbone(),
            input_size: default_input_size(),
            feature_dim: Some(1280),
            hidden_dim: default_hidden_dim(),
            num_classes: None,
        }
    }
}

/// Contents of `bundle.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Labels in output-index order.
    pub class_names: Vec<ClassLabel>,
    #[serde(default)]
    pub architecture: Architecture,
    /// Graph input to feed; the first declared input when absent.
    #[serde(default)]
    pub input_name: Option<String>,
    /// Graph output to read; the first declared output when absent.
    #[serde(default)]
    pub output_name: Option<String>,
    #[serde(default)]
    pub output: OutputKind,
}

/// A validated model bundle on disk.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    dir: PathBuf,
    manifest: BundleManifest,
    labels: LabelSet,
}

impl ModelBundle {
    /// Opens and validates the bundle in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ModelLoad`] when either file is missing, the
    /// manifest cannot be parsed, the labels are empty or duplicated, or the
    /// declared architecture disagrees with the labels or the fixed input
    /// contract.
    pub fn open(dir: impl AsRef<Path>) -> AnalysisResult<Self> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(MANIFEST_FILE_NAME);
        let model_path = dir.join(MODEL_FILE_NAME);

        if !model_path.is_file() {
            return Err(AnalysisError::model_load_message(
                &model_path,
                "model file not found",
                Some("place model.onnx in the bundle directory or set MODEL_URL"),
            ));
        }

        let raw = std::fs::read_to_string(&manifest_path).map_err(|e| {
            AnalysisError::model_load_error(
                &manifest_path,
                "bundle manifest could not be read",
                Some("place bundle.json next to model.onnx"),
                Some(e),
            )
        })?;
        let manifest: BundleManifest = serde_json::from_str(&raw).map_err(|e| {
            AnalysisError::model_load_error(
                &manifest_path,
                "bundle manifest is not valid JSON",
                None,
                Some(e),
            )
        })?;

        let bundle = Self::from_manifest(dir, manifest)?;
        debug!(
            bundle = %dir.display(),
            classes = bundle.labels.len(),
            backbone = %bundle.manifest.architecture.backbone,
            "opened model bundle"
        );
        Ok(bundle)
    }

    /// Validates an already parsed manifest for the bundle in `dir`.
    pub fn from_manifest(dir: impl AsRef<Path>, manifest: BundleManifest) -> AnalysisResult<Self> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(MANIFEST_FILE_NAME);

        let labels = LabelSet::new(manifest.class_names.clone()).map_err(|e| {
            AnalysisError::model_load_error(&manifest_path, "class_names are invalid", None, Some(e))
        })?;
        validate_architecture(&manifest.architecture, labels.len())
            .map_err(|reason| AnalysisError::model_load_message(&manifest_path, reason, None))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            manifest,
            labels,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE_NAME)
    }

    pub fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn architecture(&self) -> &Architecture {
        &self.manifest.architecture
    }

    pub fn output_kind(&self) -> OutputKind {
        self.manifest.output
    }

    pub(crate) fn into_labels(self) -> LabelSet {
        self.labels
    }
}

/// Whether both bundle files exist in `dir`.
pub fn bundle_present(dir: impl AsRef<Path>) -> bool {
    let dir = dir.as_ref();
    dir.join(MODEL_FILE_NAME).is_file() && dir.join(MANIFEST_FILE_NAME).is_file()
}

fn validate_architecture(arch: &Architecture, label_count: usize) -> Result<(), String> {
    if arch.input_size != INPUT_SIZE {
        return Err(format!(
            "architecture input_size {} does not match the fixed input size {}",
            arch.input_size, INPUT_SIZE
        ));
    }
    if arch.hidden_dim != HEAD_HIDDEN_DIM {
        return Err(format!(
            "architecture hidden_dim {} does not match the classification head ({})",
            arch.hidden_dim, HEAD_HIDDEN_DIM
        ));
    }
    if let Some(classes) = arch.num_classes {
        if classes != label_count {
            return Err(format!(
                "architecture declares {} classes but class_names has {}",
                classes, label_count
            ));
        }
    }
    Ok(())
}
