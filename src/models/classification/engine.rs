//! Classifier engine: loaded model plus its ordered labels.

use super::backend::ClassifierBackend;
use super::bundle::{ModelBundle, OutputKind};
use crate::core::config::OrtSessionConfig;
use crate::core::constants::{INPUT_CHANNELS, INPUT_SIZE};
use crate::core::errors::{AnalysisError, AnalysisResult, ProcessingStage, SimpleError};
use crate::core::inference::OrtInfer;
use crate::core::tensor::{Tensor3D, Tensor4D};
use crate::domain::LabelSet;
use ndarray::Axis;
use std::path::Path;
use tracing::{debug, info};

/// Probability for each class, in label-set order. Non-negative, sums to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityVector(Vec<f64>);

impl ProbabilityVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// Numerically stable softmax. `None` for empty or non-finite input.
pub fn softmax(logits: &[f32]) -> Option<ProbabilityVector> {
    if logits.is_empty() || logits.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let max = logits
        .iter()
        .fold(f64::NEG_INFINITY, |acc, &v| acc.max(v as f64));
    let exps: Vec<f64> = logits.iter().map(|&v| (v as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    Some(ProbabilityVector(exps.into_iter().map(|e| e / sum).collect()))
}

/// Rescales an output that is already a distribution so it sums to exactly 1.
/// `None` for negative, non-finite, or all-zero input.
pub fn renormalize(probabilities: &[f32]) -> Option<ProbabilityVector> {
    if probabilities.is_empty() || probabilities.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return None;
    }
    let sum: f64 = probabilities.iter().map(|&v| v as f64).sum();
    if sum <= 0.0 {
        return None;
    }
    Some(ProbabilityVector(
        probabilities.iter().map(|&v| v as f64 / sum).collect(),
    ))
}

/// The loaded classifier.
///
/// Built once at start-up and shared read-only by every request. The label
/// order is cross-checked against the model's output width at construction,
/// so index `i` of every probability vector belongs to `labels().get(i)`.
#[derive(Debug)]
pub struct ClassifierEngine {
    backend: Box<dyn ClassifierBackend>,
    labels: LabelSet,
    output_kind: OutputKind,
}

impl ClassifierEngine {
    /// Loads the bundle in `bundle_dir` on ONNX Runtime.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ModelLoad`] when the bundle is missing or
    /// corrupt, or when the graph's shapes disagree with the declared
    /// architecture and label count.
    pub fn load(bundle_dir: impl AsRef<Path>, session: &OrtSessionConfig) -> AnalysisResult<Self> {
        let bundle = ModelBundle::open(bundle_dir)?;
        let manifest = bundle.manifest();
        let inference = OrtInfer::from_config(
            bundle.model_path(),
            session,
            manifest.input_name.as_deref(),
            manifest.output_name.as_deref(),
        )?;
        let output_kind = bundle.output_kind();
        let engine = Self::from_backend(Box::new(inference), bundle.into_labels(), output_kind)?;

        info!(
            model = engine.model_name(),
            classes = engine.labels.len(),
            device = engine.device(),
            "classifier loaded"
        );
        Ok(engine)
    }

    /// Wraps an already constructed backend.
    ///
    /// Runs one probe forward pass on an all-zero input to confirm the
    /// backend produces exactly one score per label.
    pub fn from_backend(
        backend: Box<dyn ClassifierBackend>,
        labels: LabelSet,
        output_kind: OutputKind,
    ) -> AnalysisResult<Self> {
        check_declared_shapes(backend.as_ref(), labels.len())?;

        let probe = Tensor4D::zeros((1, INPUT_CHANNELS, INPUT_SIZE as usize, INPUT_SIZE as usize));
        let scores = backend.forward_batch(&probe).map_err(|e| {
            AnalysisError::model_load_error(
                backend.name(),
                "probe forward pass failed",
                Some("check that the graph matches the declared architecture"),
                Some(e),
            )
        })?;
        if scores.shape() != [1, labels.len()] {
            return Err(AnalysisError::model_load_message(
                backend.name(),
                format!(
                    "model produces output shape {:?} but the bundle lists {} classes",
                    scores.shape(),
                    labels.len()
                ),
                Some("the class_names in bundle.json must match the exported head"),
            ));
        }
        if scores.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::model_load_message(
                backend.name(),
                "probe forward pass produced non-finite scores",
                None,
            ));
        }

        debug!(model = backend.name(), classes = labels.len(), "classifier probe passed");
        Ok(Self {
            backend,
            labels,
            output_kind,
        })
    }

    /// Maps one preprocessed `[3, 224, 224]` tensor to class probabilities.
    pub fn forward(&self, input: &Tensor3D) -> AnalysisResult<ProbabilityVector> {
        let expected = [INPUT_CHANNELS, INPUT_SIZE as usize, INPUT_SIZE as usize];
        if input.shape() != expected {
            return Err(AnalysisError::inference_error(
                ProcessingStage::Forward,
                self.model_name(),
                &format!("expected input shape {:?}, got {:?}", expected, input.shape()),
                SimpleError::new("unexpected input shape"),
            ));
        }

        let batch = input.view().insert_axis(Axis(0)).to_owned();
        let scores = self.backend.forward_batch(&batch)?;
        if scores.shape() != [1, self.labels.len()] {
            return Err(AnalysisError::inference_error(
                ProcessingStage::Forward,
                self.model_name(),
                &format!(
                    "expected output shape [1, {}], got {:?}",
                    self.labels.len(),
                    scores.shape()
                ),
                SimpleError::new("unexpected output shape"),
            ));
        }

        let row: Vec<f32> = scores.row(0).to_vec();
        let probabilities = match self.output_kind {
            OutputKind::Logits => softmax(&row),
            OutputKind::Probabilities => renormalize(&row),
        };
        probabilities.ok_or_else(|| {
            AnalysisError::inference_error(
                ProcessingStage::Softmax,
                self.model_name(),
                "model output is not a valid score vector",
                SimpleError::new("non-finite or negative scores"),
            )
        })
    }

    /// Labels in output-index order.
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn model_name(&self) -> &str {
        self.backend.name()
    }

    pub fn device(&self) -> &str {
        self.backend.device()
    }
}

fn check_declared_shapes(backend: &dyn ClassifierBackend, classes: usize) -> AnalysisResult<()> {
    if let Some(shape) = backend.declared_input_shape() {
        let expected = [
            -1,
            INPUT_CHANNELS as i64,
            INPUT_SIZE as i64,
            INPUT_SIZE as i64,
        ];
        let matches = shape.len() == 4
            && shape
                .iter()
                .zip(expected)
                .skip(1)
                .all(|(&dim, want)| dim < 0 || dim == want);
        if !matches {
            return Err(AnalysisError::model_load_message(
                backend.name(),
                format!("graph input shape {:?} is not [N, 3, 224, 224]", shape),
                None,
            ));
        }
    }
    if let Some(shape) = backend.declared_output_shape() {
        let width = shape.last().copied().unwrap_or(-1);
        if shape.len() != 2 || (width >= 0 && width as usize != classes) {
            return Err(AnalysisError::model_load_message(
                backend.name(),
                format!(
                    "graph output shape {:?} does not match {} classes",
                    shape, classes
                ),
                Some("the class_names in bundle.json must match the exported head"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tensor::Tensor2D;

    /// Scores each class by a fixed weight times the input mean.
    #[derive(Debug)]
    struct LinearBackend {
        weights: Vec<f32>,
        output_shape: Option<Vec<i64>>,
    }

    impl ClassifierBackend for LinearBackend {
        fn name(&self) -> &str {
            "linear"
        }

        fn device(&self) -> &str {
            "cpu"
        }

        fn forward_batch(&self, batch: &Tensor4D) -> AnalysisResult<Tensor2D> {
            let n = batch.shape()[0];
            let mean = batch.mean().unwrap_or(0.0);
            Ok(Tensor2D::from_shape_fn((n, self.weights.len()), |(_, j)| {
                self.weights[j] * mean + j as f32 * 0.1
            }))
        }

        fn declared_output_shape(&self) -> Option<Vec<i64>> {
            self.output_shape.clone()
        }
    }

    fn labels(n: usize) -> LabelSet {
        LabelSet::new((0..n).map(|i| format!("class_{i}")).collect()).unwrap()
    }

    fn input(fill: f32) -> Tensor3D {
        Tensor3D::from_elem((3, 224, 224), fill)
    }

    #[test]
    fn test_softmax_is_a_distribution() {
        let p = softmax(&[1.0, 2.0, 3.0, -50.0]).unwrap();
        assert!(p.as_slice().iter().all(|v| *v >= 0.0));
        assert!((p.as_slice().iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p.as_slice()[2] > p.as_slice()[1]);
    }

    #[test]
    fn test_softmax_handles_large_logits() {
        let p = softmax(&[1000.0, 1000.0]).unwrap();
        assert!((p.as_slice()[0] - 0.5).abs() < 1e-12);
        assert!(softmax(&[f32::NAN, 1.0]).is_none());
        assert!(softmax(&[]).is_none());
    }

    #[test]
    fn test_renormalize() {
        let p = renormalize(&[0.2, 0.2, 0.4]).unwrap();
        assert!((p.as_slice()[2] - 0.5).abs() < 1e-7);
        assert!(renormalize(&[-0.1, 1.1]).is_none());
        assert!(renormalize(&[0.0, 0.0]).is_none());
    }

    #[test]
    fn test_forward_returns_distribution_over_labels() {
        let backend = LinearBackend {
            weights: vec![1.0, -1.0, 0.5],
            output_shape: Some(vec![-1, 3]),
        };
        let engine =
            ClassifierEngine::from_backend(Box::new(backend), labels(3), OutputKind::Logits)
                .unwrap();

        let p = engine.forward(&input(0.7)).unwrap();
        assert_eq!(p.len(), 3);
        assert!((p.as_slice().iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(engine.device(), "cpu");
    }

    #[test]
    fn test_forward_is_deterministic() {
        let backend = LinearBackend {
            weights: vec![0.3, 0.2, 0.9, -0.4],
            output_shape: None,
        };
        let engine =
            ClassifierEngine::from_backend(Box::new(backend), labels(4), OutputKind::Logits)
                .unwrap();
        assert_eq!(
            engine.forward(&input(-1.2)).unwrap(),
            engine.forward(&input(-1.2)).unwrap()
        );
    }

    #[test]
    fn test_label_count_mismatch_fails_at_load() {
        let backend = LinearBackend {
            weights: vec![1.0, 2.0],
            output_shape: None,
        };
        let err = ClassifierEngine::from_backend(Box::new(backend), labels(3), OutputKind::Logits)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ModelLoad { .. }));
    }

    #[test]
    fn test_declared_output_width_mismatch_fails_at_load() {
        let backend = LinearBackend {
            weights: vec![1.0, 2.0, 3.0],
            output_shape: Some(vec![-1, 5]),
        };
        let err = ClassifierEngine::from_backend(Box::new(backend), labels(3), OutputKind::Logits)
            .unwrap_err();
        assert!(err.to_string().contains("does not match 3 classes"));
    }

    #[test]
    fn test_wrong_input_shape_is_inference_error() {
        let backend = LinearBackend {
            weights: vec![1.0, 2.0],
            output_shape: None,
        };
        let engine =
            ClassifierEngine::from_backend(Box::new(backend), labels(2), OutputKind::Logits)
                .unwrap();
        let err = engine.forward(&Tensor3D::zeros((3, 10, 10))).unwrap_err();
        assert!(matches!(err, AnalysisError::Inference { .. }));
    }

    #[test]
    fn test_missing_bundle_is_model_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClassifierEngine::load(dir.path(), &OrtSessionConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::ModelLoad { .. }));
    }
}
