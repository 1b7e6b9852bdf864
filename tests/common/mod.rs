//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use bloodsmear::core::errors::{AnalysisError, AnalysisResult, ProcessingStage, SimpleError};
use bloodsmear::core::tensor::{Tensor2D, Tensor4D};
use bloodsmear::domain::{AnalysisRecord, LabelSet, PredictionEntry, PredictionResult};
use bloodsmear::models::{ClassifierBackend, ClassifierEngine, OutputKind};
use bloodsmear::pipeline::{AppContext, DiagnosticPipeline};
use bloodsmear::store::{AnalysisStore, MemoryStore};
use bloodsmear::utils::encode_payload;
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat, RgbImage};
use ndarray::Axis;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const LABELS: [&str; 3] = ["babesia", "healthy", "malaria"];

pub fn labels() -> LabelSet {
    LabelSet::new(LABELS.iter().map(|s| s.to_string()).collect()).unwrap()
}

/// Scores each class by the mean of one input channel.
#[derive(Debug, Default)]
pub struct ChannelMeanBackend;

impl ClassifierBackend for ChannelMeanBackend {
    fn name(&self) -> &str {
        "channel-mean"
    }

    fn device(&self) -> &str {
        "cpu"
    }

    fn forward_batch(&self, batch: &Tensor4D) -> AnalysisResult<Tensor2D> {
        let means = batch
            .mean_axis(Axis(3))
            .and_then(|m| m.mean_axis(Axis(2)))
            .ok_or_else(|| {
                AnalysisError::inference_error(
                    ProcessingStage::Forward,
                    self.name(),
                    "empty batch",
                    SimpleError::new("empty"),
                )
            })?;
        Ok(means)
    }

    fn declared_output_shape(&self) -> Option<Vec<i64>> {
        Some(vec![-1, 3])
    }
}

/// Passes the load-time probe, then fails every forward pass.
#[derive(Debug, Default)]
pub struct FlakyBackend {
    calls: AtomicUsize,
}

impl ClassifierBackend for FlakyBackend {
    fn name(&self) -> &str {
        "flaky"
    }

    fn device(&self) -> &str {
        "cpu"
    }

    fn forward_batch(&self, batch: &Tensor4D) -> AnalysisResult<Tensor2D> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Ok(Tensor2D::zeros((batch.shape()[0], 3)));
        }
        Err(AnalysisError::inference_error(
            ProcessingStage::Forward,
            self.name(),
            "device lost",
            SimpleError::new("device lost"),
        ))
    }
}

/// Store whose every operation fails.
#[derive(Debug, Default)]
pub struct BrokenStore;

impl AnalysisStore for BrokenStore {
    fn name(&self) -> &str {
        "broken"
    }

    fn insert(&self, _record: &AnalysisRecord) -> AnalysisResult<()> {
        Err(AnalysisError::persistence_error(
            "insert",
            SimpleError::new("connection refused"),
        ))
    }

    fn recent_for(&self, _user_id: &str, _limit: usize) -> AnalysisResult<Vec<AnalysisRecord>> {
        Err(AnalysisError::persistence_error(
            "list",
            SimpleError::new("connection refused"),
        ))
    }

    fn timestamps_for(&self, _user_id: &str) -> AnalysisResult<Vec<DateTime<Utc>>> {
        Err(AnalysisError::persistence_error(
            "stats",
            SimpleError::new("connection refused"),
        ))
    }
}

pub fn pipeline_with(backend: impl ClassifierBackend + 'static) -> DiagnosticPipeline {
    let engine =
        ClassifierEngine::from_backend(Box::new(backend), labels(), OutputKind::Logits).unwrap();
    DiagnosticPipeline::new(engine)
}

pub fn pipeline() -> DiagnosticPipeline {
    pipeline_with(ChannelMeanBackend)
}

pub fn context() -> AppContext {
    AppContext::new(pipeline(), Arc::new(MemoryStore::new()))
}

pub fn context_with_store(store: Arc<dyn AnalysisStore>) -> AppContext {
    AppContext::new(pipeline(), store)
}

pub fn encode(image: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

/// Base64 PNG of a solid-colour image.
pub fn png_payload(width: u32, height: u32, rgb: [u8; 3]) -> String {
    let image = RgbImage::from_pixel(width, height, image::Rgb(rgb));
    encode_payload(&encode(image, ImageFormat::Png))
}

pub fn sample_result(top: &str) -> PredictionResult {
    PredictionResult {
        top_label: top.to_string(),
        top_confidence: 80.0,
        ranked: vec![
            PredictionEntry::new(top, 80.0),
            PredictionEntry::new("other", 20.0),
        ],
    }
}
