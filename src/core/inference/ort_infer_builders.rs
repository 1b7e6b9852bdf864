use super::*;
use crate::core::config::{OrtGraphOptimizationLevel, OrtSessionConfig};
use crate::core::errors::{AnalysisError, AnalysisResult};
use ort::execution_providers::ExecutionProviderDispatch;
use ort::logging::LogLevel;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use std::path::Path;
use tracing::{debug, warn};

impl OrtInfer {
    /// Creates an engine with default ONNX Runtime settings and a single session.
    pub fn new(model_path: impl AsRef<Path>) -> AnalysisResult<Self> {
        Self::from_config(model_path, &OrtSessionConfig::default(), None, None)
    }

    /// Creates an engine from `config`, building one session per pool slot.
    ///
    /// When `input_name` or `output_name` is `None` the first input or output
    /// declared by the graph is used.
    pub fn from_config(
        model_path: impl AsRef<Path>,
        config: &OrtSessionConfig,
        input_name: Option<&str>,
        output_name: Option<&str>,
    ) -> AnalysisResult<Self> {
        let path = model_path.as_ref();
        if !path.is_file() {
            return Err(AnalysisError::model_load_message(
                path,
                "model file does not exist",
                Some("check MODEL_PATH or configure MODEL_URL to download the bundle"),
            ));
        }

        let provider = config.effective_provider();
        let pool_size = config.pool_size();
        let mut sessions = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let builder = Self::apply_ort_config(Session::builder()?, config)?;
            let session = builder.commit_from_file(path).map_err(|e| {
                AnalysisError::model_load_error(
                    path,
                    "failed to create ONNX session",
                    Some("verify the model file is a valid ONNX graph"),
                    Some(e),
                )
            })?;
            sessions.push(Mutex::new(session));
        }

        let (input_name, output_name) = {
            let first = &sessions[0];
            let session = first.lock().map_err(|_| {
                AnalysisError::model_load_message(path, "session lock poisoned during load", None)
            })?;
            let input = match input_name {
                Some(name) => name.to_string(),
                None => session
                    .inputs
                    .first()
                    .map(|i| i.name.clone())
                    .ok_or_else(|| {
                        AnalysisError::model_load_message(path, "graph declares no inputs", None)
                    })?,
            };
            let output = match output_name {
                Some(name) => name.to_string(),
                None => session
                    .outputs
                    .first()
                    .map(|o| o.name.clone())
                    .ok_or_else(|| {
                        AnalysisError::model_load_message(path, "graph declares no outputs", None)
                    })?,
            };
            if !session.inputs.iter().any(|i| i.name == input) {
                return Err(AnalysisError::model_load_message(
                    path,
                    format!("graph has no input named '{input}'"),
                    None,
                ));
            }
            if !session.outputs.iter().any(|o| o.name == output) {
                return Err(AnalysisError::model_load_message(
                    path,
                    format!("graph has no output named '{output}'"),
                    None,
                ));
            }
            (input, output)
        };

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        debug!(
            model = %model_name,
            sessions = pool_size,
            device = provider.device_label(),
            "created ONNX Runtime sessions"
        );

        Ok(OrtInfer {
            sessions,
            next_idx: AtomicUsize::new(0),
            input_name,
            output_name,
            model_path: path.to_path_buf(),
            model_name,
            provider,
        })
    }

    fn apply_ort_config(
        mut builder: SessionBuilder,
        cfg: &OrtSessionConfig,
    ) -> Result<SessionBuilder, ort::Error> {
        builder = builder.with_log_level(LogLevel::Error)?;
        if let Some(intra) = cfg.intra_threads {
            builder = builder.with_intra_threads(intra)?;
        }
        if let Some(inter) = cfg.inter_threads {
            builder = builder.with_inter_threads(inter)?;
        }
        if let Some(level) = cfg.optimization_level {
            let mapped = match level {
                OrtGraphOptimizationLevel::DisableAll => GraphOptimizationLevel::Disable,
                OrtGraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
                OrtGraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
                OrtGraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
            };
            builder = builder.with_optimization_level(mapped)?;
        }
        if let Some(eps) = &cfg.execution_providers {
            let providers = Self::build_execution_providers(eps);
            if !providers.is_empty() {
                builder = builder.with_execution_providers(providers)?;
            }
        }
        Ok(builder)
    }

    fn build_execution_providers(eps: &[OrtExecutionProvider]) -> Vec<ExecutionProviderDispatch> {
        let mut providers = Vec::new();
        for ep in eps {
            match ep {
                OrtExecutionProvider::CPU => {
                    providers
                        .push(ort::execution_providers::CPUExecutionProvider::default().build());
                }
                #[cfg(feature = "cuda")]
                OrtExecutionProvider::CUDA { device_id } => {
                    let mut cuda = ort::execution_providers::CUDAExecutionProvider::default();
                    if let Some(id) = device_id {
                        cuda = cuda.with_device_id(*id);
                    }
                    providers.push(cuda.build());
                }
                #[cfg(feature = "tensorrt")]
                OrtExecutionProvider::TensorRT { device_id } => {
                    let mut trt = ort::execution_providers::TensorRTExecutionProvider::default();
                    if let Some(id) = device_id {
                        trt = trt.with_device_id(*id);
                    }
                    providers.push(trt.build());
                }
                #[allow(unreachable_patterns)]
                other => {
                    warn!(
                        provider = other.device_label(),
                        "execution provider not compiled in, falling back to CPU"
                    );
                }
            }
        }
        providers
    }
}
