//! ONNX Runtime configuration types.

use serde::{Deserialize, Serialize};

/// Graph optimization levels for ONNX Runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrtGraphOptimizationLevel {
    /// Disable all optimizations.
    DisableAll,
    /// Enable basic optimizations.
    #[default]
    Level1,
    /// Enable extended optimizations.
    Level2,
    /// Enable all optimizations.
    Level3,
}

/// Execution providers the classifier can run on.
///
/// Providers are tried in the configured order. Providers whose cargo feature
/// is not compiled in are skipped with a warning and the session falls back
/// to the CPU provider, so rankings never depend on which device is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrtExecutionProvider {
    /// CPU execution provider (always available)
    #[default]
    CPU,
    /// NVIDIA CUDA execution provider
    CUDA {
        /// CUDA device ID (default: 0)
        device_id: Option<i32>,
    },
    /// TensorRT execution provider
    TensorRT {
        /// TensorRT device ID (default: 0)
        device_id: Option<i32>,
    },
}

impl OrtExecutionProvider {
    /// Parses the short provider names accepted in the environment.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "cpu" => Some(Self::CPU),
            "cuda" | "gpu" => Some(Self::CUDA { device_id: None }),
            "tensorrt" | "trt" => Some(Self::TensorRT { device_id: None }),
            _ => None,
        }
    }

    /// Short device label reported by the health probe.
    pub fn device_label(&self) -> &'static str {
        match self {
            Self::CPU => "cpu",
            Self::CUDA { .. } => "cuda",
            Self::TensorRT { .. } => "tensorrt",
        }
    }

    /// Whether support for this provider was compiled into the binary.
    pub fn is_compiled(&self) -> bool {
        match self {
            Self::CPU => true,
            Self::CUDA { .. } => cfg!(feature = "cuda"),
            Self::TensorRT { .. } => cfg!(feature = "tensorrt"),
        }
    }
}

/// Configuration for ONNX Runtime sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrtSessionConfig {
    /// Number of threads used to parallelize execution within nodes
    pub intra_threads: Option<usize>,
    /// Number of threads used to parallelize execution across nodes
    pub inter_threads: Option<usize>,
    /// Graph optimization level
    pub optimization_level: Option<OrtGraphOptimizationLevel>,
    /// Execution providers in order of preference
    pub execution_providers: Option<Vec<OrtExecutionProvider>>,
    /// Number of sessions kept for concurrent requests
    pub session_pool_size: Option<usize>,
}

impl OrtSessionConfig {
    /// Creates a new configuration with ONNX Runtime defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of intra-op threads.
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    /// Sets the number of inter-op threads.
    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = Some(threads);
        self
    }

    /// Sets the graph optimization level.
    pub fn with_optimization_level(mut self, level: OrtGraphOptimizationLevel) -> Self {
        self.optimization_level = Some(level);
        self
    }

    /// Sets the preferred execution providers.
    pub fn with_execution_providers(mut self, providers: Vec<OrtExecutionProvider>) -> Self {
        self.execution_providers = Some(providers);
        self
    }

    /// Sets the session pool size.
    pub fn with_session_pool_size(mut self, size: usize) -> Self {
        self.session_pool_size = Some(size);
        self
    }

    /// Pool size with the lower bound applied.
    pub fn pool_size(&self) -> usize {
        self.session_pool_size.unwrap_or(1).max(1)
    }

    /// The first configured provider that is compiled in, or CPU.
    pub fn effective_provider(&self) -> OrtExecutionProvider {
        self.execution_providers
            .iter()
            .flatten()
            .find(|ep| ep.is_compiled())
            .cloned()
            .unwrap_or_default()
    }
}
