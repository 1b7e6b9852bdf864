//! Error type definitions for the analysis service.

use thiserror::Error;

/// Stage of the inference pipeline in which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Transport payload to pixel buffer.
    Decode,
    /// Resizing to the model input resolution.
    Resize,
    /// Scaling and per-channel normalization.
    Normalization,
    /// Forward pass through the classifier.
    Forward,
    /// Logit to probability conversion.
    Softmax,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Decode => write!(f, "decode"),
            ProcessingStage::Resize => write!(f, "resize"),
            ProcessingStage::Normalization => write!(f, "normalization"),
            ProcessingStage::Forward => write!(f, "forward pass"),
            ProcessingStage::Softmax => write!(f, "softmax"),
        }
    }
}

/// How a caller should treat an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself was bad; retrying the same request will fail again.
    Client,
    /// The request was fine but the service could not complete it.
    Server,
    /// The process cannot serve traffic.
    Fatal,
}

/// Lightweight error carrying only a message, used as a `source` where no
/// underlying library error exists.
#[derive(Debug, Clone)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SimpleError {}

/// Reasons an image payload could not be turned into a pixel buffer.
#[derive(Error, Debug)]
pub enum DecodeFailure {
    /// Nothing left to decode after stripping the media-type header.
    #[error("payload is empty")]
    Empty,

    /// The payload is not valid base64.
    #[error("payload is not valid base64")]
    Base64(#[from] base64::DecodeError),

    /// The bytes decoded but are not an image the decoder understands.
    #[error("payload is not a readable image")]
    Image(#[from] image::ImageError),
}

/// Errors produced by the analysis service.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The image payload was malformed.
    #[error("image decode failed: {0}")]
    Decode(#[source] DecodeFailure),

    /// The model bundle could not be loaded. Fatal at start-up.
    #[error("model load failed for '{model_path}': {reason}{suggestion}")]
    ModelLoad {
        /// Path of the bundle or model file.
        model_path: String,
        /// What went wrong.
        reason: String,
        /// Optional hint, already formatted with a leading separator.
        suggestion: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Preprocessing or the forward pass failed.
    #[error("inference failed in {stage} for model '{model_name}': {context}")]
    Inference {
        /// Pipeline stage that failed.
        stage: ProcessingStage,
        /// Model the failure belongs to.
        model_name: String,
        /// Additional context.
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A record could not be written to or read from the analysis store.
    #[error("persistence failed during {operation}")]
    Persistence {
        /// Store operation that failed.
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The request was structurally invalid.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Configuration could not be resolved.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor reshaping.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Classifies the error for the request boundary.
    pub fn class(&self) -> ErrorClass {
        match self {
            AnalysisError::Decode(_) | AnalysisError::InvalidInput { .. } => ErrorClass::Client,
            AnalysisError::ModelLoad { .. } | AnalysisError::ConfigError { .. } => {
                ErrorClass::Fatal
            }
            AnalysisError::Inference { .. }
            | AnalysisError::Persistence { .. }
            | AnalysisError::Session(_)
            | AnalysisError::Tensor(_)
            | AnalysisError::Io(_) => ErrorClass::Server,
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Decode(_) => "decode",
            AnalysisError::ModelLoad { .. } => "model_load",
            AnalysisError::Inference { .. } | AnalysisError::Session(_) | AnalysisError::Tensor(_) => {
                "inference"
            }
            AnalysisError::Persistence { .. } => "persistence",
            AnalysisError::InvalidInput { .. } => "invalid_input",
            AnalysisError::ConfigError { .. } => "config",
            AnalysisError::Io(_) => "io",
        }
    }

    /// Renders the error and its whole source chain as one line.
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

impl From<DecodeFailure> for AnalysisError {
    fn from(failure: DecodeFailure) -> Self {
        AnalysisError::Decode(failure)
    }
}
