//! Service configuration resolved from the environment.

use super::onnx::{OrtExecutionProvider, OrtSessionConfig};
use crate::core::constants::DEFAULT_HISTORY_LIMIT;
use crate::core::errors::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime configuration of the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Interface to bind the HTTP listener to.
    pub host: String,
    /// Port to bind the HTTP listener to.
    pub port: u16,
    /// Directory holding `model.onnx` and `bundle.json`.
    pub model_dir: PathBuf,
    /// Base URL the bundle files are fetched from when missing locally.
    pub model_url: Option<String>,
    /// SQLite database file for analysis records.
    pub database_path: PathBuf,
    /// Maximum number of records returned by a history query.
    pub history_limit: usize,
    /// ONNX Runtime session settings.
    pub session: OrtSessionConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_dir: PathBuf::from("backend/models"),
            model_url: None,
            database_path: PathBuf::from("bloodsmear.sqlite3"),
            history_limit: DEFAULT_HISTORY_LIMIT,
            session: OrtSessionConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Reads the configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn from_env() -> AnalysisResult<Self> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!(path = %path.display(), "loaded environment file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Recognised keys: `HOST`, `PORT`, `MODEL_PATH`, `MODEL_URL`,
    /// `DATABASE_PATH`, `HISTORY_LIMIT`, `ORT_INTRA_THREADS`,
    /// `ORT_SESSION_POOL`, `EXECUTION_PROVIDER`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AnalysisResult<Self> {
        let defaults = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match value("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AnalysisError::config_error(format!("PORT is not a port: {raw}")))?,
            None => defaults.port,
        };

        let history_limit = match value("HISTORY_LIMIT") {
            Some(raw) => raw.parse::<usize>().ok().filter(|n| *n > 0).ok_or_else(|| {
                AnalysisError::config_error(format!("HISTORY_LIMIT must be a positive integer: {raw}"))
            })?,
            None => defaults.history_limit,
        };

        let mut session = OrtSessionConfig::new();
        if let Some(raw) = value("ORT_INTRA_THREADS") {
            let threads = raw.parse::<usize>().map_err(|_| {
                AnalysisError::config_error(format!("ORT_INTRA_THREADS is not a number: {raw}"))
            })?;
            session = session.with_intra_threads(threads);
        }
        if let Some(raw) = value("ORT_SESSION_POOL") {
            let size = raw.parse::<usize>().map_err(|_| {
                AnalysisError::config_error(format!("ORT_SESSION_POOL is not a number: {raw}"))
            })?;
            session = session.with_session_pool_size(size);
        }
        if let Some(raw) = value("EXECUTION_PROVIDER") {
            let mut providers = Vec::new();
            for name in raw.split(',') {
                let provider = OrtExecutionProvider::from_name(name).ok_or_else(|| {
                    AnalysisError::config_error(format!("unknown execution provider '{name}'"))
                })?;
                providers.push(provider);
            }
            if !providers.contains(&OrtExecutionProvider::CPU) {
                providers.push(OrtExecutionProvider::CPU);
            }
            session = session.with_execution_providers(providers);
        }

        Ok(Self {
            host: value("HOST").unwrap_or(defaults.host),
            port,
            model_dir: value("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            model_url: value("MODEL_URL"),
            database_path: value("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            history_limit,
            session,
        })
    }

    /// Socket address the HTTP listener binds to.
    pub fn bind_addr(&self) -> AnalysisResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| {
                AnalysisError::config_error(format!(
                    "'{}:{}' is not a valid listen address",
                    self.host, self.port
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.bind_addr().unwrap().port(), 5000);
    }

    #[test]
    fn test_reads_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("MODEL_PATH", "/srv/models"),
            ("MODEL_URL", "https://models.example.org/smear"),
            ("HISTORY_LIMIT", "25"),
            ("ORT_INTRA_THREADS", "4"),
            ("EXECUTION_PROVIDER", "cuda"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.model_dir, PathBuf::from("/srv/models"));
        assert_eq!(
            config.model_url.as_deref(),
            Some("https://models.example.org/smear")
        );
        assert_eq!(config.history_limit, 25);
        assert_eq!(config.session.intra_threads, Some(4));
        assert_eq!(
            config.session.execution_providers,
            Some(vec![
                OrtExecutionProvider::CUDA { device_id: None },
                OrtExecutionProvider::CPU
            ])
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(ServiceConfig::from_lookup(lookup(&[("PORT", "http")])).is_err());
        assert!(ServiceConfig::from_lookup(lookup(&[("HISTORY_LIMIT", "0")])).is_err());
        assert!(ServiceConfig::from_lookup(lookup(&[("EXECUTION_PROVIDER", "npu")])).is_err());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[("PORT", "  "), ("MODEL_URL", "")]))
            .unwrap();
        assert_eq!(config.port, 5000);
        assert!(config.model_url.is_none());
    }
}
