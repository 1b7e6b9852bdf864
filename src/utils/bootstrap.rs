//! Fetches the model bundle before start-up when it is not on disk.

use crate::core::constants::{MANIFEST_FILE_NAME, MODEL_FILE_NAME};
use crate::core::errors::{AnalysisError, AnalysisResult};
use crate::models::bundle_present;
use std::path::Path;
use tracing::{info, warn};

const USER_AGENT: &str = concat!("bloodsmear/", env!("CARGO_PKG_VERSION"));

/// Makes sure `dir` holds a complete bundle.
///
/// Does nothing when both files already exist. Otherwise downloads
/// `<base_url>/model.onnx` and `<base_url>/bundle.json` into `dir`. Each file
/// is written under a temporary name and renamed into place, so an
/// interrupted download never leaves a truncated bundle behind.
///
/// # Errors
///
/// [`AnalysisError::ModelLoad`] when the bundle is missing and no URL is
/// configured, or when a download fails.
pub async fn ensure_bundle(dir: &Path, base_url: Option<&str>) -> AnalysisResult<()> {
    if bundle_present(dir) {
        return Ok(());
    }

    let Some(base_url) = base_url else {
        warn!(bundle = %dir.display(), "model bundle not found and MODEL_URL is not set");
        return Err(AnalysisError::model_load_message(
            dir,
            "model bundle not found",
            Some("place model.onnx and bundle.json in the bundle directory or set MODEL_URL"),
        ));
    };

    tokio::fs::create_dir_all(dir).await?;
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| AnalysisError::model_load_error(dir, "http client setup failed", None, Some(e)))?;

    let base_url = base_url.trim_end_matches('/');
    for file in [MANIFEST_FILE_NAME, MODEL_FILE_NAME] {
        let target = dir.join(file);
        if target.is_file() {
            continue;
        }
        let url = format!("{}/{}", base_url, file);
        info!(%url, target = %target.display(), "downloading model bundle file");
        download(&client, &url, &target).await?;
    }
    Ok(())
}

async fn download(client: &reqwest::Client, url: &str, target: &Path) -> AnalysisResult<()> {
    let fail = |reason: &str, e: reqwest::Error| {
        AnalysisError::model_load_error(target, format!("{reason} {url}"), None, Some(e))
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fail("could not reach", e))?;
    if !response.status().is_success() {
        return Err(AnalysisError::model_load_message(
            target,
            format!("download of {} returned status {}", url, response.status()),
            Some("check MODEL_URL"),
        ));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| fail("could not read", e))?;

    let partial = target.with_extension("part");
    tokio::fs::write(&partial, &bytes).await?;
    tokio::fs::rename(&partial, target).await?;
    info!(target = %target.display(), bytes = bytes.len(), "downloaded model bundle file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_present_bundle_needs_no_url() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MODEL_FILE_NAME), b"x").unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE_NAME), b"{}").unwrap();
        ensure_bundle(dir.path(), None).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_bundle_without_url_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ensure_bundle(dir.path(), None).await.unwrap_err();
        assert!(matches!(err, AnalysisError::ModelLoad { .. }));
    }
}
