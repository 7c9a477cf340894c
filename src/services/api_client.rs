use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::detection_types::{AnalysisResult, HealthReport};
use crate::services::intake::SelectedFile;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

/// The remote detection service.
#[allow(async_fn_in_trait)]
pub trait DetectionApi {
    /// Liveness check. Never fails; an unreachable service is reported, not raised.
    async fn check_health(&self) -> HealthReport;

    /// Uploads `file` as the multipart field `file` and parses the result.
    async fn predict(&self, file: &SelectedFile) -> Result<AnalysisResult, AppError>;

    /// Streams the model weights into `dest_dir`, reporting progress in percent.
    async fn download_model(
        &self,
        dest_dir: &Path,
        on_progress: &mut (dyn FnMut(u64) + Send),
    ) -> Result<PathBuf, AppError>;
}

#[derive(Clone)]
pub struct HttpDetectionApi {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpDetectionApi {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `GET /health`, bounded by `health_timeout` so a silent backend cannot
    /// hold up the caller.
    pub async fn fetch_health(&self) -> HealthReport {
        let url = self.config.health_url();
        let outcome: Result<serde_json::Value, AppError> = async {
            let response = self
                .client
                .get(&url)
                .timeout(self.config.health_timeout)
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(status_error(status));
            }
            Ok(response.json::<serde_json::Value>().await?)
        }
        .await;

        match outcome {
            Ok(body) => {
                info!(url = %url, body = %body, "API connected");
                HealthReport::Connected { body }
            }
            Err(e) => {
                warn!(url = %url, error = %e, "API unreachable, analysis will need the backend");
                HealthReport::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn status_error(status: reqwest::StatusCode) -> AppError {
    AppError::Transport {
        status: Some(status.as_u16()),
        message: status.canonical_reason().unwrap_or("Request failed").to_string(),
    }
}

impl DetectionApi for HttpDetectionApi {
    async fn check_health(&self) -> HealthReport {
        self.fetch_health().await
    }

    async fn predict(&self, file: &SelectedFile) -> Result<AnalysisResult, AppError> {
        let url = self.config.predict_url();
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|e| AppError::Validation(format!("Invalid MIME type {}: {}", file.mime, e)))?;
        let form = Form::new().part("file", part);

        let start = Instant::now();
        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!(url = %url, status = status.as_u16(), "Prediction request failed");
            return Err(status_error(status));
        }

        let body = response.bytes().await?;
        let result: AnalysisResult = serde_json::from_slice(&body)?;
        debug!(
            file = %file.name,
            status = %result.status,
            detections = result.num_detections,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Prediction received"
        );
        Ok(result)
    }

    async fn download_model(
        &self,
        dest_dir: &Path,
        on_progress: &mut (dyn FnMut(u64) + Send),
    ) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(dest_dir).await?;
        let dest = dest_dir.join(&self.config.model_file_name);
        let partial = dest_dir.join(format!("{}.part", self.config.model_file_name));
        let url = self.config.download_url();

        // An existing model is only replaced once the new one is complete.
        let result = match download_file(&self.client, &url, &partial, on_progress).await {
            Ok(bytes) => tokio::fs::rename(&partial, &dest)
                .await
                .map(|_| bytes)
                .map_err(AppError::from),
            Err(e) => Err(e),
        };
        if let Err(ref e) = result {
            error!(url = %url, error = %e, "Model download failed");
            let _ = tokio::fs::remove_file(&partial).await;
        }
        result.map(|bytes| {
            info!(path = %dest.display(), bytes, "Model downloaded");
            dest
        })
    }
}

async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    on_progress: &mut (dyn FnMut(u64) + Send),
) -> Result<u64, AppError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(status));
    }

    let total_size = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut last_emit = 0;

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        downloaded += chunk.len() as u64;
        file.write_all(&chunk).await?;

        if total_size > 0 {
            let progress = (downloaded * 100) / total_size;
            if progress > last_emit {
                on_progress(progress);
                last_emit = progress;
            }
        }
    }
    file.flush().await?;
    if last_emit < 100 {
        on_progress(100);
    }

    Ok(downloaded)
}
