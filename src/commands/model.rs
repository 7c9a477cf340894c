use crate::error::AppError;
use crate::models::ui_types::DownloadButton;
use crate::services::api_client::DetectionApi;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// State of the "download model" button. Done and Failed revert to Idle
/// after `revert_after`.
pub struct ModelDownload {
    button: DownloadButton,
    changed_at: Instant,
    revert_after: Duration,
}

impl ModelDownload {
    pub fn new(revert_after: Duration) -> Self {
        Self {
            button: DownloadButton::Idle,
            changed_at: Instant::now(),
            revert_after,
        }
    }

    pub fn button(&self) -> DownloadButton {
        self.button
    }

    fn set(&mut self, button: DownloadButton) {
        self.button = button;
        self.changed_at = Instant::now();
    }

    pub async fn download<A: DetectionApi>(
        &mut self,
        api: &A,
        dest_dir: &Path,
        on_progress: &mut (dyn FnMut(u64) + Send),
    ) -> Result<PathBuf, AppError> {
        if !self.button.is_enabled() {
            return Err(AppError::Busy);
        }

        self.set(DownloadButton::Downloading);
        match api.download_model(dest_dir, on_progress).await {
            Ok(path) => {
                info!(path = %path.display(), "Model saved");
                self.set(DownloadButton::Done);
                Ok(path)
            }
            Err(e) => {
                error!(error = %e, "Model download failed");
                self.set(DownloadButton::Failed);
                Err(e)
            }
        }
    }

    /// Restores the idle label once the transient state has been shown long enough.
    pub fn poll(&mut self, now: Instant) -> bool {
        let transient = matches!(self.button, DownloadButton::Done | DownloadButton::Failed);
        if transient && now.saturating_duration_since(self.changed_at) >= self.revert_after {
            self.button = DownloadButton::Idle;
            self.changed_at = now;
            return true;
        }
        false
    }
}
