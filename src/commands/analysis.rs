use crate::config::ApiConfig;
use crate::error::AppError;
use crate::models::detection_types::{AnalysisResult, HealthReport};
use crate::models::ui_types::{ErrorBanner, ResultView, StatsView, UiState};
use crate::services::api_client::DetectionApi;
use crate::services::intake::{self, FileSource, Preview, SelectedFile};
use crate::services::render::{self, RenderReport};
use crate::services::stats::RunningStats;
use crate::services::surface::DisplaySurface;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// The staged file together with its decoded preview.
pub struct StagedImage {
    pub file: SelectedFile,
    pub preview: Preview,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub view: ResultView,
    pub render: RenderReport,
    pub stats: StatsView,
}

/// Holds the busy flag for the duration of one request and clears it on drop.
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    pub fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Owns the session state and walks it through
/// empty → preview → busy → result | error.
pub struct AnalysisController<A, S> {
    api: A,
    surface: S,
    config: ApiConfig,
    ui: UiState,
    staged: Option<StagedImage>,
    last: Option<AnalysisOutcome>,
    stats: RunningStats,
    banner: Option<ErrorBanner>,
    health: Option<HealthReport>,
    busy: Arc<AtomicBool>,
}

impl<A: DetectionApi, S: DisplaySurface> AnalysisController<A, S> {
    pub fn new(api: A, surface: S, config: ApiConfig) -> Self {
        Self {
            api,
            surface,
            config,
            ui: UiState::Empty,
            staged: None,
            last: None,
            stats: RunningStats::new(),
            banner: None,
            health: None,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn ui_state(&self) -> UiState {
        self.ui
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.staged.as_ref().map(|s| &s.file)
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.staged.as_ref().map(|s| &s.preview)
    }

    pub fn last_outcome(&self) -> Option<&AnalysisOutcome> {
        self.last.as_ref()
    }

    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }

    pub fn banner(&self) -> Option<&ErrorBanner> {
        self.banner.as_ref()
    }

    pub fn health(&self) -> Option<&HealthReport> {
        self.health.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Best-effort startup check. The outcome only feeds the status badge.
    pub async fn check_health(&mut self) -> &HealthReport {
        let report = self.api.check_health().await;
        self.record_health(report)
    }

    /// Stores a health report obtained outside the controller, e.g. from a
    /// check that ran alongside analysis.
    pub fn record_health(&mut self, report: HealthReport) -> &HealthReport {
        self.health.insert(report)
    }

    /// Stages a browsed or dropped file. Returns `Ok(false)` for an empty drop.
    ///
    /// A rejected file leaves the previously staged one in place.
    pub async fn select(&mut self, source: FileSource) -> Result<bool, AppError> {
        let Some(file) = source.into_candidate() else {
            return Ok(false);
        };

        if let Err(e) = intake::validate(&file.mime, file.size(), self.config.max_upload_bytes) {
            self.show_error(e.user_message());
            return Err(e);
        }

        let preview = match intake::build_preview(&file).await {
            Ok(preview) => preview,
            Err(e) => {
                self.show_error(e.user_message());
                return Err(e);
            }
        };

        info!(name = %file.name, size = file.size(), "Image staged");
        self.staged = Some(StagedImage { file, preview });
        self.last = None;
        self.banner = None;
        self.ui = UiState::Preview;
        Ok(true)
    }

    pub async fn select_path(&mut self, path: &Path) -> Result<bool, AppError> {
        match intake::read_candidate(path, self.config.max_upload_bytes).await {
            Ok(file) => self.select(FileSource::Browse(file)).await,
            Err(e) => {
                self.show_error(e.user_message());
                Err(e)
            }
        }
    }

    /// Sends the staged file for analysis, then updates stats and renders.
    ///
    /// On failure the staged file is kept so the user can retry.
    pub async fn analyze(&mut self) -> Result<AnalysisOutcome, AppError> {
        let Some(staged) = self.staged.as_ref() else {
            let err = AppError::NoFileSelected;
            self.show_error(err.user_message());
            return Err(err);
        };

        let Some(guard) = BusyGuard::acquire(&self.busy) else {
            warn!("Analysis already in flight, request ignored");
            return Err(AppError::Busy);
        };

        self.ui = UiState::Busy;
        self.banner = None;
        let response = self.api.predict(&staged.file).await;
        drop(guard);

        let result = match response {
            Ok(result) => result,
            Err(e) => {
                self.show_error(e.user_message());
                return Err(e);
            }
        };

        let stats = self.stats.record(&result);
        let report = render::render_result(
            &mut self.surface,
            &staged.preview.image,
            &result,
            self.config.display_max_width,
            self.config.display_max_height,
        );
        let outcome = AnalysisOutcome {
            view: render::result_view(&result),
            result,
            render: report,
            stats,
        };

        self.last = Some(outcome.clone());
        self.ui = UiState::Result;
        Ok(outcome)
    }

    /// Back to the empty drop zone, discarding the staged file and any result.
    pub fn reset(&mut self) {
        info!(from = ?self.ui, "Reset");
        self.staged = None;
        self.last = None;
        self.banner = None;
        self.ui = UiState::Empty;
    }

    fn show_error(&mut self, message: String) {
        warn!(message = %message, "Showing error");
        self.banner = Some(ErrorBanner::new(
            message,
            Instant::now(),
            self.config.banner_timeout,
        ));
        self.ui = UiState::Error;
    }

    fn resting_state(&self) -> UiState {
        if self.staged.is_some() {
            UiState::Preview
        } else {
            UiState::Empty
        }
    }

    pub fn dismiss_error(&mut self) {
        if self.banner.take().is_some() && self.ui == UiState::Error {
            self.ui = self.resting_state();
        }
    }

    /// Hides the banner once its display window has passed. Returns whether
    /// it was hidden.
    pub fn poll_banner(&mut self, now: Instant) -> bool {
        match &self.banner {
            Some(banner) if banner.is_expired(now) => {
                self.dismiss_error();
                true
            }
            _ => false,
        }
    }

    /// Sleeps until the current banner expires, then hides it.
    pub async fn wait_for_banner(&mut self) {
        let Some(deadline) = self.banner.as_ref().map(|b| b.shown_at + b.timeout) else {
            return;
        };
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        self.poll_banner(Instant::now());
    }
}

#[cfg(test)]
impl<A, S> AnalysisController<A, S> {
    fn api(&self) -> &A {
        &self.api
    }

    fn busy_flag(&self) -> Arc<AtomicBool> {
        self.busy.clone()
    }
}
