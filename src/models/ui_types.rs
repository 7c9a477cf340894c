use serde::Serialize;
use std::time::{Duration, Instant};

/// Which section of the interface is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiState {
    Empty,
    Preview,
    Busy,
    Result,
    Error,
}

/// Dismissable error banner. Hides itself once `timeout` has elapsed.
#[derive(Debug, Clone)]
pub struct ErrorBanner {
    pub message: String,
    pub shown_at: Instant,
    pub timeout: Duration,
}

impl ErrorBanner {
    pub fn new(message: impl Into<String>, shown_at: Instant, timeout: Duration) -> Self {
        Self {
            message: message.into(),
            shown_at,
            timeout,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.timeout
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadButton {
    Idle,
    Downloading,
    Done,
    Failed,
}

impl DownloadButton {
    pub fn label(&self) -> &'static str {
        match self {
            DownloadButton::Idle => "📥 Download model",
            DownloadButton::Downloading => "⏳ Downloading...",
            DownloadButton::Done => "✅ Downloaded!",
            DownloadButton::Failed => "❌ Error",
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, DownloadButton::Idle)
    }
}

/// Plain-text detail fields under the result image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultDetails {
    pub class_name: String,
    pub priority: String,
    pub num_detections: String,
    pub processing_time: String,
}

/// Everything the result card shows besides the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub emoji: String,
    pub status: String,
    pub color: String,
    /// Header background: the result color at low alpha.
    pub header_tint: String,
    /// Confidence bar width in percent of its track, clamped to 0..=100.
    pub confidence_bar_width: f64,
    pub confidence_text: String,
    pub message: String,
    pub details: ResultDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsView {
    pub total_analyses: u64,
    pub avg_confidence: String,
    pub avg_time: String,
}
