use crate::models::detection_types::AnalysisResult;
use crate::models::ui_types::StatsView;
use serde::Serialize;
use tracing::info;

/// Session-wide counters. Only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunningStats {
    total_analyses: u64,
    total_confidence: f64,
    total_time: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds in one successful analysis. Missing confidence or time count as 0.
    pub fn record(&mut self, result: &AnalysisResult) -> StatsView {
        self.total_analyses += 1;
        self.total_confidence += result.confidence.unwrap_or(0.0);
        self.total_time += result.processing_time.unwrap_or(0.0);

        let view = self.view();
        info!(
            total = view.total_analyses,
            avg_confidence = %view.avg_confidence,
            avg_time = %view.avg_time,
            "Stats updated"
        );
        view
    }

    pub fn total_analyses(&self) -> u64 {
        self.total_analyses
    }

    pub fn average_confidence(&self) -> Option<f64> {
        (self.total_analyses > 0).then(|| self.total_confidence / self.total_analyses as f64)
    }

    pub fn average_time(&self) -> Option<f64> {
        (self.total_analyses > 0).then(|| self.total_time / self.total_analyses as f64)
    }

    pub fn view(&self) -> StatsView {
        StatsView {
            total_analyses: self.total_analyses,
            avg_confidence: format!("{:.1}%", self.average_confidence().unwrap_or(0.0) * 100.0),
            avg_time: format!("{:.2}s", self.average_time().unwrap_or(0.0)),
        }
    }
}
