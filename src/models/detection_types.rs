use serde::{Deserialize, Serialize};

/// Box in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Scales each coordinate independently, x by `sx` and y by `sy`.
    pub fn scaled(&self, sx: f64, sy: f64) -> BoundingBox {
        BoundingBox {
            x1: self.x1 * sx,
            y1: self.y1 * sy,
            x2: self.x2 * sx,
            y2: self.y2 * sy,
        }
    }
}

/// Body of a successful `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub status: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub confidence_percent: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub num_detections: u32,
    #[serde(default)]
    pub processing_time: Option<f64>,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
}

fn default_color() -> String {
    "#6b7280".to_string()
}

impl AnalysisResult {
    /// The box to overlay, if the service reported a detection with one.
    pub fn detection_box(&self) -> Option<BoundingBox> {
        if self.num_detections == 0 {
            return None;
        }
        self.bbox
    }

    /// "status percent%" as drawn above the box.
    pub fn label(&self) -> String {
        format!("{} {}%", self.status, self.confidence_percent)
    }
}

/// Outcome of the startup liveness check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HealthReport {
    Connected { body: serde_json::Value },
    Unavailable { reason: String },
}

impl HealthReport {
    pub fn is_connected(&self) -> bool {
        matches!(self, HealthReport::Connected { .. })
    }

    pub fn badge(&self) -> &'static str {
        match self {
            HealthReport::Connected { .. } => "✓ API connected",
            HealthReport::Unavailable { .. } => "⚠️ Backend unavailable",
        }
    }
}
