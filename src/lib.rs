pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use commands::analysis::{AnalysisController, AnalysisOutcome};
pub use commands::model::ModelDownload;
pub use config::ApiConfig;
pub use error::AppError;
pub use services::api_client::{DetectionApi, HttpDetectionApi};
pub use services::surface::{DisplaySurface, RasterSurface};
