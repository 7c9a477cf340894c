use crate::error::AppError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const LOCAL_API_URL: &str = "http://127.0.0.1:8000";
pub const PRODUCTION_API_URL: &str = "https://detection-poubelle-backend.onrender.com";
pub const API_URL_ENV: &str = "DETECT_LENS_API_URL";

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const DISPLAY_MAX_WIDTH: u32 = 800;
pub const DISPLAY_MAX_HEIGHT: u32 = 600;
pub const BANNER_TIMEOUT: Duration = Duration::from_secs(5);
pub const DOWNLOAD_REVERT: Duration = Duration::from_secs(2);
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
pub const MODEL_FILE_NAME: &str = "best.pt";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub max_upload_bytes: u64,
    pub display_max_width: u32,
    pub display_max_height: u32,
    pub banner_timeout: Duration,
    pub download_revert: Duration,
    /// Upper bound on the liveness check, connect included.
    pub health_timeout: Duration,
    pub model_file_name: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: LOCAL_API_URL.to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            display_max_width: DISPLAY_MAX_WIDTH,
            display_max_height: DISPLAY_MAX_HEIGHT,
            banner_timeout: BANNER_TIMEOUT,
            download_revert: DOWNLOAD_REVERT,
            health_timeout: HEALTH_TIMEOUT,
            model_file_name: MODEL_FILE_NAME.to_string(),
        }
    }
}

/// On-disk overrides. Every field is optional; missing ones keep the default.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    api_url: Option<String>,
    max_upload_bytes: Option<u64>,
    display_max_width: Option<u32>,
    display_max_height: Option<u32>,
    banner_timeout_secs: Option<u64>,
    download_revert_secs: Option<u64>,
    health_timeout_ms: Option<u64>,
    model_file_name: Option<String>,
}

impl ApiConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Picks the endpoint: explicit flag, then environment, then the
    /// production preset, then the local development server.
    pub fn resolve(explicit: Option<&str>, env_value: Option<&str>, production: bool) -> Self {
        let base_url = explicit
            .or(env_value)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                if production {
                    PRODUCTION_API_URL.to_string()
                } else {
                    LOCAL_API_URL.to_string()
                }
            });
        Self::with_base_url(base_url)
    }

    pub fn apply_toml(mut self, contents: &str) -> Result<Self, AppError> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| AppError::Validation(format!("Invalid config file: {}", e)))?;

        if let Some(url) = file.api_url {
            self.base_url = url;
        }
        if let Some(v) = file.max_upload_bytes {
            self.max_upload_bytes = v;
        }
        if let Some(v) = file.display_max_width {
            self.display_max_width = v;
        }
        if let Some(v) = file.display_max_height {
            self.display_max_height = v;
        }
        if let Some(v) = file.banner_timeout_secs {
            self.banner_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.download_revert_secs {
            self.download_revert = Duration::from_secs(v);
        }
        if let Some(v) = file.health_timeout_ms {
            self.health_timeout = Duration::from_millis(v);
        }
        if let Some(name) = file.model_file_name {
            self.model_file_name = name;
        }
        Ok(self)
    }

    pub fn load_toml(self, path: &Path) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path)?;
        self.apply_toml(&contents)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn health_url(&self) -> String {
        self.endpoint("health")
    }

    pub fn predict_url(&self) -> String {
        self.endpoint("predict")
    }

    pub fn download_url(&self) -> String {
        self.endpoint("download-model")
    }
}
