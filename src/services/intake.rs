use crate::error::AppError;
use base64::Engine;
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use tracing::{debug, warn};

const UNKNOWN_MIME: &str = "application/octet-stream";

/// The image staged for analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// How a file reached the drop zone.
#[derive(Debug)]
pub enum FileSource {
    Browse(SelectedFile),
    Drop(Vec<SelectedFile>),
}

impl FileSource {
    /// A drop of several files only stages the first one.
    pub fn into_candidate(self) -> Option<SelectedFile> {
        match self {
            FileSource::Browse(file) => Some(file),
            FileSource::Drop(files) => files.into_iter().next(),
        }
    }
}

/// Decoded local preview of the staged file.
#[derive(Debug, Clone)]
pub struct Preview {
    pub data_uri: String,
    pub image: DynamicImage,
}

/// Rejects non-image MIME types and files over `max_bytes`.
pub fn validate(mime: &str, size: u64, max_bytes: u64) -> Result<(), AppError> {
    if !mime.starts_with("image/") {
        warn!(mime, "Rejected file: not an image");
        return Err(AppError::Validation(
            "Please select a valid image (JPG, PNG, JPEG)".to_string(),
        ));
    }
    if size > max_bytes {
        warn!(size, max_bytes, "Rejected file: too large");
        return Err(AppError::Validation(format!(
            "The image is too large. Maximum size: {} MB",
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Declared MIME type for a file on disk, from its extension.
pub fn mime_from_path(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or(UNKNOWN_MIME)
}

/// Reads a candidate from disk. Size is checked before the bytes are read.
pub async fn read_candidate(path: &Path, max_bytes: u64) -> Result<SelectedFile, AppError> {
    let mime = mime_from_path(path);
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        AppError::Validation(format!("Cannot read {}: {}", path.display(), e))
    })?;
    validate(mime, metadata.len(), max_bytes)?;

    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    debug!(name = %name, mime, size = bytes.len(), "Read candidate file");
    Ok(SelectedFile::new(name, mime, bytes))
}

pub fn to_data_uri(file: &SelectedFile) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(&file.bytes);
    format!("data:{};base64,{}", file.mime, b64)
}

/// Decodes a `data:<mime>;base64,<payload>` URI back into an image.
pub fn decode_data_uri(data_uri: &str) -> Result<DynamicImage, AppError> {
    let payload = data_uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| AppError::Validation("Preview is not a base64 data URI".to_string()))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| AppError::Validation(format!("Invalid preview encoding: {}", e)))?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Builds the preview off the async executor, the decode being CPU bound.
pub async fn build_preview(file: &SelectedFile) -> Result<Preview, AppError> {
    let data_uri = to_data_uri(file);
    let uri = data_uri.clone();
    let image = tokio::task::spawn_blocking(move || decode_data_uri(&uri))
        .await
        .map_err(|e| AppError::Validation(format!("Preview task failed: {}", e)))??;
    Ok(Preview { data_uri, image })
}
