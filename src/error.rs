use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Rejected locally, never reaches the network.
    #[error("{0}")]
    Validation(String),

    #[error("No image selected")]
    NoFileSelected,

    #[error("An analysis is already in progress")]
    Busy,

    #[error("{}", transport_message(.status, .message))]
    Transport { status: Option<u16>, message: String },

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Error {}: {}", code, message),
        None => message.to_string(),
    }
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::NoFileSelected => "no_file_selected",
            AppError::Busy => "busy",
            AppError::Transport { .. } => "transport",
            AppError::Parse(_) => "parse",
            AppError::Io(_) => "io",
            AppError::Image(_) => "image",
        }
    }

    /// Text shown in the error banner.
    ///
    /// Transport and parse failures share the same prefix; the user is not
    /// told which of the two happened beyond the detail text.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Transport { .. } | AppError::Parse(_) => {
                format!("Analysis failed: {}", self)
            }
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl Serialize for AppError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AppError", 2)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return AppError::Parse(err.to_string());
        }
        AppError::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_carries_status_code() {
        let err = AppError::Transport {
            status: Some(500),
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "Error 500: Internal Server Error");
        assert_eq!(
            err.user_message(),
            "Analysis failed: Error 500: Internal Server Error"
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = AppError::Validation("too large".into());
        assert_eq!(err.user_message(), "too large");
    }

    #[test]
    fn serializes_kind_and_message() {
        let json = serde_json::to_value(AppError::Parse("bad json".into())).unwrap();
        assert_eq!(json["kind"], "parse");
        assert_eq!(json["message"], "Invalid response: bad json");
    }
}
