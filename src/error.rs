use crate::models::VariantFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StickerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Missing API credential: set one of {0}")]
    MissingCredential(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Gemini API error {}: {message}", render_status(.status))]
    ApiError { status: Option<u16>, message: String },
    #[error("Image error: {0}")]
    ImageError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("{}", render_failures(.0))]
    AggregateGeneration(Vec<VariantFailure>),
}

fn render_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "-".to_string(),
    }
}

fn render_failures(failures: &[VariantFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.variant, f.reason))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<image::ImageError> for StickerError {
    fn from(e: image::ImageError) -> Self {
        StickerError::ImageError(e.to_string())
    }
}

impl From<serde_json::Error> for StickerError {
    fn from(e: serde_json::Error) -> Self {
        StickerError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StickerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureKind;

    #[test]
    fn aggregate_message_has_one_line_per_variant() {
        let err = StickerError::AggregateGeneration(vec![
            VariantFailure::new("Happy", FailureKind::NoContent, "no image returned"),
            VariantFailure::new("Sad", FailureKind::PermissionDenied, "permission denied"),
        ]);
        let message = err.to_string();
        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(lines, vec!["Happy: no image returned", "Sad: permission denied"]);
    }

    #[test]
    fn api_error_carries_status() {
        let err = StickerError::ApiError {
            status: Some(429),
            message: "RESOURCE_EXHAUSTED".into(),
        };
        assert_eq!(err.to_string(), "Gemini API error 429: RESOURCE_EXHAUSTED");
    }
}
