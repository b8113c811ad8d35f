use crate::error::StickerError;
use crate::models::{GeneratedArtifact, Locale};
use serde::{Deserialize, Serialize};

const MAX_REASON_CHARS: usize = 160;

fn has_token(text: &str, token: &str) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|t| t == token)
}

/// Why a single variant did not produce an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    RateLimited,
    PermissionDenied,
    ContentFiltered,
    ServiceUnavailable,
    NoContent,
    Unknown(String),
}

impl FailureKind {
    /// Classifies a remote error by its status code, then by the status
    /// markers in its message. Bare status numbers only count inside API
    /// errors, and only as whole tokens.
    pub fn classify(error: &StickerError) -> Self {
        match error {
            StickerError::ApiError { status, message } => {
                match status {
                    Some(429) => return FailureKind::RateLimited,
                    Some(403) => return FailureKind::PermissionDenied,
                    Some(503) => return FailureKind::ServiceUnavailable,
                    _ => {}
                }
                Self::from_markers(message, true)
                    .unwrap_or_else(|| FailureKind::unknown(&error.to_string()))
            }
            other => {
                let message = other.to_string();
                Self::from_markers(&message, false)
                    .unwrap_or_else(|| FailureKind::unknown(&message))
            }
        }
    }

    pub fn classify_message(message: &str) -> Self {
        Self::from_markers(message, true).unwrap_or_else(|| FailureKind::unknown(message))
    }

    fn from_markers(message: &str, status_codes: bool) -> Option<Self> {
        let upper = message.to_ascii_uppercase();
        let code = |c: &str| status_codes && has_token(&upper, c);

        if code("429") || upper.contains("RESOURCE_EXHAUSTED") || upper.contains("RATE LIMIT") {
            Some(FailureKind::RateLimited)
        } else if code("403") || upper.contains("PERMISSION_DENIED") {
            Some(FailureKind::PermissionDenied)
        } else if upper.contains("SAFETY") || upper.contains("BLOCKED") {
            Some(FailureKind::ContentFiltered)
        } else if code("503") || upper.contains("UNAVAILABLE") {
            Some(FailureKind::ServiceUnavailable)
        } else {
            None
        }
    }

    /// Single-line, length-capped reason for an unrecognized error.
    fn unknown(message: &str) -> Self {
        let flat = message.split_whitespace().collect::<Vec<_>>().join(" ");
        let reason = match flat.char_indices().nth(MAX_REASON_CHARS) {
            Some((cut, _)) => format!("{}...", &flat[..cut]),
            None => flat,
        };
        FailureKind::Unknown(reason)
    }

    pub fn is_retriable(&self) -> bool {
        matches!(self, FailureKind::RateLimited)
    }

    /// Human-readable reason; a rate limit only surfaces once retries ran out.
    pub fn describe(&self, locale: Locale) -> String {
        match (self, locale) {
            (FailureKind::RateLimited, Locale::English) => "rate limited, retries exhausted".into(),
            (FailureKind::RateLimited, Locale::TraditionalChinese) => {
                "請求過於頻繁，已達重試上限".into()
            }
            (FailureKind::PermissionDenied, Locale::English) => {
                "permission denied, check the API key and its project access".into()
            }
            (FailureKind::PermissionDenied, Locale::TraditionalChinese) => {
                "權限不足，請確認 API Key 設定".into()
            }
            (FailureKind::ContentFiltered, Locale::English) => {
                "blocked by the content safety filter".into()
            }
            (FailureKind::ContentFiltered, Locale::TraditionalChinese) => {
                "內容被安全過濾器阻擋".into()
            }
            (FailureKind::ServiceUnavailable, Locale::English) => {
                "service temporarily unavailable".into()
            }
            (FailureKind::ServiceUnavailable, Locale::TraditionalChinese) => {
                "服務暫時無法使用".into()
            }
            (FailureKind::NoContent, Locale::English) => "no image returned".into(),
            (FailureKind::NoContent, Locale::TraditionalChinese) => "未產生圖片".into(),
            (FailureKind::Unknown(message), _) => message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFailure {
    pub variant: String,
    pub kind: FailureKind,
    pub reason: String,
}

impl VariantFailure {
    pub fn new(variant: impl Into<String>, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            variant: variant.into(),
            kind,
            reason: reason.into(),
        }
    }
}

/// Result of a run that produced at least one artifact (or had nothing to do).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub requested: usize,
    pub succeeded: usize,
    pub failures: Vec<VariantFailure>,
}

impl RunSummary {
    pub fn is_partial(&self) -> bool {
        self.succeeded > 0 && !self.failures.is_empty()
    }
}

/// Items yielded by the streaming form of a run.
#[derive(Debug)]
pub enum RunEvent {
    Progress { current: usize, total: usize },
    Artifact(GeneratedArtifact),
    Completed(RunSummary),
    Failed(StickerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_status_codes() {
        let limited = StickerError::ApiError {
            status: Some(429),
            message: "quota".into(),
        };
        assert_eq!(FailureKind::classify(&limited), FailureKind::RateLimited);

        let denied = StickerError::ApiError {
            status: Some(403),
            message: "nope".into(),
        };
        assert_eq!(FailureKind::classify(&denied), FailureKind::PermissionDenied);
    }

    #[test]
    fn classifies_message_markers() {
        assert_eq!(
            FailureKind::classify_message("RESOURCE_EXHAUSTED: quota exceeded"),
            FailureKind::RateLimited
        );
        assert_eq!(
            FailureKind::classify_message("finish reason IMAGE_SAFETY"),
            FailureKind::ContentFiltered
        );
        assert_eq!(
            FailureKind::classify_message("503 Service Unavailable"),
            FailureKind::ServiceUnavailable
        );
        assert_eq!(
            FailureKind::classify_message("connection reset"),
            FailureKind::Unknown("connection reset".into())
        );
    }

    #[test]
    fn digits_outside_api_errors_are_not_status_codes() {
        let decode = StickerError::ResponseError("image data: Invalid byte 61, offset 4291.".into());
        assert!(matches!(FailureKind::classify(&decode), FailureKind::Unknown(_)));

        let bytes = StickerError::ResponseError("read 403 bytes before reset".into());
        assert!(matches!(FailureKind::classify(&bytes), FailureKind::Unknown(_)));

        let embedded = StickerError::ApiError {
            status: Some(500),
            message: "request 14291 failed".into(),
        };
        assert!(matches!(FailureKind::classify(&embedded), FailureKind::Unknown(_)));

        let token = StickerError::ApiError {
            status: None,
            message: "upstream said 429 Too Many Requests".into(),
        };
        assert_eq!(FailureKind::classify(&token), FailureKind::RateLimited);
    }

    #[test]
    fn unknown_reasons_are_single_line_and_capped() {
        let err = StickerError::ApiError {
            status: Some(502),
            message: "<html>\n<head><title>Bad Gateway</title></head>\n</html>".into(),
        };
        let reason = FailureKind::classify(&err).describe(Locale::English);
        assert_eq!(reason.lines().count(), 1);
        assert!(reason.starts_with("Gemini API error 502: <html> <head>"));

        let long = "x ".repeat(400);
        let FailureKind::Unknown(reason) = FailureKind::classify_message(&long) else {
            panic!("expected an unknown failure");
        };
        assert_eq!(reason.chars().count(), MAX_REASON_CHARS + 3);
        assert!(reason.ends_with("..."));
    }

    #[test]
    fn only_rate_limits_retry() {
        assert!(FailureKind::RateLimited.is_retriable());
        assert!(!FailureKind::ServiceUnavailable.is_retriable());
        assert!(!FailureKind::NoContent.is_retriable());
    }

    #[test]
    fn rate_limit_reason_mentions_exhaustion() {
        assert_eq!(
            FailureKind::RateLimited.describe(Locale::English),
            "rate limited, retries exhausted"
        );
    }
}
