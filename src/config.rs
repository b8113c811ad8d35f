use crate::error::{Result, StickerError};
use crate::models::Locale;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_CREDENTIAL_VARS: [&str; 3] = ["GEMINI_API_KEY", "VITE_API_KEY", "API_KEY"];

/// A resolved API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct CredentialConfig {
    pub api_key: Option<String>,
    pub env_keys: Vec<String>,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        CredentialConfig {
            api_key: None,
            env_keys: DEFAULT_CREDENTIAL_VARS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl CredentialConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_env_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Explicit key first, then the first non-empty environment variable.
    pub fn resolve(&self) -> Result<ApiKey> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(ApiKey::new(key.trim()));
        }

        self.env_keys
            .iter()
            .filter_map(|name| env::var(name).ok())
            .find(|value| !value.trim().is_empty())
            .map(|value| ApiKey::new(value.trim()))
            .ok_or_else(|| StickerError::MissingCredential(self.env_keys.join(", ")))
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        GeminiConfig {
            base_url: env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            model: env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            timeout_secs: env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Pacing and retry limits for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub pacing_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            backoff_base: Duration::from_millis(5_000),
            pacing_delay: Duration::from_millis(2_000),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let millis = |name: &str| env::var(name).ok().and_then(|s| s.parse::<u64>().ok());
        RetryPolicy {
            max_attempts: env::var("STICKERGEN_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_attempts),
            backoff_base: millis("STICKERGEN_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.backoff_base),
            pacing_delay: millis("STICKERGEN_PACING_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.pacing_delay),
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn with_pacing_delay(mut self, delay: Duration) -> Self {
        self.pacing_delay = delay;
        self
    }

    /// Wait before retrying after the given (1-based) failed attempt.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base * attempt.max(1)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub credentials: CredentialConfig,
    pub retry: RetryPolicy,
    pub locale: Locale,
    pub output_dir: PathBuf,
    /// TrueType/OpenType font used to draw captions onto exported images.
    pub caption_font: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            gemini: GeminiConfig::default(),
            credentials: CredentialConfig::default(),
            retry: RetryPolicy::default(),
            locale: Locale::default(),
            output_dir: PathBuf::from("stickers"),
            caption_font: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        let locale = match env::var("STICKERGEN_LOCALE") {
            Ok(value) => value.parse().map_err(StickerError::ConfigError)?,
            Err(_) => Locale::default(),
        };
        let output_dir = env::var("STICKERGEN_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("stickers"));
        let caption_font = env::var("STICKERGEN_FONT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Config {
            gemini: GeminiConfig::from_env(),
            credentials: CredentialConfig::default(),
            retry: RetryPolicy::from_env(),
            locale,
            output_dir,
            caption_font,
        })
    }

    pub fn with_gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialConfig) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_caption_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.caption_font = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_key_wins() {
        let key = CredentialConfig::new()
            .with_api_key("  abc  ")
            .with_env_keys(["STICKERGEN_TEST_NEVER_SET"])
            .resolve()
            .unwrap();
        assert_eq!(key.expose(), "abc");
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
    }

    #[test]
    fn missing_key_is_an_error() {
        let err = CredentialConfig::new()
            .with_env_keys(["STICKERGEN_TEST_NEVER_SET"])
            .resolve()
            .unwrap_err();
        assert!(matches!(err, StickerError::MissingCredential(_)));
    }

    #[test]
    fn backoff_grows_with_attempt() {
        let policy = RetryPolicy::new().with_backoff_base(Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
        assert_eq!(policy.max_attempts, 3);
    }
}
