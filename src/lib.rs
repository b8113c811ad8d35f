//! Generate LINE sticker and emoji sets with Gemini image models.
//!
//! [`BatchOrchestrator`] requests one image per [`Variant`], sequentially,
//! retrying rate-limited calls and reporting each [`GeneratedArtifact`] as it
//! arrives. [`export::StickerExporter`] turns artifacts into LINE-sized PNGs
//! with transparent backgrounds.

pub mod config;
pub mod error;
pub mod export;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod prompt;

pub use config::{ApiKey, Config, CredentialConfig, GeminiConfig, RetryPolicy};
pub use error::{Result, StickerError};
pub use gemini::{GeminiImageClient, ImageGenerator};
pub use models::*;
pub use orchestrator::BatchOrchestrator;
