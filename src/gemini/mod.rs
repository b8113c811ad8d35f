pub mod image_client;

use crate::{
    config::ApiKey,
    error::Result,
    models::{ImageGenerationRequest, ImageGenerationResponse},
};
use async_trait::async_trait;

pub use image_client::GeminiImageClient;

/// The remote image-generation collaborator the orchestrator drives.
///
/// Failures are reported as [`crate::StickerError`] values whose text carries
/// the status markers (`403`, `429`, `503`, `SAFETY`) used for classification.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        api_key: &ApiKey,
        request: &ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse>;
}
