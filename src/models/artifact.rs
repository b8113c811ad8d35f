use crate::models::{ArtStyle, ImagePayload};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const SQUARE_ASPECT_RATIO: &str = "1:1";

/// One ordered piece of a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    InlineData(ImagePayload),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub parts: Vec<ContentPart>,
    pub aspect_ratio: String,
}

impl ImageGenerationRequest {
    pub fn square(model: impl Into<String>, parts: Vec<ContentPart>) -> Self {
        Self {
            model: model.into(),
            parts,
            aspect_ratio: SQUARE_ASPECT_RATIO.to_string(),
        }
    }

    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text(text) => Some(text.as_str()),
                ContentPart::InlineData(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Decoded response parts; text parts are kept for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ImageGenerationResponse {
    pub parts: Vec<ContentPart>,
    pub model: String,
}

impl ImageGenerationResponse {
    pub fn first_image(self) -> Option<ImagePayload> {
        self.parts.into_iter().find_map(|p| match p {
            ContentPart::InlineData(image) => Some(image),
            ContentPart::Text(_) => None,
        })
    }
}

/// A successfully generated sticker image plus the metadata needed to export it.
#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    pub id: String,
    pub image: ImagePayload,
    pub variant: String,
    pub caption: Option<String>,
    pub style: ArtStyle,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

impl GeneratedArtifact {
    pub fn new(
        image: ImagePayload,
        variant: impl Into<String>,
        caption: Option<String>,
        style: ArtStyle,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            image,
            variant: variant.into(),
            caption,
            style,
            prompt: prompt.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_image_skips_text_parts() {
        let response = ImageGenerationResponse {
            parts: vec![
                ContentPart::Text("here you go".into()),
                ContentPart::InlineData(ImagePayload::new(vec![9], "image/png")),
                ContentPart::InlineData(ImagePayload::new(vec![7], "image/png")),
            ],
            model: "m".into(),
        };
        assert_eq!(response.first_image().unwrap().data, vec![9]);
    }

    #[test]
    fn artifact_ids_are_unique() {
        let image = ImagePayload::new(vec![1], "image/png");
        let a = GeneratedArtifact::new(image.clone(), "Happy", None, ArtStyle::Anime, "p");
        let b = GeneratedArtifact::new(image, "Happy", None, ArtStyle::Anime, "p");
        assert_ne!(a.id, b.id);
    }
}
