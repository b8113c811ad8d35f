use crate::error::{Result, StickerError};
use crate::models::ImagePayload;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtStyle {
    #[default]
    Anime,
    Pixel,
    #[serde(rename = "3d")]
    ThreeD,
    Flat,
    Sketch,
}

impl ArtStyle {
    pub const ALL: [ArtStyle; 5] = [
        ArtStyle::Anime,
        ArtStyle::Pixel,
        ArtStyle::ThreeD,
        ArtStyle::Flat,
        ArtStyle::Sketch,
    ];

    /// Style clause sent to the image model.
    pub fn descriptor(&self) -> &'static str {
        match self {
            ArtStyle::Anime => "Anime Style, vibrant colors, thick outlines",
            ArtStyle::Pixel => "Pixel Art, 8-bit, retro game style",
            ArtStyle::ThreeD => "3D Render, claymation style, cute, soft lighting",
            ArtStyle::Flat => "Flat Vector, minimalism, simple shapes, corporate memphis",
            ArtStyle::Sketch => "Hand drawn sketch, pencil texture, doodle",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtStyle::Anime => "anime",
            ArtStyle::Pixel => "pixel",
            ArtStyle::ThreeD => "3d",
            ArtStyle::Flat => "flat",
            ArtStyle::Sketch => "sketch",
        }
    }
}

impl FromStr for ArtStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anime" => Ok(ArtStyle::Anime),
            "pixel" => Ok(ArtStyle::Pixel),
            "3d" | "threed" | "clay" => Ok(ArtStyle::ThreeD),
            "flat" => Ok(ArtStyle::Flat),
            "sketch" => Ok(ArtStyle::Sketch),
            other => Err(format!(
                "unknown style '{}' (expected anime, pixel, 3d, flat or sketch)",
                other
            )),
        }
    }
}

impl fmt::Display for ArtStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LINE product the images are meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Sticker,
    Emoji,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Sticker => "sticker",
            OutputMode::Emoji => "emoji",
        }
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sticker" | "stickers" => Ok(OutputMode::Sticker),
            "emoji" | "emojis" => Ok(OutputMode::Emoji),
            other => Err(format!("unknown mode '{}' (expected sticker or emoji)", other)),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A photo the generated character should resemble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage(pub ImagePayload);

impl ReferenceImage {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self(ImagePayload::new(data, mime_type))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mime_type = mime_from_extension(path).ok_or_else(|| {
            StickerError::ConfigError(format!(
                "Unsupported reference image type: {}",
                path.display()
            ))
        })?;
        let data = std::fs::read(path)?;
        Ok(Self::new(data, mime_type))
    }

    /// Parses a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| StickerError::ConfigError("Reference image is not a data URL".into()))?;
        let (mime_type, encoded) = rest.split_once(";base64,").ok_or_else(|| {
            StickerError::ConfigError("Reference data URL must be base64 encoded".into())
        })?;
        if mime_type.is_empty() {
            return Err(StickerError::ConfigError(
                "Reference data URL has no media type".into(),
            ));
        }
        let data = STANDARD
            .decode(encoded.trim())
            .map_err(|e| StickerError::SerializationError(e.to_string()))?;
        Ok(Self::new(data, mime_type))
    }

    pub fn payload(&self) -> &ImagePayload {
        &self.0
    }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

/// Everything the user chose for one generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerationParameters {
    pub description: String,
    pub style: ArtStyle,
    pub reference_image: Option<ReferenceImage>,
    pub mode: OutputMode,
    pub include_caption: bool,
    pub caption_override: Option<String>,
}

impl GenerationParameters {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: ArtStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_reference_image(mut self, image: ReferenceImage) -> Self {
        self.reference_image = Some(image);
        self
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_caption(mut self, enabled: bool) -> Self {
        self.include_caption = enabled;
        self
    }

    pub fn with_caption_override(mut self, text: impl Into<String>) -> Self {
        self.caption_override = Some(text.into());
        self
    }

    /// Input check for callers; the orchestrator itself does not enforce it.
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() && self.reference_image.is_none() {
            return Err(StickerError::ConfigError(
                "Provide a description or a reference image".into(),
            ));
        }
        Ok(())
    }
}
