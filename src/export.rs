//! LINE export: pixel specs, background removal and caption placement.

use crate::error::{Result, StickerError};
use crate::models::{ArtStyle, GeneratedArtifact, OutputMode};
use image::{imageops, imageops::FilterType, GenericImageView, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Channel value above which a pixel counts as background white.
pub const WHITE_THRESHOLD: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportSpec {
    pub width: u32,
    pub height: u32,
    pub name: &'static str,
    pub suffix: &'static str,
}

pub const STICKER_MAIN: ExportSpec = ExportSpec {
    width: 240,
    height: 240,
    name: "Main image",
    suffix: "main",
};
pub const STICKER_IMAGE: ExportSpec = ExportSpec {
    width: 370,
    height: 320,
    name: "Sticker image",
    suffix: "sticker",
};
pub const EMOJI_IMAGE: ExportSpec = ExportSpec {
    width: 180,
    height: 180,
    name: "Emoji image",
    suffix: "emoji",
};
pub const CHAT_TAB: ExportSpec = ExportSpec {
    width: 96,
    height: 74,
    name: "Chat room tab",
    suffix: "tab",
};

pub fn specs_for(mode: OutputMode) -> &'static [ExportSpec] {
    const STICKER_SPECS: [ExportSpec; 3] = [STICKER_MAIN, STICKER_IMAGE, CHAT_TAB];
    const EMOJI_SPECS: [ExportSpec; 2] = [EMOJI_IMAGE, CHAT_TAB];
    match mode {
        OutputMode::Sticker => &STICKER_SPECS,
        OutputMode::Emoji => &EMOJI_SPECS,
    }
}

/// Scales the image to fit the spec, centers it on a transparent canvas and
/// clears near-white pixels.
pub fn process_image(bytes: &[u8], spec: &ExportSpec) -> Result<RgbaImage> {
    let source = image::load_from_memory(bytes)?;
    let fitted = source.resize(spec.width, spec.height, FilterType::Lanczos3);

    let mut canvas = RgbaImage::new(spec.width, spec.height);
    let x = (spec.width - fitted.width().min(spec.width)) / 2;
    let y = (spec.height - fitted.height().min(spec.height)) / 2;
    imageops::overlay(&mut canvas, &fitted.to_rgba8(), x as i64, y as i64);

    strip_white_background(&mut canvas);
    Ok(canvas)
}

pub fn strip_white_background(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        if r > WHITE_THRESHOLD && g > WHITE_THRESHOLD && b > WHITE_THRESHOLD {
            pixel.0[3] = 0;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptionPosition {
    TopLeft,
    TopCenter,
    #[default]
    TopRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl FromStr for CaptionPosition {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        use CaptionPosition::*;
        match s.trim().to_ascii_lowercase().as_str() {
            "top-left" => Ok(TopLeft),
            "top-center" => Ok(TopCenter),
            "top-right" => Ok(TopRight),
            "middle-left" => Ok(MiddleLeft),
            "middle-center" | "center" => Ok(MiddleCenter),
            "middle-right" => Ok(MiddleRight),
            "bottom-left" => Ok(BottomLeft),
            "bottom-center" => Ok(BottomCenter),
            "bottom-right" => Ok(BottomRight),
            other => Err(format!("unknown caption position '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionSize {
    Sm,
    #[default]
    Md,
    Lg,
    Xl,
}

impl CaptionSize {
    /// Font size as a fraction of the canvas height.
    pub fn ratio(&self) -> f32 {
        match self {
            CaptionSize::Sm => 0.15,
            CaptionSize::Md => 0.22,
            CaptionSize::Lg => 0.30,
            CaptionSize::Xl => 0.40,
        }
    }
}

impl FromStr for CaptionSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sm" => Ok(CaptionSize::Sm),
            "md" => Ok(CaptionSize::Md),
            "lg" => Ok(CaptionSize::Lg),
            "xl" => Ok(CaptionSize::Xl),
            other => Err(format!("unknown caption size '{}' (sm, md, lg, xl)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Baseline {
    Top,
    Middle,
    Bottom,
}

/// Where and how the caption is stroked and filled: black fill over a white
/// outline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionLayout {
    pub text: String,
    pub font_family: &'static str,
    pub font_weight: u16,
    pub font_size: u32,
    pub stroke_width: f32,
    pub x: f32,
    pub y: f32,
    pub align: HorizontalAlign,
    pub baseline: Baseline,
}

impl CaptionLayout {
    pub fn compute(
        text: &str,
        spec: &ExportSpec,
        position: CaptionPosition,
        size: CaptionSize,
        style: ArtStyle,
    ) -> Self {
        let (font_family, font_weight) = match style {
            ArtStyle::Pixel => ("DotGothic16", 400),
            ArtStyle::Sketch => ("Zen Maru Gothic", 700),
            _ => ("Noto Sans TC", 900),
        };

        let font_size = (spec.height as f32 * size.ratio()).floor() as u32;
        let padding = spec.width as f32 * 0.05;
        let (width, height) = (spec.width as f32, spec.height as f32);

        use CaptionPosition::*;
        let (y, baseline) = match position {
            TopLeft | TopCenter | TopRight => (padding, Baseline::Top),
            MiddleLeft | MiddleCenter | MiddleRight => (height / 2.0, Baseline::Middle),
            BottomLeft | BottomCenter | BottomRight => (height - padding, Baseline::Bottom),
        };
        let (x, align) = match position {
            TopLeft | MiddleLeft | BottomLeft => (padding, HorizontalAlign::Left),
            TopCenter | MiddleCenter | BottomCenter => (width / 2.0, HorizontalAlign::Center),
            TopRight | MiddleRight | BottomRight => (width - padding, HorizontalAlign::Right),
        };

        Self {
            text: text.to_string(),
            font_family,
            font_weight,
            font_size,
            stroke_width: (font_size as f32 * 0.25).max(4.0),
            x,
            y,
            align,
            baseline,
        }
    }
}

const CAPTION_FILL: Rgba<u8> = Rgba([0, 0, 0, 255]);
const CAPTION_STROKE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A parsed font for drawing captions.
#[derive(Clone)]
pub struct CaptionFont {
    font: Font<'static>,
}

impl CaptionFont {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Font::try_from_vec(bytes)
            .map(|font| Self { font })
            .ok_or_else(|| StickerError::ConfigError("caption font is not a valid TrueType/OpenType font".into()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            StickerError::ConfigError(format!("cannot read caption font {}: {}", path.display(), e))
        })?;
        Self::from_bytes(bytes)
    }
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont").finish_non_exhaustive()
    }
}

/// Top-left corner of a `width` x `height` text box anchored at the layout point.
pub fn caption_origin(layout: &CaptionLayout, width: i32, height: i32) -> (i32, i32) {
    let x = match layout.align {
        HorizontalAlign::Left => layout.x,
        HorizontalAlign::Center => layout.x - width as f32 / 2.0,
        HorizontalAlign::Right => layout.x - width as f32,
    };
    let y = match layout.baseline {
        Baseline::Top => layout.y,
        Baseline::Middle => layout.y - height as f32 / 2.0,
        Baseline::Bottom => layout.y - height as f32,
    };
    (x.round() as i32, y.round() as i32)
}

/// Draws the caption: the stroke is the text stamped in white across a disc
/// of half the stroke width, then the black fill goes on top.
pub fn draw_caption(image: &mut RgbaImage, layout: &CaptionLayout, font: &CaptionFont) {
    let scale = Scale::uniform(layout.font_size as f32);
    let text = layout.text.as_str();
    let (width, height) = text_size(scale, &font.font, text);
    let (x, y) = caption_origin(layout, width, height);

    let radius = (layout.stroke_width / 2.0).round() as i32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                draw_text_mut(image, CAPTION_STROKE, x + dx, y + dy, scale, &font.font, text);
            }
        }
    }
    draw_text_mut(image, CAPTION_FILL, x, y, scale, &font.font, text);
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub spec: ExportSpec,
    pub path: PathBuf,
    pub caption: Option<CaptionLayout>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportEntry {
    pub artifact_id: String,
    pub variant: String,
    pub style: ArtStyle,
    pub caption: Option<String>,
    pub prompt: String,
    pub files: Vec<ExportedFile>,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    mode: OutputMode,
    generated_at: chrono::DateTime<chrono::Utc>,
    entries: &'a [ExportEntry],
}

/// Writes every LINE size of each artifact into one directory and keeps a
/// manifest of what was written.
pub struct StickerExporter {
    out_dir: PathBuf,
    mode: OutputMode,
    position: CaptionPosition,
    size: CaptionSize,
    font: Option<CaptionFont>,
    entries: Vec<ExportEntry>,
}

impl StickerExporter {
    pub fn new(out_dir: impl Into<PathBuf>, mode: OutputMode) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)?;
        Ok(Self {
            out_dir,
            mode,
            position: CaptionPosition::default(),
            size: CaptionSize::default(),
            font: None,
            entries: Vec::new(),
        })
    }

    pub fn with_caption_style(mut self, position: CaptionPosition, size: CaptionSize) -> Self {
        self.position = position;
        self.size = size;
        self
    }

    pub fn with_font(mut self, font: CaptionFont) -> Self {
        self.font = Some(font);
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn entries(&self) -> &[ExportEntry] {
        &self.entries
    }

    fn file_base(&self, artifact: &GeneratedArtifact) -> String {
        let prefix = match self.mode {
            OutputMode::Sticker => "LINE_Sticker",
            OutputMode::Emoji => "LINE_Emoji",
        };
        let variant: String = artifact
            .variant
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        let short_id: String = artifact.id.chars().take(8).collect();
        format!("{}_{}_{}", prefix, variant, short_id)
    }

    pub fn export(&mut self, artifact: &GeneratedArtifact) -> Result<&ExportEntry> {
        let base = self.file_base(artifact);
        let caption = artifact
            .caption
            .as_deref()
            .filter(|text| !text.trim().is_empty());

        if caption.is_some() && self.font.is_none() {
            log::warn!(
                "No caption font configured, {} is exported without its caption text",
                artifact.variant
            );
        }

        let mut files = Vec::new();
        for spec in specs_for(self.mode) {
            let mut image = process_image(&artifact.image.data, spec)?;
            let layout = caption.map(|text| {
                CaptionLayout::compute(text, spec, self.position, self.size, artifact.style)
            });
            if let (Some(layout), Some(font)) = (&layout, &self.font) {
                draw_caption(&mut image, layout, font);
            }

            let path = self.out_dir.join(format!("{}_{}.png", base, spec.suffix));
            image.save_with_format(&path, ImageFormat::Png)?;
            log::debug!("Wrote {} ({}x{})", path.display(), spec.width, spec.height);

            files.push(ExportedFile {
                spec: *spec,
                path,
                caption: layout,
            });
        }

        self.entries.push(ExportEntry {
            artifact_id: artifact.id.clone(),
            variant: artifact.variant.clone(),
            style: artifact.style,
            caption: caption.map(str::to_string),
            prompt: artifact.prompt.clone(),
            files,
        });
        self.entries
            .last()
            .ok_or_else(|| StickerError::ImageError("export entry missing".into()))
    }

    pub fn write_manifest(&self) -> Result<PathBuf> {
        let manifest = Manifest {
            mode: self.mode,
            generated_at: chrono::Utc::now(),
            entries: &self.entries,
        };
        let path = self.out_dir.join("manifest.json");
        fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emoji_mode_has_content_and_tab() {
        let sizes: Vec<(u32, u32)> = specs_for(OutputMode::Emoji)
            .iter()
            .map(|s| (s.width, s.height))
            .collect();
        assert_eq!(sizes, vec![(180, 180), (96, 74)]);
        assert_eq!(specs_for(OutputMode::Sticker).len(), 3);
    }

    #[test]
    fn near_white_becomes_transparent() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([250, 245, 241, 255]));
        img.put_pixel(1, 0, Rgba([250, 240, 250, 255]));
        strip_white_background(&mut img);
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
        assert_eq!(img.get_pixel(1, 0).0[3], 255);
    }

    #[test]
    fn caption_layout_top_right_md() {
        let layout = CaptionLayout::compute(
            "OK",
            &STICKER_IMAGE,
            CaptionPosition::TopRight,
            CaptionSize::Md,
            ArtStyle::Anime,
        );
        assert_eq!(layout.font_size, 70);
        assert_eq!(layout.x, 370.0 - 18.5);
        assert_eq!(layout.y, 18.5);
        assert_eq!(layout.align, HorizontalAlign::Right);
        assert_eq!(layout.baseline, Baseline::Top);
        assert_eq!(layout.stroke_width, 17.5);
        assert_eq!(layout.font_family, "Noto Sans TC");
    }

    #[test]
    fn caption_font_follows_style_and_min_stroke() {
        let layout = CaptionLayout::compute(
            "Hi",
            &CHAT_TAB,
            CaptionPosition::BottomLeft,
            CaptionSize::Sm,
            ArtStyle::Pixel,
        );
        assert_eq!(layout.font_family, "DotGothic16");
        assert_eq!(layout.font_weight, 400);
        assert_eq!(layout.font_size, 11);
        assert_eq!(layout.stroke_width, 4.0);
        assert_eq!(layout.baseline, Baseline::Bottom);
    }

    #[test]
    fn caption_origin_follows_alignment() {
        let top_right =
            CaptionLayout::compute("OK", &STICKER_IMAGE, CaptionPosition::TopRight, CaptionSize::Md, ArtStyle::Anime);
        assert_eq!(caption_origin(&top_right, 100, 60), (252, 19));

        let center = CaptionLayout::compute(
            "OK",
            &EMOJI_IMAGE,
            CaptionPosition::MiddleCenter,
            CaptionSize::Md,
            ArtStyle::Anime,
        );
        assert_eq!(caption_origin(&center, 40, 20), (70, 80));

        let bottom_left =
            CaptionLayout::compute("OK", &EMOJI_IMAGE, CaptionPosition::BottomLeft, CaptionSize::Md, ArtStyle::Anime);
        assert_eq!(caption_origin(&bottom_left, 40, 20), (9, 151));
    }

    #[test]
    fn garbage_font_bytes_are_rejected() {
        let err = CaptionFont::from_bytes(vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, StickerError::ConfigError(_)));
    }

    #[test]
    fn positions_parse_from_kebab_case() {
        assert_eq!(
            "bottom-center".parse::<CaptionPosition>().unwrap(),
            CaptionPosition::BottomCenter
        );
        assert!("somewhere".parse::<CaptionPosition>().is_err());
    }
}
