//! Caption resolution and instruction payload composition.
//!
//! Captions are never requested from the image model: every payload forbids
//! rendered text, and the caption is composited later during export.

use crate::models::{ContentPart, GenerationParameters, OutputMode, Variant};

/// Composed request content plus the exact instruction text, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct ComposedPrompt {
    pub parts: Vec<ContentPart>,
    pub text: String,
}

pub fn resolve_caption(params: &GenerationParameters, variant: &Variant) -> Option<String> {
    if !params.include_caption {
        return None;
    }

    match params.caption_override.as_deref() {
        Some(text) if !text.trim().is_empty() => Some(text.to_string()),
        _ if !variant.default_caption.trim().is_empty() => Some(variant.default_caption.clone()),
        _ => None,
    }
}

fn mode_instruction(mode: OutputMode) -> &'static str {
    match mode {
        OutputMode::Emoji => {
            "- TASK: Create a LINE Emoji (表情貼).\n\
             - CRITICAL: Emoji are shown very small, inline with chat text.\n\
             - The design must be SIMPLE, BOLD and ICON-LIKE.\n\
             - Focus on the facial expression.\n\
             - Aspect Ratio: Strictly Square (1:1)."
        }
        OutputMode::Sticker => {
            "- TASK: Create a LINE Sticker (貼圖).\n\
             - Stickers are shown large in the chat.\n\
             - The design can be detailed and expressive.\n\
             - Aspect Ratio: Strictly Square (1:1)."
        }
    }
}

const BACKGROUND_RULES: &str = "- IMPORTANT: THE BACKGROUND MUST BE SOLID PURE WHITE (#FFFFFF).\n\
     - High contrast.\n\
     - White border around the character (sticker style).\n\
     - NEGATIVE PROMPT: DO NOT INCLUDE ANY TEXT, LETTERS OR CHARACTERS IN THE IMAGE. PURE ILLUSTRATION ONLY.";

pub fn compose(params: &GenerationParameters, variant: &Variant) -> ComposedPrompt {
    let mut parts = Vec::with_capacity(2);
    let style = params.style.descriptor();
    let emotion = format!("{} ({})", variant.display_name, variant.prompt_fragment);
    let description = params.description.trim();

    let text = match &params.reference_image {
        Some(reference) => {
            parts.push(ContentPart::InlineData(reference.payload().clone()));

            let context = if description.is_empty() {
                String::new()
            } else {
                format!("Additional Context: {}\n", description)
            };
            format!(
                "{}\n\
                 Based on the provided reference image, create a character in the style of: {}.\n\
                 Target Emotion: {}.\n\
                 {}\n\
                 Design Requirements:\n\
                 - Keep the key recognizable features of the subject.\n\
                 {}",
                mode_instruction(params.mode),
                style,
                emotion,
                context,
                BACKGROUND_RULES
            )
        }
        None => format!(
            "{}\n\
             Create a character or object based on this description: {}.\n\
             Emotion: {}.\n\
             Style: {}.\n\n\
             Design Requirements:\n\
             {}",
            mode_instruction(params.mode),
            description,
            emotion,
            style,
            BACKGROUND_RULES
        ),
    };

    parts.push(ContentPart::Text(text.clone()));
    ComposedPrompt { parts, text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArtStyle, ReferenceImage};

    fn happy() -> Variant {
        Variant::new("happy", "Happy", "laughing, smile", "OK")
    }

    #[test]
    fn override_caption_beats_default() {
        let params = GenerationParameters::new("cat")
            .with_caption(true)
            .with_caption_override("Thanks!");
        assert_eq!(resolve_caption(&params, &happy()).as_deref(), Some("Thanks!"));
    }

    #[test]
    fn blank_override_falls_back_to_default() {
        let params = GenerationParameters::new("cat")
            .with_caption(true)
            .with_caption_override("   ");
        assert_eq!(resolve_caption(&params, &happy()).as_deref(), Some("OK"));

        let no_override = GenerationParameters::new("cat").with_caption(true);
        assert_eq!(resolve_caption(&no_override, &happy()).as_deref(), Some("OK"));
    }

    #[test]
    fn captions_off_resolves_to_none() {
        let params = GenerationParameters::new("cat").with_caption_override("Hi");
        assert_eq!(resolve_caption(&params, &happy()), None);
    }

    #[test]
    fn mode_instruction_names_the_line_product() {
        let sticker = compose(&GenerationParameters::new("cat"), &happy());
        assert!(sticker.text.contains("LINE Sticker (貼圖)"));

        let emoji = compose(
            &GenerationParameters::new("cat").with_mode(OutputMode::Emoji),
            &happy(),
        );
        assert!(emoji.text.contains("LINE Emoji (表情貼)"));
    }

    #[test]
    fn text_only_prompt_has_single_part() {
        let params = GenerationParameters::new("a shiba inu").with_style(ArtStyle::Pixel);
        let composed = compose(&params, &happy());
        assert_eq!(composed.parts.len(), 1);
        assert!(composed.text.contains("a shiba inu"));
        assert!(composed.text.contains("Pixel Art"));
        assert!(composed.text.contains("Happy (laughing, smile)"));
        assert!(composed.text.contains("#FFFFFF"));
        assert!(composed.text.contains("DO NOT INCLUDE ANY TEXT"));
    }

    #[test]
    fn reference_image_goes_first() {
        let params = GenerationParameters::new("")
            .with_mode(OutputMode::Emoji)
            .with_reference_image(ReferenceImage::new(vec![1, 2], "image/jpeg"));
        let composed = compose(&params, &happy());
        assert!(matches!(composed.parts[0], ContentPart::InlineData(_)));
        assert!(matches!(composed.parts[1], ContentPart::Text(_)));
        assert!(composed.text.contains("recognizable features"));
        assert!(composed.text.contains("ICON-LIKE"));
        assert!(!composed.text.contains("Additional Context"));
    }
}
