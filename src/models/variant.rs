use crate::error::{Result, StickerError};
use serde::{Deserialize, Serialize};

/// One emotional variant the orchestrator requests an image for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub display_name: String,
    pub prompt_fragment: String,
    pub default_caption: String,
}

// id, display name, prompt fragment, default caption
const PRESET_TABLE: [(&str, &str, &str, &str); 4] = [
    ("happy", "Happy", "laughing, joy, happy face, smile", "OK"),
    ("sad", "Sad", "crying, sad face, tears, upset", "No..."),
    ("angry", "Angry", "angry, mad, rage, fury, red face", "Bububu"),
    (
        "love",
        "Love",
        "heart eyes, love, blowing kiss, romantic",
        "Love",
    ),
];

impl Variant {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        prompt_fragment: impl Into<String>,
        default_caption: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            prompt_fragment: prompt_fragment.into(),
            default_caption: default_caption.into(),
        }
    }

    /// The full preset set, in its canonical order.
    pub fn presets() -> Vec<Variant> {
        PRESET_TABLE
            .iter()
            .map(|(id, name, fragment, caption)| Variant::new(*id, *name, *fragment, *caption))
            .collect()
    }

    /// Picks a user-curated subset of presets by id, keeping the caller's order.
    pub fn select(ids: &[String]) -> Result<Vec<Variant>> {
        let presets = Self::presets();
        ids.iter()
            .map(|wanted| {
                let wanted = wanted.trim().to_ascii_lowercase();
                presets
                    .iter()
                    .find(|v| v.id == wanted)
                    .cloned()
                    .ok_or_else(|| {
                        StickerError::ConfigError(format!(
                            "Unknown variant '{}' (available: {})",
                            wanted,
                            PRESET_TABLE
                                .iter()
                                .map(|(id, ..)| *id)
                                .collect::<Vec<_>>()
                                .join(", ")
                        ))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_ordered() {
        let names: Vec<String> = Variant::presets()
            .into_iter()
            .map(|v| v.display_name)
            .collect();
        assert_eq!(names, vec!["Happy", "Sad", "Angry", "Love"]);
    }

    #[test]
    fn select_keeps_requested_order() {
        let picked = Variant::select(&["Love".to_string(), "happy".to_string()]).unwrap();
        assert_eq!(picked[0].id, "love");
        assert_eq!(picked[1].default_caption, "OK");
    }

    #[test]
    fn select_rejects_unknown_ids() {
        let err = Variant::select(&["sleepy".to_string()]).unwrap_err();
        assert!(err.to_string().contains("sleepy"));
    }
}
