use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::directory::Category;
use crate::error::ImportError;
use crate::mention::scanner::DEFAULT_PICKER_OFFSET;

pub const DEFAULT_FONT: &str = "Arial";

const FONTS: [&str; 12] = [
    "Arial",
    "Helvetica",
    "Times New Roman",
    "Courier New",
    "Verdana",
    "Georgia",
    "Palatino",
    "Garamond",
    "Bookman",
    "Comic Sans MS",
    "Trebuchet MS",
    "Impact",
];

/// Editor settings, read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Font selected when the editor starts.
    pub default_font: String,

    /// Fonts offered by the font menu, in menu order.
    pub fonts: Vec<String>,

    /// Gap between the caret's bottom edge and the picker.
    pub picker_offset: f32,

    /// Category a freshly opened picker starts on.
    pub default_category: Category,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_font: DEFAULT_FONT.to_string(),
            fonts: FONTS.iter().map(|font| font.to_string()).collect(),
            picker_offset: DEFAULT_PICKER_OFFSET,
            default_category: Category::Person,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        let mut config: EditorConfig = serde_json::from_str(json)?;
        if config.fonts.is_empty() {
            config.fonts = Self::default().fonts;
        }
        if !config.fonts.contains(&config.default_font) {
            config.fonts.insert(0, config.default_font.clone());
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_offer_twelve_fonts() {
        let config = EditorConfig::default();
        assert_eq!(config.default_font, "Arial");
        assert_eq!(config.fonts.len(), 12);
        assert_eq!(config.fonts[11], "Impact");
        assert_eq!(config.picker_offset, 5.0);
        assert_eq!(config.default_category, Category::Person);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{"pickerOffset": 2.5}"#).unwrap();
        assert_eq!(config.picker_offset, 2.5);
        assert_eq!(config.default_font, "Arial");
        assert_eq!(config.fonts, EditorConfig::default().fonts);
    }

    #[test]
    fn default_font_joins_the_menu() {
        let json = r#"{
            "defaultFont": "Futura",
            "fonts": ["Georgia", "Impact"],
            "defaultCategory": "object"
        }"#;
        let config = EditorConfig::from_json(json).unwrap();
        assert_eq!(config.fonts, vec!["Futura", "Georgia", "Impact"]);
        assert_eq!(config.default_category, Category::Object);
    }

    #[test]
    fn rejects_unknown_category() {
        assert!(matches!(
            EditorConfig::from_json(r#"{"defaultCategory": "robot"}"#),
            Err(ImportError::Json(_))
        ));
    }
}
