//! Design-system tokens produced once per project and reused by every edit.

use crate::schema::{SchemaError, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Shade name (`"50"`, `"500"`, `"DEFAULT"`, ...) to CSS color.
pub type ColorScale = BTreeMap<String, String>;

/// Complete token set for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSystem {
    pub colors: ColorPalette,
    pub typography: Typography,
    #[serde(default)]
    pub spacing: BTreeMap<String, String>,
    #[serde(default)]
    pub border_radius: BTreeMap<String, String>,
    #[serde(default)]
    pub shadows: BTreeMap<String, String>,
    /// Optional named animations; the preview merges these over its defaults.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub animations: BTreeMap<String, AnimationSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPalette {
    pub primary: ColorScale,
    pub secondary: ColorScale,
    pub accent: ColorScale,
    pub neutral: ColorScale,
}

impl ColorPalette {
    /// Groups in their canonical order.
    pub fn groups(&self) -> [(&'static str, &ColorScale); 4] {
        [
            ("primary", &self.primary),
            ("secondary", &self.secondary),
            ("accent", &self.accent),
            ("neutral", &self.neutral),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub font_families: FontFamilies,
    /// Named sizes (`h1`, `body`, `caption`, ...).
    pub scale: BTreeMap<String, TypeStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFamilies {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStyle {
    pub size: CssValue,
    pub line_height: CssValue,
    pub weight: CssValue,
}

/// A CSS value the model may emit either as a number or as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CssValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for CssValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSpec {
    /// Keyframe selector (`"0%"`, `"to"`) to CSS declarations.
    pub keyframes: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default = "default_duration")]
    pub duration: String,
    #[serde(default = "default_easing")]
    pub easing: String,
}

fn default_duration() -> String {
    "0.6s".to_string()
}

fn default_easing() -> String {
    "ease-out".to_string()
}

impl Validate for DesignSystem {
    const DOCUMENT: &'static str = "design system";

    fn validate(&self) -> Result<(), SchemaError> {
        for (group, scale) in self.colors.groups() {
            if scale.is_empty() {
                return Err(SchemaError::invalid(
                    Self::DOCUMENT,
                    format!("color group `{}` has no shades", group),
                ));
            }
            if let Some((shade, _)) = scale.iter().find(|(_, v)| v.trim().is_empty()) {
                return Err(SchemaError::invalid(
                    Self::DOCUMENT,
                    format!("color `{}.{}` is empty", group, shade),
                ));
            }
        }
        let fonts = &self.typography.font_families;
        if fonts.heading.trim().is_empty() || fonts.body.trim().is_empty() {
            return Err(SchemaError::invalid(
                Self::DOCUMENT,
                "typography.fontFamilies needs both heading and body",
            ));
        }
        if self.typography.scale.is_empty() {
            return Err(SchemaError::invalid(
                Self::DOCUMENT,
                "typography.scale is empty",
            ));
        }
        for (name, anim) in &self.animations {
            if anim.keyframes.is_empty() {
                return Err(SchemaError::invalid(
                    Self::DOCUMENT,
                    format!("animation `{}` has no keyframes", name),
                ));
            }
        }
        Ok(())
    }
}
