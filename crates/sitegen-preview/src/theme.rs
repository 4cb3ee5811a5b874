//! Design tokens to Tailwind Play CDN configuration.
//!
//! The stored design system is read leniently: any key that is missing or
//! has the wrong shape is skipped, and a document that does not parse at all
//! yields the default theme.

use serde_json::{Map, Value, json};
use sitegen_core::files::{DESIGN_SYSTEM_PATH, VirtualFile};

const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
    "ui-sans-serif",
    "ui-serif",
    "ui-monospace",
    "inherit",
];

/// Animations every preview gets; design-system entries with the same name
/// replace them.
fn default_animations() -> (Map<String, Value>, Map<String, Value>) {
    let keyframes = json!({
        "fadeIn": {"0%": {"opacity": "0"}, "100%": {"opacity": "1"}},
        "fadeInUp": {
            "0%": {"opacity": "0", "transform": "translateY(20px)"},
            "100%": {"opacity": "1", "transform": "translateY(0)"}
        },
        "slideInLeft": {
            "0%": {"opacity": "0", "transform": "translateX(-30px)"},
            "100%": {"opacity": "1", "transform": "translateX(0)"}
        },
        "slideInRight": {
            "0%": {"opacity": "0", "transform": "translateX(30px)"},
            "100%": {"opacity": "1", "transform": "translateX(0)"}
        },
        "scaleIn": {
            "0%": {"opacity": "0", "transform": "scale(0.95)"},
            "100%": {"opacity": "1", "transform": "scale(1)"}
        },
        "float": {
            "0%, 100%": {"transform": "translateY(0)"},
            "50%": {"transform": "translateY(-10px)"}
        }
    });
    let animation = json!({
        "fadeIn": "fadeIn 0.6s ease-out both",
        "fadeInUp": "fadeInUp 0.6s ease-out both",
        "slideInLeft": "slideInLeft 0.6s ease-out both",
        "slideInRight": "slideInRight 0.6s ease-out both",
        "scaleIn": "scaleIn 0.5s ease-out both",
        "float": "float 3s ease-in-out infinite"
    });
    match (keyframes, animation) {
        (Value::Object(k), Value::Object(a)) => (k, a),
        _ => (Map::new(), Map::new()),
    }
}

/// Theme pieces injected into the preview document.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Value assigned to `tailwind.config`.
    pub tailwind_config: Value,
    /// Google Fonts stylesheet for the declared families.
    pub fonts_href: Option<String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_tokens(&Value::Null)
    }
}

impl Theme {
    /// Theme from the design-system file in `files`, or the default.
    pub fn from_files(files: &[VirtualFile]) -> Self {
        files
            .iter()
            .find(|f| f.path == DESIGN_SYSTEM_PATH)
            .map_or_else(Self::default, |f| Self::from_json(&f.content))
    }

    pub fn from_json(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(tokens) => Self::from_tokens(&tokens),
            Err(e) => {
                tracing::debug!(error = %e, "design system unreadable, using default theme");
                Self::default()
            }
        }
    }

    pub fn from_tokens(tokens: &Value) -> Self {
        let mut extend = Map::new();

        if let Some(colors) = tokens.get("colors").and_then(Value::as_object) {
            extend.insert("colors".into(), Value::Object(colors.clone()));
        }

        let families = font_families(tokens);
        if !families.is_empty() {
            let mut font_family = Map::new();
            for (role, family) in &families {
                let fallback = if *role == "heading" { "serif" } else { "sans-serif" };
                font_family.insert((*role).to_string(), json!([family, fallback]));
            }
            if let Some((_, body)) = families.iter().find(|(role, _)| *role == "body") {
                font_family.insert("sans".into(), json!([body, "sans-serif"]));
            }
            extend.insert("fontFamily".into(), Value::Object(font_family));
        }

        for (source, target) in [("borderRadius", "borderRadius"), ("shadows", "boxShadow"), ("spacing", "spacing")] {
            if let Some(map) = tokens.get(source).and_then(Value::as_object)
                && map.values().all(Value::is_string)
            {
                extend.insert(target.into(), Value::Object(map.clone()));
            }
        }

        let (mut keyframes, mut animation) = default_animations();
        if let Some(custom) = tokens.get("animations").and_then(Value::as_object) {
            for (name, spec) in custom {
                let Some(frames) = spec.get("keyframes").filter(|k| k.is_object()) else {
                    continue;
                };
                let duration = spec.get("duration").and_then(Value::as_str).unwrap_or("0.6s");
                let easing = spec.get("easing").and_then(Value::as_str).unwrap_or("ease-out");
                keyframes.insert(name.clone(), frames.clone());
                animation.insert(name.clone(), Value::String(format!("{} {} {} both", name, duration, easing)));
            }
        }
        extend.insert("keyframes".into(), Value::Object(keyframes));
        extend.insert("animation".into(), Value::Object(animation));

        Self {
            tailwind_config: json!({ "theme": { "extend": extend } }),
            fonts_href: fonts_href(families.iter().map(|(_, f)| f.as_str())),
        }
    }
}

/// `(role, family)` pairs with fallbacks and quotes stripped.
fn font_families(tokens: &Value) -> Vec<(&'static str, String)> {
    let Some(families) = tokens.pointer("/typography/fontFamilies") else {
        return Vec::new();
    };
    ["heading", "body"]
        .into_iter()
        .filter_map(|role| {
            let raw = families.get(role)?.as_str()?;
            let primary = raw.split(',').next()?.trim().trim_matches(['"', '\'']).trim();
            (!primary.is_empty()).then(|| (role, primary.to_string()))
        })
        .collect()
}

fn fonts_href<'a>(families: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut params: Vec<String> = Vec::new();
    for family in families {
        if GENERIC_FAMILIES.contains(&family.to_ascii_lowercase().as_str()) {
            continue;
        }
        let param = format!("family={}:wght@400;500;600;700", family.replace(' ', "+"));
        if !params.contains(&param) {
            params.push(param);
        }
    }
    (!params.is_empty()).then(|| {
        format!("https://fonts.googleapis.com/css2?{}&display=swap", params.join("&"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKENS: &str = r##"{
        "colors": {"primary": {"500": "#3b82f6"}},
        "typography": {"fontFamilies": {"heading": "'Playfair Display', serif", "body": "Inter"}},
        "borderRadius": {"card": "1rem"},
        "shadows": {"card": "0 10px 30px rgba(0,0,0,0.08)"},
        "animations": {
            "fadeIn": {"keyframes": {"from": {"opacity": "0.2"}, "to": {"opacity": "1"}}, "duration": "1s"},
            "pulseSoft": {"keyframes": {"50%": {"opacity": "0.7"}}}
        }
    }"##;

    #[test]
    fn test_tokens_to_tailwind_config() {
        let theme = Theme::from_json(TOKENS);
        let extend = &theme.tailwind_config["theme"]["extend"];
        assert_eq!(extend["colors"]["primary"]["500"], "#3b82f6");
        assert_eq!(extend["fontFamily"]["heading"], json!(["Playfair Display", "serif"]));
        assert_eq!(extend["fontFamily"]["sans"], json!(["Inter", "sans-serif"]));
        assert_eq!(extend["borderRadius"]["card"], "1rem");
        assert!(extend["boxShadow"]["card"].is_string());
    }

    #[test]
    fn test_animations_merge_over_defaults() {
        let theme = Theme::from_json(TOKENS);
        let extend = &theme.tailwind_config["theme"]["extend"];
        assert_eq!(extend["animation"]["fadeIn"], "fadeIn 1s ease-out both");
        assert_eq!(extend["keyframes"]["fadeIn"]["from"]["opacity"], "0.2");
        assert_eq!(extend["animation"]["pulseSoft"], "pulseSoft 0.6s ease-out both");
        assert!(extend["keyframes"]["float"].is_object());
    }

    #[test]
    fn test_fonts_href() {
        let theme = Theme::from_json(TOKENS);
        assert_eq!(
            theme.fonts_href.as_deref(),
            Some(
                "https://fonts.googleapis.com/css2?family=Playfair+Display:wght@400;500;600;700&family=Inter:wght@400;500;600;700&display=swap"
            )
        );
        let generic = Theme::from_json(r#"{"typography": {"fontFamilies": {"heading": "serif", "body": "system-ui"}}}"#);
        assert!(generic.fonts_href.is_none());
    }

    #[test]
    fn test_malformed_json_falls_back() {
        let theme = Theme::from_json("{\"colors\": {");
        assert_eq!(theme, Theme::default());
        assert!(theme.tailwind_config["theme"]["extend"]["keyframes"]["fadeInUp"].is_object());
        assert!(theme.tailwind_config["theme"]["extend"].get("colors").is_none());
    }
}
