//! Business, branding, and section inputs that drive a full site build.

use serde::{Deserialize, Serialize};

/// Input to a generation run, as submitted by the user.
///
/// Treated as immutable once the pipeline starts; [`GenerationConfig::normalize`]
/// produces the canonical form every later stage sees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationConfig {
    pub business_name: String,
    pub description: String,
    pub industry: String,
    pub target_audience: String,
    pub branding: Branding,
    /// Requested pages by title, e.g. `["Home", "About", "Contact"]`.
    pub pages: Vec<String>,
    pub sections: Vec<SectionConfig>,
    pub contact: ContactInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Branding {
    /// Voice of the copy ("friendly", "professional", ...).
    pub tone: String,
    /// Visual style keyword ("modern", "minimal", "bold", ...).
    pub style: String,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub font_preference: Option<String>,
    pub logo_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SectionConfig {
    /// Section name as the user typed it ("Hero", "Pricing", ...).
    pub name: String,
    pub enabled: bool,
    pub order: u32,
    /// Free-form guidance for this section's content.
    pub notes: String,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            order: 0,
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Malformed generation input.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("section {0} has an empty name")]
    EmptySectionName(usize),
    #[error("invalid color `{value}` for {field}: expected #rgb or #rrggbb")]
    InvalidColor { field: &'static str, value: String },
}

impl GenerationConfig {
    /// Trim every string, drop disabled and blank entries, and re-index section
    /// order to a contiguous `0..n-1` sequence.
    ///
    /// Sections are ordered by their requested `order`; ties keep input order.
    pub fn normalize(&self) -> Result<Self, ConfigError> {
        let business_name = self.business_name.trim().to_string();
        if business_name.is_empty() {
            return Err(ConfigError::MissingField("businessName"));
        }
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(ConfigError::MissingField("description"));
        }

        let branding = Branding {
            tone: self.branding.tone.trim().to_string(),
            style: self.branding.style.trim().to_string(),
            primary_color: normalize_color("primaryColor", self.branding.primary_color.as_ref())?,
            secondary_color: normalize_color(
                "secondaryColor",
                self.branding.secondary_color.as_ref(),
            )?,
            font_preference: trimmed_opt(self.branding.font_preference.as_ref()),
            logo_text: trimmed_opt(self.branding.logo_text.as_ref()),
        };

        let mut sections: Vec<(usize, &SectionConfig)> = Vec::new();
        for (idx, section) in self.sections.iter().enumerate() {
            if section.name.trim().is_empty() {
                return Err(ConfigError::EmptySectionName(idx));
            }
            if section.enabled {
                sections.push((idx, section));
            }
        }
        sections.sort_by_key(|(idx, s)| (s.order, *idx));
        let sections = sections
            .into_iter()
            .enumerate()
            .map(|(order, (_, s))| SectionConfig {
                name: s.name.trim().to_string(),
                enabled: true,
                order: order as u32,
                notes: s.notes.trim().to_string(),
            })
            .collect();

        let mut pages: Vec<String> = Vec::new();
        for page in &self.pages {
            let page = page.trim();
            if !page.is_empty() && !pages.iter().any(|p| p.eq_ignore_ascii_case(page)) {
                pages.push(page.to_string());
            }
        }
        if pages.is_empty() {
            pages.push("Home".to_string());
        }

        Ok(Self {
            business_name,
            description,
            industry: self.industry.trim().to_string(),
            target_audience: self.target_audience.trim().to_string(),
            branding,
            pages,
            sections,
            contact: ContactInfo {
                email: trimmed_opt(self.contact.email.as_ref()),
                phone: trimmed_opt(self.contact.phone.as_ref()),
                address: trimmed_opt(self.contact.address.as_ref()),
            },
        })
    }
}

fn trimmed_opt(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_color(field: &'static str, value: Option<&String>) -> Result<Option<String>, ConfigError> {
    let Some(color) = trimmed_opt(value) else {
        return Ok(None);
    };
    let hex = color.strip_prefix('#').unwrap_or(&color);
    if matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(Some(format!("#{}", hex.to_ascii_lowercase())))
    } else {
        Err(ConfigError::InvalidColor {
            field,
            value: color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str, order: u32) -> SectionConfig {
        SectionConfig {
            name: name.to_string(),
            order,
            ..SectionConfig::default()
        }
    }

    fn base() -> GenerationConfig {
        GenerationConfig {
            business_name: "  Bean There  ".to_string(),
            description: " Neighbourhood coffee roaster ".to_string(),
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn test_normalize_trims_and_defaults_pages() {
        let config = base().normalize().unwrap();
        assert_eq!(config.business_name, "Bean There");
        assert_eq!(config.description, "Neighbourhood coffee roaster");
        assert_eq!(config.pages, vec!["Home".to_string()]);
    }

    #[test]
    fn test_normalize_reindexes_sections() {
        let mut input = base();
        input.sections = vec![section("Pricing", 7), section(" Hero ", 2), section("Footer", 9)];
        let config = input.normalize().unwrap();
        let names: Vec<_> = config.sections.iter().map(|s| (s.name.as_str(), s.order)).collect();
        assert_eq!(names, vec![("Hero", 0), ("Pricing", 1), ("Footer", 2)]);
    }

    #[test]
    fn test_normalize_drops_disabled_sections() {
        let mut input = base();
        let mut hidden = section("Team", 1);
        hidden.enabled = false;
        input.sections = vec![section("Hero", 0), hidden, section("Contact", 2)];
        let config = input.normalize().unwrap();
        assert_eq!(config.sections.len(), 2);
        assert_eq!(config.sections[1].name, "Contact");
        assert_eq!(config.sections[1].order, 1);
    }

    #[test]
    fn test_normalize_rejects_missing_name() {
        let mut input = base();
        input.business_name = "   ".to_string();
        assert_eq!(
            input.normalize().unwrap_err(),
            ConfigError::MissingField("businessName")
        );
    }

    #[test]
    fn test_normalize_rejects_blank_section() {
        let mut input = base();
        input.sections = vec![section("Hero", 0), section(" ", 1)];
        assert_eq!(input.normalize().unwrap_err(), ConfigError::EmptySectionName(1));
    }

    #[test]
    fn test_normalize_colors() {
        let mut input = base();
        input.branding.primary_color = Some(" 1E40AF ".to_string());
        let config = input.normalize().unwrap();
        assert_eq!(config.branding.primary_color.as_deref(), Some("#1e40af"));

        let mut input = base();
        input.branding.secondary_color = Some("blue-ish".to_string());
        assert!(matches!(
            input.normalize(),
            Err(ConfigError::InvalidColor { field: "secondaryColor", .. })
        ));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r##"{
            "businessName": "Acme",
            "description": "Widgets",
            "branding": { "primaryColor": "#fff", "tone": "bold" },
            "sections": [{ "name": "Hero" }]
        }"##;
        let config: GenerationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.business_name, "Acme");
        assert_eq!(config.branding.tone, "bold");
        assert!(config.sections[0].enabled);
    }
}
