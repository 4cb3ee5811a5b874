//! Page blueprint: which pages exist and which components each one renders.

use crate::files::{SectionKind, component_file_path, page_file_path};
use crate::schema::{SchemaError, Validate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Site structure produced by the blueprint stage.
///
/// Every section's `component_name` and every shared component is expected to
/// arrive as a generated file, but nothing downstream may rely on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBlueprint {
    pub pages: Vec<PageSpec>,
    /// Components rendered on every page (navigation, footer, ...).
    #[serde(default)]
    pub shared_components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub path: String,
    pub title: String,
    pub sections: Vec<SectionSpec>,
    #[serde(default)]
    pub metadata: PageMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSpec {
    pub component_name: String,
    #[serde(default)]
    pub props: serde_json::Value,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMetadata {
    pub description: String,
    pub keywords: Vec<String>,
}

impl PageBlueprint {
    /// Distinct component names across all sections plus shared components.
    pub fn component_names(&self) -> BTreeSet<&str> {
        self.pages
            .iter()
            .flat_map(|p| p.sections.iter().map(|s| s.component_name.as_str()))
            .chain(self.shared_components.iter().map(String::as_str))
            .collect()
    }

    /// Number of files the component stage is expected to produce: one per
    /// distinct component plus one per page.
    pub fn expected_file_count(&self) -> usize {
        self.component_names().len() + self.pages.len()
    }

    /// Paths the component stage is expected to write.
    pub fn expected_paths(&self) -> BTreeSet<String> {
        self.component_names()
            .into_iter()
            .map(component_file_path)
            .chain(self.pages.iter().map(|p| page_file_path(&p.path)))
            .collect()
    }

    /// Section classification for a component, when the blueprint places it
    /// in a page section whose name is recognizable.
    pub fn section_for(&self, component_name: &str) -> Option<SectionKind> {
        let known = self.component_names().contains(component_name);
        known.then(|| SectionKind::from_name(component_name)).flatten()
    }
}

impl PageSpec {
    /// Sections in render order.
    pub fn ordered_sections(&self) -> Vec<&SectionSpec> {
        let mut sections: Vec<&SectionSpec> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.order);
        sections
    }
}

fn is_component_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// PascalCase a component name written as `hero-section`, `hero_section`,
/// `hero section` or `heroSection`. Already valid names pass unchanged.
fn to_component_name(name: &str) -> String {
    let name = name.trim();
    if is_component_identifier(name) {
        return name.to_string();
    }
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default()
        })
        .collect()
}

/// `about/` → `/about`, `` → `/`.
fn normalize_page_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    format!("/{}", trimmed)
}

impl Validate for PageBlueprint {
    const DOCUMENT: &'static str = "blueprint";

    /// Add missing leading slashes, PascalCase component names, and drop
    /// pages whose path repeats an earlier page.
    fn normalize(&mut self) {
        let mut seen_paths = HashSet::new();
        self.pages.retain_mut(|page| {
            page.path = normalize_page_path(&page.path);
            for section in &mut page.sections {
                section.component_name = to_component_name(&section.component_name);
            }
            let first = seen_paths.insert(page.path.clone());
            if !first {
                tracing::warn!(path = %page.path, "dropping duplicate blueprint page");
            }
            first
        });

        let mut seen_shared = HashSet::new();
        let shared = std::mem::take(&mut self.shared_components);
        self.shared_components = shared
            .iter()
            .map(|name| to_component_name(name))
            .filter(|name| seen_shared.insert(name.clone()))
            .collect();
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.pages.is_empty() {
            return Err(SchemaError::invalid(
                Self::DOCUMENT,
                "at least one page is required",
            ));
        }

        for page in &self.pages {
            if page.sections.is_empty() {
                return Err(SchemaError::invalid(
                    Self::DOCUMENT,
                    format!("page `{}` has no sections", page.path),
                ));
            }
            if let Some(bad) = page
                .sections
                .iter()
                .find(|s| !is_component_identifier(&s.component_name))
            {
                return Err(SchemaError::invalid(
                    Self::DOCUMENT,
                    format!(
                        "page `{}` section `{}` is not a component name",
                        page.path, bad.component_name
                    ),
                ));
            }
        }

        if let Some(bad) = self
            .shared_components
            .iter()
            .find(|name| !is_component_identifier(name))
        {
            return Err(SchemaError::invalid(
                Self::DOCUMENT,
                format!("shared component `{}` is not a component name", bad),
            ));
        }
        Ok(())
    }
}
