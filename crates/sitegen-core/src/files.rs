//! Generated files, their classification, and the path conventions the
//! prompts instruct the model to follow.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const LAYOUT_PATH: &str = "src/app/layout.tsx";
pub const GLOBALS_CSS_PATH: &str = "src/app/globals.css";
pub const DESIGN_SYSTEM_PATH: &str = "src/lib/design-system.json";

/// Broad role of a file within the generated site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Page,
    Style,
    Config,
    Data,
    Component,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Page => "page",
            Self::Style => "style",
            Self::Config => "config",
            Self::Data => "data",
            Self::Component => "component",
        };
        f.write_str(s)
    }
}

/// Which kind of page section a component implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    Navbar,
    Hero,
    Features,
    Services,
    About,
    Pricing,
    Testimonials,
    Team,
    Gallery,
    Faq,
    Stats,
    Cta,
    Contact,
    Blog,
    Footer,
}

/// Substring table used to recover a section from a component name.
/// Earlier entries win.
const SECTION_TABLE: &[(&str, SectionKind)] = &[
    ("Navbar", SectionKind::Navbar),
    ("Navigation", SectionKind::Navbar),
    ("Header", SectionKind::Navbar),
    ("Hero", SectionKind::Hero),
    ("Feature", SectionKind::Features),
    ("Service", SectionKind::Services),
    ("About", SectionKind::About),
    ("Pricing", SectionKind::Pricing),
    ("Plan", SectionKind::Pricing),
    ("Testimonial", SectionKind::Testimonials),
    ("Review", SectionKind::Testimonials),
    ("Team", SectionKind::Team),
    ("Gallery", SectionKind::Gallery),
    ("Portfolio", SectionKind::Gallery),
    ("Faq", SectionKind::Faq),
    ("FAQ", SectionKind::Faq),
    ("Stats", SectionKind::Stats),
    ("Cta", SectionKind::Cta),
    ("CTA", SectionKind::Cta),
    ("CallToAction", SectionKind::Cta),
    ("Contact", SectionKind::Contact),
    ("Blog", SectionKind::Blog),
    ("Footer", SectionKind::Footer),
];

impl SectionKind {
    /// Classify a component by its name (or a path containing it).
    pub fn from_name(name: &str) -> Option<Self> {
        SECTION_TABLE
            .iter()
            .find(|(needle, _)| name.contains(needle))
            .map(|(_, kind)| *kind)
    }

    /// Classify a file by the stem of its path.
    pub fn from_path(path: &str) -> Option<Self> {
        let stem = file_stem(path);
        Self::from_name(stem)
    }
}

/// One file of a generated site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualFile {
    pub path: String,
    pub content: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionKind>,
}

impl VirtualFile {
    /// Build a file, normalizing the path and classifying its type.
    pub fn new(path: impl AsRef<str>, content: impl Into<String>) -> Self {
        let path = normalize_path(path.as_ref());
        let file_type = classify_path(&path);
        Self {
            path,
            content: content.into(),
            file_type,
            section: None,
        }
    }

    #[must_use]
    pub fn with_section(mut self, section: Option<SectionKind>) -> Self {
        self.section = section;
        self
    }

    /// Display name used in progress events.
    pub fn component_name(&self) -> String {
        component_name_for_path(&self.path)
    }
}

/// A fenced block extracted from streamed model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub file_path: String,
    pub content: String,
    pub language: String,
}

impl Block {
    pub fn into_file(self) -> VirtualFile {
        VirtualFile::new(&self.file_path, self.content)
    }
}

/// Normalize a file path: trim, forward slashes, no leading `./` or `/`.
pub fn normalize_path(path: &str) -> String {
    let mut p = path.trim().replace('\\', "/");
    while let Some(rest) = p.strip_prefix("./") {
        p = rest.to_string();
    }
    p.trim_start_matches('/').to_string()
}

/// Final path segment without its extension.
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.split_once('.').map_or(name, |(stem, _)| stem)
}

fn extension(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map_or("", |(_, ext)| ext)
}

/// Derive a [`FileType`] from a path.
pub fn classify_path(path: &str) -> FileType {
    let path = normalize_path(path);
    let ext = extension(&path);
    let stem = file_stem(&path);
    let in_root = !path.contains('/');

    if ext == "css" || ext == "scss" {
        return FileType::Style;
    }
    if (in_root && matches!(ext, "json" | "js" | "mjs" | "cjs" | "ts"))
        || path.contains(".config.")
        || stem == "tsconfig"
    {
        return FileType::Config;
    }
    if matches!(stem, "page" | "layout") && path.contains("app/") {
        return FileType::Page;
    }
    if path.contains("pages/") && matches!(ext, "tsx" | "jsx" | "ts" | "js") {
        return FileType::Page;
    }
    if ext == "json" || path.contains("lib/") || path.contains("data/") {
        return FileType::Data;
    }
    FileType::Component
}

/// Source file for a logical route: `/` → `src/app/page.tsx`,
/// `/about` → `src/app/about/page.tsx`.
pub fn page_file_path(route: &str) -> String {
    let route = normalize_route(route);
    if route == "/" {
        "src/app/page.tsx".to_string()
    } else {
        format!("src/app{}/page.tsx", route)
    }
}

pub fn component_file_path(name: &str) -> String {
    format!("src/components/{}.tsx", name)
}

/// Canonical form of a logical page path: leading slash, no trailing slash,
/// no query or fragment.
pub fn normalize_route(route: &str) -> String {
    let route = route.trim();
    let route = route.split(['?', '#']).next().unwrap_or("");
    let trimmed = route.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Human-facing name for a file: component stem, or `<Route>Page` for app
/// router pages.
pub fn component_name_for_path(path: &str) -> String {
    let path = normalize_path(path);
    let stem = file_stem(&path);
    if stem == "layout" && path.contains("app/") {
        return "Layout".to_string();
    }
    if stem == "page" && path.contains("app/") {
        let route = path
            .split("app/")
            .nth(1)
            .unwrap_or("")
            .trim_end_matches(|c: char| c != '/')
            .trim_end_matches('/');
        let last = route.rsplit('/').next().unwrap_or("");
        if last.is_empty() {
            return "HomePage".to_string();
        }
        return format!("{}Page", pascal_case(last));
    }
    stem.to_string()
}

/// `about-us` → `AboutUs`.
pub fn pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}
