//! System prompts and user-prompt builders for each model call.

use sitegen_core::blueprint::PageBlueprint;
use sitegen_core::design::DesignSystem;
use sitegen_core::files::VirtualFile;
use sitegen_core::site::GenerationConfig;
use std::fmt::Write;

/// System prompt for the design-system stage.
pub const DESIGN_SYSTEM_SYSTEM: &str = include_str!("prompts/design_system.md");

/// System prompt for the blueprint stage.
pub const BLUEPRINT_SYSTEM: &str = include_str!("prompts/blueprint.md");

/// System prompt for streaming component generation.
pub const COMPONENTS_SYSTEM: &str = include_str!("prompts/components.md");

/// System prompt for the edit variant.
pub const EDIT_SYSTEM: &str = include_str!("prompts/edit.md");

fn describe_site(config: &GenerationConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Business");
    let _ = writeln!(out, "Name: {}", config.business_name);
    let _ = writeln!(out, "Description: {}", config.description);
    if !config.industry.is_empty() {
        let _ = writeln!(out, "Industry: {}", config.industry);
    }
    if !config.target_audience.is_empty() {
        let _ = writeln!(out, "Target audience: {}", config.target_audience);
    }

    let branding = &config.branding;
    let _ = writeln!(out, "\n## Branding");
    if !branding.tone.is_empty() {
        let _ = writeln!(out, "Tone: {}", branding.tone);
    }
    if !branding.style.is_empty() {
        let _ = writeln!(out, "Style: {}", branding.style);
    }
    for (label, value) in [
        ("Primary color", &branding.primary_color),
        ("Secondary color", &branding.secondary_color),
        ("Font preference", &branding.font_preference),
        ("Logo text", &branding.logo_text),
    ] {
        if let Some(value) = value {
            let _ = writeln!(out, "{}: {}", label, value);
        }
    }

    let _ = writeln!(out, "\n## Pages");
    for page in &config.pages {
        let _ = writeln!(out, "- {}", page);
    }

    if !config.sections.is_empty() {
        let _ = writeln!(out, "\n## Sections (in order)");
        for section in &config.sections {
            if section.notes.is_empty() {
                let _ = writeln!(out, "{}. {}", section.order + 1, section.name);
            } else {
                let _ = writeln!(
                    out,
                    "{}. {}: {}",
                    section.order + 1,
                    section.name,
                    section.notes
                );
            }
        }
    }

    let contact = &config.contact;
    let details: Vec<&str> = [&contact.email, &contact.phone, &contact.address]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .collect();
    if !details.is_empty() {
        let _ = writeln!(out, "\n## Contact");
        for detail in details {
            let _ = writeln!(out, "- {}", detail);
        }
    }
    out
}

fn pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

pub fn design_system_user(config: &GenerationConfig) -> String {
    format!(
        "{}\nCreate the design system for this website.",
        describe_site(config)
    )
}

pub fn blueprint_user(config: &GenerationConfig, design: &DesignSystem) -> String {
    format!(
        "{}\n## Design tokens\n{}\n\nPlan the pages and sections for this website.",
        describe_site(config),
        pretty(design)
    )
}

pub fn components_user(
    config: &GenerationConfig,
    design: &DesignSystem,
    blueprint: &PageBlueprint,
) -> String {
    let mut out = describe_site(config);
    let _ = write!(
        out,
        "\n## Design tokens\n{}\n\n## Blueprint\n{}\n\n## Files to write\n",
        pretty(design),
        pretty(blueprint)
    );
    for path in blueprint.expected_paths() {
        let _ = writeln!(out, "- {}", path);
    }
    let _ = writeln!(out, "- src/app/layout.tsx");
    out.push_str("\nWrite every file now.");
    out
}

pub fn edit_user(instruction: &str, design: &DesignSystem, targets: &[VirtualFile]) -> String {
    let mut out = format!(
        "## Change request\n{}\n\n## Design tokens\n{}\n\n## Current files\n",
        instruction.trim(),
        pretty(design)
    );
    for file in targets {
        let lang = file.path.rsplit_once('.').map_or("txt", |(_, ext)| ext);
        let _ = write!(out, "\n```{}:{}\n{}\n```\n", lang, file.path, file.content);
    }
    out.push_str("\nReturn only the files that change.");
    out
}
