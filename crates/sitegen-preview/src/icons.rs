//! Icon shims.
//!
//! Generated components import icons from `lucide-react` (and occasionally
//! `react-icons/*`). The preview renders the ones it knows from a path table
//! and a sized placeholder for the rest.

use crate::imports::ImportDecl;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Inner SVG markup on a 24x24 stroke grid, keyed by lucide name.
const ICON_PATHS: &[(&str, &str)] = &[
    ("ArrowLeft", r#"<path d="m12 19-7-7 7-7"/><path d="M19 12H5"/>"#),
    ("ArrowRight", r#"<path d="M5 12h14"/><path d="m12 5 7 7-7 7"/>"#),
    ("ArrowUpRight", r#"<path d="M7 7h10v10"/><path d="M7 17 17 7"/>"#),
    ("Award", r#"<circle cx="12" cy="8" r="6"/><path d="M15.477 12.89 17 22l-5-3-5 3 1.523-9.11"/>"#),
    ("Calendar", r#"<rect width="18" height="18" x="3" y="4" rx="2" ry="2"/><line x1="16" x2="16" y1="2" y2="6"/><line x1="8" x2="8" y1="2" y2="6"/><line x1="3" x2="21" y1="10" y2="10"/>"#),
    ("Camera", r#"<path d="M14.5 4h-5L7 7H4a2 2 0 0 0-2 2v9a2 2 0 0 0 2 2h16a2 2 0 0 0 2-2V9a2 2 0 0 0-2-2h-3l-2.5-3z"/><circle cx="12" cy="13" r="3"/>"#),
    ("Check", r#"<path d="M20 6 9 17l-5-5"/>"#),
    ("CheckCircle", r#"<path d="M22 11.08V12a10 10 0 1 1-5.93-9.14"/><path d="m9 11 3 3L22 4"/>"#),
    ("ChevronDown", r#"<path d="m6 9 6 6 6-6"/>"#),
    ("ChevronLeft", r#"<path d="m15 18-6-6 6-6"/>"#),
    ("ChevronRight", r#"<path d="m9 18 6-6-6-6"/>"#),
    ("ChevronUp", r#"<path d="m18 15-6-6-6 6"/>"#),
    ("Clock", r#"<circle cx="12" cy="12" r="10"/><polyline points="12 6 12 12 16 14"/>"#),
    ("Coffee", r#"<path d="M17 8h1a4 4 0 1 1 0 8h-1"/><path d="M3 8h14v9a4 4 0 0 1-4 4H7a4 4 0 0 1-4-4Z"/><line x1="6" x2="6" y1="2" y2="4"/><line x1="10" x2="10" y1="2" y2="4"/><line x1="14" x2="14" y1="2" y2="4"/>"#),
    ("ExternalLink", r#"<path d="M15 3h6v6"/><path d="M10 14 21 3"/><path d="M18 13v6a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2V8a2 2 0 0 1 2-2h6"/>"#),
    ("Facebook", r#"<path d="M18 2h-3a5 5 0 0 0-5 5v3H7v4h3v8h4v-8h3l1-4h-4V7a1 1 0 0 1 1-1h3z"/>"#),
    ("Github", r#"<path d="M15 22v-4a4.8 4.8 0 0 0-1-3.5c3 0 6-2 6-5.5.08-1.25-.27-2.48-1-3.5.28-1.15.28-2.35 0-3.5 0 0-1 0-3 1.5-2.64-.5-5.36-.5-8 0C6 2 5 2 5 2c-.3 1.15-.3 2.35 0 3.5A5.403 5.403 0 0 0 4 9c0 3.5 3 5.5 6 5.5-.39.49-.68 1.05-.85 1.65-.17.6-.22 1.23-.15 1.85v4"/><path d="M9 18c-4.51 2-5-2-7-2"/>"#),
    ("Globe", r#"<circle cx="12" cy="12" r="10"/><path d="M12 2a14.5 14.5 0 0 0 0 20 14.5 14.5 0 0 0 0-20"/><path d="M2 12h20"/>"#),
    ("Heart", r#"<path d="M19 14c1.49-1.46 3-3.21 3-5.5A5.5 5.5 0 0 0 16.5 3c-1.76 0-3 .5-4.5 2-1.5-1.5-2.74-2-4.5-2A5.5 5.5 0 0 0 2 8.5c0 2.3 1.5 4.05 3 5.5l7 7Z"/>"#),
    ("Home", r#"<path d="m3 9 9-7 9 7v11a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2z"/><polyline points="9 22 9 12 15 12 15 22"/>"#),
    ("Info", r#"<circle cx="12" cy="12" r="10"/><path d="M12 16v-4"/><path d="M12 8h.01"/>"#),
    ("Instagram", r#"<rect width="20" height="20" x="2" y="2" rx="5" ry="5"/><path d="M16 11.37A4 4 0 1 1 12.63 8 4 4 0 0 1 16 11.37z"/><line x1="17.5" x2="17.51" y1="6.5" y2="6.5"/>"#),
    ("Linkedin", r#"<path d="M16 8a6 6 0 0 1 6 6v7h-4v-7a2 2 0 0 0-2-2 2 2 0 0 0-2 2v7h-4v-7a6 6 0 0 1 6-6z"/><rect width="4" height="12" x="2" y="9"/><circle cx="4" cy="4" r="2"/>"#),
    ("Mail", r#"<rect width="20" height="16" x="2" y="4" rx="2"/><path d="m22 7-8.97 5.7a1.94 1.94 0 0 1-2.06 0L2 7"/>"#),
    ("MapPin", r#"<path d="M20 10c0 6-8 12-8 12s-8-6-8-12a8 8 0 0 1 16 0Z"/><circle cx="12" cy="10" r="3"/>"#),
    ("Menu", r#"<line x1="4" x2="20" y1="12" y2="12"/><line x1="4" x2="20" y1="6" y2="6"/><line x1="4" x2="20" y1="18" y2="18"/>"#),
    ("Minus", r#"<path d="M5 12h14"/>"#),
    ("Phone", r#"<path d="M22 16.92v3a2 2 0 0 1-2.18 2 19.79 19.79 0 0 1-8.63-3.07 19.5 19.5 0 0 1-6-6 19.79 19.79 0 0 1-3.07-8.67A2 2 0 0 1 4.11 2h3a2 2 0 0 1 2 1.72 12.84 12.84 0 0 0 .7 2.81 2 2 0 0 1-.45 2.11L8.09 9.91a16 16 0 0 0 6 6l1.27-1.27a2 2 0 0 1 2.11-.45 12.84 12.84 0 0 0 2.81.7A2 2 0 0 1 22 16.92z"/>"#),
    ("Play", r#"<polygon points="5 3 19 12 5 21 5 3"/>"#),
    ("Plus", r#"<path d="M5 12h14"/><path d="M12 5v14"/>"#),
    ("Quote", r#"<path d="M3 21c3 0 7-1 7-8V5c0-1.25-.756-2.017-2-2H4c-1.25 0-2 .75-2 1.972V11c0 1.25.75 2 2 2 1 0 1 0 1 1v1c0 1-1 2-2 2s-1 .008-1 1.031V20c0 1 0 1 1 1z"/><path d="M15 21c3 0 7-1 7-8V5c0-1.25-.757-2.017-2-2h-4c-1.25 0-2 .75-2 1.972V11c0 1.25.75 2 2 2h.75c0 2.25.25 4-2.75 4v3c0 1 0 1 1 1z"/>"#),
    ("Search", r#"<circle cx="11" cy="11" r="8"/><path d="m21 21-4.3-4.3"/>"#),
    ("Send", r#"<path d="m22 2-7 20-4-9-9-4Z"/><path d="M22 2 11 13"/>"#),
    ("Shield", r#"<path d="M12 22s8-4 8-10V5l-8-3-8 3v7c0 6 8 10 8 10"/>"#),
    ("ShoppingCart", r#"<circle cx="8" cy="21" r="1"/><circle cx="19" cy="21" r="1"/><path d="M2.05 2.05h2l2.66 12.42a2 2 0 0 0 2 1.58h9.78a2 2 0 0 0 1.95-1.57l1.65-7.43H5.12"/>"#),
    ("Sparkles", r#"<path d="m12 3-1.912 5.813a2 2 0 0 1-1.275 1.275L3 12l5.813 1.912a2 2 0 0 1 1.275 1.275L12 21l1.912-5.813a2 2 0 0 1 1.275-1.275L21 12l-5.813-1.912a2 2 0 0 1-1.275-1.275L12 3Z"/><path d="M5 3v4"/><path d="M19 17v4"/><path d="M3 5h4"/><path d="M17 19h4"/>"#),
    ("Star", r#"<polygon points="12 2 15.09 8.26 22 9.27 17 14.14 18.18 21.02 12 17.77 5.82 21.02 7 14.14 2 9.27 8.91 8.26 12 2"/>"#),
    ("Target", r#"<circle cx="12" cy="12" r="10"/><circle cx="12" cy="12" r="6"/><circle cx="12" cy="12" r="2"/>"#),
    ("TrendingUp", r#"<polyline points="22 7 13.5 15.5 8.5 10.5 2 17"/><polyline points="16 7 22 7 22 13"/>"#),
    ("Twitter", r#"<path d="M22 4s-.7 2.1-2 3.4c1.6 10-9.4 17.3-18 11.6 2.2.1 4.4-.6 6-2C3 15.5.5 9.6 3 5c2.2 2.6 5.6 4.1 9 4-.9-4.2 4-6.6 7-3.8 1.1 0 3-1.2 3-1.2z"/>"#),
    ("User", r#"<path d="M19 21v-2a4 4 0 0 0-4-4H9a4 4 0 0 0-4 4v2"/><circle cx="12" cy="7" r="4"/>"#),
    ("Users", r#"<path d="M16 21v-2a4 4 0 0 0-4-4H6a4 4 0 0 0-4 4v2"/><circle cx="9" cy="7" r="4"/><path d="M22 21v-2a4 4 0 0 0-3-3.87"/><path d="M16 3.13a4 4 0 0 1 0 7.75"/>"#),
    ("X", r#"<path d="M18 6 6 18"/><path d="m6 6 12 12"/>"#),
    ("Zap", r#"<polygon points="13 2 3 14 12 14 11 22 21 10 12 10 13 2"/>"#),
];

/// Two-letter family prefixes used by `react-icons` (`FaStar`, `FiMail`).
const REACT_ICON_PREFIXES: &[&str] = &[
    "Ai", "Bi", "Bs", "Cg", "Di", "Fa", "Fc", "Fi", "Gi", "Go", "Gr", "Hi", "Im", "Io", "Lu", "Md",
    "Ri", "Si", "Sl", "Tb", "Ti", "Vsc", "Wi",
];

pub fn is_icon_module(specifier: &str) -> bool {
    specifier == "lucide-react" || specifier.starts_with("react-icons")
}

fn lookup(name: &str) -> Option<&'static str> {
    ICON_PATHS
        .binary_search_by(|(key, _)| key.cmp(&name))
        .ok()
        .map(|idx| ICON_PATHS[idx].1)
}

/// SVG markup for an icon name, trying common spelling variants
/// (`ArrowRightIcon`, `LucideStar`, `CheckCircle2`, `FaFacebook`, `FaFacebookF`).
pub fn icon_markup(name: &str) -> Option<&'static str> {
    let base = name.strip_prefix("Lucide").unwrap_or(name);
    let base = base.strip_suffix("Icon").unwrap_or(base);
    let mut candidates = vec![base.to_string(), base.trim_end_matches(|c: char| c.is_ascii_digit()).to_string()];
    for prefix in REACT_ICON_PREFIXES {
        if let Some(rest) = base.strip_prefix(prefix).filter(|r| r.starts_with(|c: char| c.is_ascii_uppercase())) {
            candidates.push(rest.to_string());
            candidates.push(rest.trim_end_matches('F').to_string());
            candidates.push(rest.trim_end_matches("Alt").to_string());
        }
    }
    candidates.iter().find_map(|c| lookup(c))
}

/// Local names bound from icon modules across all imports.
pub fn collect_icon_names<'a>(imports: impl IntoIterator<Item = &'a ImportDecl>) -> BTreeSet<String> {
    imports
        .into_iter()
        .filter(|decl| !decl.type_only && is_icon_module(&decl.specifier))
        .flat_map(|decl| decl.named.iter().map(|(imported, _)| imported.clone()))
        .collect()
}

/// Script defining one shim per icon name in `__iconShims`. Unknown names get
/// a placeholder.
pub fn icon_shims(names: &BTreeSet<String>) -> String {
    let mut js = String::new();
    for name in names {
        let markup = icon_markup(name)
            .map_or_else(|| "null".to_string(), |m| serde_json::Value::from(m).to_string());
        let _ = writeln!(
            js,
            "__iconShims[{}] = __makeIcon({}, {});",
            serde_json::Value::from(name.as_str()),
            serde_json::Value::from(name.as_str()),
            markup
        );
    }
    js
}
