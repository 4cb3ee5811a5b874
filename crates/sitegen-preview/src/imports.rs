//! Parsing and removal of ES import declarations.
//!
//! The sandbox has no module loader, so every `import` is stripped from the
//! source and kept as an [`ImportDecl`]; the compiler turns each one back
//! into plain bindings against the module registry or the shims.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static IMPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*import\s+(type\s+)?([\w$*{}\s,]+?)\s*from\s*['"]([^'"\n]+)['"][ \t]*;?[ \t]*\r?\n?"#,
    )
    .unwrap()
});

static IMPORT_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s*['"]([^'"\n]+)['"][ \t]*;?[ \t]*\r?\n?"#).unwrap()
});

/// One `import ... from '...'` declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportDecl {
    pub specifier: String,
    /// Local name of the default import.
    pub default: Option<String>,
    /// Local name of a `* as ns` import.
    pub namespace: Option<String>,
    /// `(imported, local)` pairs.
    pub named: Vec<(String, String)>,
    /// `import type ...`; erased entirely.
    pub type_only: bool,
}

impl ImportDecl {
    /// Every local name this declaration introduces.
    pub fn locals(&self) -> impl Iterator<Item = &str> {
        self.default
            .iter()
            .chain(self.namespace.iter())
            .map(String::as_str)
            .chain(self.named.iter().map(|(_, local)| local.as_str()))
    }

    /// Whether the specifier points into the project rather than a package.
    pub fn is_local(&self) -> bool {
        is_local_specifier(&self.specifier)
    }
}

pub fn is_local_specifier(specifier: &str) -> bool {
    ["@/", "~/", "./", "../"]
        .iter()
        .any(|prefix| specifier.starts_with(prefix))
}

/// Parse a `{ a, b as c, type T }` list into `(imported, local)` pairs.
pub(crate) fn parse_named_list(list: &str) -> Vec<(String, String)> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty() && !entry.starts_with("type "))
        .map(|entry| match entry.split_once(" as ") {
            Some((imported, local)) => (imported.trim().to_string(), local.trim().to_string()),
            None => (entry.to_string(), entry.to_string()),
        })
        .collect()
}

fn parse_clause(clause: &str) -> (Option<String>, Option<String>, Vec<(String, String)>) {
    let (head, named) = match (clause.find('{'), clause.rfind('}')) {
        (Some(open), Some(close)) if close > open => {
            (&clause[..open], parse_named_list(&clause[open + 1..close]))
        }
        _ => (clause, Vec::new()),
    };
    let mut default = None;
    let mut namespace = None;
    for part in head.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(ns) = part.strip_prefix('*') {
            let ns = ns.trim().trim_start_matches("as").trim();
            if !ns.is_empty() {
                namespace = Some(ns.to_string());
            }
        } else {
            default = Some(part.to_string());
        }
    }
    (default, namespace, named)
}

/// Remove every import statement and return what was imported.
pub fn strip_imports(source: &str) -> (String, Vec<ImportDecl>) {
    let mut decls = Vec::new();
    let stripped = IMPORT_FROM.replace_all(source, |caps: &Captures<'_>| {
        let (default, namespace, named) = parse_clause(&caps[2]);
        decls.push(ImportDecl {
            specifier: caps[3].trim().to_string(),
            default,
            namespace,
            named,
            type_only: caps.get(1).is_some(),
        });
        String::new()
    });
    let stripped = IMPORT_BARE.replace_all(&stripped, "");
    (stripped.into_owned(), decls)
}
