//! Source rewrite steps for sandbox execution.
//!
//! Each generated module goes through [`STEPS`] in order:
//!
//! 1. normalize typographic punctuation to ASCII
//! 2. strip `'use client'`-style directives
//! 3. strip imports (recorded as [`ImportDecl`]s)
//! 4. rewrite exports into plain declarations (recorded as [`Exports`])
//!
//! Removing JSX for unavailable components is the last step, applied with
//! [`ModuleSource::remove_components`] once the compiler knows which
//! components exist.

use crate::imports::{ImportDecl, parse_named_list, strip_imports};
use crate::jsx;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Binding used for an anonymous default export.
pub const DEFAULT_BINDING: &str = "__default";

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*['"]use (?:client|server|strict)['"][ \t]*;?[ \t]*\r?\n?"#).unwrap()
});

static DEFAULT_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)export\s+default\s+(async\s+)?function\b\s*([A-Za-z_$][\w$]*)?\s*\(")
        .unwrap()
});

static DEFAULT_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)export\s+default\s+class\s+([A-Za-z_$][\w$]*)").unwrap()
});

static DEFAULT_IDENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*export\s+default\s+([A-Za-z_$][\w$]*)[ \t]*;?[ \t]*$").unwrap()
});

static DEFAULT_EXPR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)export\s+default\s+").unwrap());

static NAMED_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^([ \t]*)export\s+((?:async\s+)?function\*?|const|let|var|class|enum)\s+([A-Za-z_$][\w$]*)",
    )
    .unwrap()
});

static TYPE_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*export\s+type\s*\{[^}]*\}[^;\n]*;?[ \t]*\r?\n?").unwrap()
});

static TYPE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*)export\s+(type|interface|declare|abstract)\b").unwrap()
});

static REEXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*export\s*(\*|\{[^}]*\})\s*from\s*['"]([^'"\n]+)['"][ \t]*;?[ \t]*\r?\n?"#)
        .unwrap()
});

static EXPORT_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*export\s*\{([^}]*)\}[ \t]*;?[ \t]*\r?\n?").unwrap()
});

/// What a module exports once its `export` keywords are gone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exports {
    /// Local binding holding the default export.
    pub default: Option<String>,
    /// `(exported, local)` pairs.
    pub named: Vec<(String, String)>,
}

/// A module after rewriting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSource {
    pub code: String,
    pub imports: Vec<ImportDecl>,
    pub exports: Exports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    NormalizePunctuation,
    StripDirectives,
    StripImports,
    RewriteExports,
}

pub const STEPS: [Step; 4] = [
    Step::NormalizePunctuation,
    Step::StripDirectives,
    Step::StripImports,
    Step::RewriteExports,
];

impl Step {
    fn apply(self, module: &mut ModuleSource) {
        match self {
            Self::NormalizePunctuation => module.code = normalize_punctuation(&module.code),
            Self::StripDirectives => module.code = strip_directives(&module.code),
            Self::StripImports => {
                let (code, imports) = strip_imports(&module.code);
                module.code = code;
                module.imports.extend(imports);
            }
            Self::RewriteExports => {
                let (code, exports, reexports) = rewrite_exports(&module.code);
                module.code = code;
                module.exports = exports;
                module.imports.extend(reexports);
            }
        }
    }
}

/// Run every rewrite step over one source file.
pub fn rewrite_module(source: &str) -> ModuleSource {
    let mut module = ModuleSource {
        code: source.to_string(),
        ..ModuleSource::default()
    };
    for step in STEPS {
        step.apply(&mut module);
    }
    module
}

impl ModuleSource {
    /// Strip JSX usages of `names`.
    pub fn remove_components(&mut self, names: &HashSet<String>) {
        self.code = jsx::remove_components(&self.code, names);
    }
}

pub fn normalize_punctuation(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for c in source.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2007}' | '\u{202F}' => out.push(' '),
            '\u{200B}' | '\u{FEFF}' => {}
            _ => out.push(c),
        }
    }
    out
}

pub fn strip_directives(source: &str) -> String {
    DIRECTIVE.replace_all(source, "").into_owned()
}

/// Turn `export` forms into plain declarations.
///
/// Re-exports (`export { default as Hero } from './Hero'`) come back as
/// imports so their bindings exist locally; `export *` is dropped.
pub fn rewrite_exports(source: &str) -> (String, Exports, Vec<ImportDecl>) {
    let mut exports = Exports::default();
    let mut reexports = Vec::new();

    let code = REEXPORT.replace_all(source, |caps: &Captures<'_>| {
        if &caps[1] == "*" {
            tracing::debug!(specifier = &caps[2], "dropping star re-export");
            return String::new();
        }
        let list = &caps[1][1..caps[1].len() - 1];
        let mut decl = ImportDecl {
            specifier: caps[2].to_string(),
            ..ImportDecl::default()
        };
        for (imported, exported) in parse_named_list(list) {
            if imported == "default" {
                decl.default = Some(exported.clone());
            } else {
                decl.named.push((imported, exported.clone()));
            }
            exports.named.push((exported.clone(), exported));
        }
        reexports.push(decl);
        String::new()
    });

    let code = TYPE_LIST.replace_all(&code, "");
    let code = TYPE_DECL.replace_all(&code, "${1}${2}");

    let code = DEFAULT_FUNCTION.replace_all(&code, |caps: &Captures<'_>| {
        let name = caps
            .get(3)
            .map_or(DEFAULT_BINDING, |m| m.as_str())
            .to_string();
        let asyncness = caps.get(2).map_or("", |m| m.as_str());
        let out = format!("{}{}function {}(", &caps[1], asyncness, name);
        exports.default.get_or_insert(name);
        out
    });
    let code = DEFAULT_CLASS.replace_all(&code, |caps: &Captures<'_>| {
        exports.default.get_or_insert_with(|| caps[2].to_string());
        format!("{}class {}", &caps[1], &caps[2])
    });
    let code = DEFAULT_IDENT.replace_all(&code, |caps: &Captures<'_>| {
        exports.default.get_or_insert_with(|| caps[1].to_string());
        String::new()
    });
    let code = DEFAULT_EXPR.replace_all(&code, |caps: &Captures<'_>| {
        exports
            .default
            .get_or_insert_with(|| DEFAULT_BINDING.to_string());
        format!("{}const {} = ", &caps[1], DEFAULT_BINDING)
    });

    let code = NAMED_DECL.replace_all(&code, |caps: &Captures<'_>| {
        let name = caps[3].to_string();
        exports.named.push((name.clone(), name));
        format!("{}{} {}", &caps[1], &caps[2], &caps[3])
    });
    let code = EXPORT_LIST.replace_all(&code, |caps: &Captures<'_>| {
        for (local, exported) in parse_named_list(&caps[1]) {
            if exported == "default" {
                exports.default.get_or_insert(local);
            } else {
                exports.named.push((exported, local));
            }
        }
        String::new()
    });

    (code.into_owned(), exports, reexports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smart_punctuation() {
        assert_eq!(
            normalize_punctuation("\u{201C}Hi\u{201D} \u{2014} it\u{2019}s\u{2026}"),
            "\"Hi\" - it's..."
        );
    }

    #[test]
    fn test_directives() {
        assert_eq!(strip_directives("'use client';\nconst a = 1;\n"), "const a = 1;\n");
        assert_eq!(strip_directives("\"use client\"\nx"), "x");
        // Only whole-line directives.
        assert_eq!(strip_directives("const s = 'use client';"), "const s = 'use client';");
    }

    #[test]
    fn test_default_function_export() {
        let (code, exports, _) = rewrite_exports("export default function Hero() {\n  return null;\n}\n");
        assert_eq!(code, "function Hero() {\n  return null;\n}\n");
        assert_eq!(exports.default.as_deref(), Some("Hero"));
    }

    #[test]
    fn test_default_identifier_and_expression() {
        let (code, exports, _) =
            rewrite_exports("const Hero = () => <div />;\n\nexport default Hero;\n");
        assert_eq!(code, "const Hero = () => <div />;\n\n\n");
        assert_eq!(exports.default.as_deref(), Some("Hero"));

        let (code, exports, _) = rewrite_exports("export default memo(function Card() {});\n");
        assert_eq!(code, "const __default = memo(function Card() {});\n");
        assert_eq!(exports.default.as_deref(), Some(DEFAULT_BINDING));

        let (code, exports, _) = rewrite_exports("export default async function () {}\n");
        assert_eq!(code, "async function __default() {}\n");
        assert_eq!(exports.default.as_deref(), Some(DEFAULT_BINDING));
    }

    #[test]
    fn test_named_exports() {
        let src = "export const plans = [];\nexport async function load() {}\nexport interface Plan { name: string }\nconst a = 1, b = 2;\nexport { a, b as beta };\nexport type { Plan as P };\n";
        let (code, exports, _) = rewrite_exports(src);
        assert_eq!(
            code,
            "const plans = [];\nasync function load() {}\ninterface Plan { name: string }\nconst a = 1, b = 2;\n"
        );
        let named: Vec<(&str, &str)> = exports
            .named
            .iter()
            .map(|(e, l)| (e.as_str(), l.as_str()))
            .collect();
        assert_eq!(named, vec![("plans", "plans"), ("load", "load"), ("a", "a"), ("beta", "b")]);
        assert!(exports.default.is_none());
    }

    #[test]
    fn test_reexports_become_imports() {
        let (code, exports, reexports) =
            rewrite_exports("export { default as Hero } from './Hero';\nexport * from './all';\n");
        assert_eq!(code, "");
        assert_eq!(reexports.len(), 1);
        assert_eq!(reexports[0].default.as_deref(), Some("Hero"));
        assert_eq!(exports.named, vec![("Hero".to_string(), "Hero".to_string())]);
    }

    #[test]
    fn test_rewrite_module_runs_all_steps() {
        let src = "'use client';\nimport { useState } from 'react';\nexport default function Faq() {\n  const [open] = useState(false);\n  return <p>\u{201C}Ask\u{201D}</p>;\n}\n";
        let module = rewrite_module(src);
        assert_eq!(
            module.code,
            "function Faq() {\n  const [open] = useState(false);\n  return <p>\"Ask\"</p>;\n}\n"
        );
        assert_eq!(module.imports.len(), 1);
        assert_eq!(module.exports.default.as_deref(), Some("Faq"));
    }
}
