//! Bindings that replace stripped imports inside a module scope.

use crate::imports::ImportDecl;
use crate::icons::is_icon_module;
use regex::Regex;
use std::collections::HashSet;
use std::fmt::Write;

/// Component names the runtime defines globally.
pub const GLOBAL_COMPONENTS: &[&str] = &[
    "Link",
    "Image",
    "Fragment",
    "Suspense",
    "AnimatePresence",
    "Head",
    "Script",
];

pub fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// Whether `code` declares `name` itself, as a declaration or a renamed
/// destructuring target (`{ icon: Icon }`).
pub fn declares(code: &str, name: &str) -> bool {
    let name = regex::escape(name);
    let pattern = format!(
        r"(?:\b(?:function\*?|class|const|let|var|enum)\s+{name}\b)|(?::\s*{name}\s*[,}}])"
    );
    Regex::new(&pattern).is_ok_and(|re| re.is_match(code))
}

/// Whether `name` occurs in `code` as a standalone identifier.
pub fn references(code: &str, name: &str) -> bool {
    let pattern = format!(r"(?:^|[^\w$.]){}(?:[^\w$]|$)", regex::escape(name));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(code))
}

/// Binding statements written at the top of one module factory.
#[derive(Debug, Default)]
pub struct Bindings {
    code: String,
    bound: HashSet<String>,
    js: String,
}

impl Bindings {
    /// Bindings for a module whose own declarations live in `code`.
    pub fn for_module(code: &str) -> Self {
        Self {
            code: code.to_string(),
            ..Self::default()
        }
    }

    pub fn is_bound(&self, local: &str) -> bool {
        self.bound.contains(local)
    }

    /// `const local = <expr>;` unless `local` is already bound or the
    /// module declares it.
    pub fn bind(&mut self, local: &str, expr: &str) -> bool {
        if self.bound.contains(local) || declares(&self.code, local) {
            return false;
        }
        self.bound.insert(local.to_string());
        let _ = writeln!(self.js, "const {} = {};", local, expr);
        true
    }

    /// Bind every name of an import from a package.
    pub fn bind_external(&mut self, decl: &ImportDecl) {
        let module = format!("__import({})", js_string(&decl.specifier));
        if let Some(ns) = &decl.namespace {
            self.bind(ns, &module);
        }
        if let Some(default) = &decl.default {
            self.bind(default, &format!("{}.default", module));
        }
        for (imported, local) in &decl.named {
            let expr = if is_icon_module(&decl.specifier) {
                format!("__iconShims[{}]", js_string(imported))
            } else {
                format!("{}[{}]", module, js_string(imported))
            };
            self.bind(local, &expr);
        }
    }

    pub fn into_js(self) -> String {
        self.js
    }
}
