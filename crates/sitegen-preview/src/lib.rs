//! Preview compiler.
//!
//! Turns the file set of one generated version into a single HTML document
//! that runs in a sandboxed iframe. The generated sources are written for a
//! bundler; the preview has none, so every module is rewritten into a
//! factory registered with a tiny in-page module registry, imports become
//! explicit bindings, and anything that cannot be satisfied (a component the
//! model never produced, a file cut off mid-stream) is removed before the
//! browser sees it.
//!
//! ```text
//! files ──► rewrite ──► classify ──► resolve page ──► bind + remove JSX
//!                                                        │
//!        document ◄── theme ◄── icon shims ◄── layout ◄──┘
//! ```

pub mod document;
pub mod icons;
pub mod imports;
pub mod jsx;
pub mod layout;
pub mod resolve;
pub mod rewrite;
pub mod shims;
pub mod theme;
pub mod truncation;

use crate::document::{DocumentParts, diagnostic_document, render_document};
use crate::layout::{Chrome, FOOTER_STEMS, HEADER_STEMS, strip_document_shell};
use crate::resolve::{has_source_extension, resolve_page, resolve_specifier};
use crate::rewrite::{ModuleSource, rewrite_module};
use crate::shims::{Bindings, GLOBAL_COMPONENTS, js_string, references};
use crate::theme::Theme;
use sitegen_core::files::{FileType, LAYOUT_PATH, VirtualFile, file_stem, normalize_route};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fmt::Write;
use thiserror::Error;

/// Name of the layout function synthesized from Navbar/Footer.
const SYNTHESIZED_LAYOUT: &str = "__PreviewLayout";

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("version has no files")]
    NoFiles,

    #[error("no page for route `{route}` and no root page to fall back to")]
    NoPage { route: String },
}

/// A compiled preview and what the compiler had to drop to produce it.
#[derive(Debug, Clone)]
pub struct PreviewDocument {
    pub html: String,
    /// Source file rendered as the page.
    pub page_path: String,
    /// True when the requested route had no page and `/` was used.
    pub fell_back: bool,
    /// Modules left out because their source is truncated.
    pub excluded: Vec<String>,
    /// Component names whose JSX usages were removed.
    pub removed_components: BTreeSet<String>,
    /// Module source embedded in the document, before transpilation.
    pub source: String,
}

fn is_module_path(path: &str) -> bool {
    has_source_extension(path) || path.ends_with(".json")
}

/// One module factory ready to be written into the document.
struct CompiledModule {
    js: String,
    deps: Vec<String>,
}

struct Compiler<'a> {
    /// Every module file in the set, truncated or not.
    modules: BTreeMap<&'a str, &'a VirtualFile>,
    /// Modules that are usable.
    available: BTreeMap<&'a str, ModuleSource>,
    /// Component stem to the module defining it.
    stems: BTreeMap<String, &'a str>,
    /// Named value export to the first module exporting it.
    hoisted: BTreeMap<String, &'a str>,
    layout: Option<&'a str>,
    icons: BTreeSet<String>,
    removed: BTreeSet<String>,
}

impl<'a> Compiler<'a> {
    fn new(files: &'a [VirtualFile], page: &'a VirtualFile, excluded: &mut Vec<String>) -> Self {
        let modules: BTreeMap<&str, &VirtualFile> = files
            .iter()
            .filter(|f| f.file_type != FileType::Config && is_module_path(&f.path))
            .map(|f| (f.path.as_str(), f))
            .collect();

        let mut available = BTreeMap::new();
        for (path, file) in &modules {
            let usable = if path.ends_with(".json") {
                serde_json::from_str::<serde_json::Value>(&file.content).is_ok()
            } else {
                *path == page.path || !truncation::is_truncated(&file.content)
            };
            if !usable {
                tracing::warn!(path = %path, "excluding truncated module from preview");
                excluded.push((*path).to_string());
                continue;
            }
            let source = if path.ends_with(".json") {
                ModuleSource::default()
            } else {
                rewrite_module(&file.content)
            };
            available.insert(*path, source);
        }

        let mut stems = BTreeMap::new();
        let mut hoisted = BTreeMap::new();
        for (path, source) in &available {
            let file = modules[path];
            if file.file_type == FileType::Page || !has_source_extension(path) {
                continue;
            }
            stems.entry(file_stem(path).to_string()).or_insert(*path);
            for (exported, _) in &source.exports.named {
                hoisted.entry(exported.clone()).or_insert(*path);
            }
        }

        let layout = available
            .keys()
            .copied()
            .filter(|p| file_stem(p) == "layout" && modules[p].file_type == FileType::Page)
            .min_by_key(|p| (*p != LAYOUT_PATH, p.matches('/').count()));

        // Icons imported anywhere in the file set, reached or not.
        let icons = icons::collect_icon_names(available.values().flat_map(|m| m.imports.iter()));

        Self {
            modules,
            available,
            stems,
            hoisted,
            layout,
            icons,
            removed: BTreeSet::new(),
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.modules.contains_key(path)
    }

    fn require(path: &str) -> String {
        format!("__require({})", js_string(path))
    }

    /// Header and footer for a site without a layout, leaving out any the
    /// page already renders.
    fn chrome(&self, page_path: &str) -> Chrome {
        let used = self
            .available
            .get(page_path)
            .map(|m| jsx::component_names(&m.code))
            .unwrap_or_default();
        let pick = |candidates: &[&str]| {
            candidates
                .iter()
                .find_map(|stem| self.stems.get(*stem).map(|path| (*stem, *path)))
                .filter(|(stem, _)| !used.contains(*stem))
                .map(|(_, path)| path.to_string())
        };
        Chrome {
            header: pick(HEADER_STEMS),
            footer: pick(FOOTER_STEMS),
        }
    }

    fn compile_module(&mut self, path: &str) -> Option<CompiledModule> {
        let file = *self.modules.get(path)?;
        let mut module = self.available.get(path)?.clone();

        if path.ends_with(".json") {
            return Some(CompiledModule {
                js: format!(
                    "__define({}, function () {{\n  return {{ default: {} }};\n}});\n",
                    js_string(path),
                    file.content.trim()
                ),
                deps: Vec::new(),
            });
        }

        if self.layout == Some(path) {
            module.code = strip_document_shell(&module.code);
        }

        let mut bindings = Bindings::for_module(&module.code);
        let mut deps = Vec::new();
        let mut unavailable: HashSet<String> = HashSet::new();
        let mut unresolved: Vec<String> = Vec::new();

        for decl in module.imports.iter().filter(|d| !d.type_only) {
            if !decl.is_local() {
                bindings.bind_external(decl);
                continue;
            }
            let resolved = resolve_specifier(path, &decl.specifier, |p| self.exists(p))
                .filter(|p| self.available.contains_key(p.as_str()));
            if let Some(target) = resolved {
                let module_expr = Self::require(&target);
                if let Some(ns) = &decl.namespace {
                    bindings.bind(ns, &module_expr);
                }
                if let Some(default) = &decl.default {
                    bindings.bind(default, &format!("{}.default", module_expr));
                }
                for (imported, local) in &decl.named {
                    bindings.bind(local, &format!("{}[{}]", module_expr, js_string(imported)));
                }
                deps.push(target);
                continue;
            }

            tracing::debug!(from = path, specifier = %decl.specifier, "local import not available");
            // A default import whose file moved can still be found by name.
            if let Some(default) = &decl.default
                && let Some(target) = self.stems.get(file_stem(&decl.specifier)).copied()
                && target != path
            {
                bindings.bind(default, &format!("{}.default", Self::require(target)));
                deps.push(target.to_string());
            }
            for local in decl.locals() {
                if !bindings.is_bound(local) {
                    unavailable.insert(local.to_string());
                    unresolved.push(local.to_string());
                }
            }
        }

        for name in jsx::component_names(&module.code) {
            if bindings.is_bound(&name)
                || unavailable.contains(&name)
                || shims::declares(&module.code, &name)
            {
                continue;
            }
            if let Some(target) = self.stems.get(&name).copied().filter(|t| *t != path) {
                bindings.bind(&name, &format!("{}.default", Self::require(target)));
                deps.push(target.to_string());
            } else if let Some(target) = self.hoisted.get(&name).copied().filter(|t| *t != path) {
                bindings.bind(&name, &format!("{}[{}]", Self::require(target), js_string(&name)));
                deps.push(target.to_string());
            } else if GLOBAL_COMPONENTS.contains(&name.as_str()) {
                continue;
            } else if icons::icon_markup(&name).is_some() {
                bindings.bind(&name, &format!("__iconShims[{}]", js_string(&name)));
                self.icons.insert(name);
            } else {
                unavailable.insert(name);
            }
        }

        if !unavailable.is_empty() {
            let before = jsx::component_names(&module.code);
            module.remove_components(&unavailable);
            let after = jsx::component_names(&module.code);
            for name in before.difference(&after) {
                tracing::debug!(module = path, component = %name, "removed unavailable component");
                self.removed.insert(name.clone());
            }
        }

        for local in &unresolved {
            if references(&module.code, local) {
                bindings.bind(local, &format!("__missingBinding({})", js_string(local)));
            }
        }

        for (name, owner) in &self.hoisted {
            if *owner != path
                && !bindings.is_bound(name)
                && references(&module.code, name)
                && bindings.bind(name, &format!("{}[{}]", Self::require(owner), js_string(name)))
            {
                deps.push((*owner).to_string());
            }
        }

        let mut exports = String::new();
        let _ = write!(
            exports,
            "default: {}",
            module.exports.default.as_deref().unwrap_or("undefined")
        );
        for (exported, local) in &module.exports.named {
            let _ = write!(exports, ", {}: {}", js_string(exported), local);
        }

        let js = format!(
            "__define({}, function () {{\n{}{}\nreturn {{ {} }};\n}});\n",
            js_string(path),
            bindings.into_js(),
            module.code.trim_end(),
            exports
        );
        Some(CompiledModule { js, deps })
    }
}

/// Compile the preview for `route`.
///
/// The requested page and everything it reaches (imports, components used
/// by name, the layout or its stand-in) become module factories; files the
/// page never reaches stay out of the document. Icon shims are the
/// exception: every icon imported anywhere in the file set gets one.
pub fn compile_preview(files: &[VirtualFile], route: &str) -> Result<PreviewDocument, PreviewError> {
    if files.is_empty() {
        return Err(PreviewError::NoFiles);
    }
    let route = normalize_route(route);
    let (page, fell_back) = resolve_page(files, &route).ok_or_else(|| PreviewError::NoPage {
        route: route.clone(),
    })?;
    if fell_back {
        tracing::debug!(route = %route, "no page for route, rendering root page");
    }

    let mut excluded = Vec::new();
    let mut compiler = Compiler::new(files, page, &mut excluded);

    let mut mount_layout = "null".to_string();
    let mut layout_js = String::new();
    let mut roots = vec![page.path.clone()];
    if let Some(layout) = compiler.layout {
        roots.push(layout.to_string());
        mount_layout = format!("{}.default", Compiler::require(layout));
    } else {
        let chrome = compiler.chrome(&page.path);
        if !chrome.is_empty() {
            roots.extend(chrome.header.iter().chain(chrome.footer.iter()).cloned());
            layout_js = chrome.layout_function(SYNTHESIZED_LAYOUT);
            mount_layout = SYNTHESIZED_LAYOUT.to_string();
        }
    }

    let mut queue: VecDeque<String> = roots.into();
    let mut visited: HashSet<String> = HashSet::new();
    let mut defined = String::new();
    while let Some(path) = queue.pop_front() {
        if !visited.insert(path.clone()) {
            continue;
        }
        if let Some(compiled) = compiler.compile_module(&path) {
            defined.push_str(&compiled.js);
            queue.extend(compiled.deps);
        }
    }

    let mut source = icons::icon_shims(&compiler.icons);
    source.push_str(&defined);
    source.push_str(&layout_js);
    let _ = writeln!(
        source,
        "__mount({}, {});",
        js_string(&page.path),
        mount_layout
    );

    let stylesheets: Vec<&str> = files
        .iter()
        .filter(|f| f.file_type == FileType::Style)
        .map(|f| f.content.as_str())
        .collect();
    let theme = Theme::from_files(files);
    let title = format!("Preview {}", route);
    let html = render_document(&DocumentParts {
        title: &title,
        route: &route,
        theme: &theme,
        stylesheets,
        source: &source,
    })
    .into_string();

    Ok(PreviewDocument {
        html,
        page_path: page.path.clone(),
        fell_back,
        excluded,
        removed_components: compiler.removed,
        source,
    })
}

/// Render the preview for `route`, or a diagnostic page when nothing can be
/// rendered. Never fails.
pub fn render_preview(files: &[VirtualFile], route: &str) -> String {
    match compile_preview(files, route) {
        Ok(doc) => doc.html,
        Err(e) => {
            tracing::warn!(route, error = %e, "preview unavailable");
            diagnostic_document("Preview unavailable", &e.to_string()).into_string()
        }
    }
}
