//! The HTML shell around a compiled preview.

use crate::theme::Theme;
use maud::{DOCTYPE, Markup, PreEscaped, html};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";
const REACT_UMD: &str = "https://unpkg.com/react@18.3.1/umd/react.development.js";
const REACT_DOM_UMD: &str = "https://unpkg.com/react-dom@18.3.1/umd/react-dom.development.js";
const BABEL_STANDALONE: &str = "https://unpkg.com/@babel/standalone@7.26.4/babel.min.js";

const PRELUDE: &str = include_str!("runtime/prelude.js");
const BOOTSTRAP: &str = include_str!("runtime/bootstrap.js");

const DIAGNOSTIC_CSS: &str = ".preview-diagnostic{font-family:ui-sans-serif,system-ui,sans-serif;max-width:42rem;margin:4rem auto;padding:1.5rem;border:1px solid #fecaca;border-radius:.75rem;background:#fef2f2;color:#7f1d1d}.preview-diagnostic h2{font-size:1.125rem;font-weight:600;margin:0 0 .75rem}.preview-diagnostic pre{white-space:pre-wrap;font-size:.875rem;margin:0}";

/// Everything the document needs besides the fixed runtime.
#[derive(Debug, Clone)]
pub struct DocumentParts<'a> {
    pub title: &'a str,
    pub route: &'a str,
    pub theme: &'a Theme,
    /// Contents of the site's CSS files, in path order.
    pub stylesheets: Vec<&'a str>,
    /// Combined module source, transpiled in the browser.
    pub source: &'a str,
}

/// Serialize `value` for a `<script>` body. `<`, `>`, `&` and the JS line
/// separators are written as `\u` escapes so no sequence inside the string
/// can close the element or break the statement.
pub fn escape_script_json(value: &serde_json::Value) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

/// Keep raw text from terminating the element it is embedded in.
pub fn escape_raw_text(text: &str, element: &str) -> String {
    let needle = format!("</{}", element);
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = find_ignore_case(rest, &needle) {
        out.push_str(&rest[..idx]);
        out.push_str("<\\/");
        out.push_str(&rest[idx + 2..idx + needle.len()]);
        rest = &rest[idx + needle.len()..];
    }
    out.push_str(rest);
    out
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    hay.windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

pub fn render_document(parts: &DocumentParts<'_>) -> Markup {
    let config = format!("tailwind.config = {};", escape_script_json(&parts.theme.tailwind_config));
    let source = format!(
        "window.__PREVIEW_PATH__ = {};\nwindow.__PREVIEW_SOURCE__ = {};",
        escape_script_json(&serde_json::Value::from(parts.route)),
        escape_script_json(&serde_json::Value::from(parts.source))
    );
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (parts.title) }
                script src=(TAILWIND_CDN) {}
                script { (PreEscaped(config)) }
                @if let Some(href) = &parts.theme.fonts_href {
                    link rel="preconnect" href="https://fonts.gstatic.com" crossorigin;
                    link rel="stylesheet" href=(href);
                }
                style { (PreEscaped(DIAGNOSTIC_CSS)) }
                @for css in &parts.stylesheets {
                    style type="text/tailwindcss" { (PreEscaped(escape_raw_text(css, "style"))) }
                }
                script crossorigin src=(REACT_UMD) {}
                script crossorigin src=(REACT_DOM_UMD) {}
                script src=(BABEL_STANDALONE) {}
            }
            body {
                div id="root" {}
                script { (PreEscaped(escape_raw_text(PRELUDE, "script"))) }
                script { (PreEscaped(source)) }
                script { (PreEscaped(escape_raw_text(BOOTSTRAP, "script"))) }
            }
        }
    }
}

/// A standalone page explaining why nothing could be rendered.
pub fn diagnostic_document(title: &str, detail: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { (title) }
                style { (PreEscaped(DIAGNOSTIC_CSS)) }
            }
            body {
                div.preview-diagnostic {
                    h2 { (title) }
                    pre { (detail) }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_json_escaping() {
        let value = serde_json::Value::from("a</script><b>&\u{2028}");
        let escaped = escape_script_json(&value);
        assert_eq!(escaped, "\"a\\u003c/script\\u003e\\u003cb\\u003e\\u0026\\u2028\"");
        let back: serde_json::Value = serde_json::from_str(&escaped).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_raw_text_escaping() {
        assert_eq!(
            escape_raw_text("a { content: '</STYLE>' }", "style"),
            "a { content: '<\\/STYLE>' }"
        );
        assert_eq!(escape_raw_text("no closers", "script"), "no closers");
    }

    #[test]
    fn test_document_shell() {
        let theme = Theme::default();
        let html = render_document(&DocumentParts {
            title: "Acme",
            route: "/",
            theme: &theme,
            stylesheets: vec!["@tailwind base;\nbody > main { color: red; }"],
            source: "const x = '</script>';",
        })
        .into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<div id=\"root\"></div>"));
        assert!(html.contains("<style type=\"text/tailwindcss\">@tailwind base;\nbody > main"));
        assert!(html.contains("tailwind.config = {"));
        assert!(!html.contains("'</script>'"));
        assert!(html.contains("__mount"));
    }

    #[test]
    fn test_diagnostic_escapes_detail() {
        let html = diagnostic_document("Nothing to show", "<no files>").into_string();
        assert!(html.contains("&lt;no files&gt;"));
        assert!(html.contains("preview-diagnostic"));
    }
}
