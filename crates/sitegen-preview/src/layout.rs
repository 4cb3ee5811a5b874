//! Page chrome: the root layout, or a stand-in built from Navbar/Footer.

use regex::Regex;
use std::sync::LazyLock;

static HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<head(?:\s[^>]*)?>.*?</head>|<head\s*/>").unwrap());
static HTML_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<html(?:\s[^>]*)?>").unwrap());
static HTML_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</html\s*>").unwrap());
static BODY_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<body(\s|>)").unwrap());
static BODY_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</body\s*>").unwrap());

/// Stems recognized as a site header, best first.
pub const HEADER_STEMS: &[&str] = &["Navbar", "Header", "Navigation", "Nav"];
pub const FOOTER_STEMS: &[&str] = &["Footer"];

/// Reduce a layout's document shell to something renderable inside the
/// preview root: `<html>` becomes a fragment, `<head>` is dropped, and
/// `<body>` becomes a `<div>` that keeps its attributes.
pub fn strip_document_shell(code: &str) -> String {
    let code = HEAD.replace_all(code, "");
    let code = HTML_OPEN.replace_all(&code, "<>");
    let code = HTML_CLOSE.replace_all(&code, "</>");
    let code = BODY_OPEN.replace_all(&code, "<div$1");
    BODY_CLOSE.replace_all(&code, "</div>").into_owned()
}

/// Header and footer modules used when the site has no layout file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chrome {
    pub header: Option<String>,
    pub footer: Option<String>,
}

impl Chrome {
    pub fn is_empty(&self) -> bool {
        self.header.is_none() && self.footer.is_none()
    }

    /// A layout function that renders the header, the page, and the footer.
    /// Uses `React.createElement` so it needs no transpilation.
    pub fn layout_function(&self, name: &str) -> String {
        let require = |path: &Option<String>| match path {
            Some(path) => format!(
                "React.createElement(__require({}).default)",
                serde_json::Value::String(path.clone())
            ),
            None => "null".to_string(),
        };
        format!(
            "function {}(props) {{\n  return React.createElement(React.Fragment, null, {}, props.children, {});\n}}\n",
            name,
            require(&self.header),
            require(&self.footer)
        )
    }
}
