//! A small scanner for component tags in JSX source.
//!
//! The scanner walks the source in three modes: script, element attributes,
//! and element children. In script, a `<` directly after an identifier or a
//! closing bracket is a comparison or a type argument, not a tag. Among
//! children every `<Name` is a tag, whatever text precedes it, and quotes are
//! plain text. Attribute values are skipped with brace and quote tracking, so
//! `icon={<Star />}` or `title="a > b"` do not end a tag early.
//!
//! Only capitalized, undotted tag names are reported (`<Hero>`, `<Hero />`,
//! `</Hero>`); other elements are walked for their children.

use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    SelfClosing,
    Close,
}

/// One tag occurrence as a byte range into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub kind: TagKind,
    pub start: usize,
    pub end: usize,
    /// The tag sits among an element's children rather than where a script
    /// expression is expected.
    pub in_children: bool,
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'.' | b'-' | b':')
}

/// Last non-whitespace byte before `at`, with its index.
fn previous_token(bytes: &[u8], at: usize) -> Option<(usize, u8)> {
    bytes[..at]
        .iter()
        .enumerate()
        .rev()
        .find(|(_, b)| !b.is_ascii_whitespace())
        .map(|(i, b)| (i, *b))
}

/// Keywords after which a `<` starts JSX.
const EXPRESSION_KEYWORDS: &[&str] = &["return", "default", "yield"];

fn ends_with_keyword(prefix: &str) -> bool {
    EXPRESSION_KEYWORDS.iter().any(|kw| {
        prefix.ends_with(kw)
            && !prefix[..prefix.len() - kw.len()]
                .bytes()
                .next_back()
                .is_some_and(is_ident_byte)
    })
}

/// Whether a `<` at `at` in script follows a value, making it an operator.
fn follows_value(source: &str, at: usize) -> bool {
    previous_token(source.as_bytes(), at).is_some_and(|(idx, p)| {
        matches!(p, b')' | b']' | b'.')
            || (is_ident_byte(p) && !ends_with_keyword(&source[..=idx]))
    })
}

/// Component names are capitalized identifiers without member access.
fn is_component_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase())
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tags: Vec<Tag>,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tags: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    /// Skip a quoted string starting at the current quote.
    fn skip_string(&mut self, quote: u8) {
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            self.pos += 1;
            if b == b'\\' {
                self.pos += 1;
            } else if b == quote {
                return;
            }
        }
    }

    /// Skip a template literal, scanning its `${...}` substitutions as script.
    fn skip_template(&mut self) {
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    return;
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.script(true);
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Scan script until the end of input, or until an unbalanced `}` when
    /// `nested` (the brace is consumed).
    fn script(&mut self, nested: bool) {
        let mut depth = 0usize;
        while let Some(b) = self.peek(0) {
            match b {
                b'"' | b'\'' => self.skip_string(b),
                b'`' => self.skip_template(),
                b'/' if self.peek(1) == Some(b'/') => {
                    while self.peek(0).is_some_and(|c| c != b'\n') {
                        self.pos += 1;
                    }
                }
                b'/' if self.peek(1) == Some(b'*') => {
                    self.pos += 2;
                    while self.pos < self.bytes.len()
                        && !self.bytes[self.pos..].starts_with(b"*/")
                    {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.bytes.len());
                }
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' => {
                    self.pos += 1;
                    if depth == 0 {
                        if nested {
                            return;
                        }
                    } else {
                        depth -= 1;
                    }
                }
                b'<' if !follows_value(self.source, self.pos) => {
                    if !self.element(false) {
                        self.pos += 1;
                    }
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Scan children until the closing tag of the enclosing element.
    fn children(&mut self) {
        while let Some(b) = self.peek(0) {
            match b {
                b'{' => {
                    self.pos += 1;
                    self.script(true);
                }
                b'<' if self.peek(1) == Some(b'/') => {
                    self.close_tag();
                    return;
                }
                b'<' => {
                    if !self.element(true) {
                        self.pos += 1;
                    }
                }
                _ => self.pos += 1,
            }
        }
    }

    fn close_tag(&mut self) {
        let source = self.source;
        let start = self.pos;
        let name_start = start + 2;
        let mut end = name_start;
        while self.bytes.get(end).copied().is_some_and(is_name_byte) {
            end += 1;
        }
        let name = &source[name_start..end];
        let mut j = end;
        while self.bytes.get(j).is_some_and(u8::is_ascii_whitespace) {
            j += 1;
        }
        if self.bytes.get(j) != Some(&b'>') {
            // Not a well-formed close tag; treat the element as ended here.
            self.pos = start + 2;
            return;
        }
        if is_component_name(name) {
            self.tags.push(Tag {
                name: name.to_string(),
                kind: TagKind::Close,
                start,
                end: j + 1,
                in_children: true,
            });
        }
        self.pos = j + 1;
    }

    /// Parse an element starting at the current `<`. On failure nothing is
    /// recorded and the position is restored.
    fn element(&mut self, in_children: bool) -> bool {
        let source = self.source;
        let start = self.pos;
        let recorded = self.tags.len();
        let name_start = start + 1;
        let mut name_end = name_start;
        while self.bytes.get(name_end).copied().is_some_and(is_name_byte) {
            name_end += 1;
        }
        let name = &source[name_start..name_end];
        let fragment = name.is_empty() && self.bytes.get(name_end) == Some(&b'>');
        let well_formed = fragment
            || (name.starts_with(|c: char| c.is_ascii_alphabetic())
                && self
                    .bytes
                    .get(name_end)
                    .is_some_and(|b| b.is_ascii_whitespace() || matches!(b, b'/' | b'>')));
        if !well_formed {
            return false;
        }

        let report = is_component_name(name);
        if report {
            self.tags.push(Tag {
                name: name.to_string(),
                kind: TagKind::Open,
                start,
                end: start,
                in_children,
            });
        }

        self.pos = name_end;
        let self_closing = loop {
            let Some(b) = self.peek(0) else {
                self.tags.truncate(recorded);
                self.pos = start;
                return false;
            };
            match b {
                b'>' => {
                    self.pos += 1;
                    break false;
                }
                b'/' if self.peek(1) == Some(b'>') => {
                    self.pos += 2;
                    break true;
                }
                b'{' => {
                    self.pos += 1;
                    self.script(true);
                }
                b'"' | b'\'' => self.skip_string(b),
                _ => self.pos += 1,
            }
        };

        if report {
            let tag = &mut self.tags[recorded];
            tag.end = self.pos;
            if self_closing {
                tag.kind = TagKind::SelfClosing;
            }
        }
        if !self_closing {
            self.children();
        }
        true
    }
}

/// Every component tag in `source`, in order. Tags nested inside another
/// tag's attributes are included.
pub fn scan_tags(source: &str) -> Vec<Tag> {
    let mut scanner = Scanner::new(source);
    scanner.script(false);
    scanner.tags
}

/// Distinct component names used as tags.
pub fn component_names(source: &str) -> BTreeSet<String> {
    scan_tags(source)
        .into_iter()
        .filter(|t| t.kind != TagKind::Close)
        .map(|t| t.name)
        .collect()
}

/// Remove every usage of the named components.
///
/// Self-closing tags disappear (or become `null` where an expression is
/// required). Paired tags become a fragment so their children survive.
pub fn remove_components(source: &str, names: &HashSet<String>) -> String {
    if names.is_empty() {
        return source.to_string();
    }
    let tags: Vec<Tag> = scan_tags(source)
        .into_iter()
        .filter(|t| names.contains(&t.name))
        .collect();

    // Pair opens with closes per name.
    let mut replacements: Vec<(usize, usize, &'static str)> = Vec::new();
    let mut open_stack: Vec<&Tag> = Vec::new();
    for tag in &tags {
        match tag.kind {
            TagKind::SelfClosing => {
                let with = if tag.in_children { "" } else { "null" };
                replacements.push((tag.start, tag.end, with));
            }
            TagKind::Open => open_stack.push(tag),
            TagKind::Close => {
                if let Some(pos) = open_stack.iter().rposition(|o| o.name == tag.name) {
                    let open = open_stack.remove(pos);
                    replacements.push((open.start, open.end, "<>"));
                    replacements.push((tag.start, tag.end, "</>"));
                } else {
                    replacements.push((tag.start, tag.end, ""));
                }
            }
        }
    }
    for unmatched in open_stack {
        replacements.push((unmatched.start, unmatched.end, ""));
    }

    replacements.sort_by_key(|(start, _, _)| *start);
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for (start, end, with) in replacements {
        // Skip spans inside an already replaced tag.
        if start < cursor {
            continue;
        }
        out.push_str(&source[cursor..start]);
        out.push_str(with);
        cursor = end;
    }
    out.push_str(&source[cursor..]);
    out
}
