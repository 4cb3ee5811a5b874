//! Detect component files cut off by the model's token limit.
//!
//! The check only looks at the last non-blank line. A file is usable when
//! that line ends in `}`, `)`, `;`, or `/>`, or is an `export default Name`
//! statement. Anything else (a half-written JSX attribute, a dangling
//! expression) marks the file as truncated.

use regex::Regex;
use std::sync::LazyLock;

static DEFAULT_EXPORT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^export\s+default\s+[A-Za-z_$][\w$]*;?$").unwrap());

const TERMINATORS: &[&str] = &["}", ")", ";", "/>"];

pub fn is_truncated(source: &str) -> bool {
    let Some(last) = source.lines().rev().map(str::trim).find(|l| !l.is_empty()) else {
        return true;
    };
    if TERMINATORS.iter().any(|t| last.ends_with(t)) {
        return false;
    }
    !DEFAULT_EXPORT_LINE.is_match(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_sources() {
        assert!(!is_truncated("export default function Hero() {\n  return null;\n}\n"));
        assert!(!is_truncated("const Hero = () => <div />;\n\nexport default Hero"));
        assert!(!is_truncated("export const links = [1, 2, 3];\n\n"));
        assert!(!is_truncated("  <Footer />"));
    }

    #[test]
    fn test_truncated_sources() {
        assert!(is_truncated(""));
        assert!(is_truncated("   \n\n"));
        assert!(is_truncated(
            "export default function Pricing() {\n  return (\n    <div className=\"grid"
        ));
        assert!(is_truncated("const items = [\n  { name: 'Basic', price: 9 },"));
    }

    #[test]
    fn test_bare_identifier_is_truncated() {
        // A trailing expression statement is not a recognized ending.
        assert!(is_truncated("function f() {}\nf"));
    }
}
