//! JSON extraction and schema validation for model-produced documents.
//!
//! The design-system and blueprint stages ask the model for a single JSON
//! document. Models wrap it in prose, code fences, or `<think>` blocks often
//! enough that extraction has to be tolerant; validation, on the other hand,
//! is strict and never falls back to defaults.

use serde::de::DeserializeOwned;

/// A model document failed to parse or to satisfy its schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{document}: response contained no JSON object")]
    NoJson { document: &'static str },
    #[error("{document}: malformed JSON: {source}")]
    Malformed {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{document}: {reason}")]
    Invalid {
        document: &'static str,
        reason: String,
    },
}

impl SchemaError {
    pub fn invalid(document: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            document,
            reason: reason.into(),
        }
    }
}

/// Semantic checks that run after a document deserializes.
pub trait Validate {
    /// Name used in error messages ("design system", "blueprint").
    const DOCUMENT: &'static str;

    /// Repair harmless deviations in model output before validation.
    fn normalize(&mut self) {}

    fn validate(&self) -> Result<(), SchemaError>;
}

/// Extract, deserialize, normalize, and validate a document from raw model
/// output.
pub fn parse_document<T: DeserializeOwned + Validate>(text: &str) -> Result<T, SchemaError> {
    let json = extract_json(text).ok_or(SchemaError::NoJson {
        document: T::DOCUMENT,
    })?;
    let mut doc: T = serde_json::from_str(json).map_err(|source| SchemaError::Malformed {
        document: T::DOCUMENT,
        source,
    })?;
    doc.normalize();
    doc.validate()?;
    Ok(doc)
}

/// Locate the JSON object in a model response.
///
/// Tries, in order: the whole trimmed text, a ```json fence, any fence, and
/// finally the span from the first `{` to the last `}`.
pub fn extract_json(text: &str) -> Option<&str> {
    let text = skip_think_blocks(text).trim();
    if text.starts_with('{') && text.ends_with('}') {
        return Some(text);
    }

    for opener in ["```json", "```"] {
        if let Some(start) = text.find(opener) {
            let after = &text[start + opener.len()..];
            if let Some(end) = after.find("```") {
                let inner = after[..end].trim();
                if inner.starts_with('{') {
                    return Some(inner);
                }
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Return the text after the last closed `<think>...</think>` block.
///
/// Unclosed think blocks leave nothing usable, so they yield an empty string.
fn skip_think_blocks(text: &str) -> &str {
    let mut rest = text;
    while let Some(start) = rest.find("<think>") {
        match rest[start..].find("</think>") {
            Some(end_offset) => {
                let end = start + end_offset + "</think>".len();
                // Anything before the block is preamble; keep only what follows.
                rest = &rest[end..];
            }
            None => return "",
        }
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Doc {
        name: String,
    }

    impl Validate for Doc {
        const DOCUMENT: &'static str = "doc";

        fn validate(&self) -> Result<(), SchemaError> {
            if self.name.is_empty() {
                return Err(SchemaError::invalid(Self::DOCUMENT, "name is empty"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_extract_plain() {
        assert_eq!(extract_json(" {\"a\":1} "), Some("{\"a\":1}"));
    }

    #[test]
    fn test_extract_fenced() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nEnjoy";
        assert_eq!(extract_json(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_embedded_in_prose() {
        let text = "Sure! {\"a\": {\"b\": 2}} hope that helps";
        assert_eq!(extract_json(text), Some("{\"a\": {\"b\": 2}}"));
    }

    #[test]
    fn test_extract_skips_think() {
        let text = "<think>maybe {\"x\": 0}</think>{\"a\": 1}";
        assert_eq!(extract_json(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("<think>{\"a\":1}"), None);
    }

    #[test]
    fn test_parse_document_validates() {
        let doc: Doc = parse_document("{\"name\": \"ok\"}").unwrap();
        assert_eq!(doc.name, "ok");

        let err = parse_document::<Doc>("{\"name\": \"\"}").err().unwrap();
        assert!(matches!(err, SchemaError::Invalid { .. }));

        let err = parse_document::<Doc>("{\"other\": 1}").err().unwrap();
        assert!(err.to_string().contains("missing field `name`"));
    }
}
