//! Incremental extraction of fenced file blocks from streamed model output.
//!
//! The model writes each file as
//!
//! ````text
//! ```tsx:src/components/Hero.tsx
//! export default function Hero() { ... }
//! ```
//! ````
//!
//! Deltas arrive split at arbitrary byte positions, so extraction is a pure
//! function over `(remainder, chunk)`: it returns every block completed in the
//! concatenation and the text after the last completed block, which the next
//! call rescans. [`BlockStream`] layers the run-scoped "seen paths" set on top.

use sitegen_core::files::{Block, normalize_path};
use std::collections::HashSet;

const FENCE: &str = "```";

/// Result of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Blocks completed in this pass, in stream order.
    pub blocks: Vec<Block>,
    /// Text after the last completed block's closing fence.
    pub remainder: String,
}

/// A parsed opening fence.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    language: String,
    path: String,
    /// Byte offset just past the header's newline.
    content_start: usize,
}

enum HeaderScan {
    Valid(Header),
    /// Not a block header; keep scanning after the backticks.
    Invalid,
    /// The header line is not finished yet.
    Incomplete,
}

/// Scan the start of a fence at `at` for `lang:path\n`.
fn scan_header(buf: &str, at: usize) -> HeaderScan {
    let after = &buf[at + FENCE.len()..];
    let Some(newline) = after.find('\n') else {
        return HeaderScan::Incomplete;
    };
    let line = after[..newline].trim_end_matches('\r');
    let Some((language, path)) = line.split_once(':') else {
        return HeaderScan::Invalid;
    };
    let language_ok = !language.is_empty()
        && language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '.' | '-'));
    let path = path.trim();
    if !language_ok || path.is_empty() || path.contains('`') {
        return HeaderScan::Invalid;
    }
    HeaderScan::Valid(Header {
        language: language.to_string(),
        path: normalize_path(path),
        content_start: at + FENCE.len() + newline + 1,
    })
}

/// Offset of the closing fence for content starting at `content_start`.
/// A closing fence sits at the start of a line.
fn find_close(buf: &str, content_start: usize) -> Option<usize> {
    if buf[content_start..].starts_with(FENCE) {
        return Some(content_start);
    }
    buf[content_start..]
        .find("\n```")
        .map(|idx| content_start + idx + 1)
}

/// Extract every block completed by appending `chunk` to `prior_remainder`.
pub fn extract_blocks(prior_remainder: &str, chunk: &str) -> Extraction {
    let mut buf = String::with_capacity(prior_remainder.len() + chunk.len());
    buf.push_str(prior_remainder);
    buf.push_str(chunk);

    let mut blocks = Vec::new();
    let mut consumed = 0;
    let mut cursor = 0;

    // Outside a block: look for the next fence that opens one.
    while let Some(offset) = buf[cursor..].find(FENCE) {
        let at = cursor + offset;
        let header = match scan_header(&buf, at) {
            HeaderScan::Valid(header) => header,
            HeaderScan::Invalid => {
                cursor = at + FENCE.len();
                continue;
            }
            HeaderScan::Incomplete => break,
        };

        // Inside a block: wait for its closing fence.
        let Some(close) = find_close(&buf, header.content_start) else {
            break;
        };
        let content_end = if close > header.content_start {
            close - 1
        } else {
            close
        };
        blocks.push(Block {
            file_path: header.path,
            content: buf[header.content_start..content_end].to_string(),
            language: header.language,
        });
        consumed = close + FENCE.len();
        cursor = consumed;
    }

    Extraction {
        blocks,
        remainder: buf[consumed..].to_string(),
    }
}

/// Final pass at end of stream: close a block left open by a token limit.
pub fn finish_blocks(remainder: &str) -> Vec<Block> {
    if remainder.trim().is_empty() {
        return Vec::new();
    }
    let closing = if remainder.ends_with('\n') { "```" } else { "\n```" };
    extract_blocks(remainder, closing).blocks
}

/// Path of the block currently open at the end of `buf`, if its header is
/// complete.
fn open_block_path(buf: &str) -> Option<String> {
    let mut cursor = 0;
    let mut open = None;
    while let Some(offset) = buf[cursor..].find(FENCE) {
        let at = cursor + offset;
        match scan_header(buf, at) {
            HeaderScan::Valid(header) => match find_close(buf, header.content_start) {
                Some(close) => cursor = close + FENCE.len(),
                None => {
                    open = Some(header.path);
                    break;
                }
            },
            HeaderScan::Invalid => cursor = at + FENCE.len(),
            HeaderScan::Incomplete => break,
        }
    }
    open
}

/// Block extraction over one streaming phase.
///
/// Owns the remainder between chunks and the set of paths already emitted.
/// A path is emitted at most once; later blocks for it are dropped.
#[derive(Debug, Default)]
pub struct BlockStream {
    remainder: String,
    seen: HashSet<String>,
}

impl BlockStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one delta and return newly completed, never-seen blocks.
    pub fn push(&mut self, chunk: &str) -> Vec<Block> {
        let extraction = extract_blocks(&self.remainder, chunk);
        self.remainder = extraction.remainder;
        self.accept(extraction.blocks)
    }

    /// Flush at end of stream. Consumes the remainder.
    pub fn finish(&mut self) -> Vec<Block> {
        let remainder = std::mem::take(&mut self.remainder);
        let blocks = finish_blocks(&remainder);
        self.accept(blocks)
    }

    /// Path of the block still being streamed, if any.
    pub fn open_path(&self) -> Option<String> {
        open_block_path(&self.remainder)
    }

    pub fn has_seen(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    pub fn emitted(&self) -> usize {
        self.seen.len()
    }

    fn accept(&mut self, blocks: Vec<Block>) -> Vec<Block> {
        blocks
            .into_iter()
            .filter(|block| {
                let fresh = self.seen.insert(block.file_path.clone());
                if !fresh {
                    tracing::debug!(path = %block.file_path, "ignoring repeated block");
                }
                fresh
            })
            .collect()
    }
}
