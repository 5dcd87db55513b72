//! Heading-aware markdown chunking.
//!
//! A document is split along level-2 headings. Each section becomes one
//! chunk prefixed with `"{title} — {heading}"`; sections that do not fit the
//! size limit are re-split at paragraph boundaries, every piece carrying the
//! same prefix. Fenced code blocks are opaque: a `## ` line inside a fence
//! is not a heading and a fence is never split.

use crate::types::{Chunk, ChunkId, Document};
use regex::Regex;
use std::sync::LazyLock;

/// Heading used for content before the first H2.
pub const INTRODUCTION_HEADING: &str = "Introduction";

/// Default chunk size limit in characters.
pub const DEFAULT_MAX_CHARS: usize = 1500;

static H2_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##[ \t]+(\S.*?)[ \t]*$").expect("valid regex"));

/// A level-2 section of a document.
#[derive(Debug, Clone, PartialEq)]
struct Section {
    heading: String,
    body: String,
}

/// Splits documents into chunks no longer than `max_chars` characters
/// (unless a single paragraph is longer on its own).
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl Chunker {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Chunk a document. Deterministic: the same document always yields the
    /// same chunks.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for section in split_sections(&document.body) {
            let paragraphs = split_paragraphs(&section.body);
            if paragraphs.is_empty() {
                continue;
            }

            let prefix = format!("{} — {}\n\n", document.title, section.heading);
            for body in self.pack(&prefix, &paragraphs) {
                let id = ChunkId::new(document.id.clone(), chunks.len());
                chunks.push(Chunk::new(
                    id,
                    section.heading.clone(),
                    format!("{}{}", prefix, body),
                ));
            }
        }

        tracing::debug!(
            "Chunked {} into {} chunks (max {} chars)",
            document.id,
            chunks.len(),
            self.max_chars
        );

        chunks
    }

    /// Greedily pack paragraphs into bodies whose prefixed length stays
    /// within the limit. A paragraph that does not fit on its own gets a
    /// body to itself.
    fn pack(&self, prefix: &str, paragraphs: &[String]) -> Vec<String> {
        let prefix_len = char_len(prefix);
        let mut bodies = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for paragraph in paragraphs {
            let paragraph_len = char_len(paragraph);

            if current.is_empty() {
                current.push_str(paragraph);
                current_len = paragraph_len;
                continue;
            }

            // +2 for the blank line joining paragraphs
            if prefix_len + current_len + 2 + paragraph_len <= self.max_chars {
                current.push_str("\n\n");
                current.push_str(paragraph);
                current_len += 2 + paragraph_len;
            } else {
                bodies.push(std::mem::take(&mut current));
                current.push_str(paragraph);
                current_len = paragraph_len;
            }
        }

        if !current.is_empty() {
            bodies.push(current);
        }

        bodies
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// A fence delimiter: the fence character, the length of its run, and
/// whatever follows the run on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FenceMarker<'a> {
    ch: char,
    len: usize,
    rest: &'a str,
}

/// Parse a fence delimiter (three or more backticks or tildes, indented by
/// at most three spaces).
fn fence_marker(line: &str) -> Option<FenceMarker<'_>> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }

    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == ch).count();
    if len < 3 {
        return None;
    }

    // both fence characters are ASCII, so `len` is also a byte offset
    Some(FenceMarker {
        ch,
        len,
        rest: &trimmed[len..],
    })
}

/// Tracks whether we are inside a fenced code block while scanning lines.
///
/// A fence closes only on a run of the same character at least as long as
/// the opening run, with nothing but whitespace after it.
#[derive(Debug, Default)]
struct FenceState {
    open: Option<(char, usize)>,
}

impl FenceState {
    /// Feed a line; returns true if the line belongs to a fence (including
    /// the fence delimiters themselves).
    fn observe(&mut self, line: &str) -> bool {
        match (self.open, fence_marker(line)) {
            (None, Some(marker)) => {
                // a backtick info string may not itself contain backticks
                if marker.ch == '`' && marker.rest.contains('`') {
                    return false;
                }
                self.open = Some((marker.ch, marker.len));
                true
            }
            (Some((ch, len)), Some(marker))
                if marker.ch == ch && marker.len >= len && marker.rest.trim().is_empty() =>
            {
                self.open = None;
                true
            }
            (Some(_), _) => true,
            (None, None) => false,
        }
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }
}

/// Split a markdown body into H2 sections.
fn split_sections(body: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut heading = INTRODUCTION_HEADING.to_string();
    let mut lines: Vec<&str> = Vec::new();
    let mut fence = FenceState::default();

    for line in body.lines() {
        let in_fence = fence.observe(line);

        if !in_fence {
            if let Some(caps) = H2_HEADING.captures(line) {
                sections.push(Section {
                    heading: std::mem::replace(&mut heading, caps[1].to_string()),
                    body: lines.join("\n"),
                });
                lines.clear();
                continue;
            }
        }

        lines.push(line);
    }

    sections.push(Section {
        heading,
        body: lines.join("\n"),
    });

    sections
}

/// Split a section body into paragraphs. Blank lines separate paragraphs
/// except inside fenced code blocks, which always stay whole.
fn split_paragraphs(body: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    let mut fence = FenceState::default();

    for line in body.lines() {
        let was_open = fence.is_open();
        let in_fence = fence.observe(line);

        if !in_fence && !was_open && line.trim().is_empty() {
            if !lines.is_empty() {
                paragraphs.push(lines.join("\n"));
                lines.clear();
            }
            continue;
        }

        lines.push(line);
    }

    if !lines.is_empty() {
        paragraphs.push(lines.join("\n"));
    }

    paragraphs
        .into_iter()
        .map(|p| p.trim_end().to_string())
        .filter(|p| !p.trim().is_empty())
        .collect()
}
