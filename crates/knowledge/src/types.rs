//! Document and chunk types.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Identifier of a markdown document: its path relative to the docs
/// directory, with `/` separators (e.g. `onboarding.md`, `guides/testing.md`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path component, e.g. `testing.md` for `guides/testing.md`.
    pub fn filename(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A markdown document loaded from the docs directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,

    /// Human-readable title derived from the filename
    pub title: String,

    /// Raw markdown body
    pub body: String,
}

impl Document {
    /// Create a document, deriving the title from the id's filename.
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        let id = DocumentId::new(id);
        let title = title_from_filename(id.filename());
        Self {
            id,
            title,
            body: body.into(),
        }
    }
}

/// `first-week-playbook.md` becomes `First Week Playbook`.
pub fn title_from_filename(filename: &str) -> String {
    let stem = filename.strip_suffix(".md").unwrap_or(filename);

    stem.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Identifier of a chunk: owning document plus position within it.
///
/// Displays as `"{document_id}::chunk{index}"` and parses back from that
/// form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkId {
    pub document_id: DocumentId,
    pub index: usize,
}

const CHUNK_ID_SEPARATOR: &str = "::chunk";

impl ChunkId {
    pub fn new(document_id: DocumentId, index: usize) -> Self {
        Self { document_id, index }
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.document_id, CHUNK_ID_SEPARATOR, self.index)
    }
}

impl FromStr for ChunkId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (document, index) = s
            .rsplit_once(CHUNK_ID_SEPARATOR)
            .ok_or_else(|| format!("Malformed chunk id: {}", s))?;

        if document.is_empty() {
            return Err(format!("Chunk id has no document: {}", s));
        }

        let index = index
            .parse::<usize>()
            .map_err(|e| format!("Malformed chunk index in {}: {}", s, e))?;

        Ok(Self::new(DocumentId::new(document), index))
    }
}

/// A retrievable passage of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,

    /// Section heading, `Introduction` for content before the first H2
    pub heading: String,

    /// Heading prefix followed by the section body
    pub text: String,

    /// SHA-256 of `text`, lowercase hex
    pub hash: String,
}

impl Chunk {
    pub fn new(id: ChunkId, heading: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let hash = content_hash(&text);
        Self {
            id,
            heading: heading.into(),
            text,
            hash,
        }
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.id.document_id
    }

    pub fn index(&self) -> usize {
        self.id.index
    }
}

/// SHA-256 of a text as lowercase hex.
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Summary of an ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// Number of documents processed
    pub documents: usize,

    /// Number of chunks stored
    pub chunks: usize,

    /// Total markdown bytes read
    pub bytes: u64,

    /// Embedding model recorded in the index
    pub embedding_model: String,

    pub duration_secs: f64,
}
