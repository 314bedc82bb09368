//! Core data model for document chunking.
//!
//! A [`Document`] is the chunker's input: the extracted text of an asset,
//! optionally accompanied by pre-parsed [`Section`]s and document-level
//! metadata. The chunker's output is an ordered sequence of [`Chunk`]s,
//! each carrying its position, a type tag, and a word count used by
//! downstream relevance heuristics.

use serde::{Deserialize, Serialize};

/// The type tag attached to every produced chunk.
///
/// Retrieval consumers use this to distinguish a document-level overview
/// (`Summary`) from section-scoped content (`Section`/`SectionPart`) and
/// from strategy-agnostic body chunks (`Content`/`Fixed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    /// Leading overview chunk: metadata line, section listing, text head.
    Summary,
    /// One whole pre-parsed section.
    Section,
    /// A split piece of an oversized section (`{title} (Part k)`).
    SectionPart,
    /// Paragraph-accumulated body content (semantic strategy).
    Content,
    /// A sliding-window slice (fixed strategy).
    Fixed,
}

impl ChunkKind {
    /// Stable string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Summary => "summary",
            ChunkKind::Section => "section",
            ChunkKind::SectionPart => "section_part",
            ChunkKind::Content => "content",
            ChunkKind::Fixed => "fixed",
        }
    }
}

/// A bounded, ordered fragment of a document's text.
///
/// Within one chunking run, `index` values are contiguous starting at 0.
/// Every chunk's text length stays within the configured chunk size except
/// the leading summary chunk, which may exceed it slightly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// 0-based position within the chunking run.
    pub index: usize,
    pub kind: ChunkKind,
    /// Human-readable label (section title, part label, or "Summary").
    pub title: String,
    /// Source page hint, carried over from the originating section.
    pub page: Option<u32>,
    /// Nesting level of the originating section (0 for top level).
    pub level: u32,
    /// Whitespace-token count of `text`.
    pub word_count: usize,
    pub text: String,
}

impl Chunk {
    pub fn new(index: usize, kind: ChunkKind, title: impl Into<String>, text: String) -> Self {
        let word_count = word_count(&text);
        Self {
            index,
            kind,
            title: title.into(),
            page: None,
            level: 0,
            word_count,
            text,
        }
    }

    pub fn with_page(mut self, page: Option<u32>) -> Self {
        self.page = page;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }
}

/// A pre-parsed section of a document (title/content/page/level).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
    pub page: Option<u32>,
    pub level: u32,
}

impl Section {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            page: None,
            level: 0,
        }
    }
}

/// Document-level metadata surfaced in the summary chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

impl DocumentMeta {
    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.subject.is_none()
    }
}

/// The chunker's input: extracted text plus optional structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub sections: Vec<Section>,
    pub meta: DocumentMeta,
}

impl Document {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_sections(mut self, sections: Vec<Section>) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_meta(mut self, meta: DocumentMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// Count non-empty whitespace-separated tokens in trimmed text.
pub fn word_count(text: &str) -> usize {
    text.trim().split_whitespace().filter(|t| !t.is_empty()).count()
}
