//! Chunking strategies.
//!
//! A [`ChunkStrategy`] is a closed set of pure splitting functions selected
//! by tag; every strategy takes the same `(document, options)` contract and
//! produces an ordered, contiguously indexed sequence of [`Chunk`]s.
//!
//! - **fixed**: sliding character window with sentence/word-aligned cuts.
//! - **semantic**: paragraph accumulation with a sentence-aligned overlap
//!   bridge between consecutive chunks, preceded by a summary chunk.
//! - **section**: one chunk per pre-parsed section, oversized sections
//!   split with the semantic accumulation rule.
//! - **hybrid** (default): summary chunk first, then per-section chunking,
//!   falling back to semantic when the document has no sections.
//!
//! Malformed input (empty text, missing sections) degrades to whole-text
//! fallbacks rather than failing; none of these functions return errors.

use crate::chunk::{Chunk, ChunkKind, Document, Section};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// How many characters of the raw text lead the summary chunk.
const SUMMARY_HEAD_CHARS: usize = 500;
/// How many section titles the summary chunk lists.
const SUMMARY_SECTION_TITLES: usize = 10;

/// Strategy tag selecting one of the splitting functions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    Fixed,
    Semantic,
    Section,
    #[default]
    Hybrid,
}

/// Tuning knobs shared by all strategies.
#[derive(Debug, Clone)]
pub struct ChunkOptions {
    pub strategy: ChunkStrategy,
    /// Upper bound on chunk text length in bytes (summary chunk excepted).
    pub chunk_size: usize,
    /// Back-reference shared between consecutive chunks.
    pub overlap: usize,
    /// Safety bound on the number of chunks per document.
    pub max_chunks: usize,
    /// Whether `section`/`hybrid` honor pre-parsed sections.
    pub preserve_sections: bool,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::default(),
            chunk_size: 1000,
            overlap: 100,
            max_chunks: 100,
            preserve_sections: true,
        }
    }
}

impl ChunkOptions {
    pub fn with_strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks.max(1);
        self
    }

    pub fn with_preserve_sections(mut self, preserve: bool) -> Self {
        self.preserve_sections = preserve;
        self
    }
}

/// Split a document into ordered chunks using the configured strategy.
///
/// Chunk indices are contiguous starting at 0 and the result never exceeds
/// `options.max_chunks`.
pub fn chunk(document: &Document, options: &ChunkOptions) -> Vec<Chunk> {
    let mut chunks = match options.strategy {
        ChunkStrategy::Fixed => chunk_fixed(document, options),
        ChunkStrategy::Semantic => chunk_semantic(document, options),
        ChunkStrategy::Section => chunk_section(document, options),
        ChunkStrategy::Hybrid => chunk_hybrid(document, options),
    };
    chunks.truncate(options.max_chunks);
    chunks
}

/// Sliding-window chunking over the raw text.
///
/// Each window is `chunk_size` bytes with `overlap` bytes of back-reference.
/// A window boundary is pulled back to the nearest sentence end inside the
/// last 30% of the window, else to the nearest word boundary inside the
/// last 20%, so chunks do not cut mid-word.
fn chunk_fixed(document: &Document, options: &ChunkOptions) -> Vec<Chunk> {
    let text = document.text.as_str();
    let mut chunks = Vec::new();
    if text.trim().is_empty() {
        return chunks;
    }

    let size = options.chunk_size.max(1);
    let mut start = 0usize;
    while start < text.len() && chunks.len() < options.max_chunks {
        let mut end = floor_char_boundary(text, (start + size).min(text.len()));
        if end < text.len() {
            end = adjust_window_end(text, start, end);
        }

        let index = chunks.len();
        chunks.push(Chunk::new(
            index,
            ChunkKind::Fixed,
            format!("Part {}", index + 1),
            text[start..end].to_string(),
        ));

        if end >= text.len() {
            break;
        }
        let mut next = floor_char_boundary(text, end.saturating_sub(options.overlap));
        if next <= start {
            next = end;
        }
        start = next;
    }
    chunks
}

/// Pull a window end back to a sentence or word boundary.
fn adjust_window_end(text: &str, start: usize, end: usize) -> usize {
    let window = &text[start..end];

    // Sentence end inside the last 30% of the window.
    let sentence_floor = window.len().saturating_sub(window.len() * 3 / 10);
    if let Some(m) = sentence_end_regex()
        .find_iter(window)
        .filter(|m| m.end() >= sentence_floor)
        .last()
    {
        return start + m.end();
    }

    // Word boundary inside the last 20%.
    let word_floor = window.len().saturating_sub(window.len() / 5);
    if let Some((idx, c)) = window
        .char_indices()
        .rev()
        .find(|(idx, c)| c.is_whitespace() && *idx >= word_floor && *idx > 0)
    {
        return start + idx + c.len_utf8();
    }

    end
}

fn sentence_end_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s").expect("valid sentence-end pattern"))
}

/// Paragraph-accumulation chunking with a leading summary chunk.
fn chunk_semantic(document: &Document, options: &ChunkOptions) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    if document.text.trim().is_empty()
        && document.sections.is_empty()
        && document.meta.is_empty()
    {
        return chunks;
    }

    chunks.push(summary_chunk(document));
    push_content_chunks(&document.text, options, &mut chunks);
    chunks
}

/// One chunk per pre-parsed section; falls back to `semantic` when the
/// document exposes no sections.
fn chunk_section(document: &Document, options: &ChunkOptions) -> Vec<Chunk> {
    if document.sections.is_empty() || !options.preserve_sections {
        return chunk_semantic(document, options);
    }
    let mut chunks = Vec::new();
    push_section_chunks(&document.sections, options, &mut chunks);
    chunks
}

/// Default strategy: summary chunk first, then section-aware chunking with
/// a semantic fallback for unstructured documents.
fn chunk_hybrid(document: &Document, options: &ChunkOptions) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    if document.text.trim().is_empty()
        && document.sections.is_empty()
        && document.meta.is_empty()
    {
        return chunks;
    }

    chunks.push(summary_chunk(document));
    if !document.sections.is_empty() && options.preserve_sections {
        push_section_chunks(&document.sections, options, &mut chunks);
    } else {
        push_content_chunks(&document.text, options, &mut chunks);
    }
    chunks
}

/// Build the leading summary chunk: metadata line, section listing, and the
/// first [`SUMMARY_HEAD_CHARS`] characters of the raw text. Always index 0,
/// kind `Summary`, level 0; this is the one chunk allowed to exceed
/// `chunk_size` slightly.
fn summary_chunk(document: &Document) -> Chunk {
    let mut lines: Vec<String> = Vec::new();

    let mut meta_parts: Vec<String> = Vec::new();
    if let Some(title) = &document.meta.title {
        meta_parts.push(format!("Title: {title}"));
    }
    if let Some(author) = &document.meta.author {
        meta_parts.push(format!("Author: {author}"));
    }
    if let Some(subject) = &document.meta.subject {
        meta_parts.push(format!("Subject: {subject}"));
    }
    if !meta_parts.is_empty() {
        lines.push(meta_parts.join(" "));
    }

    if !document.sections.is_empty() {
        let titles: Vec<&str> = document
            .sections
            .iter()
            .take(SUMMARY_SECTION_TITLES)
            .map(|s| s.title.as_str())
            .collect();
        lines.push(format!("Sections: {}", titles.join(", ")));
    }

    let head_end = floor_char_boundary(&document.text, document.text.len().min(SUMMARY_HEAD_CHARS));
    let head = document.text[..head_end].trim();
    if !head.is_empty() {
        lines.push(head.to_string());
    }

    Chunk::new(0, ChunkKind::Summary, "Summary", lines.join("\n"))
}

/// Append `Content` chunks produced by paragraph accumulation.
fn push_content_chunks(text: &str, options: &ChunkOptions, out: &mut Vec<Chunk>) {
    for piece in accumulate_paragraphs(text, options.chunk_size, options.overlap) {
        if out.len() >= options.max_chunks {
            break;
        }
        let index = out.len();
        out.push(Chunk::new(index, ChunkKind::Content, "Content", piece));
    }
}

/// Append section chunks: whole sections that fit, `{title} (Part k)`
/// sub-chunks for oversized sections.
fn push_section_chunks(sections: &[Section], options: &ChunkOptions, out: &mut Vec<Chunk>) {
    for section in sections {
        if out.len() >= options.max_chunks {
            break;
        }
        let content = section.content.trim();
        if content.is_empty() {
            continue;
        }

        if content.len() <= options.chunk_size {
            let index = out.len();
            out.push(
                Chunk::new(index, ChunkKind::Section, section.title.clone(), content.to_string())
                    .with_page(section.page)
                    .with_level(section.level),
            );
        } else {
            for (k, piece) in accumulate_paragraphs(content, options.chunk_size, options.overlap)
                .into_iter()
                .enumerate()
            {
                if out.len() >= options.max_chunks {
                    break;
                }
                let index = out.len();
                out.push(
                    Chunk::new(
                        index,
                        ChunkKind::SectionPart,
                        format!("{} (Part {})", section.title, k + 1),
                        piece,
                    )
                    .with_page(section.page)
                    .with_level(section.level),
                );
            }
        }
    }
}

/// Accumulate blank-line paragraphs into chunk-sized buffers, seeding each
/// new buffer with the sentence-aligned overlap tail of the previous one.
///
/// Paragraphs longer than the budget are pre-split at word boundaries so
/// that a seeded buffer (tail + separator + paragraph) never exceeds
/// `chunk_size`.
fn accumulate_paragraphs(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let max_para = chunk_size.saturating_sub(overlap + 2).max(1);

    let mut paragraphs: Vec<String> = Vec::new();
    for para in text.split("\n\n") {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }
        if para.len() <= max_para {
            paragraphs.push(para.to_string());
        } else {
            paragraphs.extend(split_at_word_boundaries(para, max_para));
        }
    }

    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    for para in paragraphs {
        if !buf.is_empty() && buf.len() + 2 + para.len() > chunk_size {
            let tail = overlap_tail(&buf, overlap);
            out.push(std::mem::take(&mut buf));
            buf = tail;
        }
        if !buf.is_empty() {
            buf.push_str("\n\n");
        }
        buf.push_str(&para);
    }
    if !buf.trim().is_empty() {
        out.push(buf);
    }
    out
}

/// The overlap bridge between consecutive chunks: the trailing `overlap`
/// bytes of the previous chunk, trimmed to start just after the first
/// `". "` terminator when that terminator lies in the first half of the
/// tail window. The result is always a suffix of the input.
fn overlap_tail(text: &str, overlap: usize) -> String {
    if overlap == 0 || text.is_empty() {
        return String::new();
    }
    let start = floor_char_boundary(text, text.len().saturating_sub(overlap));
    let tail = &text[start..];
    if let Some(pos) = tail.find(". ") {
        if pos < tail.len() / 2 {
            return tail[pos + 2..].to_string();
        }
    }
    tail.to_string()
}

/// Hard-split an oversized paragraph at word boundaries into consecutive
/// pieces no longer than `max_len`.
fn split_at_word_boundaries(text: &str, max_len: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut start = 0usize;
    while start < text.len() {
        let mut end = floor_char_boundary(text, (start + max_len).min(text.len()));
        if end < text.len() {
            let window = &text[start..end];
            if let Some((idx, c)) = window
                .char_indices()
                .rev()
                .find(|(idx, c)| c.is_whitespace() && *idx > 0)
            {
                end = start + idx + c.len_utf8();
            }
        }
        if end <= start {
            break;
        }
        let piece = text[start..end].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        start = end;
    }
    pieces
}

/// Largest index `<= i` that falls on a char boundary of `text`.
fn floor_char_boundary(text: &str, mut i: usize) -> usize {
    if i >= text.len() {
        return text.len();
    }
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}
