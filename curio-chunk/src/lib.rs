//! curio-chunk: document chunking for the Curio retrieval pipeline.
//!
//! This crate turns an asset's extracted text into bounded, overlapping,
//! typed segments suitable for independent embedding and retrieval. It is
//! pure and synchronous: no I/O, no async, no collaborator calls.
//!
//! ```
//! use curio_chunk::{chunk, ChunkOptions, Document, Section};
//!
//! let document = Document::from_text("Quarterly figures improved across the board.")
//!     .with_sections(vec![Section::new("Overview", "Figures improved.")]);
//! let chunks = chunk(&document, &ChunkOptions::default());
//!
//! assert_eq!(chunks[0].index, 0); // leading summary chunk
//! ```

pub mod chunk;
pub mod strategy;

pub use chunk::{word_count, Chunk, ChunkKind, Document, DocumentMeta, Section};
pub use strategy::{chunk, ChunkOptions, ChunkStrategy};
