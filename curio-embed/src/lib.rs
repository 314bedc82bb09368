//! curio-embed: embedding generation for the Curio retrieval pipeline.
//!
//! Defines the [`EmbeddingProvider`] contract the indexing and retrieval
//! sides depend on, plus two implementations:
//!
//! - [`FastEmbedProvider`]: local ONNX models via fastembed (the default
//!   deployment provider).
//! - [`HashEmbeddingProvider`]: deterministic token-hash vectors for tests
//!   and offline environments.
//!
//! Providers never retry: a failed embedding call propagates to the caller,
//! and the indexing job queue owns retry policy.

pub mod config;
pub mod error;
pub mod provider;

pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, EmbeddingResult, FastEmbedProvider, HashEmbeddingProvider};
