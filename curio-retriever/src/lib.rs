//! curio-retriever: semantic indexing and retrieval for Curio assets.
//!
//! The crate wires four pieces together:
//!
//! - [`storage::AssetStore`]: read surface over the entity store that owns
//!   assets (documents, spreadsheets, images).
//! - [`vector::VectorIndex`]: the external similarity index the pipeline
//!   writes [`vector::VectorRecord`]s into.
//! - [`retrieval::pipeline::IndexingPipeline`] plus
//!   [`retrieval::worker::IndexWorker`]: background vectorization driven
//!   by a priority [`retrieval::job_queue::JobQueue`].
//! - [`retrieval::search::RetrievalEngine`]: owner-scoped similarity
//!   search over the indexed records.
//!
//! Chunking and embedding live in the sibling `curio-chunk` and
//! `curio-embed` crates.
//!
//! ```no_run
//! use std::sync::Arc;
//! use curio_embed::HashEmbeddingProvider;
//! use curio_retriever::retrieval::job_queue::JobQueue;
//! use curio_retriever::retrieval::pipeline::IndexingPipeline;
//! use curio_retriever::retrieval::search::{RetrievalEngine, SearchOptions};
//! use curio_retriever::retrieval::worker::IndexWorker;
//! use curio_retriever::storage::memory::MemoryAssetStore;
//! use curio_retriever::vector::memory::MemoryVectorIndex;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let store = Arc::new(MemoryAssetStore::new());
//! let index = Arc::new(MemoryVectorIndex::new());
//! let embedder = Arc::new(HashEmbeddingProvider::default());
//!
//! let pipeline = Arc::new(IndexingPipeline::new(
//!     Some(index.clone()),
//!     store.clone(),
//!     embedder.clone(),
//! ));
//! let worker = Arc::new(IndexWorker::new(Arc::new(JobQueue::new()), pipeline, store));
//! worker.notify_created("asset-1").await;
//! worker.tick().await;
//!
//! let engine = RetrievalEngine::new(Some(index), embedder);
//! let _hits = engine
//!     .search_assets("sunset over water", Some("user-1"), &SearchOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod model;
pub mod retrieval;
pub mod storage;
pub mod vector;

pub use model::{Asset, AssetKind, AssetMetadata};
pub use retrieval::job_queue::{IndexJob, JobOp, JobPriority, JobQueue};
pub use retrieval::pipeline::{IndexOutcome, IndexingPipeline, PipelineConfig};
pub use retrieval::search::{RetrievalEngine, SearchHit, SearchOptions};
pub use retrieval::searchable_text::{build_asset_text, build_chunk_text};
pub use retrieval::worker::{IndexWorker, IndexWorkerConfig, TickStats};
pub use storage::AssetStore;
pub use vector::{
    Filter, FilterBuilder, FilterValue, IndexStats, QueryMatch, RecordKind, RecordMetadata,
    VectorIndex, VectorRecord,
};
