//! Indexing pipeline: asset in, vector records out.
//!
//! For each asset the pipeline writes one asset-level record plus one
//! record per document chunk. Updates run in two phases, delete then add,
//! with no read-before-write: re-vectorizing an already current asset is
//! safe and converges on the same records. Between the phases the asset is
//! briefly absent from search, which is accepted over serving stale
//! records.

use crate::model::Asset;
use crate::retrieval::searchable_text::{build_asset_text, build_chunk_text};
use crate::storage::AssetStore;
use crate::vector::{
    FilterBuilder, RecordKind, RecordMetadata, VectorIndex, VectorRecord, chunk_record_id,
};
use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use curio_chunk::{Chunk, ChunkOptions};
use curio_embed::EmbeddingProvider;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Upper bound on chunk records fetched when sweeping an asset's stale
/// records out of the index.
const CHUNK_SWEEP_LIMIT: usize = 1_000;

#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Chunking parameters applied to every document asset.
    pub chunk_options: ChunkOptions,
}

impl PipelineConfig {
    pub fn with_chunk_options(mut self, chunk_options: ChunkOptions) -> Self {
        self.chunk_options = chunk_options;
        self
    }
}

/// Counters returned by a single index operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Vector records written, asset record included.
    pub records_written: usize,
    /// How many of those were chunk records.
    pub chunks_indexed: usize,
}

/// Writes and deletes vector records for assets.
///
/// The vector index is optional: when absent every operation is a logged
/// no-op, so environments without an index degrade to metadata-only
/// behavior instead of failing.
pub struct IndexingPipeline {
    index: Option<Arc<dyn VectorIndex>>,
    store: Arc<dyn AssetStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: PipelineConfig,
}

impl IndexingPipeline {
    pub fn new(
        index: Option<Arc<dyn VectorIndex>>,
        store: Arc<dyn AssetStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            index,
            store,
            embedder,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Index a newly created asset.
    pub async fn add(&self, asset_id: &str) -> Result<IndexOutcome> {
        let Some(index) = self.index.as_ref() else {
            debug!("no vector index configured, skipping add for {asset_id}");
            return Ok(IndexOutcome::default());
        };
        self.write_records(index, asset_id).await
    }

    /// Re-index a changed asset: delete every existing record for it,
    /// then write fresh ones. The delete is unconditional so leftover
    /// chunk records from a longer previous version cannot survive.
    pub async fn update(&self, asset_id: &str) -> Result<IndexOutcome> {
        let Some(index) = self.index.as_ref() else {
            debug!("no vector index configured, skipping update for {asset_id}");
            return Ok(IndexOutcome::default());
        };
        self.delete_records(index, asset_id).await?;
        self.write_records(index, asset_id).await
    }

    /// Drop every record for a removed asset. Returns how many chunk
    /// records were swept (the asset record deletion is unconditional and
    /// uncounted, since backends treat deleting a missing id as success).
    pub async fn remove(&self, asset_id: &str) -> Result<usize> {
        let Some(index) = self.index.as_ref() else {
            debug!("no vector index configured, skipping remove for {asset_id}");
            return Ok(0);
        };
        let swept = self.delete_records(index, asset_id).await?;
        info!("removed vector records for {asset_id} ({swept} chunk records)");
        Ok(swept)
    }

    async fn delete_records(
        &self,
        index: &Arc<dyn VectorIndex>,
        asset_id: &str,
    ) -> Result<usize> {
        index
            .delete_by_id(asset_id)
            .await
            .with_context(|| format!("deleting asset record {asset_id}"))?;

        // The index has no delete-by-filter, so enumerate the asset's chunk
        // records with a zero-vector probe (scores are irrelevant, only the
        // filter matters) and delete them by id.
        let stats = index.describe_stats().await?;
        if stats.total_vectors == 0 || stats.dimension == 0 {
            return Ok(0);
        }
        let probe = vec![0.0f32; stats.dimension];
        let filter = FilterBuilder::new()
            .record_kind(RecordKind::Chunk)
            .parent_asset(asset_id)
            .build();
        let matches = index
            .query(&probe, CHUNK_SWEEP_LIMIT, filter.as_ref(), false)
            .await
            .with_context(|| format!("sweeping chunk records of {asset_id}"))?;
        if matches.is_empty() {
            return Ok(0);
        }
        let ids: Vec<String> = matches.into_iter().map(|m| m.id).collect();
        index.delete_many(&ids).await?;
        Ok(ids.len())
    }

    async fn write_records(
        &self,
        index: &Arc<dyn VectorIndex>,
        asset_id: &str,
    ) -> Result<IndexOutcome> {
        let asset = self
            .store
            .get(asset_id)
            .await?
            .ok_or_else(|| anyhow!("asset not found in store: {asset_id}"))?;

        let asset_text = build_asset_text(&asset);
        let vector = self
            .embedder
            .embed_text(&asset_text)
            .await
            .with_context(|| format!("embedding asset {asset_id}"))?;
        index
            .upsert(VectorRecord {
                id: asset.id.clone(),
                vector,
                metadata: asset_record_metadata(&asset, asset_text),
            })
            .await?;
        let mut outcome = IndexOutcome {
            records_written: 1,
            chunks_indexed: 0,
        };

        if let Some(document) = asset.to_document() {
            let chunks = curio_chunk::chunk(&document, &self.config.chunk_options);
            self.write_chunk_records(index, &asset, chunks, &mut outcome)
                .await?;
        }

        self.store.mark_indexed(&asset.id, Utc::now()).await?;
        debug!(
            "indexed {asset_id}: {} records ({} chunks)",
            outcome.records_written, outcome.chunks_indexed
        );
        Ok(outcome)
    }

    async fn write_chunk_records(
        &self,
        index: &Arc<dyn VectorIndex>,
        asset: &Asset,
        chunks: Vec<Chunk>,
        outcome: &mut IndexOutcome,
    ) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = chunks
            .iter()
            .map(|chunk| build_chunk_text(chunk, asset))
            .collect();
        let embedded = self
            .embedder
            .embed_texts(&texts)
            .await
            .with_context(|| format!("embedding {} chunks of {}", chunks.len(), asset.id))?;
        if embedded.len() != chunks.len() {
            return Err(anyhow!(
                "embedding count mismatch for {}: {} texts, {} vectors",
                asset.id,
                chunks.len(),
                embedded.len()
            ));
        }

        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(embedded.embeddings)
            .zip(texts)
            .map(|((chunk, vector), text)| VectorRecord {
                id: chunk_record_id(&asset.id, chunk.index),
                vector,
                metadata: chunk_record_metadata(asset, &chunk, text),
            })
            .collect();

        // Chunk writes are best-effort: a failed bulk write falls back to
        // per-record upserts so one bad record cannot take down the whole
        // batch with it.
        for batch in records.chunks(crate::vector::MAX_UPSERT_BATCH) {
            match index.upsert_batch(batch.to_vec()).await {
                Ok(()) => {
                    outcome.records_written += batch.len();
                    outcome.chunks_indexed += batch.len();
                }
                Err(e) => {
                    warn!(
                        "chunk batch upsert failed for {} ({} records), retrying per record: {e:#}",
                        asset.id,
                        batch.len()
                    );
                    for record in batch {
                        let id = record.id.clone();
                        match index.upsert(record.clone()).await {
                            Ok(()) => {
                                outcome.records_written += 1;
                                outcome.chunks_indexed += 1;
                            }
                            Err(e) => warn!("chunk upsert failed for {id}: {e:#}"),
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn asset_record_metadata(asset: &Asset, searchable_text: String) -> RecordMetadata {
    RecordMetadata {
        record_kind: RecordKind::Asset,
        owner_id: asset.owner_id.clone(),
        asset_kind: asset.kind,
        name: asset.name.clone(),
        tags: asset.metadata.tags.clone(),
        folder_id: asset.folder_id.clone(),
        searchable_text,
        parent_asset_id: None,
        chunk_index: None,
        chunk_title: None,
    }
}

fn chunk_record_metadata(asset: &Asset, chunk: &Chunk, searchable_text: String) -> RecordMetadata {
    RecordMetadata {
        record_kind: RecordKind::Chunk,
        owner_id: asset.owner_id.clone(),
        asset_kind: asset.kind,
        name: asset.name.clone(),
        tags: asset.metadata.tags.clone(),
        folder_id: asset.folder_id.clone(),
        searchable_text,
        parent_asset_id: Some(asset.id.clone()),
        chunk_index: Some(chunk.index),
        chunk_title: (!chunk.title.is_empty()).then(|| chunk.title.clone()),
    }
}
