//! Retrieval engine: query text in, scored metadata out.

use crate::model::AssetKind;
use crate::vector::{FilterBuilder, RecordKind, RecordMetadata, VectorIndex};
use anyhow::{Context, Result};
use curio_embed::EmbeddingProvider;
use std::sync::Arc;
use tracing::debug;

/// Per-query knobs. Unset filters widen the query; the defaults match
/// interactive search (20 results, 0.7 similarity floor).
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    /// Minimum similarity score a match must reach to be returned.
    pub threshold: f32,
    pub kind: Option<AssetKind>,
    pub folder_id: Option<String>,
    /// Restrict chunk results to one parent asset.
    pub asset_id: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            threshold: 0.7,
            kind: None,
            folder_id: None,
            asset_id: None,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_kind(mut self, kind: AssetKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn in_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    pub fn for_asset(mut self, asset_id: impl Into<String>) -> Self {
        self.asset_id = Some(asset_id.into());
        self
    }
}

/// One search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub score: f32,
    pub metadata: RecordMetadata,
}

/// Embeds queries and runs filtered similarity search against the index.
pub struct RetrievalEngine {
    index: Option<Arc<dyn VectorIndex>>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl RetrievalEngine {
    pub fn new(
        index: Option<Arc<dyn VectorIndex>>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self { index, embedder }
    }

    /// Search asset-level and chunk records alike.
    ///
    /// `owner` scopes results to one owner; `None` (or empty) runs an
    /// unscoped system-level search. That widening is intentional and
    /// callers serving end users must always pass the owner.
    pub async fn search_assets(
        &self,
        query: &str,
        owner: Option<&str>,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        self.run(query, owner, options, None).await
    }

    /// Search chunk records only, for passage-level results inside
    /// documents. Combine with [`SearchOptions::for_asset`] to search
    /// within a single document.
    pub async fn search_document_chunks(
        &self,
        query: &str,
        owner: Option<&str>,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        self.run(query, owner, options, Some(RecordKind::Chunk)).await
    }

    async fn run(
        &self,
        query: &str,
        owner: Option<&str>,
        options: &SearchOptions,
        pin_kind: Option<RecordKind>,
    ) -> Result<Vec<SearchHit>> {
        let Some(index) = self.index.as_ref() else {
            debug!("no vector index configured, returning empty results");
            return Ok(Vec::new());
        };

        let vector = self
            .embedder
            .embed_text(query)
            .await
            .context("embedding search query")?;

        let mut builder = FilterBuilder::new().owner(owner);
        if let Some(kind) = options.kind {
            builder = builder.kind(kind);
        }
        if let Some(folder_id) = &options.folder_id {
            builder = builder.folder(folder_id);
        }
        if let Some(asset_id) = &options.asset_id {
            builder = builder.parent_asset(asset_id);
        }
        if let Some(kind) = pin_kind {
            builder = builder.record_kind(kind);
        }
        let filter = builder.build();

        let matches = index
            .query(&vector, options.limit, filter.as_ref(), true)
            .await
            .context("vector index query")?;
        debug!(
            "query returned {} matches before threshold {}",
            matches.len(),
            options.threshold
        );

        Ok(matches
            .into_iter()
            .filter(|m| m.score >= options.threshold)
            .filter_map(|m| {
                m.metadata.map(|metadata| SearchHit {
                    score: m.score,
                    metadata,
                })
            })
            .collect())
    }
}
