//! Entity store abstraction.
//!
//! Assets live in a system of record the retrieval core does not own.
//! [`AssetStore`] is the read/mark surface the pipeline needs from it;
//! [`memory::MemoryAssetStore`] backs tests and embedded use.

pub mod memory;

use crate::model::Asset;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Fetch an asset by id. `None` when the id is unknown.
    async fn get(&self, id: &str) -> Result<Option<Asset>>;

    /// Assets whose vector records are missing or stale.
    async fn list_unindexed(&self) -> Result<Vec<Asset>>;

    /// Every asset, for full re-vectorization sweeps.
    async fn list_all(&self) -> Result<Vec<Asset>>;

    /// Record that the asset's vectors were (re)written at `at`.
    async fn mark_indexed(&self, id: &str, at: DateTime<Utc>) -> Result<()>;
}
