//! In-memory entity store.

use super::AssetStore;
use crate::model::Asset;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// `HashMap`-backed asset store for tests and embedded deployments.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: RwLock<HashMap<String, Asset>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, asset: Asset) {
        self.assets.write().await.insert(asset.id.clone(), asset);
    }

    pub async fn remove(&self, id: &str) -> Option<Asset> {
        self.assets.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.assets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.assets.read().await.is_empty()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn get(&self, id: &str) -> Result<Option<Asset>> {
        Ok(self.assets.read().await.get(id).cloned())
    }

    async fn list_unindexed(&self) -> Result<Vec<Asset>> {
        let mut assets: Vec<Asset> = self
            .assets
            .read()
            .await
            .values()
            .filter(|a| !a.indexed)
            .cloned()
            .collect();
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(assets)
    }

    async fn list_all(&self) -> Result<Vec<Asset>> {
        let mut assets: Vec<Asset> = self.assets.read().await.values().cloned().collect();
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(assets)
    }

    async fn mark_indexed(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        if let Some(asset) = self.assets.write().await.get_mut(id) {
            asset.indexed = true;
            asset.last_indexed_at = Some(at);
        }
        Ok(())
    }
}
