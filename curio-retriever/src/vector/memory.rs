//! In-memory vector index.

use super::{
    Filter, IndexStats, MAX_UPSERT_BATCH, QueryMatch, VectorIndex, VectorRecord,
};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Cosine-similarity index backed by a `HashMap`.
///
/// Scores every stored vector per query, so it is only suitable for tests
/// and modest datasets. It applies filters and ordering exactly as the
/// [`VectorIndex`] contract specifies, which is what makes it useful as a
/// reference backend.
#[derive(Debug, Default)]
pub struct MemoryVectorIndex {
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored record id, unordered.
    pub async fn ids(&self) -> Vec<String> {
        self.records.read().await.keys().cloned().collect()
    }

    /// Fetch a single record by id.
    pub async fn get(&self, id: &str) -> Option<VectorRecord> {
        self.records.read().await.get(id).cloned()
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(&self, record: VectorRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn upsert_batch(&self, records: Vec<VectorRecord>) -> Result<()> {
        if records.len() > MAX_UPSERT_BATCH {
            bail!(
                "upsert batch of {} exceeds limit of {MAX_UPSERT_BATCH}",
                records.len()
            );
        }
        let mut stored = self.records.write().await;
        for record in records {
            stored.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<()> {
        let mut stored = self.records.write().await;
        for id in ids {
            stored.remove(id);
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
        include_metadata: bool,
    ) -> Result<Vec<QueryMatch>> {
        let stored = self.records.read().await;
        let mut matches: Vec<QueryMatch> = stored
            .values()
            .filter(|record| filter.is_none_or(|f| f.matches(&record.metadata)))
            .map(|record| QueryMatch {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.vector),
                metadata: include_metadata.then(|| record.metadata.clone()),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn describe_stats(&self) -> Result<IndexStats> {
        let stored = self.records.read().await;
        Ok(IndexStats {
            total_vectors: stored.len(),
            dimension: stored
                .values()
                .next()
                .map(|r| r.vector.len())
                .unwrap_or(0),
        })
    }
}

/// Cosine similarity in [-1, 1]. Mismatched lengths and zero vectors score
/// 0 rather than erroring, so a zero-vector probe can still enumerate
/// filter matches.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssetKind;
    use crate::vector::{FilterBuilder, RecordKind, RecordMetadata};

    fn record(id: &str, owner: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.into(),
            vector,
            metadata: RecordMetadata {
                record_kind: RecordKind::Asset,
                owner_id: owner.into(),
                asset_kind: AssetKind::Document,
                name: format!("{id}.txt"),
                tags: Vec::new(),
                folder_id: None,
                searchable_text: String::new(),
                parent_asset_id: None,
                chunk_index: None,
                chunk_title: None,
            },
        }
    }

    #[test]
    fn test_cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_query_orders_by_score_and_truncates() {
        let index = MemoryVectorIndex::new();
        index.upsert(record("far", "u", vec![0.0, 1.0])).await.unwrap();
        index.upsert(record("near", "u", vec![1.0, 0.1])).await.unwrap();
        index.upsert(record("exact", "u", vec![1.0, 0.0])).await.unwrap();

        let matches = index.query(&[1.0, 0.0], 2, None, false).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "exact");
        assert_eq!(matches[1].id, "near");
        assert!(matches[0].metadata.is_none());
    }

    #[tokio::test]
    async fn test_query_applies_filter() {
        let index = MemoryVectorIndex::new();
        index.upsert(record("a", "alice", vec![1.0, 0.0])).await.unwrap();
        index.upsert(record("b", "bob", vec![1.0, 0.0])).await.unwrap();

        let filter = FilterBuilder::new().owner(Some("alice")).build().unwrap();
        let matches = index
            .query(&[1.0, 0.0], 10, Some(&filter), true)
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "a");
        assert_eq!(matches[0].metadata.as_ref().unwrap().owner_id, "alice");
    }

    #[tokio::test]
    async fn test_zero_vector_probe_enumerates_filter_matches() {
        let index = MemoryVectorIndex::new();
        index.upsert(record("a", "alice", vec![1.0, 0.0])).await.unwrap();
        index.upsert(record("b", "alice", vec![0.0, 1.0])).await.unwrap();

        let filter = FilterBuilder::new().owner(Some("alice")).build().unwrap();
        let matches = index
            .query(&[0.0, 0.0], 100, Some(&filter), false)
            .await
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.score == 0.0));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_and_delete_removes() {
        let index = MemoryVectorIndex::new();
        index.upsert(record("a", "u", vec![1.0, 0.0])).await.unwrap();
        index.upsert(record("a", "u", vec![0.0, 1.0])).await.unwrap();
        assert_eq!(index.describe_stats().await.unwrap().total_vectors, 1);
        assert_eq!(index.get("a").await.unwrap().vector, vec![0.0, 1.0]);

        index.delete_by_id("a").await.unwrap();
        assert_eq!(index.describe_stats().await.unwrap().total_vectors, 0);
    }

    #[tokio::test]
    async fn test_upsert_batch_enforces_limit() {
        let index = MemoryVectorIndex::new();
        let records: Vec<_> = (0..=MAX_UPSERT_BATCH)
            .map(|i| record(&format!("r{i}"), "u", vec![1.0]))
            .collect();
        assert!(index.upsert_batch(records).await.is_err());
        assert_eq!(index.describe_stats().await.unwrap().total_vectors, 0);
    }

    #[tokio::test]
    async fn test_delete_many() {
        let index = MemoryVectorIndex::new();
        for id in ["a", "b", "c"] {
            index.upsert(record(id, "u", vec![1.0])).await.unwrap();
        }
        index
            .delete_many(&["a".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(index.ids().await, vec!["b".to_string()]);
    }
}
