//! Vector index abstraction.
//!
//! The index is an external collaborator: the pipeline writes
//! [`VectorRecord`]s into it and the retrieval engine queries it with
//! conjunctive metadata [`Filter`]s. Implementations plug in behind the
//! [`VectorIndex`] trait; [`memory::MemoryVectorIndex`] is the in-process
//! reference implementation used by tests and offline deployments.

pub mod memory;

use crate::model::AssetKind;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum records accepted per upsert batch. Larger writes must be split
/// by the caller; the pipeline slices chunk records to this bound.
pub const MAX_UPSERT_BATCH: usize = 100;

/// Whether a record represents a whole asset or one chunk of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Asset,
    Chunk,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Asset => "asset",
            RecordKind::Chunk => "chunk",
        }
    }
}

/// Metadata stored alongside each vector.
///
/// Chunk records carry `parent_asset_id` and `chunk_index`; asset records
/// leave both `None`. Every record carries the owner so queries can be
/// scoped without consulting the entity store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub record_kind: RecordKind,
    pub owner_id: String,
    pub asset_kind: AssetKind,
    /// Display name of the (parent) asset.
    pub name: String,
    pub tags: Vec<String>,
    pub folder_id: Option<String>,
    /// The text that was embedded, kept for display and debugging.
    pub searchable_text: String,
    pub parent_asset_id: Option<String>,
    pub chunk_index: Option<usize>,
    /// Section title for chunk records, when the chunk has one.
    pub chunk_title: Option<String>,
}

impl RecordMetadata {
    /// Scalar field lookup used by filter evaluation. Unknown keys and
    /// absent optional fields return `None`.
    fn field(&self, key: &str) -> Option<&str> {
        match key {
            "record_kind" => Some(self.record_kind.as_str()),
            "owner_id" => Some(&self.owner_id),
            "asset_kind" => Some(self.asset_kind.as_str()),
            "name" => Some(&self.name),
            "folder_id" => self.folder_id.as_deref(),
            "parent_asset_id" => self.parent_asset_id.as_deref(),
            _ => None,
        }
    }
}

/// A stored vector with its metadata.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: RecordMetadata,
}

/// Deterministic id for the `index`-th chunk record of an asset.
///
/// Re-chunking identical content yields identical ids, which makes updates
/// overwrite in place instead of accumulating duplicates.
pub fn chunk_record_id(asset_id: &str, index: usize) -> String {
    format!("{asset_id}_chunk_{index}")
}

/// One condition on a metadata field.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Field equals the value exactly.
    Eq(String),
    /// Field equals one of the values.
    In(Vec<String>),
}

impl FilterValue {
    fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            // Absent fields never satisfy a condition.
            return false;
        };
        match self {
            FilterValue::Eq(expected) => actual == expected,
            FilterValue::In(values) => values.iter().any(|v| v == actual),
        }
    }
}

/// Conjunction of metadata conditions. A record matches only when every
/// condition holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(BTreeMap<String, FilterValue>);

impl Filter {
    pub fn matches(&self, metadata: &RecordMetadata) -> bool {
        self.0
            .iter()
            .all(|(key, condition)| condition.matches(metadata.field(key)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }
}

/// Builds query filters one condition at a time.
///
/// `build` returns `None` when no conditions were added, so an
/// unconstrained query passes no filter at all rather than an empty one.
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    conditions: BTreeMap<String, FilterValue>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope to an owner. `None` or an empty id adds no condition, which
    /// deliberately widens the query to all owners for system-level calls.
    pub fn owner(mut self, owner_id: Option<&str>) -> Self {
        if let Some(owner_id) = owner_id
            && !owner_id.is_empty()
        {
            self.conditions
                .insert("owner_id".into(), FilterValue::Eq(owner_id.into()));
        }
        self
    }

    pub fn kind(mut self, kind: AssetKind) -> Self {
        self.conditions
            .insert("asset_kind".into(), FilterValue::Eq(kind.as_str().into()));
        self
    }

    pub fn folder(mut self, folder_id: &str) -> Self {
        self.conditions
            .insert("folder_id".into(), FilterValue::Eq(folder_id.into()));
        self
    }

    pub fn parent_asset(mut self, asset_id: &str) -> Self {
        self.conditions.insert(
            "parent_asset_id".into(),
            FilterValue::Eq(asset_id.into()),
        );
        self
    }

    pub fn record_kind(mut self, kind: RecordKind) -> Self {
        self.conditions
            .insert("record_kind".into(), FilterValue::Eq(kind.as_str().into()));
        self
    }

    pub fn build(self) -> Option<Filter> {
        if self.conditions.is_empty() {
            None
        } else {
            Some(Filter(self.conditions))
        }
    }
}

/// One query result: the record id, its similarity score, and (when
/// requested) the stored metadata.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Option<RecordMetadata>,
}

/// Aggregate index statistics.
#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub total_vectors: usize,
    pub dimension: usize,
}

/// Contract for vector index backends.
///
/// Queries return up to `top_k` matches ordered by descending similarity;
/// score thresholds are the retrieval engine's concern, not the index's.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, record: VectorRecord) -> Result<()>;

    /// Insert or overwrite up to [`MAX_UPSERT_BATCH`] records.
    async fn upsert_batch(&self, records: Vec<VectorRecord>) -> Result<()>;

    async fn delete_by_id(&self, id: &str) -> Result<()>;

    async fn delete_many(&self, ids: &[String]) -> Result<()>;

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
        include_metadata: bool,
    ) -> Result<Vec<QueryMatch>>;

    async fn describe_stats(&self) -> Result<IndexStats>;
}
