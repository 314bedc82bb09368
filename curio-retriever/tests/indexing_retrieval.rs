//! End-to-end tests over the in-memory collaborators: asset lifecycle
//! notifications through the worker and pipeline, then owner-scoped
//! retrieval over the resulting records.

use curio_embed::HashEmbeddingProvider;
use curio_retriever::retrieval::job_queue::JobQueue;
use curio_retriever::retrieval::pipeline::IndexingPipeline;
use curio_retriever::retrieval::search::{RetrievalEngine, SearchOptions};
use curio_retriever::retrieval::worker::IndexWorker;
use curio_retriever::storage::memory::MemoryAssetStore;
use curio_retriever::vector::memory::MemoryVectorIndex;
use curio_retriever::{Asset, AssetKind, AssetMetadata, AssetStore, RecordKind, VectorIndex};
use std::sync::Arc;

struct Harness {
    store: Arc<MemoryAssetStore>,
    index: Arc<MemoryVectorIndex>,
    worker: IndexWorker,
    engine: RetrievalEngine,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn harness() -> Harness {
    init_tracing();
    let store = Arc::new(MemoryAssetStore::new());
    let index = Arc::new(MemoryVectorIndex::new());
    let embedder = Arc::new(HashEmbeddingProvider::default());
    let pipeline = Arc::new(IndexingPipeline::new(
        Some(index.clone() as Arc<dyn VectorIndex>),
        store.clone(),
        embedder.clone(),
    ));
    let worker = IndexWorker::new(Arc::new(JobQueue::new()), pipeline, store.clone());
    let engine = RetrievalEngine::new(Some(index.clone() as Arc<dyn VectorIndex>), embedder);
    Harness {
        store,
        index,
        worker,
        engine,
    }
}

fn image_asset(id: &str, owner: &str, description: &str) -> Asset {
    let mut metadata = AssetMetadata::default();
    metadata.description = Some(description.to_string());
    Asset::new(id, owner, AssetKind::Image, format!("{id}.jpg")).with_metadata(metadata)
}

fn document_asset(id: &str, owner: &str, text: &str) -> Asset {
    Asset::new(id, owner, AssetKind::Document, format!("{id}.txt")).with_text(text)
}

/// Any-score options: ranking tests care about order, not the floor.
fn unthresholded() -> SearchOptions {
    SearchOptions::default().with_threshold(0.0)
}

#[tokio::test]
async fn created_asset_becomes_searchable_after_tick() {
    let h = harness();
    h.store
        .insert(image_asset("img-1", "alice", "sailboat on calm water"))
        .await;

    h.worker.notify_created("img-1").await;
    let stats = h.worker.tick().await;
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.failed, 0);

    let hits = h
        .engine
        .search_assets("sailboat calm water", Some("alice"), &unthresholded())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].metadata.name, "img-1.jpg");
    assert!(hits[0].score > 0.0);

    // The store now reflects the indexing.
    let asset = h.store.get("img-1").await.unwrap().unwrap();
    assert!(asset.indexed);
    assert!(asset.last_indexed_at.is_some());
}

#[tokio::test]
async fn owner_scope_excludes_other_owners() {
    let h = harness();
    h.store
        .insert(image_asset("a-img", "alice", "red bicycle"))
        .await;
    h.store
        .insert(image_asset("b-img", "bob", "red bicycle"))
        .await;
    h.worker.notify_created("a-img").await;
    h.worker.notify_created("b-img").await;
    h.worker.tick().await;

    let hits = h
        .engine
        .search_assets("red bicycle", Some("alice"), &unthresholded())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].metadata.owner_id, "alice");

    // No owner widens to a system-level search over both.
    let hits = h
        .engine
        .search_assets("red bicycle", None, &unthresholded())
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn document_indexing_writes_asset_and_chunk_records() {
    let h = harness();
    let body = "Migration plan. ".repeat(40);
    h.store.insert(document_asset("doc-1", "alice", &body)).await;
    h.worker.notify_created("doc-1").await;
    h.worker.tick().await;

    let mut ids = h.index.ids().await;
    ids.sort();
    assert!(ids.contains(&"doc-1".to_string()));
    assert!(ids.contains(&"doc-1_chunk_0".to_string()));
    assert!(ids.len() >= 2);

    // Chunk search surfaces only chunk records, tagged with their parent.
    let hits = h
        .engine
        .search_document_chunks("migration plan", Some("alice"), &unthresholded())
        .await
        .unwrap();
    assert!(!hits.is_empty());
    for hit in &hits {
        assert_eq!(hit.metadata.record_kind, RecordKind::Chunk);
        assert_eq!(hit.metadata.parent_asset_id.as_deref(), Some("doc-1"));
        assert!(hit.metadata.chunk_index.is_some());
    }
}

#[tokio::test]
async fn update_is_idempotent_and_sweeps_orphan_chunks() {
    let h = harness();
    let long_body = "Sentence about the original long draft. ".repeat(120);
    h.store
        .insert(document_asset("doc-2", "alice", &long_body))
        .await;
    h.worker.notify_created("doc-2").await;
    h.worker.tick().await;

    let before: usize = h.index.ids().await.len();
    assert!(before > 3, "long document should produce several chunks");

    // Re-running an update with unchanged content converges on the same ids.
    h.worker.notify_updated("doc-2").await;
    h.worker.tick().await;
    assert_eq!(h.index.ids().await.len(), before);

    // Shrinking the document removes the now-orphaned chunk records.
    h.store
        .insert(document_asset("doc-2", "alice", "Short final version."))
        .await;
    h.worker.notify_updated("doc-2").await;
    h.worker.tick().await;

    let ids = h.index.ids().await;
    assert!(ids.len() < before);
    for id in &ids {
        let keep = id == "doc-2" || id == "doc-2_chunk_0" || id == "doc-2_chunk_1";
        assert!(keep, "stale record survived the update: {id}");
    }
}

#[tokio::test]
async fn removed_asset_stops_surfacing() {
    let h = harness();
    let body = "Contract terms and conditions. ".repeat(60);
    h.store.insert(document_asset("doc-3", "alice", &body)).await;
    h.worker.notify_created("doc-3").await;
    h.worker.tick().await;
    assert!(h.index.describe_stats().await.unwrap().total_vectors > 1);

    h.worker.notify_removed("doc-3").await;
    h.worker.tick().await;

    assert_eq!(h.index.describe_stats().await.unwrap().total_vectors, 0);
    let hits = h
        .engine
        .search_assets("contract terms", Some("alice"), &unthresholded())
        .await
        .unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn search_on_empty_index_returns_no_hits() {
    let h = harness();
    let hits = h
        .engine
        .search_assets("anything at all", Some("alice"), &SearchOptions::default())
        .await
        .unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn kind_and_folder_filters_narrow_results() {
    let h = harness();
    h.store
        .insert(image_asset("img-9", "alice", "team offsite photo").with_folder("f-1"))
        .await;
    h.store
        .insert(document_asset("doc-9", "alice", "team offsite notes").with_folder("f-2"))
        .await;
    h.worker.notify_created("img-9").await;
    h.worker.notify_created("doc-9").await;
    h.worker.tick().await;

    let hits = h
        .engine
        .search_assets(
            "team offsite",
            Some("alice"),
            &unthresholded().with_kind(AssetKind::Image),
        )
        .await
        .unwrap();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|hit| hit.metadata.asset_kind == AssetKind::Image));

    let hits = h
        .engine
        .search_assets("team offsite", Some("alice"), &unthresholded().in_folder("f-2"))
        .await
        .unwrap();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|hit| hit.metadata.folder_id.as_deref() == Some("f-2")));
}

#[tokio::test]
async fn threshold_drops_weak_matches() {
    let h = harness();
    h.store
        .insert(image_asset("img-5", "alice", "lighthouse at dusk"))
        .await;
    h.worker.notify_created("img-5").await;
    h.worker.tick().await;

    // Querying with the record's exact searchable text scores 1.0.
    let exact = "img-5.jpg image lighthouse at dusk";
    let hits = h
        .engine
        .search_assets(exact, Some("alice"), &SearchOptions::default().with_threshold(0.99))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);

    // An unrelated query falls below the default floor.
    let hits = h
        .engine
        .search_assets(
            "spreadsheet quarterly budget",
            Some("alice"),
            &SearchOptions::default(),
        )
        .await
        .unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn failed_jobs_retry_then_drop() {
    let h = harness();
    // No such asset in the store, so every attempt fails.
    h.worker.notify_created("ghost").await;

    let first = h.worker.tick().await;
    assert_eq!(first.failed, 1);
    assert_eq!(first.retried, 1);
    assert_eq!(h.worker.queue().len().await, 1);

    let second = h.worker.tick().await;
    assert_eq!(second.retried, 1);

    let third = h.worker.tick().await;
    assert_eq!(third.failed, 1);
    assert_eq!(third.dropped, 1);
    assert!(h.worker.queue().is_empty().await);
}

#[tokio::test]
async fn recovery_sweep_enqueues_unindexed_assets() {
    let h = harness();
    h.store
        .insert(image_asset("img-7", "alice", "whiteboard sketch"))
        .await;
    h.store
        .insert(image_asset("img-8", "alice", "kitchen remodel"))
        .await;

    let enqueued = h.worker.process_all_unvectorized().await.unwrap();
    assert_eq!(enqueued, 2);
    let stats = h.worker.tick().await;
    assert_eq!(stats.processed, 2);

    // A second sweep finds nothing left to do.
    assert_eq!(h.worker.process_all_unvectorized().await.unwrap(), 0);

    // A full rebuild re-enqueues everything regardless of indexed state.
    assert_eq!(h.worker.re_vectorize_all().await.unwrap(), 2);
    let stats = h.worker.tick().await;
    assert_eq!(stats.processed, 2);
    assert_eq!(h.index.describe_stats().await.unwrap().total_vectors, 2);
}

/// Delegates everything to an in-memory index but rejects bulk writes,
/// standing in for a backend whose batch endpoint is failing.
struct BatchRejectingIndex {
    inner: MemoryVectorIndex,
}

#[async_trait::async_trait]
impl VectorIndex for BatchRejectingIndex {
    async fn upsert(&self, record: curio_retriever::VectorRecord) -> anyhow::Result<()> {
        self.inner.upsert(record).await
    }

    async fn upsert_batch(
        &self,
        _records: Vec<curio_retriever::VectorRecord>,
    ) -> anyhow::Result<()> {
        anyhow::bail!("bulk writes unavailable")
    }

    async fn delete_by_id(&self, id: &str) -> anyhow::Result<()> {
        self.inner.delete_by_id(id).await
    }

    async fn delete_many(&self, ids: &[String]) -> anyhow::Result<()> {
        self.inner.delete_many(ids).await
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&curio_retriever::Filter>,
        include_metadata: bool,
    ) -> anyhow::Result<Vec<curio_retriever::QueryMatch>> {
        self.inner.query(vector, top_k, filter, include_metadata).await
    }

    async fn describe_stats(&self) -> anyhow::Result<curio_retriever::IndexStats> {
        self.inner.describe_stats().await
    }
}

#[tokio::test]
async fn failed_chunk_batch_falls_back_to_per_record_writes() {
    init_tracing();
    let store = Arc::new(MemoryAssetStore::new());
    let index = Arc::new(BatchRejectingIndex {
        inner: MemoryVectorIndex::new(),
    });
    let pipeline = IndexingPipeline::new(
        Some(index.clone() as Arc<dyn VectorIndex>),
        store.clone(),
        Arc::new(HashEmbeddingProvider::default()),
    );

    let body = "Field notes from the survey. ".repeat(60);
    store.insert(document_asset("doc-4", "alice", &body)).await;
    let outcome = pipeline.add("doc-4").await.unwrap();

    // Every chunk still lands, one record at a time.
    assert!(outcome.chunks_indexed >= 2);
    let ids = index.inner.ids().await;
    assert!(ids.contains(&"doc-4".to_string()));
    assert!(ids.contains(&"doc-4_chunk_0".to_string()));
    assert_eq!(ids.len(), outcome.records_written);
}

#[tokio::test]
async fn pipeline_without_index_is_a_quiet_noop() {
    let store = Arc::new(MemoryAssetStore::new());
    store.insert(image_asset("img-2", "alice", "anything")).await;
    let pipeline = Arc::new(IndexingPipeline::new(
        None,
        store.clone(),
        Arc::new(HashEmbeddingProvider::default()),
    ));
    let worker = IndexWorker::new(Arc::new(JobQueue::new()), pipeline, store);

    worker.notify_created("img-2").await;
    let stats = worker.tick().await;
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.failed, 0);
}
