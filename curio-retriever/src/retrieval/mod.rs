//! Indexing and retrieval orchestration.

pub mod job_queue;
pub mod pipeline;
pub mod search;
pub mod searchable_text;
pub mod worker;
