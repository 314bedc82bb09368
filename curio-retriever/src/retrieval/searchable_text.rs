//! Searchable-text construction.
//!
//! Each vector record embeds a single flat string assembled from asset
//! fields in a fixed order: name, kind, tags, then kind-specific metadata.
//! Empty fields are dropped, parts are space-joined, and the result is
//! lowercased. The fixed order keeps re-indexing deterministic: the same
//! asset state always embeds the same text.

use crate::model::{Asset, AssetKind};
use curio_chunk::Chunk;

/// Flat searchable text for an asset-level record.
pub fn build_asset_text(asset: &Asset) -> String {
    let mut parts: Vec<&str> = Vec::new();
    push(&mut parts, &asset.name);
    push(&mut parts, asset.kind.as_str());
    for tag in &asset.metadata.tags {
        push(&mut parts, tag);
    }

    let metadata = &asset.metadata;
    match asset.kind {
        AssetKind::Image => {
            push_opt(&mut parts, metadata.description.as_deref());
            for object in &metadata.detected_objects {
                push(&mut parts, object);
            }
            for color in &metadata.dominant_colors {
                push(&mut parts, color);
            }
            push_opt(&mut parts, asset.text.as_deref());
            push_opt(&mut parts, metadata.mood.as_deref());
            push_opt(&mut parts, metadata.style.as_deref());
            push_opt(&mut parts, metadata.category.as_deref());
        }
        AssetKind::Document | AssetKind::Spreadsheet => {
            push_opt(&mut parts, metadata.title.as_deref());
            push_opt(&mut parts, metadata.author.as_deref());
            push_opt(&mut parts, metadata.subject.as_deref());
            push_opt(&mut parts, metadata.description.as_deref());
        }
        AssetKind::Audio | AssetKind::Video | AssetKind::Other => {
            push_opt(&mut parts, metadata.description.as_deref());
            push_opt(&mut parts, metadata.category.as_deref());
        }
    }

    parts.join(" ").to_lowercase()
}

/// Flat searchable text for one chunk record: parent context first so a
/// chunk remains findable by asset name and tags, then the chunk itself.
pub fn build_chunk_text(chunk: &Chunk, parent: &Asset) -> String {
    let mut parts: Vec<&str> = Vec::new();
    push(&mut parts, &parent.name);
    push(&mut parts, parent.kind.as_str());
    for tag in &parent.metadata.tags {
        push(&mut parts, tag);
    }
    push(&mut parts, &chunk.title);
    push(&mut parts, &chunk.text);
    parts.join(" ").to_lowercase()
}

fn push<'a>(parts: &mut Vec<&'a str>, value: &'a str) {
    let value = value.trim();
    if !value.is_empty() {
        parts.push(value);
    }
}

fn push_opt<'a>(parts: &mut Vec<&'a str>, value: Option<&'a str>) {
    if let Some(value) = value {
        push(parts, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssetMetadata;
    use curio_chunk::{Chunk, ChunkKind};

    #[test]
    fn test_image_text_order_and_lowercase() {
        let mut metadata = AssetMetadata::default();
        metadata.tags = vec!["Vacation".into()];
        metadata.description = Some("A red boat at Sunset".into());
        metadata.detected_objects = vec!["boat".into(), "sea".into()];
        metadata.dominant_colors = vec!["red".into(), "orange".into()];
        metadata.mood = Some("Calm".into());
        let asset = Asset::new("a1", "u1", AssetKind::Image, "IMG_2041.jpg")
            .with_metadata(metadata);

        assert_eq!(
            build_asset_text(&asset),
            "img_2041.jpg image vacation a red boat at sunset boat sea red orange calm"
        );
    }

    #[test]
    fn test_empty_fields_are_dropped() {
        let mut metadata = AssetMetadata::default();
        metadata.tags = vec!["  ".into(), "ok".into()];
        metadata.description = Some(String::new());
        let asset =
            Asset::new("a2", "u1", AssetKind::Other, "blob.bin").with_metadata(metadata);

        assert_eq!(build_asset_text(&asset), "blob.bin other ok");
    }

    #[test]
    fn test_document_text_uses_extraction_fields() {
        let mut metadata = AssetMetadata::default();
        metadata.title = Some("Quarterly Plan".into());
        metadata.author = Some("Dana".into());
        let asset = Asset::new("a3", "u1", AssetKind::Document, "plan.pdf")
            .with_text("full body text is not embedded at asset level")
            .with_metadata(metadata);

        assert_eq!(build_asset_text(&asset), "plan.pdf document quarterly plan dana");
    }

    #[test]
    fn test_deterministic_for_same_state() {
        let asset = Asset::new("a4", "u1", AssetKind::Spreadsheet, "Budget.xlsx")
            .with_tags(vec!["finance".into()]);
        assert_eq!(build_asset_text(&asset), build_asset_text(&asset));
    }

    #[test]
    fn test_chunk_text_includes_parent_context() {
        let parent = Asset::new("a5", "u1", AssetKind::Document, "Notes.md")
            .with_tags(vec!["meeting".into()]);
        let chunk = Chunk::new(
            2,
            ChunkKind::Section,
            "Action Items",
            "Follow up with Legal.".to_string(),
        );
        assert_eq!(
            build_chunk_text(&chunk, &parent),
            "notes.md document meeting action items follow up with legal."
        );
    }
}
