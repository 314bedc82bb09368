//! Asset data model.
//!
//! An [`Asset`] is an owned content unit supplied by the entity store:
//! a document, spreadsheet, or image with extracted text and structured
//! metadata. The retrieval core never deletes assets, only the vector
//! records derived from them.

use chrono::{DateTime, Utc};
use curio_chunk::{Document, DocumentMeta, Section};
use serde::{Deserialize, Serialize};

/// Content type of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Document,
    Spreadsheet,
    Image,
    Audio,
    Video,
    Other,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Document => "document",
            AssetKind::Spreadsheet => "spreadsheet",
            AssetKind::Image => "image",
            AssetKind::Audio => "audio",
            AssetKind::Video => "video",
            AssetKind::Other => "other",
        }
    }
}

/// Structured metadata attached to an asset.
///
/// Fields are populated per kind: image analysis fills description,
/// detected objects, colors, and mood/style/category tags; document
/// extraction fills title/author/subject. Absent fields stay `None`/empty
/// and are dropped when building searchable text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetMetadata {
    pub description: Option<String>,
    pub tags: Vec<String>,

    // Image analysis
    pub detected_objects: Vec<String>,
    pub dominant_colors: Vec<String>,
    pub mood: Option<String>,
    pub style: Option<String>,
    pub category: Option<String>,

    // Document extraction
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

/// An owned content unit, as supplied by the entity store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub owner_id: String,
    pub kind: AssetKind,
    /// Display name / filename.
    pub name: String,
    /// Raw or extracted text, when the asset has any.
    pub text: Option<String>,
    /// Pre-parsed sections, when the extractor produced them.
    pub sections: Vec<Section>,
    pub metadata: AssetMetadata,
    pub folder_id: Option<String>,
    /// Whether the asset's vector records are current.
    pub indexed: bool,
    pub last_indexed_at: Option<DateTime<Utc>>,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        kind: AssetKind,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            kind,
            name: name.into(),
            text: None,
            sections: Vec::new(),
            metadata: AssetMetadata::default(),
            folder_id: None,
            indexed: false,
            last_indexed_at: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_sections(mut self, sections: Vec<Section>) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_metadata(mut self, metadata: AssetMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.metadata.tags = tags;
        self
    }

    /// The chunkable view of this asset, when it carries extractable text.
    pub fn to_document(&self) -> Option<Document> {
        let text = self.text.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        Some(
            Document::from_text(text)
                .with_sections(self.sections.clone())
                .with_meta(DocumentMeta {
                    title: self.metadata.title.clone(),
                    author: self.metadata.author.clone(),
                    subject: self.metadata.subject.clone(),
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_document_requires_text() {
        let asset = Asset::new("a1", "u1", AssetKind::Image, "photo.png");
        assert!(asset.to_document().is_none());

        let asset = asset.with_text("   ");
        assert!(asset.to_document().is_none());
    }

    #[test]
    fn test_to_document_carries_metadata_and_sections() {
        let mut metadata = AssetMetadata::default();
        metadata.title = Some("Report".into());
        let asset = Asset::new("a2", "u1", AssetKind::Document, "report.pdf")
            .with_text("Body of the report.")
            .with_sections(vec![Section::new("Intro", "Opening.")])
            .with_metadata(metadata);

        let document = asset.to_document().unwrap();
        assert_eq!(document.meta.title.as_deref(), Some("Report"));
        assert_eq!(document.sections.len(), 1);
        assert_eq!(document.text, "Body of the report.");
    }

    #[test]
    fn test_kind_as_str() {
        assert_eq!(AssetKind::Spreadsheet.as_str(), "spreadsheet");
        assert_eq!(AssetKind::Image.as_str(), "image");
    }
}
