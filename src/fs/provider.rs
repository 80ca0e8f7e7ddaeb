//! Boundary to the external listing provider.
//!
//! The tree engine never touches the disk itself; everything goes through a
//! `Provider`. The local implementation lives in `fs::local`.

use async_trait::async_trait;

use crate::error::Result;
use crate::fs::order::OrderSpec;

/// One mounted volume as reported by the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeInfo {
    pub path: String,
}

/// Metadata the caller wants filled in for each listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    Extension,
    MimeType,
    Size,
    ModifiedTime,
}

/// Metadata requested for tree listings.
pub const TREE_METADATA: &[MetadataKind] = &[
    MetadataKind::Extension,
    MetadataKind::MimeType,
    MetadataKind::Size,
    MetadataKind::ModifiedTime,
];

/// One entry of a directory listing. Absent fields were not requested or
/// could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_directory: Option<bool>,
    pub extension: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub modified_secs: Option<i64>,
}

impl ListingEntry {
    /// Entry with a name and nothing else known.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            is_directory: Some(true),
            ..Self::named(name)
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self {
            is_directory: Some(false),
            ..Self::named(name)
        }
    }
}

/// A directory listing, already sorted by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<ListingEntry>,
}

/// Text content of a file for the preview pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextContent {
    pub path: String,
    pub mime_type: String,
    /// `None` when the file is not valid UTF-8.
    pub text: Option<String>,
}

/// External collaborator supplying volumes, listings, and file contents.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Mounted volumes. An empty result is the only failure mode.
    async fn list_volumes(&self) -> Vec<VolumeInfo>;

    /// Sorted listing of `path` with the requested metadata.
    async fn list_directory(
        &self,
        path: &str,
        order: &OrderSpec,
        metadata: &[MetadataKind],
    ) -> Result<Listing>;

    async fn read_file_text(&self, path: &str) -> Result<TextContent>;

    /// Path to hydrate at launch, if any.
    fn startup_path(&self) -> Option<String>;
}
