//! Provider backed by the local filesystem.

use std::cmp::Ordering;
use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use crate::error::{AppError, Result};
use crate::fs::order::{Direction, OrderKey, OrderSpec};
use crate::fs::provider::{Listing, ListingEntry, MetadataKind, Provider, TextContent, VolumeInfo};

/// Largest prefix of a file read for preview.
pub const MAX_TEXT_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default)]
pub struct LocalProvider {
    startup_path: Option<String>,
}

impl LocalProvider {
    pub fn new(startup_path: Option<String>) -> Self {
        Self { startup_path }
    }
}

#[async_trait]
impl Provider for LocalProvider {
    async fn list_volumes(&self) -> Vec<VolumeInfo> {
        let volumes = platform_volumes().await;
        if volumes.is_empty() {
            tracing::warn!("no volumes found");
        }
        volumes
    }

    async fn list_directory(
        &self,
        path: &str,
        order: &OrderSpec,
        metadata: &[MetadataKind],
    ) -> Result<Listing> {
        let listing_error = |source| AppError::Listing {
            path: path.to_string(),
            source,
        };
        let dir_meta = tokio::fs::metadata(path).await.map_err(listing_error)?;
        if !dir_meta.is_dir() {
            return Err(AppError::NotADirectory(path.to_string()));
        }

        let mut read_dir = tokio::fs::read_dir(path).await.map_err(listing_error)?;
        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(listing_error)? {
            let name = entry.file_name().to_string_lossy().into_owned();
            match read_entry(&entry.path(), name, metadata).await {
                Ok(item) => entries.push(item),
                Err(e) => {
                    tracing::debug!("skipping unreadable entry {:?}: {}", entry.path(), e);
                }
            }
        }
        sort_entries(&mut entries, order);
        tracing::debug!(path, count = entries.len(), "listed directory");
        Ok(Listing { entries })
    }

    async fn read_file_text(&self, path: &str) -> Result<TextContent> {
        let file = tokio::fs::File::open(path).await?;
        let mut bytes = Vec::new();
        file.take(MAX_TEXT_BYTES).read_to_end(&mut bytes).await?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        Ok(TextContent {
            path: path.to_string(),
            mime_type,
            text: String::from_utf8(bytes).ok(),
        })
    }

    fn startup_path(&self) -> Option<String> {
        self.startup_path.clone()
    }
}

#[cfg(windows)]
async fn platform_volumes() -> Vec<VolumeInfo> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    let mut volumes: Vec<VolumeInfo> = disks
        .list()
        .iter()
        .map(|disk| VolumeInfo {
            path: disk.mount_point().to_string_lossy().into_owned(),
        })
        .collect();
    volumes.sort_by(|a, b| a.path.cmp(&b.path));
    volumes.dedup();
    volumes
}

/// Directories directly under `/`, each treated as its own root.
#[cfg(not(windows))]
async fn platform_volumes() -> Vec<VolumeInfo> {
    let mut read_dir = match tokio::fs::read_dir("/").await {
        Ok(rd) => rd,
        Err(e) => {
            tracing::warn!("cannot read /: {}", e);
            return Vec::new();
        }
    };
    let mut volumes = Vec::new();
    while let Ok(Some(entry)) = read_dir.next_entry().await {
        let path = entry.path();
        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            volumes.push(VolumeInfo {
                path: path.to_string_lossy().into_owned(),
            });
        }
    }
    volumes.sort_by(|a, b| a.path.cmp(&b.path));
    volumes
}

/// Build one listing entry. Symlinks are followed; a dangling link is
/// reported as a file.
async fn read_entry(path: &Path, name: String, wanted: &[MetadataKind]) -> Result<ListingEntry> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(_) => tokio::fs::symlink_metadata(path).await?,
    };
    let is_dir = meta.is_dir();
    let mut entry = ListingEntry {
        is_directory: Some(is_dir),
        ..ListingEntry::named(name)
    };

    if !is_dir && wanted.contains(&MetadataKind::Extension) {
        entry.extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());
    }
    if !is_dir && wanted.contains(&MetadataKind::MimeType) {
        entry.mime_type = mime_guess::from_path(path).first().map(|m| m.to_string());
    }
    if wanted.contains(&MetadataKind::Size) {
        entry.size_bytes = Some(meta.len());
    }
    if wanted.contains(&MetadataKind::ModifiedTime) {
        entry.modified_secs = meta
            .modified()
            .ok()
            .map(|t| chrono::DateTime::<chrono::Utc>::from(t).timestamp());
    }
    Ok(entry)
}

fn directed<T: Ord>(a: &T, b: &T, direction: Direction) -> Option<Ordering> {
    if a == b {
        return None;
    }
    Some(match direction {
        Direction::Asc => a.cmp(b),
        Direction::Desc => b.cmp(a),
    })
}

fn both<T: Ord>(a: &Option<T>, b: &Option<T>, direction: Direction) -> Option<Ordering> {
    match (a, b) {
        (Some(a), Some(b)) => directed(a, b, direction),
        (Some(_), None) => Some(Ordering::Less),
        (None, Some(_)) => Some(Ordering::Greater),
        (None, None) => None,
    }
}

fn both_ci(a: &Option<String>, b: &Option<String>, direction: Direction) -> Option<Ordering> {
    both(
        &a.as_ref().map(|s| s.to_lowercase()),
        &b.as_ref().map(|s| s.to_lowercase()),
        direction,
    )
}

/// Compare two entries term by term. A term that cannot decide (equal
/// values, metadata missing on both sides) passes to the next one. Within a
/// term, an entry carrying the value ranks before one lacking it, whatever
/// the direction, so the result is a total order.
pub fn compare_entries(a: &ListingEntry, b: &ListingEntry, order: &OrderSpec) -> Ordering {
    let a_dir = a.is_directory.unwrap_or(false);
    let b_dir = b.is_directory.unwrap_or(false);
    let files = !a_dir && !b_dir;
    for term in order.terms() {
        let decided = match term.key {
            // Directories first when ascending.
            OrderKey::IsDirectory => directed(&b_dir, &a_dir, term.direction),
            OrderKey::Name => directed(
                &a.name.to_lowercase(),
                &b.name.to_lowercase(),
                term.direction,
            ),
            OrderKey::Extension if files => both_ci(&a.extension, &b.extension, term.direction),
            OrderKey::MimeType if files => both_ci(&a.mime_type, &b.mime_type, term.direction),
            OrderKey::Size => both(&a.size_bytes, &b.size_bytes, term.direction),
            OrderKey::ModifiedTime => both(&a.modified_secs, &b.modified_secs, term.direction),
            _ => None,
        };
        if let Some(ordering) = decided {
            return ordering;
        }
    }
    a.name.cmp(&b.name)
}

pub fn sort_entries(entries: &mut [ListingEntry], order: &OrderSpec) {
    entries.sort_by(|a, b| compare_entries(a, b, order));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::order::SortKey;
    use crate::fs::provider::TREE_METADATA;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("b_dir")).unwrap();
        fs::write(dir.path().join("A.txt"), "0123456789").unwrap();
        fs::write(dir.path().join("c.RS"), "x").unwrap();
        dir
    }

    fn names(listing: &Listing) -> Vec<&str> {
        listing.entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn path_of(dir: &TempDir) -> String {
        dir.path().to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn name_ascending_puts_directories_first() {
        let dir = setup();
        let listing = LocalProvider::default()
            .list_directory(&path_of(&dir), &OrderSpec::default(), TREE_METADATA)
            .await
            .unwrap();
        assert_eq!(names(&listing), vec!["b_dir", "A.txt", "c.RS"]);
        assert_eq!(listing.entries[0].is_directory, Some(true));
        assert_eq!(listing.entries[1].size_bytes, Some(10));
        assert_eq!(listing.entries[2].extension.as_deref(), Some("rs"));
        assert_eq!(listing.entries[1].mime_type.as_deref(), Some("text/plain"));
        assert!(listing.entries[1].modified_secs.is_some());
    }

    #[tokio::test]
    async fn size_descending_reverses_directory_flag() {
        let dir = setup();
        let order = OrderSpec::new(SortKey::Size, Direction::Desc);
        let listing = LocalProvider::default()
            .list_directory(&path_of(&dir), &order, TREE_METADATA)
            .await
            .unwrap();
        assert_eq!(names(&listing), vec!["A.txt", "c.RS", "b_dir"]);
    }

    #[tokio::test]
    async fn only_requested_metadata_is_filled() {
        let dir = setup();
        let listing = LocalProvider::default()
            .list_directory(&path_of(&dir), &OrderSpec::default(), &[])
            .await
            .unwrap();
        assert!(listing.entries.iter().all(|e| e.extension.is_none()
            && e.mime_type.is_none()
            && e.size_bytes.is_none()
            && e.modified_secs.is_none()));
    }

    #[tokio::test]
    async fn empty_directory_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let listing = LocalProvider::default()
            .list_directory(&path_of(&dir), &OrderSpec::default(), TREE_METADATA)
            .await
            .unwrap();
        assert!(listing.entries.is_empty());
    }

    #[tokio::test]
    async fn missing_and_file_paths_are_errors() {
        let dir = setup();
        let provider = LocalProvider::default();
        let missing = dir.path().join("nope").to_string_lossy().into_owned();
        let err = provider
            .list_directory(&missing, &OrderSpec::default(), TREE_METADATA)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Listing { .. }));

        let file = dir.path().join("A.txt").to_string_lossy().into_owned();
        let err = provider
            .list_directory(&file, &OrderSpec::default(), TREE_METADATA)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn read_file_text_detects_binary() {
        let dir = setup();
        let bin = dir.path().join("blob.bin");
        fs::write(&bin, [0xff, 0xfe, 0x00, 0x80]).unwrap();
        let provider = LocalProvider::default();

        let text = provider
            .read_file_text(&dir.path().join("A.txt").to_string_lossy())
            .await
            .unwrap();
        assert_eq!(text.text.as_deref(), Some("0123456789"));
        assert_eq!(text.mime_type, "text/plain");

        let blob = provider.read_file_text(&bin.to_string_lossy()).await.unwrap();
        assert!(blob.text.is_none());
    }

    #[tokio::test]
    async fn read_file_text_truncates_large_files() {
        let dir = TempDir::new().unwrap();
        let big = dir.path().join("big.txt");
        fs::write(&big, "a".repeat(MAX_TEXT_BYTES as usize + 10)).unwrap();
        let content = LocalProvider::default()
            .read_file_text(&big.to_string_lossy())
            .await
            .unwrap();
        assert_eq!(content.text.map(|t| t.len()), Some(MAX_TEXT_BYTES as usize));
    }

    #[test]
    fn missing_metadata_ranks_after_present() {
        let order = OrderSpec::new(SortKey::Size, Direction::Asc);
        let mut entries = vec![
            ListingEntry {
                size_bytes: Some(5),
                ..ListingEntry::file("b")
            },
            ListingEntry::file("a"),
            ListingEntry {
                size_bytes: Some(1),
                ..ListingEntry::file("c")
            },
        ];
        sort_entries(&mut entries, &order);
        let got: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(got, vec!["c", "b", "a"]);

        // Descending flips the sized entries but the unsized one stays last.
        let order = OrderSpec::new(SortKey::Size, Direction::Desc);
        sort_entries(&mut entries, &order);
        let got: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(got, vec!["b", "c", "a"]);
    }

    #[test]
    fn extensionless_files_do_not_break_extension_sort() {
        let order = OrderSpec::new(SortKey::Extension, Direction::Asc);
        let file = |name: &str, ext: Option<&str>| ListingEntry {
            extension: ext.map(str::to_string),
            ..ListingEntry::file(name)
        };
        let a = file("a.zip", Some("zip"));
        let b = file("b", None);
        let c = file("c.aaa", Some("aaa"));
        assert_eq!(compare_entries(&c, &a, &order), Ordering::Less);
        assert_eq!(compare_entries(&a, &b, &order), Ordering::Less);
        assert_eq!(compare_entries(&c, &b, &order), Ordering::Less);

        let mut entries = vec![b, a, c];
        sort_entries(&mut entries, &order);
        let got: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(got, vec!["c.aaa", "a.zip", "b"]);
    }

    fn entry() -> impl Strategy<Value = ListingEntry> {
        (
            "[a-cA-C]{1,3}",
            prop::option::of(any::<bool>()),
            prop::option::of(prop::sample::select(vec!["zip", "aaa", "Mmm", "b", "q"])),
            prop::option::of(0u64..4),
            prop::option::of(0i64..4),
        )
            .prop_map(|(name, is_directory, ext, size, mtime)| ListingEntry {
                is_directory,
                extension: ext.map(str::to_string),
                mime_type: ext.map(|e| format!("application/{e}")),
                size_bytes: size,
                modified_secs: mtime,
                ..ListingEntry::named(name)
            })
    }

    fn orders() -> Vec<OrderSpec> {
        let keys = [
            SortKey::Name,
            SortKey::Extension,
            SortKey::Size,
            SortKey::ModifiedTime,
        ];
        keys.iter()
            .flat_map(|&k| [OrderSpec::new(k, Direction::Asc), OrderSpec::new(k, Direction::Desc)])
            .collect()
    }

    proptest! {
        #[test]
        fn sorting_sparse_metadata_yields_sorted_output(
            entries in prop::collection::vec(entry(), 0..48)
        ) {
            for order in orders() {
                let mut sorted = entries.clone();
                sort_entries(&mut sorted, &order);
                for pair in sorted.windows(2) {
                    prop_assert_ne!(compare_entries(&pair[0], &pair[1], &order), Ordering::Greater);
                }
            }
        }

        #[test]
        fn comparison_is_antisymmetric_and_transitive(
            a in entry(), b in entry(), c in entry()
        ) {
            for order in orders() {
                let ab = compare_entries(&a, &b, &order);
                prop_assert_eq!(ab, compare_entries(&b, &a, &order).reverse());
                let bc = compare_entries(&b, &c, &order);
                if ab != Ordering::Greater && bc != Ordering::Greater {
                    prop_assert_ne!(compare_entries(&a, &c, &order), Ordering::Greater);
                }
            }
        }
    }

    #[test]
    fn extension_ignored_for_directories() {
        let order = OrderSpec::new(SortKey::Extension, Direction::Asc);
        let a = ListingEntry {
            extension: Some("zip".into()),
            ..ListingEntry::directory("a.zip")
        };
        let b = ListingEntry {
            extension: Some("bin".into()),
            ..ListingEntry::directory("b.bin")
        };
        assert_eq!(compare_entries(&a, &b, &order), Ordering::Less);
    }

    #[tokio::test]
    async fn startup_path_is_passed_through() {
        let provider = LocalProvider::new(Some("/tmp".into()));
        assert_eq!(provider.startup_path().as_deref(), Some("/tmp"));
        assert!(LocalProvider::default().startup_path().is_none());
    }
}
