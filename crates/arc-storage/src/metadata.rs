//! Per-region record resolution and display-path reconstruction.
//!
//! Every consumer that needs a readable path for a file hash goes through
//! [`display`]: the directory tree, the shared-file resolver, and the
//! search cache all render paths with the same rules, so hex fallbacks
//! look identical everywhere.

use crate::index::ArcIndex;
use crate::types::{FileMetadata, Region, ResolvedPath};
use arc_hash40::{Hash40, LabelStore};

/// Look up the authoritative record for `(hash, region)`.
///
/// Non-regional files store one canonical record which is served for
/// every region argument. Regional files resolve the exact region first,
/// then the canonical record, then the lowest stored region.
pub(crate) fn resolve(index: &ArcIndex, hash: Hash40, region: Region) -> Option<FileMetadata> {
    let records = index.records(hash)?;
    if let Some(record) = records.get(&region) {
        return Some(*record);
    }
    records
        .get(&Region::None)
        .or_else(|| records.values().next())
        .copied()
}

/// Reconstruct the display strings for `(hash, region)`.
pub(crate) fn display(
    index: &ArcIndex,
    labels: &LabelStore,
    hash: Hash40,
    region: Region,
) -> Option<ResolvedPath> {
    resolve(index, hash, region).map(|record| display_for(&record, labels))
}

/// Reconstruct the display strings for an already-resolved record.
pub(crate) fn display_for(record: &FileMetadata, labels: &LabelStore) -> ResolvedPath {
    if record.is_stream {
        return stream_display(record, labels);
    }

    let parent = labels.resolve(record.parent_hash);
    let name = labels.resolve(record.file_name_hash);
    let extension = labels
        .resolve(record.ext_hash)
        .unwrap_or_else(|| record.ext_hash.to_string());

    // With neither half resolved the path would be two hex fragments
    // glued together; the absolute hash is the better fallback.
    if parent.is_none() && name.is_none() {
        return ResolvedPath {
            path: record.path_hash.to_string(),
            file_name: record.file_name_hash.to_string(),
            extension,
        };
    }

    let file_name = name.unwrap_or_else(|| record.file_name_hash.to_string());
    let path = match parent.as_deref() {
        None | Some("") => file_name.clone(),
        Some(parent) if parent.ends_with('/') => format!("{parent}{file_name}"),
        Some(parent) => format!("{parent}/{file_name}"),
    };

    ResolvedPath {
        path,
        file_name,
        extension,
    }
}

/// Stream files carry only the absolute path hash; the name and
/// extension are substrings of the resolved path, and everything falls
/// back to hex together when the label is unknown.
fn stream_display(record: &FileMetadata, labels: &LabelStore) -> ResolvedPath {
    match labels.resolve(record.path_hash) {
        Some(path) => {
            let file_name = match path.rfind('/') {
                Some(slash) => path[slash + 1..].to_string(),
                None => path.clone(),
            };
            let extension = match file_name.rfind('.') {
                Some(dot) => file_name[dot + 1..].to_string(),
                None => String::new(),
            };
            ResolvedPath {
                path,
                file_name,
                extension,
            }
        }
        None => {
            let hex = record.path_hash.to_string();
            ResolvedPath {
                path: hex.clone(),
                file_name: hex.clone(),
                extension: hex,
            }
        }
    }
}
