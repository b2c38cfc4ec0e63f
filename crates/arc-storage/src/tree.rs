//! Directory-tree reconstruction from the flat node table.
//!
//! There are no stored child pointers; a listing is every node whose
//! recovered parent hash equals the query key, rendered to a display
//! form and sorted by it.

use crate::index::{ArcIndex, ROOT_PARENT};
use crate::metadata;
use crate::types::{DirEntry, Node, Region};
use arc_hash40::{Hash40, LabelStore};

/// List the nodes directly under the archive root.
pub(crate) fn list_root(index: &ArcIndex, labels: &LabelStore, region: Region) -> Vec<DirEntry> {
    list_children(index, labels, ROOT_PARENT, region)
}

/// List the children of `parent`, sorted ascending by display path with
/// byte-wise comparison. Hex fallbacks interleave with resolved names by
/// raw character value; they are not segregated.
///
/// Leaf directories and unknown parents yield an empty listing.
pub(crate) fn list_children(
    index: &ArcIndex,
    labels: &LabelStore,
    parent: Hash40,
    region: Region,
) -> Vec<DirEntry> {
    let mut entries: Vec<DirEntry> = index
        .children_of(parent)
        .iter()
        .map(|&node| entry_for(index, labels, node, region))
        .collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

fn entry_for(index: &ArcIndex, labels: &LabelStore, node: Node, region: Region) -> DirEntry {
    match node {
        Node::Directory(hash) => DirEntry {
            node,
            path: labels.resolve(hash).unwrap_or_else(|| hash.to_string()),
            metadata: None,
        },
        Node::File(hash) => match metadata::resolve(index, hash, region) {
            Some(record) => DirEntry {
                node,
                path: metadata::display_for(&record, labels).path,
                metadata: Some(record),
            },
            // A file node without any record still renders, so a listing
            // never fails.
            None => DirEntry {
                node,
                path: labels.resolve(hash).unwrap_or_else(|| hash.to_string()),
                metadata: None,
            },
        },
    }
}
