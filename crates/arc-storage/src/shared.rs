//! Content-deduplication group discovery.
//!
//! Shared files point at byte-identical data blocks. Groups come straight
//! from the index tables, where every member is registered against the
//! same group, so membership is symmetric by construction. Whether a
//! group lists the queried file itself is up to the mastering tool;
//! callers check rather than assume.

use crate::index::ArcIndex;
use crate::metadata;
use crate::types::Region;
use arc_hash40::{Hash40, LabelStore};

/// Display paths of every file sharing `hash`'s data block.
///
/// Order follows the index tables; callers that need a stable order sort
/// explicitly. Unknown hashes and unshared files yield an empty vec.
pub(crate) fn shared_paths(
    index: &ArcIndex,
    labels: &LabelStore,
    hash: Hash40,
    region: Region,
) -> Vec<String> {
    let Some(group) = index.group_for(hash, region) else {
        return Vec::new();
    };
    group
        .members
        .iter()
        .map(|&member| {
            metadata::display(index, labels, member, region)
                .map_or_else(|| member.to_string(), |resolved| resolved.path)
        })
        .collect()
}
