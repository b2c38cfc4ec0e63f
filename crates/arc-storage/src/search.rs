//! Precomputed fuzzy-search index over every resolvable path.
//!
//! The cache snapshots one `(hash, path)` pair per file node reachable
//! from the root, taken at open time. It does not track label updates
//! made afterwards; reopening the archive rebuilds it.

use crate::index::{ArcIndex, ROOT_PARENT};
use crate::metadata;
use crate::types::{Node, Region};
use arc_hash40::{Hash40, LabelStore};
use std::collections::HashSet;
use tracing::debug;

// Score bands. Whole match classes stay ordered ahead of any in-band
// adjustment: exact > prefix > substring > subsequence.
const EXACT: i64 = 1 << 40;
const PREFIX: i64 = 1 << 38;
const SUBSTRING: i64 = 1 << 36;
const SUBSEQUENCE: i64 = 1 << 34;
const BOUNDARY_BONUS: i64 = 1 << 20;

struct SearchEntry {
    hash: Hash40,
    path: String,
    /// Case-folded copy, precomputed so queries don't re-fold per entry.
    folded: String,
}

/// Immutable snapshot of all file paths reachable from the root.
///
/// Owned by its archive handle and built exactly once per open.
pub struct SearchCache {
    entries: Vec<SearchEntry>,
}

impl SearchCache {
    /// Walk the tree and capture a display path for every reachable file.
    ///
    /// A file node without any metadata record means the index tables are
    /// inconsistent; that fails the build, which in turn fails the open.
    pub(crate) fn build(index: &ArcIndex, labels: &LabelStore) -> Result<Self, String> {
        let mut entries = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![ROOT_PARENT];
        visited.insert(ROOT_PARENT);

        while let Some(parent) = stack.pop() {
            for node in index.children_of(parent) {
                match *node {
                    Node::Directory(hash) => {
                        if visited.insert(hash) {
                            stack.push(hash);
                        }
                    }
                    Node::File(hash) => {
                        let resolved = metadata::display(index, labels, hash, Region::None)
                            .ok_or_else(|| format!("file node {hash} has no metadata record"))?;
                        entries.push(SearchEntry {
                            hash,
                            folded: resolved.path.to_ascii_lowercase(),
                            path: resolved.path,
                        });
                    }
                }
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(paths = entries.len(), "built search cache");
        Ok(Self { entries })
    }

    /// Number of paths in the snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The snapshot in ascending path order.
    pub fn entries(&self) -> impl Iterator<Item = (Hash40, &str)> {
        self.entries.iter().map(|e| (e.hash, e.path.as_str()))
    }

    /// Rank cached paths against `term`, best first, at most
    /// `max_results`. Ties break by ascending ordinal path order, so
    /// results are deterministic. An empty term yields no results.
    pub fn search(&self, term: &str, max_results: usize) -> Vec<String> {
        if term.is_empty() || max_results == 0 {
            return Vec::new();
        }
        let term = term.to_ascii_lowercase();

        let mut hits: Vec<(i64, &str)> = self
            .entries
            .iter()
            .filter_map(|e| score(&e.folded, &term).map(|s| (s, e.path.as_str())))
            .collect();
        hits.sort_unstable_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        hits.truncate(max_results);
        hits.into_iter().map(|(_, path)| path.to_string()).collect()
    }
}

/// Monotonic similarity of `path` to `term`, `None` when unrelated.
/// Both inputs are already case folded.
fn score(path: &str, term: &str) -> Option<i64> {
    if path == term {
        return Some(EXACT);
    }

    if let Some(position) = path.find(term) {
        let base = if position == 0 { PREFIX } else { SUBSTRING };
        // A match opening a path component beats one buried mid-token.
        let on_boundary =
            position == 0 || matches!(path.as_bytes()[position - 1], b'/' | b'.');
        let bonus = if on_boundary { BOUNDARY_BONUS } else { 0 };
        return Some(base + bonus - (position as i64) * 1024 - path.len() as i64);
    }

    subsequence_span(path, term).map(|span| {
        let gaps = (span - term.len()) as i64;
        SUBSEQUENCE - gaps * 1024 - path.len() as i64
    })
}

/// Width of the first greedy window containing `term` as a subsequence;
/// `None` when the characters never all appear in order.
fn subsequence_span(path: &str, term: &str) -> Option<usize> {
    let term = term.as_bytes();
    let mut matched = 0;
    let mut start = 0;
    for (position, &byte) in path.as_bytes().iter().enumerate() {
        if byte == term[matched] {
            if matched == 0 {
                start = position;
            }
            matched += 1;
            if matched == term.len() {
                return Some(position + 1 - start);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exact_beats_prefix_beats_substring_beats_subsequence() {
        let exact = score("model.numatb", "model.numatb").unwrap();
        let prefix = score("model.numatb_extra", "model.numatb").unwrap();
        let substring = score("c00/model.numatb", "model.numatb").unwrap();
        let subsequence = score("m_odel.numatb", "model.numatb").unwrap();
        assert!(exact > prefix);
        assert!(prefix > substring);
        assert!(substring > subsequence);
    }

    #[test]
    fn component_boundary_outranks_mid_token() {
        let boundary = score("fighter/mario/model.bin", "mario").unwrap();
        let mid_token = score("fighter/xmario/model.bin", "mario").unwrap();
        assert!(boundary > mid_token);
    }

    #[test]
    fn earlier_matches_rank_higher() {
        let early = score("fighter/mario.bin", "mario").unwrap();
        let late = score("fighter/extra/mario.bin", "mario").unwrap();
        assert!(early > late);
    }

    #[test]
    fn denser_subsequences_rank_higher() {
        let dense = score("ma_rio.bin", "mario").unwrap();
        let sparse = score("m_a_r_i_o.bin", "mario").unwrap();
        assert!(dense > sparse);
    }

    #[test]
    fn unrelated_paths_do_not_match() {
        assert_eq!(score("stage/battlefield.lvd", "zelda"), None);
    }
}
