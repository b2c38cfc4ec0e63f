//! Reverse lookup from [`Hash40`] to the original path string.
//!
//! Label corpora are plain UTF-8 text with one candidate path per line.
//! They are community maintained; a hash only resolves if somebody has
//! already discovered the string behind it, so most archives resolve a
//! subset of their hashes and everything else falls back to hex display.

use crate::{Hash40, hash40};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Dictionary mapping hashes back to the strings they were derived from.
///
/// A fresh store is uninitialized: [`LabelStore::resolve`] answers `None`
/// for everything and [`LabelStore::is_loaded`] is `false`. A successful
/// [`LabelStore::load`] initializes it; a later load replaces the whole
/// mapping. Archive opening refuses to proceed against an uninitialized
/// store, so a store instance is created once and shared.
#[derive(Default)]
pub struct LabelStore {
    inner: RwLock<Option<HashMap<Hash40, String>>>,
}

impl LabelStore {
    /// Create an uninitialized store.
    pub const fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Load a corpus file, replacing any previously loaded mapping.
    ///
    /// Returns the number of distinct hashes on success. On failure the
    /// store keeps whatever state it had before the call.
    pub fn load(&self, path: impl AsRef<Path>) -> io::Result<usize> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let count = self.load_from(BufReader::new(file))?;
        debug!(entries = count, path = %path.display(), "loaded hash labels");
        Ok(count)
    }

    /// Load a corpus from any buffered reader.
    ///
    /// Blank lines are skipped. When two lines hash identically the later
    /// line wins, matching how external corpora are deduplicated.
    pub fn load_from(&self, reader: impl BufRead) -> io::Result<usize> {
        let mut map = HashMap::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            map.insert(hash40(&line), line);
        }
        let count = map.len();
        // Swap in only after the whole corpus read through cleanly.
        *self.inner.write() = Some(map);
        Ok(count)
    }

    /// The string behind `hash`, if the corpus contains it.
    pub fn resolve(&self, hash: Hash40) -> Option<String> {
        self.inner.read().as_ref()?.get(&hash).cloned()
    }

    /// `true` once a corpus has been loaded successfully.
    pub fn is_loaded(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Number of labeled hashes, zero when uninitialized.
    pub fn len(&self) -> usize {
        self.inner.read().as_ref().map_or(0, HashMap::len)
    }

    /// `true` when no labels are available.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
