//! The opened-container handle.

use crate::error::{ExtractError, OpenError};
use crate::extract;
use crate::index::ArcIndex;
use crate::search::SearchCache;
use crate::shared;
use crate::source::ContainerSource;
use crate::tree;
use crate::types::{DirEntry, FileMetadata, Region, ResolvedPath};
use crate::{metadata, types::Node};
use arc_hash40::{Hash40, LabelStore};
use lru::LruCache;
use parking_lot::Mutex;
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Decompressed blocks kept hot for repeated reads.
const BLOCK_CACHE_ENTRIES: NonZeroUsize = NonZeroUsize::new(128).unwrap();

/// An opened ARC container.
///
/// The handle exclusively owns the open container resource and all parsed
/// tables. Dropping it releases the container on every exit path;
/// [`ArcFile::close`] spells the release out at call sites, and ownership
/// makes use-after-close unrepresentable.
///
/// The parsed tables and the search cache are immutable after open, so
/// read-only queries may run concurrently from multiple threads. A
/// file-backed handle reads concurrently through its memory map; a
/// network-backed handle serializes reads over its single connection.
pub struct ArcFile {
    source: ContainerSource,
    index: ArcIndex,
    labels: Arc<LabelStore>,
    search: SearchCache,
    cache: Mutex<LruCache<(Hash40, Region), Vec<u8>>>,
}

impl ArcFile {
    /// Open a local container file.
    ///
    /// The label store must already be loaded: without it every path
    /// would silently degrade to hex, so the open fails fast with
    /// [`OpenError::LabelsNotLoaded`] instead.
    pub fn open(path: impl AsRef<Path>, labels: Arc<LabelStore>) -> Result<Self, OpenError> {
        let path = path.as_ref();
        if !labels.is_loaded() {
            return Err(OpenError::LabelsNotLoaded);
        }
        if path.as_os_str().is_empty() {
            return Err(OpenError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty archive path",
            )));
        }
        Self::from_source(ContainerSource::open_file(path)?, labels)
    }

    /// Open a container served over the network by a console-side file
    /// server, e.g. `"192.168.1.20"`. Reads share one connection and are
    /// serialized internally; concurrent extraction gains nothing here.
    pub fn open_networked(addr: &str, labels: Arc<LabelStore>) -> Result<Self, OpenError> {
        if !labels.is_loaded() {
            return Err(OpenError::LabelsNotLoaded);
        }
        if addr.is_empty() {
            return Err(OpenError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty archive address",
            )));
        }
        Self::from_source(ContainerSource::open_network(addr)?, labels)
    }

    fn from_source(source: ContainerSource, labels: Arc<LabelStore>) -> Result<Self, OpenError> {
        let index = ArcIndex::parse(&source)?;
        // The archive is unusable without its search cache; a failed
        // build fails the whole open.
        let search =
            SearchCache::build(&index, &labels).map_err(OpenError::SearchCacheFailed)?;

        info!(
            version = index.format_version(),
            files = index.file_count(),
            "opened archive"
        );

        Ok(Self {
            source,
            index,
            labels,
            search,
            cache: Mutex::new(LruCache::new(BLOCK_CACHE_ENTRIES)),
        })
    }

    /// The total number of file entries in the archive.
    pub fn file_count(&self) -> u64 {
        self.index.file_count()
    }

    /// Archive format version, masked from the header's version word.
    pub fn version(&self) -> u32 {
        self.index.format_version()
    }

    /// Nodes directly under the root, ascending by display path.
    pub fn list_root(&self, region: Region) -> Vec<DirEntry> {
        tree::list_root(&self.index, &self.labels, region)
    }

    /// Children of `parent`, ascending by display path. Empty for leaf
    /// directories and unknown parents, never an error.
    pub fn list_children(&self, parent: Hash40, region: Region) -> Vec<DirEntry> {
        tree::list_children(&self.index, &self.labels, parent, region)
    }

    /// The authoritative record for `(hash, region)`, if any.
    pub fn metadata(&self, hash: Hash40, region: Region) -> Option<FileMetadata> {
        metadata::resolve(&self.index, hash, region)
    }

    /// Display path, file name, and extension for a file record.
    pub fn resolved_path(&self, hash: Hash40, region: Region) -> Option<ResolvedPath> {
        metadata::display(&self.index, &self.labels, hash, region)
    }

    /// Display paths of every file sharing `hash`'s data block, in index
    /// order. Callers that need a stable order sort explicitly.
    pub fn shared_paths(&self, hash: Hash40, region: Region) -> Vec<String> {
        shared::shared_paths(&self.index, &self.labels, hash, region)
    }

    /// The decompressed contents of one file.
    pub fn read_file(&self, hash: Hash40, region: Region) -> Result<Vec<u8>, ExtractError> {
        if let Some(data) = self.cache.lock().get(&(hash, region)) {
            return Ok(data.clone());
        }
        let data = extract::read_file(&self.source, &self.index, hash, region)?;
        self.cache.lock().put((hash, region), data.clone());
        Ok(data)
    }

    /// Extract one file to `dest`. A successful return means a complete,
    /// correctly sized file exists at `dest`.
    pub fn extract_file(
        &self,
        hash: Hash40,
        dest: impl AsRef<Path>,
        region: Region,
    ) -> Result<(), ExtractError> {
        let data = self.read_file(hash, region)?;
        extract::write_output(dest.as_ref(), &data)
    }

    /// Fuzzy-search the path snapshot taken at open time.
    pub fn search(&self, term: &str, max_results: usize) -> Vec<String> {
        self.search.search(term, max_results)
    }

    /// The path snapshot built when this archive was opened.
    pub fn search_cache(&self) -> &SearchCache {
        &self.search
    }

    /// Walk the whole tree depth first, visiting every entry in listing
    /// order.
    pub fn walk(&self, region: Region, mut visit: impl FnMut(&DirEntry)) {
        fn recurse(arc: &ArcFile, entry: &DirEntry, region: Region, visit: &mut impl FnMut(&DirEntry)) {
            visit(entry);
            if let Node::Directory(hash) = entry.node {
                for child in arc.list_children(hash, region) {
                    recurse(arc, &child, region, visit);
                }
            }
        }
        for entry in self.list_root(region) {
            recurse(self, &entry, region, &mut visit);
        }
    }

    /// Release the container and all owned tables.
    ///
    /// Dropping the handle has the same effect; this spelling makes the
    /// release explicit at call sites.
    pub fn close(self) {
        drop(self);
    }
}
