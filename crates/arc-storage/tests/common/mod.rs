//! Shared fixture for building ARC containers in memory.
//!
//! The builder lays out the same sectioned table stream the parser
//! expects: fixed header, node table, metadata table, shared-group
//! table, then the raw data region.

#![allow(dead_code)]

use arc_storage::{LabelStore, hash40};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MAGIC: u64 = 0xABCD_EF98_7654_3210;

/// Format version 3, with noise in the unmasked bits.
pub const VERSION_WORD: u32 = 0x0003_0042;

/// Raw hash value of a path string.
pub fn h(path: &str) -> u64 {
    hash40(path).value()
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Store,
    Zlib,
    Zstd,
}

#[derive(Clone)]
pub struct FileOpts {
    pub region: u32,
    pub codec: Codec,
    pub is_stream: bool,
    pub is_shared: bool,
    pub is_regional: bool,
    pub is_localized: bool,
    /// Lie about the decompressed size to fabricate corruption.
    pub decomp_override: Option<u64>,
    /// Skip the node record, e.g. for extra per-region rows.
    pub node: bool,
}

impl Default for FileOpts {
    fn default() -> Self {
        Self {
            region: 0,
            codec: Codec::Store,
            is_stream: false,
            is_shared: false,
            is_regional: false,
            is_localized: false,
            decomp_override: None,
            node: true,
        }
    }
}

struct MetaRow {
    region: u32,
    path: u64,
    ext: u64,
    parent: u64,
    name: u64,
    blob: usize,
    decomp: u64,
    flags: [u8; 7],
}

pub struct ArcBuilder {
    version_word: u32,
    nodes: Vec<(u64, u64, u64)>,
    metas: Vec<MetaRow>,
    groups: Vec<(u32, Vec<u64>)>,
    blobs: Vec<Vec<u8>>,
}

impl ArcBuilder {
    pub fn new() -> Self {
        Self {
            version_word: VERSION_WORD,
            nodes: Vec::new(),
            metas: Vec::new(),
            groups: Vec::new(),
            blobs: Vec::new(),
        }
    }

    pub fn version_word(&mut self, word: u32) {
        self.version_word = word;
    }

    /// Directory node under `parent`; `""` is the root.
    pub fn dir(&mut self, path: &str, parent: &str) {
        self.nodes.push((0, h(path), h(parent)));
    }

    /// Arbitrary node record, for malformed-table cases.
    pub fn raw_node(&mut self, kind: u64, hash: u64, parent: u64) {
        self.nodes.push((kind, hash, parent));
    }

    /// File node plus a canonical metadata record. Returns the path hash.
    pub fn file(&mut self, parent: &str, name: &str, data: &[u8]) -> u64 {
        self.file_with(parent, name, data, FileOpts::default())
    }

    pub fn file_with(&mut self, parent: &str, name: &str, data: &[u8], opts: FileOpts) -> u64 {
        let path = if parent.is_empty() {
            name.to_string()
        } else {
            format!("{parent}/{name}")
        };
        let ext = match name.rfind('.') {
            Some(dot) => &name[dot + 1..],
            None => "",
        };
        let path_hash = h(&path);
        if opts.node {
            self.nodes.push((1, path_hash, h(parent)));
        }
        let blob = self.push_blob(data, opts.codec);
        self.metas.push(MetaRow {
            region: opts.region,
            path: path_hash,
            ext: h(ext),
            parent: h(parent),
            name: h(name),
            blob,
            decomp: opts.decomp_override.unwrap_or(data.len() as u64),
            flags: flag_bytes(&opts),
        });
        path_hash
    }

    /// Stream file: a node under `parent` whose record carries only the
    /// absolute path hash.
    pub fn stream_file(&mut self, parent: &str, full_path: &str, data: &[u8]) -> u64 {
        let path_hash = h(full_path);
        self.nodes.push((1, path_hash, h(parent)));
        let blob = self.push_blob(data, Codec::Store);
        self.metas.push(MetaRow {
            region: 0,
            path: path_hash,
            ext: 0,
            parent: 0,
            name: 0,
            blob,
            decomp: data.len() as u64,
            flags: [1, 0, 0, 0, 0, 0, 0],
        });
        path_hash
    }

    /// Second file whose record points at the same stored block as
    /// `other`. Marks both records shared.
    pub fn shared_file(&mut self, parent: &str, name: &str, other: u64) -> u64 {
        let source = self
            .metas
            .iter()
            .position(|m| m.path == other)
            .expect("shared_file: unknown source hash");
        self.metas[source].flags[1] = 1;
        let (blob, decomp, region) = {
            let m = &self.metas[source];
            (m.blob, m.decomp, m.region)
        };

        let path = if parent.is_empty() {
            name.to_string()
        } else {
            format!("{parent}/{name}")
        };
        let ext = match name.rfind('.') {
            Some(dot) => &name[dot + 1..],
            None => "",
        };
        let path_hash = h(&path);
        self.nodes.push((1, path_hash, h(parent)));
        self.metas.push(MetaRow {
            region,
            path: path_hash,
            ext: h(ext),
            parent: h(parent),
            name: h(name),
            blob,
            decomp,
            flags: [0, 1, 0, 0, 0, 0, 0],
        });
        path_hash
    }

    /// Shared-data group covering `members` in `region`.
    pub fn group(&mut self, region: u32, members: &[u64]) {
        self.groups.push((region, members.to_vec()));
    }

    fn push_blob(&mut self, data: &[u8], codec: Codec) -> usize {
        let stored = match codec {
            Codec::Store => data.to_vec(),
            Codec::Zlib => {
                let mut encoder = flate2::write::ZlibEncoder::new(
                    Vec::new(),
                    flate2::Compression::default(),
                );
                encoder.write_all(data).unwrap();
                encoder.finish().unwrap()
            }
            Codec::Zstd => zstd::stream::encode_all(data, 0).unwrap(),
        };
        self.blobs.push(stored);
        self.blobs.len() - 1
    }

    pub fn build(&self) -> Vec<u8> {
        let group_len: usize = self.groups.iter().map(|(_, m)| 12 + 8 * m.len()).sum();
        let index_size = self.nodes.len() * 24 + self.metas.len() * 67 + group_len;
        let data_base = 44 + index_size as u64;

        let mut blob_offsets = Vec::with_capacity(self.blobs.len());
        let mut cursor = data_base;
        for blob in &self.blobs {
            blob_offsets.push(cursor);
            cursor += blob.len() as u64;
        }

        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&self.version_word.to_le_bytes());
        out.extend_from_slice(&(index_size as u64).to_le_bytes());
        out.extend_from_slice(&(self.nodes.len() as u64).to_le_bytes());
        out.extend_from_slice(&(self.metas.len() as u64).to_le_bytes());
        out.extend_from_slice(&(self.groups.len() as u64).to_le_bytes());

        for &(kind, hash, parent) in &self.nodes {
            out.extend_from_slice(&kind.to_le_bytes());
            out.extend_from_slice(&hash.to_le_bytes());
            out.extend_from_slice(&parent.to_le_bytes());
        }
        for meta in &self.metas {
            out.extend_from_slice(&meta.region.to_le_bytes());
            out.extend_from_slice(&meta.path.to_le_bytes());
            out.extend_from_slice(&meta.ext.to_le_bytes());
            out.extend_from_slice(&meta.parent.to_le_bytes());
            out.extend_from_slice(&meta.name.to_le_bytes());
            out.extend_from_slice(&blob_offsets[meta.blob].to_le_bytes());
            out.extend_from_slice(&(self.blobs[meta.blob].len() as u64).to_le_bytes());
            out.extend_from_slice(&meta.decomp.to_le_bytes());
            out.extend_from_slice(&meta.flags);
        }
        for (region, members) in &self.groups {
            out.extend_from_slice(&region.to_le_bytes());
            out.extend_from_slice(&(members.len() as u64).to_le_bytes());
            for member in members {
                out.extend_from_slice(&member.to_le_bytes());
            }
        }
        for blob in &self.blobs {
            out.extend_from_slice(blob);
        }
        out
    }

    pub fn write_to(&self, dir: &Path) -> PathBuf {
        let path = dir.join("data.arc");
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

/// Label store loaded from an in-memory corpus.
pub fn loaded_labels(lines: &[&str]) -> Arc<LabelStore> {
    let store = LabelStore::new();
    store
        .load_from(std::io::Cursor::new(lines.join("\n")))
        .unwrap();
    Arc::new(store)
}

fn flag_bytes(opts: &FileOpts) -> [u8; 7] {
    let compressed = opts.codec != Codec::Store;
    [
        u8::from(opts.is_stream),
        u8::from(opts.is_shared),
        0,
        u8::from(opts.is_regional),
        u8::from(opts.is_localized),
        u8::from(compressed),
        u8::from(opts.codec == Codec::Zstd),
    ]
}
