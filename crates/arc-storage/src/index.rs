//! Parser for the container's flat index tables.
//!
//! The container opens with a fixed header, followed by three tables:
//! node records (kind, hash, parent), per-region file metadata records,
//! and shared-data groups. All integers are little-endian. The file data
//! region follows the tables; metadata offsets are absolute.

use crate::error::OpenError;
use crate::source::ContainerSource;
use crate::types::{FileMetadata, Node, Region};
use arc_hash40::Hash40;
use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use tracing::{debug, warn};

/// Magic bytes at the start of every container.
pub(crate) const ARC_MAGIC: u64 = 0xABCD_EF98_7654_3210;

/// Size of the fixed container header in bytes.
pub(crate) const HEADER_LEN: u64 = 44;

/// Size of one node record: kind, hash, parent.
const NODE_RECORD_LEN: u64 = 24;

/// Size of one metadata record: region key, seven u64 fields, seven flags.
const META_RECORD_LEN: u64 = 67;

/// Size of one shared-group header: region key and member count.
const GROUP_HEADER_LEN: u64 = 12;

/// Sentinel parent hash marking nodes directly under the archive root.
pub(crate) const ROOT_PARENT: Hash40 = Hash40::new(0);

pub(crate) struct SharedGroup {
    pub members: Vec<Hash40>,
}

/// Parsed in-memory tables of one container.
pub(crate) struct ArcIndex {
    format_version: u32,
    file_count: u64,
    /// Children in table order, keyed by parent hash.
    children: HashMap<Hash40, Vec<Node>>,
    /// Per-file records keyed by the file's path hash, then region.
    metadata: HashMap<Hash40, BTreeMap<Region, FileMetadata>>,
    groups: Vec<SharedGroup>,
    /// `(member, group region)` to position in `groups`.
    group_lookup: HashMap<(Hash40, Region), usize>,
}

impl ArcIndex {
    pub(crate) fn parse(source: &ContainerSource) -> Result<Self, OpenError> {
        let header = source.read_at(0, HEADER_LEN as usize)?;
        let mut cursor = Cursor::new(header.as_slice());

        let magic = cursor.read_u64::<LittleEndian>()?;
        if magic != ARC_MAGIC {
            return Err(OpenError::InvalidFormat(format!("bad magic {magic:#018x}")));
        }

        let version_word = cursor.read_u32::<LittleEndian>()?;
        let format_version = (version_word >> 16) & 0xF;
        if format_version == 0 {
            return Err(OpenError::InvalidFormat(format!(
                "unsupported format version in version word {version_word:#010x}"
            )));
        }

        let index_size = cursor.read_u64::<LittleEndian>()?;
        let node_count = cursor.read_u64::<LittleEndian>()?;
        let meta_count = cursor.read_u64::<LittleEndian>()?;
        let group_count = cursor.read_u64::<LittleEndian>()?;

        let fixed_len = node_count
            .checked_mul(NODE_RECORD_LEN)
            .and_then(|n| meta_count.checked_mul(META_RECORD_LEN).map(|m| (n, m)))
            .and_then(|(n, m)| group_count.checked_mul(GROUP_HEADER_LEN).map(|g| (n, m, g)))
            .and_then(|(n, m, g)| n.checked_add(m)?.checked_add(g));
        match fixed_len {
            Some(len) if len <= index_size => {}
            _ => {
                return Err(OpenError::InvalidFormat(format!(
                    "declared tables do not fit the index: {node_count} nodes, \
                     {meta_count} records, {group_count} groups in {index_size} bytes"
                )));
            }
        }

        let blob = source.read_at(HEADER_LEN, index_size as usize)?;
        let mut cursor = Cursor::new(blob.as_slice());

        // Node table. Nodes are keyed by hash; a duplicate hash is a
        // mastering defect and only the first record is kept.
        let mut seen = HashMap::with_capacity(node_count as usize);
        let mut children: HashMap<Hash40, Vec<Node>> = HashMap::new();
        let mut file_count = 0u64;
        for _ in 0..node_count {
            let kind = cursor.read_u64::<LittleEndian>()?;
            let hash = Hash40::new(cursor.read_u64::<LittleEndian>()?);
            let parent = Hash40::new(cursor.read_u64::<LittleEndian>()?);
            let node = match kind {
                0 => Node::Directory(hash),
                1 => Node::File(hash),
                other => {
                    return Err(OpenError::InvalidFormat(format!(
                        "unknown node kind {other} for {hash}"
                    )));
                }
            };
            if seen.insert(hash, node).is_some() {
                warn!(%hash, "duplicate node record, keeping the first");
                continue;
            }
            if node.is_file() {
                file_count += 1;
            }
            children.entry(parent).or_default().push(node);
        }

        // Metadata table. One record per (file, region); the last record
        // wins when a key repeats.
        let mut metadata: HashMap<Hash40, BTreeMap<Region, FileMetadata>> = HashMap::new();
        for _ in 0..meta_count {
            let region = read_region(&mut cursor)?;
            let record = read_metadata_record(&mut cursor)?;
            let replaced = metadata
                .entry(record.path_hash)
                .or_default()
                .insert(region, record);
            if replaced.is_some() {
                warn!(hash = %record.path_hash, ?region, "duplicate metadata record, keeping the last");
            }
        }

        // Shared-group table. Registering every member against the same
        // group is what makes membership symmetric.
        let mut groups = Vec::with_capacity(group_count as usize);
        let mut group_lookup = HashMap::new();
        for _ in 0..group_count {
            let region = read_region(&mut cursor)?;
            let member_count = cursor.read_u64::<LittleEndian>()?;
            let remaining = blob.len() as u64 - cursor.position();
            if member_count.checked_mul(8).is_none_or(|len| len > remaining) {
                return Err(OpenError::InvalidFormat(format!(
                    "shared group with {member_count} members overruns the index"
                )));
            }
            let mut members = Vec::with_capacity(member_count as usize);
            for _ in 0..member_count {
                let member = Hash40::new(cursor.read_u64::<LittleEndian>()?);
                group_lookup.insert((member, region), groups.len());
                members.push(member);
            }
            groups.push(SharedGroup { members });
        }

        debug!(
            version = format_version,
            nodes = seen.len(),
            files = file_count,
            records = meta_count,
            groups = groups.len(),
            "parsed archive index"
        );

        Ok(Self {
            format_version,
            file_count,
            children,
            metadata,
            groups,
            group_lookup,
        })
    }

    /// Archive format version, masked from bits 16..20 of the version word.
    pub(crate) fn format_version(&self) -> u32 {
        self.format_version
    }

    /// Number of file nodes in the container.
    pub(crate) fn file_count(&self) -> u64 {
        self.file_count
    }

    /// Children of `parent` in table order; empty for unknown parents.
    pub(crate) fn children_of(&self, parent: Hash40) -> &[Node] {
        self.children.get(&parent).map_or(&[], Vec::as_slice)
    }

    /// All per-region records for one file hash.
    pub(crate) fn records(&self, hash: Hash40) -> Option<&BTreeMap<Region, FileMetadata>> {
        self.metadata.get(&hash)
    }

    /// The dedup group covering `(hash, region)`, trying the exact region
    /// before the region-independent group.
    pub(crate) fn group_for(&self, hash: Hash40, region: Region) -> Option<&SharedGroup> {
        self.group_lookup
            .get(&(hash, region))
            .or_else(|| self.group_lookup.get(&(hash, Region::None)))
            .map(|&position| &self.groups[position])
    }
}

fn read_region(cursor: &mut Cursor<&[u8]>) -> Result<Region, OpenError> {
    let code = cursor.read_u32::<LittleEndian>()?;
    Region::try_from(code).map_err(|e| OpenError::InvalidFormat(e.to_string()))
}

fn read_metadata_record(cursor: &mut Cursor<&[u8]>) -> Result<FileMetadata, OpenError> {
    Ok(FileMetadata {
        path_hash: Hash40::new(cursor.read_u64::<LittleEndian>()?),
        ext_hash: Hash40::new(cursor.read_u64::<LittleEndian>()?),
        parent_hash: Hash40::new(cursor.read_u64::<LittleEndian>()?),
        file_name_hash: Hash40::new(cursor.read_u64::<LittleEndian>()?),
        offset: cursor.read_u64::<LittleEndian>()?,
        comp_size: cursor.read_u64::<LittleEndian>()?,
        decomp_size: cursor.read_u64::<LittleEndian>()?,
        is_stream: cursor.read_u8()? != 0,
        is_shared: cursor.read_u8()? != 0,
        is_redirect: cursor.read_u8()? != 0,
        is_regional: cursor.read_u8()? != 0,
        is_localized: cursor.read_u8()? != 0,
        is_compressed: cursor.read_u8()? != 0,
        uses_zstd: cursor.read_u8()? != 0,
    })
}
