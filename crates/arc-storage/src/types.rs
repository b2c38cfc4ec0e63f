//! Common types used throughout the ARC engine

use arc_hash40::Hash40;
use std::fmt;

/// Localization region selector for regional file records.
///
/// Files flagged regional carry distinct data per region; everything else
/// has one canonical record served regardless of the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u32)]
pub enum Region {
    #[default]
    None = 0,
    Japanese = 1,
    UsEnglish = 2,
    UsFrench = 3,
    UsSpanish = 4,
    EuEnglish = 5,
    EuFrench = 6,
    EuSpanish = 7,
    EuGerman = 8,
    EuDutch = 9,
    EuItalian = 10,
    EuRussian = 11,
    Korean = 12,
    ChinaChinese = 13,
    TaiwanChinese = 14,
}

/// An out-of-range region code in a container table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRegion(pub u32);

impl fmt::Display for InvalidRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid region code {}", self.0)
    }
}

impl std::error::Error for InvalidRegion {}

impl TryFrom<u32> for Region {
    type Error = InvalidRegion;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::None,
            1 => Self::Japanese,
            2 => Self::UsEnglish,
            3 => Self::UsFrench,
            4 => Self::UsSpanish,
            5 => Self::EuEnglish,
            6 => Self::EuFrench,
            7 => Self::EuSpanish,
            8 => Self::EuGerman,
            9 => Self::EuDutch,
            10 => Self::EuItalian,
            11 => Self::EuRussian,
            12 => Self::Korean,
            13 => Self::ChinaChinese,
            14 => Self::TaiwanChinese,
            code => return Err(InvalidRegion(code)),
        })
    }
}

/// A directory or file node from the archive's flat node table.
///
/// A node's identity is its hash; the parent relation is recovered at
/// query time from the tables rather than stored as a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Directory(Hash40),
    File(Hash40),
}

impl Node {
    /// The node's identifying hash.
    pub const fn hash(self) -> Hash40 {
        match self {
            Self::Directory(hash) | Self::File(hash) => hash,
        }
    }

    pub const fn is_file(self) -> bool {
        matches!(self, Self::File(_))
    }
}

/// The authoritative record for one file in one region.
///
/// When `is_stream` is set, `ext_hash` and `file_name_hash` carry no
/// meaning; the full path is recoverable only from `path_hash` through
/// the label store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub path_hash: Hash40,
    pub ext_hash: Hash40,
    pub parent_hash: Hash40,
    pub file_name_hash: Hash40,
    /// Absolute byte offset of the data block in the container.
    pub offset: u64,
    /// Stored size of the data block in bytes.
    pub comp_size: u64,
    /// Size after decompression. Equals `comp_size` for uncompressed files.
    pub decomp_size: u64,
    pub is_stream: bool,
    pub is_shared: bool,
    pub is_redirect: bool,
    pub is_regional: bool,
    pub is_localized: bool,
    pub is_compressed: bool,
    pub uses_zstd: bool,
}

/// Display strings reconstructed for a file record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Full path, or the fixed-width hex of the path hash when neither
    /// the name nor the parent resolves.
    pub path: String,
    /// Name without the parent directory, or its hash in hex.
    pub file_name: String,
    /// Extension without the leading dot; empty when the name has none.
    pub extension: String,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq)]
pub struct DirEntry {
    pub node: Node,
    /// Display path; unresolved hashes render as fixed-width hex.
    pub path: String,
    /// Present for file nodes that have a record in the queried region.
    pub metadata: Option<FileMetadata>,
}

/// Renders as `D <path>` or `F <path>`.
impl fmt::Display for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.node.is_file() { "F" } else { "D" };
        write!(f, "{tag} {}", self.path)
    }
}
