//! Error types for ARC container operations

use arc_hash40::Hash40;
use std::io;
use thiserror::Error;

/// Errors produced while opening a container.
///
/// All of these are fatal to the open attempt; no handle is produced.
#[derive(Error, Debug)]
pub enum OpenError {
    /// The label dictionary has not been loaded yet. Opening without it
    /// would silently degrade every path to hex display, so it is
    /// rejected up front.
    #[error("hash labels are not loaded")]
    LabelsNotLoaded,

    #[error("invalid archive format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("search cache build failed: {0}")]
    SearchCacheFailed(String),
}

/// Errors produced while reading or extracting file data.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// No record exists for the requested hash in any region.
    #[error("no file entry for {0}")]
    Missing(Hash40),

    /// Read, decompression, or output failure. Corrupt blocks surface
    /// here with [`io::ErrorKind::InvalidData`].
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
