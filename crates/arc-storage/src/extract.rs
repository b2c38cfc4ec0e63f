//! Compressed-block extraction.
//!
//! Reads a file's stored block from the container, decompresses it when
//! flagged, validates the result against the declared decompressed size,
//! and writes output through a temporary file so a successful return
//! always means a complete file at the destination.

use crate::error::ExtractError;
use crate::index::ArcIndex;
use crate::metadata;
use crate::source::ContainerSource;
use crate::types::{FileMetadata, Region};
use arc_hash40::Hash40;
use flate2::read::ZlibDecoder;
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, trace};

fn corruption(message: String) -> ExtractError {
    ExtractError::Io(io::Error::new(io::ErrorKind::InvalidData, message))
}

/// Read and decompress one file's data block.
pub(crate) fn read_file(
    source: &ContainerSource,
    index: &ArcIndex,
    hash: Hash40,
    region: Region,
) -> Result<Vec<u8>, ExtractError> {
    let record =
        metadata::resolve(index, hash, region).ok_or(ExtractError::Missing(hash))?;
    read_block(source, &record)
}

pub(crate) fn read_block(
    source: &ContainerSource,
    record: &FileMetadata,
) -> Result<Vec<u8>, ExtractError> {
    let raw = source.read_at(record.offset, record.comp_size as usize)?;

    if !record.is_compressed {
        if record.comp_size != record.decomp_size {
            return Err(corruption(format!(
                "uncompressed block stores {} bytes but the record declares {}",
                record.comp_size, record.decomp_size
            )));
        }
        return Ok(raw);
    }

    let data = if record.uses_zstd {
        zstd::stream::decode_all(raw.as_slice())
            .map_err(|e| corruption(format!("zstd decompression failed: {e}")))?
    } else {
        let mut decoder = ZlibDecoder::new(raw.as_slice());
        let mut data = Vec::new();
        decoder
            .read_to_end(&mut data)
            .map_err(|e| corruption(format!("zlib decompression failed: {e}")))?;
        data
    };

    if data.len() as u64 != record.decomp_size {
        return Err(corruption(format!(
            "block decompressed to {} bytes, expected {}",
            data.len(),
            record.decomp_size
        )));
    }

    trace!(
        offset = record.offset,
        comp = record.comp_size,
        decomp = record.decomp_size,
        "read data block"
    );
    Ok(data)
}

/// Write `data` to `dest` through a temporary file in the same directory,
/// renamed into place once complete.
pub(crate) fn write_output(dest: &Path, data: &[u8]) -> Result<(), ExtractError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(dest).map_err(|e| ExtractError::Io(e.error))?;
    debug!(path = %dest.display(), bytes = data.len(), "extracted file");
    Ok(())
}
