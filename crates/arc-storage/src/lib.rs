//! Read-only access to ARC game-asset containers.
//!
//! An ARC addresses millions of files by 40-bit content hash instead of
//! path strings. This crate parses the container's flat node and metadata
//! tables, reconstructs the directory hierarchy from parent/child hash
//! relations, resolves authoritative per-region file records, discovers
//! deduplicated content groups, extracts compressed blocks, and serves
//! fuzzy search over every resolvable path.
//!
//! Everything goes through an [`ArcFile`] handle, which exclusively owns
//! the open container and all parsed tables:
//!
//! ```no_run
//! use arc_storage::{ArcFile, LabelStore, Region, hash40};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let labels = Arc::new(LabelStore::new());
//! labels.load("Hashes.txt")?;
//!
//! let arc = ArcFile::open("data.arc", labels)?;
//! for entry in arc.list_root(Region::None) {
//!     println!("{entry}");
//! }
//! arc.extract_file(
//!     hash40("fighter/mario/model/body/c00/model.numatb"),
//!     "model.numatb",
//!     Region::None,
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod error;
mod extract;
mod handle;
mod index;
mod metadata;
mod search;
mod shared;
mod source;
mod tree;
pub mod types;

pub use error::{ExtractError, OpenError};
pub use handle::ArcFile;
pub use search::SearchCache;
pub use types::{DirEntry, FileMetadata, InvalidRegion, Node, Region, ResolvedPath};

// Re-export the hash crate's surface; almost every caller needs it.
pub use arc_hash40::{Hash40, LabelStore, hash40};
