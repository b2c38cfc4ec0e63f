//! Dump the file tree of an ARC game-asset container.
//!
//! Loads a hash-label corpus, opens the container, prints its format
//! version and file count, then walks the whole tree depth first,
//! printing one `D <path>` or `F <path>` line per node.

use anyhow::Context;
use arc_storage::{ArcFile, LabelStore, Region};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "arc-dump",
    about = "Dump the file tree of an ARC game-asset container",
    version
)]
struct Cli {
    /// Line-separated corpus of candidate paths used to label hashes
    labels: PathBuf,

    /// The data.arc container to open
    archive: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let labels = Arc::new(LabelStore::new());
    labels
        .load(&cli.labels)
        .with_context(|| format!("failed to load hash labels from {}", cli.labels.display()))?;

    let arc = ArcFile::open(&cli.archive, labels)
        .with_context(|| format!("failed to open archive {}", cli.archive.display()))?;

    println!("version: {}", arc.version());
    println!("files: {}", arc.file_count());

    arc.walk(Region::None, |entry| println!("{entry}"));

    Ok(())
}
