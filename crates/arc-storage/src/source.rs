//! Random-access readers over the raw container bytes.
//!
//! Local containers are memory mapped when possible, which keeps
//! concurrent reads cheap; a buffered seek-and-read fallback covers
//! filesystems where mapping fails. Networked containers ride a single
//! stateful connection, so their reads are serialized behind a mutex.

use memmap2::{Mmap, MmapOptions};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::net::TcpStream;
use std::path::Path;
use tracing::debug;

/// Default port of the console-side file server for networked containers.
const NETWORK_PORT: u16 = 43022;

pub(crate) enum ContainerSource {
    /// Memory-mapped local file.
    Mapped { map: Mmap, len: u64 },
    /// Buffered local file; seeks are serialized.
    Seeking { file: Mutex<BufReader<File>>, len: u64 },
    /// Single stateful connection; requests are serialized.
    Network { stream: Mutex<TcpStream> },
}

impl ContainerSource {
    pub(crate) fn open_file(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();

        match unsafe { MmapOptions::new().map(&file) } {
            Ok(map) => {
                debug!(size = len, path = %path.display(), "memory-mapped container");
                Ok(Self::Mapped { map, len })
            }
            Err(e) => {
                debug!("memory mapping unavailable ({e}), using buffered reads");
                Ok(Self::Seeking {
                    file: Mutex::new(BufReader::new(file)),
                    len,
                })
            }
        }
    }

    /// Connect to a console-side file server. `addr` may be a bare host;
    /// the default port is appended when none is given.
    pub(crate) fn open_network(addr: &str) -> io::Result<Self> {
        let target = if addr.contains(':') {
            addr.to_string()
        } else {
            format!("{addr}:{NETWORK_PORT}")
        };
        let stream = TcpStream::connect(&target)?;
        stream.set_nodelay(true)?;
        debug!(%target, "connected to networked container");
        Ok(Self::Network {
            stream: Mutex::new(stream),
        })
    }

    /// Read exactly `len` bytes at absolute `offset`.
    pub(crate) fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        match self {
            Self::Mapped { map, len: size } => {
                let end = bounds_check(offset, len, *size)?;
                Ok(map[offset as usize..end as usize].to_vec())
            }
            Self::Seeking { file, len: size } => {
                bounds_check(offset, len, *size)?;
                let mut file = file.lock();
                file.seek(SeekFrom::Start(offset))?;
                let mut buf = vec![0u8; len];
                file.read_exact(&mut buf)?;
                Ok(buf)
            }
            Self::Network { stream } => {
                let mut stream = stream.lock();
                // Request framing: offset then size, both little-endian u64.
                let mut request = [0u8; 16];
                request[..8].copy_from_slice(&offset.to_le_bytes());
                request[8..].copy_from_slice(&(len as u64).to_le_bytes());
                stream.write_all(&request)?;

                let mut buf = vec![0u8; len];
                stream.read_exact(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

fn bounds_check(offset: u64, len: usize, size: u64) -> io::Result<u64> {
    offset
        .checked_add(len as u64)
        .filter(|end| *end <= size)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("read beyond container bounds: offset={offset}, len={len}, size={size}"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    fn file_source(bytes: &[u8]) -> (tempfile::TempDir, ContainerSource) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("container.arc");
        std::fs::File::create(&path).unwrap().write_all(bytes).unwrap();
        let source = ContainerSource::open_file(&path).unwrap();
        (dir, source)
    }

    #[test]
    fn reads_exact_ranges() {
        let (_dir, source) = file_source(b"0123456789");
        assert_eq!(source.read_at(0, 4).unwrap(), b"0123");
        assert_eq!(source.read_at(6, 4).unwrap(), b"6789");
    }

    #[test]
    fn rejects_out_of_bounds_reads() {
        let (_dir, source) = file_source(b"0123456789");
        let err = source.read_at(8, 4).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        let err = source.read_at(u64::MAX, 4).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
