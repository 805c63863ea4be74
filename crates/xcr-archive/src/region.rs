//! Backing byte regions for archives.
//!
//! The archive engine never opens files itself; callers hand it a [`Region`],
//! either a shared file mapping ([`FileRegion`]) or an in-memory buffer
//! ([`VecRegion`]).

use std::fs::File;

use memmap2::{Mmap, MmapMut, MmapOptions};

use crate::error::{ArchiveError, Result};

fn check_range(size: usize, offset: usize, len: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(ArchiveError::OutOfBounds {
            offset: offset as u64,
            len: len as u64,
            size: size as u64,
        }),
    }
}

/// Readable, optionally writable, resizable byte storage.
///
/// All accesses are bounds-checked; a range past the end fails with
/// [`ArchiveError::OutOfBounds`] instead of panicking, since offsets
/// frequently come straight from the command line or from untrusted
/// table records.
pub trait Region {
    /// Current physical size in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared view of `len` bytes at `offset`.
    fn get(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Mutable view of `len` bytes at `offset`.
    fn get_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]>;

    /// Grow or shrink the region to `new_len` bytes. New bytes read as zero.
    fn resize(&mut self, new_len: usize) -> Result<()>;

    /// Force pending changes to stable storage.
    fn flush(&mut self) -> Result<()>;

    /// Copy `len` bytes from `src` to `dst` within the region. The ranges
    /// may overlap.
    fn copy_within(&mut self, src: usize, dst: usize, len: usize) -> Result<()> {
        let size = self.len();
        check_range(size, src, len)?;
        check_range(size, dst, len)?;
        let all = self.get_mut(0, size)?;
        all.copy_within(src..src + len, dst);
        Ok(())
    }

    /// Overwrite `len` bytes at `offset` with `byte`.
    fn fill(&mut self, offset: usize, len: usize, byte: u8) -> Result<()> {
        self.get_mut(offset, len)?.fill(byte);
        Ok(())
    }
}

enum Map {
    Ro(Mmap),
    Rw(MmapMut),
}

/// Shared memory mapping of a file.
///
/// Assumes exclusive ownership of the file for the lifetime of the mapping;
/// there is no coordination with other writers. Mapping requires a non-empty
/// file.
pub struct FileRegion {
    file: File,
    map: Map,
}

impl FileRegion {
    /// Map `file` read-only. Writes and resizes will fail with
    /// [`ArchiveError::ReadOnly`].
    pub fn open_read(file: File) -> Result<Self> {
        let map = unsafe { MmapOptions::new().map(&file)? };
        Ok(Self {
            file,
            map: Map::Ro(map),
        })
    }

    /// Map `file` read-write. The file must be open for both reading and
    /// writing.
    pub fn open_write(file: File) -> Result<Self> {
        let map = unsafe { MmapOptions::new().map_mut(&file)? };
        Ok(Self {
            file,
            map: Map::Rw(map),
        })
    }
}

impl Region for FileRegion {
    fn len(&self) -> usize {
        match &self.map {
            Map::Ro(m) => m.len(),
            Map::Rw(m) => m.len(),
        }
    }

    fn get(&self, offset: usize, len: usize) -> Result<&[u8]> {
        check_range(self.len(), offset, len)?;
        let bytes: &[u8] = match &self.map {
            Map::Ro(m) => m,
            Map::Rw(m) => m,
        };
        Ok(&bytes[offset..offset + len])
    }

    fn get_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        check_range(self.len(), offset, len)?;
        match &mut self.map {
            Map::Ro(_) => Err(ArchiveError::ReadOnly),
            Map::Rw(m) => Ok(&mut m[offset..offset + len]),
        }
    }

    fn resize(&mut self, new_len: usize) -> Result<()> {
        match &mut self.map {
            Map::Ro(_) => Err(ArchiveError::ReadOnly),
            Map::Rw(map) => {
                map.flush()?;
                self.file.set_len(new_len as u64)?;
                *map = unsafe { MmapOptions::new().map_mut(&self.file)? };
                Ok(())
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        match &mut self.map {
            Map::Ro(_) => Ok(()),
            Map::Rw(map) => {
                map.flush()?;
                Ok(())
            }
        }
    }
}

/// In-memory region backed by a `Vec<u8>`.
#[derive(Debug, Default, Clone)]
pub struct VecRegion {
    buf: Vec<u8>,
}

impl VecRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(buf: Vec<u8>) -> Self {
        Self { buf }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Region for VecRegion {
    fn len(&self) -> usize {
        self.buf.len()
    }

    fn get(&self, offset: usize, len: usize) -> Result<&[u8]> {
        check_range(self.buf.len(), offset, len)?;
        Ok(&self.buf[offset..offset + len])
    }

    fn get_mut(&mut self, offset: usize, len: usize) -> Result<&mut [u8]> {
        check_range(self.buf.len(), offset, len)?;
        Ok(&mut self.buf[offset..offset + len])
    }

    fn resize(&mut self, new_len: usize) -> Result<()> {
        self.buf.resize(new_len, 0);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn out_of_range_access_fails() {
        let region = VecRegion::from_bytes(vec![0; 16]);
        assert!(region.get(0, 16).is_ok());
        assert!(matches!(
            region.get(8, 9),
            Err(ArchiveError::OutOfBounds { .. })
        ));
        assert!(matches!(
            region.get(usize::MAX, 2),
            Err(ArchiveError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn resize_zero_fills() {
        let mut region = VecRegion::from_bytes(vec![0xff; 4]);
        region.resize(8).unwrap();
        assert_eq!(region.as_bytes(), &[0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]);
    }

    #[test]
    fn copy_within_and_fill() {
        let mut region = VecRegion::from_bytes(vec![1, 2, 3, 4, 0, 0, 0, 0]);
        region.copy_within(0, 4, 4).unwrap();
        region.fill(0, 4, 0).unwrap();
        assert_eq!(region.as_bytes(), &[0, 0, 0, 0, 1, 2, 3, 4]);
    }
}
