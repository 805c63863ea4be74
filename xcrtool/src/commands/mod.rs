pub mod append;
pub mod compare;
pub mod create;
pub mod extract;
pub mod find_offset;
pub mod index;
pub mod replace;

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;

use xcr_archive::{Archive, FileRegion};

/// Map `path` read-only and open it as an archive.
pub(crate) fn open_read(path: &Path, entry_limit: u32) -> Result<Archive<FileRegion>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let region = FileRegion::open_read(file)?;
    Ok(Archive::open(region, entry_limit)?)
}

/// Map `path` read-write and open it as an archive.
pub(crate) fn open_write(path: &Path, entry_limit: u32) -> Result<Archive<FileRegion>> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("open {} for writing", path.display()))?;
    let region = FileRegion::open_write(file)?;
    Ok(Archive::open(region, entry_limit)?)
}
