use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use tracing::info;

use xcr_archive::{Archive, FileRegion, HEADER_SIZE};

pub fn run(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("create {}", path.display()))?;
    // a mapping needs a non-empty file; the factory rewrites this region
    file.set_len(HEADER_SIZE as u64)
        .with_context(|| format!("size {}", path.display()))?;

    let region = FileRegion::open_write(file)?;
    let mut archive = Archive::create(region)?;
    archive.flush()?;

    info!("created empty archive {}", path.display());
    Ok(())
}
