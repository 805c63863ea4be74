use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;

use crate::commands::open_write;

pub fn run(
    path: &Path,
    offset: u64,
    length: Option<u64>,
    input: &Path,
    entry_limit: u32,
) -> Result<()> {
    let data = std::fs::read(input).with_context(|| format!("read {}", input.display()))?;
    let length = length.unwrap_or(data.len() as u64);
    if data.len() as u64 != length {
        bail!(
            "file size {} doesn't match segment length {length}",
            data.len()
        );
    }

    let mut archive = open_write(path, entry_limit)?;
    archive.write_raw(offset as usize, &data)?;
    archive.flush()?;

    info!("wrote {length} bytes at offset {offset}");
    Ok(())
}
