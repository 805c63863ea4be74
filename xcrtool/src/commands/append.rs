use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use xcr_archive::NewEntry;

use crate::commands::open_write;

pub fn run(
    path: &Path,
    file_name: &str,
    directory_name: &str,
    input: &Path,
    entry_limit: u32,
) -> Result<()> {
    let data = std::fs::read(input).with_context(|| format!("read {}", input.display()))?;

    let mut archive = open_write(path, entry_limit)?;
    let entry = NewEntry::new(file_name, directory_name).with_length(data.len() as i64);
    let (offset, index) = {
        let appended = archive.append(entry)?;
        (appended.offset, appended.index())
    };
    archive.write_raw(offset as usize, &data)?;
    archive.flush()?;

    info!(
        "appended entry {index} at offset {offset} ({} bytes)",
        data.len()
    );
    Ok(())
}
