use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;

use crate::commands::open_read;

pub fn run(path: &Path, offset: u64, entry_limit: u32) -> Result<()> {
    let Ok(value) = u32::try_from(offset) else {
        bail!("offset {offset} does not fit the u32 format field");
    };

    let archive = open_read(path, entry_limit)?;
    match archive.find_offset_ref(value) {
        Some(position) => info!("little-endian {value:#x} first occurs at byte {position}"),
        None => info!("little-endian {value:#x} not found"),
    }
    Ok(())
}
