use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::commands::open_read;

pub fn run(
    path: &Path,
    offset: u64,
    length: Option<u64>,
    input: &Path,
    entry_limit: u32,
) -> Result<()> {
    let data = std::fs::read(input).with_context(|| format!("read {}", input.display()))?;
    let length = length.unwrap_or(data.len() as u64);

    let archive = open_read(path, entry_limit)?;
    let range = archive.read_raw(offset as usize, length as usize)?;

    if range == data {
        info!("match: OK");
    } else {
        info!("doesn't match!");
    }
    Ok(())
}
