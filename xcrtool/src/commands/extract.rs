use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::Path;

use crate::commands::open_read;

pub fn run(path: &Path, offset: u64, length: u64, out: &str, entry_limit: u32) -> Result<()> {
    let archive = open_read(path, entry_limit)?;
    let data = archive.read_raw(offset as usize, length as usize)?;

    match out {
        "-" => io::stdout()
            .write_all(data)
            .context("write to stdout")?,
        path => std::fs::write(path, data).with_context(|| format!("write {path}"))?,
    }
    Ok(())
}
