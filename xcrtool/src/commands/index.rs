use anyhow::Result;
use std::path::Path;

use crate::commands::open_read;

pub fn run(path: &Path, entry_limit: u32) -> Result<()> {
    let mut archive = open_read(path, entry_limit)?;

    let magic = String::from_utf8_lossy(archive.magic())
        .trim_end_matches('\0')
        .to_string();
    println!("magic:       {magic}");
    println!("entries:     {}", archive.len());
    println!("file length: {}", archive.file_length());

    println!("{:>6}  {:>10}  {:>10}  name", "index", "offset", "length");
    for entry in archive.entries()? {
        let dir = &entry.directory_name;
        let sep = if dir.as_bytes().is_empty() { "" } else { "\\" };
        println!(
            "{:>6}  {:>10}  {:>10}  {dir}{sep}{}",
            entry.index(),
            entry.offset,
            entry.length,
            entry.file_name,
        );
    }
    Ok(())
}
