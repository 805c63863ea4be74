use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod commands;

use commands::{append, compare, create, extract, find_offset, index, replace};

/// Accept plain decimal or 0x-prefixed hex, the way offsets usually arrive
/// from a hex editor.
fn auto_int(s: &str) -> Result<u64, std::num::ParseIntError> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse()
    }
}

#[derive(Parser)]
#[command(name = "xcrtool")]
#[command(about = "Warlords XCR archive inspector and editor")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Refuse archives that state more than this many entries (guard
    /// against damaged or hostile files)
    #[arg(long, default_value_t = 0x0001_0000, global = true)]
    entry_limit: u32,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, default_value = "info", global = true)]
    log_level: Level,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty archive
    Create {
        /// Path of the archive to create, must not exist yet
        file: PathBuf,
    },

    /// List header fields and every entry, running the consistency check
    Index {
        /// Archive to inspect
        file: PathBuf,
    },

    /// Copy a raw byte range out of the archive
    Extract {
        /// Archive to read
        file: PathBuf,

        /// Start of the range
        #[arg(long, value_parser = auto_int)]
        offset: u64,

        /// Size of the range
        #[arg(long, value_parser = auto_int)]
        length: u64,

        /// Where to write the data, '-' for stdout
        #[arg(long, default_value = "-")]
        out: String,
    },

    /// Overwrite a raw byte range with the contents of another file
    Replace {
        /// Archive to edit
        file: PathBuf,

        /// Start of the range
        #[arg(long, value_parser = auto_int)]
        offset: u64,

        /// Expected size of the range, defaults to the source file size and
        /// must match it exactly
        #[arg(long, value_parser = auto_int)]
        length: Option<u64>,

        /// File holding the replacement bytes
        #[arg(long = "in")]
        input: PathBuf,
    },

    /// Byte-compare a raw range against another file
    Compare {
        /// Archive to read
        file: PathBuf,

        /// Start of the range
        #[arg(long, value_parser = auto_int)]
        offset: u64,

        /// Size of the range, defaults to the source file size
        #[arg(long, value_parser = auto_int)]
        length: Option<u64>,

        /// File to compare against
        #[arg(long = "in")]
        input: PathBuf,
    },

    /// Append a new entry whose payload is the contents of another file
    Append {
        /// Archive to edit
        file: PathBuf,

        /// Entry file name
        #[arg(long)]
        file_name: String,

        /// Entry directory name
        #[arg(long, default_value = "")]
        directory_name: String,

        /// File holding the payload
        #[arg(long = "in")]
        input: PathBuf,
    },

    /// Report where the little-endian encoding of an offset value occurs
    FindOffset {
        /// Archive to scan
        file: PathBuf,

        /// Offset value to look for
        #[arg(long, value_parser = auto_int)]
        offset: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(cli.log_level).init();

    match cli.command {
        Commands::Create { file } => create::run(&file),
        Commands::Index { file } => index::run(&file, cli.entry_limit),
        Commands::Extract {
            file,
            offset,
            length,
            out,
        } => extract::run(&file, offset, length, &out, cli.entry_limit),
        Commands::Replace {
            file,
            offset,
            length,
            input,
        } => replace::run(&file, offset, length, &input, cli.entry_limit),
        Commands::Compare {
            file,
            offset,
            length,
            input,
        } => compare::run(&file, offset, length, &input, cli.entry_limit),
        Commands::Append {
            file,
            file_name,
            directory_name,
            input,
        } => append::run(&file, &file_name, &directory_name, &input, cli.entry_limit),
        Commands::FindOffset { file, offset } => find_offset::run(&file, offset, cli.entry_limit),
    }
}
