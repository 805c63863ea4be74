use thiserror::Error;

/// Archive error types
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Header declares more entries than the caller allows
    #[error("header states {found} entries, allowed are {limit} entries max")]
    EntryLimitExceeded { found: u32, limit: u32 },

    /// Append called with a length outside the u32 format field
    #[error("invalid entry length {0}")]
    InvalidLength(i64),

    /// Operation needs every table slot decoded first
    #[error("entry table is not fully loaded")]
    NotFullyLoaded,

    /// Entry index past the end of the table
    #[error("entry index {index} out of range, table has {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    /// Byte range outside the backing region
    #[error("range {offset}+{len} is outside the {size} byte region")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    /// Write or resize attempted on a read-only region
    #[error("region is read-only")]
    ReadOnly,

    /// Archive size arithmetic left the u32 range of the format
    #[error("archive size out of range for the u32 format field")]
    SizeOverflow,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;
