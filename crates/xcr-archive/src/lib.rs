//! Warlords XCR archive engine.
//!
//! An XCR file is a 28 byte header, a contiguous table of 528 byte entry
//! records (the allocation table), and the payload bytes of each entry. The
//! engine works on a shared memory mapping of the file and mutates it in
//! place: appending an entry first relocates any payload the growing table
//! would overwrite, always to the end of the file.

pub mod archive;
pub mod entry;
pub mod error;
pub mod region;

pub use archive::{Archive, Diagnostic, DEFAULT_ENTRY_LIMIT, HEADER_SIZE, MAGIC};
pub use entry::{Entry, NameField, NewEntry, ENTRY_SIZE, NAME_WIDTH, ZERO_WIDTH};
pub use error::{ArchiveError, Result};
pub use region::{FileRegion, Region, VecRegion};
