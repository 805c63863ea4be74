//! The archive engine: header state, lazy entry table, in-place mutation.

use std::fmt;

use tracing::{error, info, warn};

use crate::entry::{Entry, NewEntry, ENTRY_SIZE};
use crate::error::{ArchiveError, Result};
use crate::region::Region;

/// Magic written into fresh archives. Trailing bytes of the 16 byte field
/// are NUL; existing archives may carry anything there and it is preserved.
pub const MAGIC: &[u8] = b"xcr File 1.00";

const MAGIC_WIDTH: usize = 16;
const RESERVED_WIDTH: usize = 4;

/// Size of the fixed header at offset 0.
pub const HEADER_SIZE: usize = MAGIC_WIDTH + RESERVED_WIDTH + 4 + 4;

/// Default guard against absurd entry counts in damaged or hostile files.
pub const DEFAULT_ENTRY_LIMIT: u32 = 0x0001_0000;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    magic: [u8; MAGIC_WIDTH],
    reserved: [u8; RESERVED_WIDTH],
    entry_count: u32,
    file_length: u32,
}

impl Header {
    fn decode(raw: &[u8]) -> Self {
        debug_assert_eq!(raw.len(), HEADER_SIZE);
        let (magic, rest) = raw.split_at(MAGIC_WIDTH);
        let (reserved, rest) = rest.split_at(RESERVED_WIDTH);
        let (entry_count, file_length) = rest.split_at(4);

        Self {
            magic: magic.try_into().unwrap(),
            reserved: reserved.try_into().unwrap(),
            entry_count: u32::from_le_bytes(entry_count.try_into().unwrap()),
            file_length: u32::from_le_bytes(file_length.try_into().unwrap()),
        }
    }

    fn encode_into(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), HEADER_SIZE);
        let (magic, rest) = out.split_at_mut(MAGIC_WIDTH);
        let (reserved, rest) = rest.split_at_mut(RESERVED_WIDTH);
        let (entry_count, file_length) = rest.split_at_mut(4);

        magic.copy_from_slice(&self.magic);
        reserved.copy_from_slice(&self.reserved);
        entry_count.copy_from_slice(&self.entry_count.to_le_bytes());
        file_length.copy_from_slice(&self.file_length.to_le_bytes());
    }

    fn fresh() -> Self {
        let mut magic = [0u8; MAGIC_WIDTH];
        magic[..MAGIC.len()].copy_from_slice(MAGIC);
        Self {
            magic,
            reserved: [0; RESERVED_WIDTH],
            entry_count: 0,
            file_length: HEADER_SIZE as u32,
        }
    }
}

/// Non-fatal finding of the whole-table consistency check.
///
/// Diagnostics never block an operation; the automatic once-per-session
/// check logs them and the archive stays usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Non-zero bytes between the end of the entry table and the first
    /// data segment.
    HiddenData { start: u64, end: u64 },
    /// The entry table runs into the first data segment.
    TableOverlap { table_end: u64, first_offset: u32 },
    /// The physical backing size exceeds the declared archive length.
    SizeMismatch { declared: u32, physical: u64 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::HiddenData { start, end } => write!(
                f,
                "unsupported hidden data area between the entry table and the first data segment ({start}..{end})"
            ),
            Diagnostic::TableOverlap {
                table_end,
                first_offset,
            } => write!(
                f,
                "archive is most likely damaged: reserved table area up to {table_end} is used by the data segment at {first_offset}"
            ),
            Diagnostic::SizeMismatch { declared, physical } => write!(
                f,
                "archive length {declared} does not match file size {physical}"
            ),
        }
    }
}

/// An open XCR archive over a backing [`Region`].
///
/// Entries are decoded lazily, one table slot per first access. Once every
/// slot has been decoded the consistency check of [`Archive::validate`] runs
/// once and its findings are logged. Mutating operations force the whole
/// table into memory first; relocation decisions need the true minimum
/// offset across all entries.
#[derive(Debug)]
pub struct Archive<R: Region> {
    region: R,
    header: Header,
    slots: Vec<Option<Entry>>,
    fully_loaded: bool,
}

impl<R: Region> Archive<R> {
    /// Parse the header at offset 0 and set up the empty slot table.
    ///
    /// Fails with [`ArchiveError::EntryLimitExceeded`] if the header states
    /// more than `entry_limit` entries.
    pub fn open(region: R, entry_limit: u32) -> Result<Self> {
        let header = Header::decode(region.get(0, HEADER_SIZE)?);
        if header.entry_count > entry_limit {
            return Err(ArchiveError::EntryLimitExceeded {
                found: header.entry_count,
                limit: entry_limit,
            });
        }

        let slots = vec![None; header.entry_count as usize];
        Ok(Self {
            region,
            header,
            slots,
            fully_loaded: false,
        })
    }

    /// Write a fresh empty archive into `region` and open it.
    pub fn create(mut region: R) -> Result<Self> {
        region.resize(HEADER_SIZE)?;
        Header::fresh().encode_into(region.get_mut(0, HEADER_SIZE)?);
        Self::open(region, DEFAULT_ENTRY_LIMIT)
    }

    /// Number of table slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Declared total archive size in bytes. Authoritative for where new
    /// data is appended; may differ from the physical backing size.
    pub fn file_length(&self) -> u32 {
        self.header.file_length
    }

    /// Raw magic field of the header, unknown trailing bytes included.
    pub fn magic(&self) -> &[u8] {
        &self.header.magic
    }

    /// The backing region.
    pub fn region(&self) -> &R {
        &self.region
    }

    /// Mutable access to the backing region, for callers that write payload
    /// past the declared end before [`Archive::rewrite_last_entry_length`].
    pub fn region_mut(&mut self) -> &mut R {
        &mut self.region
    }

    fn table_offset(index: usize) -> usize {
        HEADER_SIZE + index * ENTRY_SIZE
    }

    /// The entry in table slot `index`, decoding and caching it on first
    /// access. Decoding the last empty slot triggers the one-time
    /// consistency check.
    pub fn entry(&mut self, index: usize) -> Result<&Entry> {
        let len = self.slots.len();
        if index >= len {
            return Err(ArchiveError::IndexOutOfRange { index, len });
        }

        if self.slots[index].is_none() {
            let record = self.region.get(Self::table_offset(index), ENTRY_SIZE)?;
            let decoded = Entry::decode(record, index);
            self.slots[index] = Some(decoded);
            if !self.fully_loaded && self.slots.iter().all(Option::is_some) {
                self.run_validation();
            }
        }

        match self.slots[index].as_ref() {
            Some(entry) => Ok(entry),
            None => unreachable!(),
        }
    }

    /// Decode every remaining slot and run the one-time consistency check.
    pub fn load_all(&mut self) -> Result<()> {
        for index in 0..self.slots.len() {
            self.entry(index)?;
        }
        // an empty table never passes through entry(), check here
        if !self.fully_loaded {
            self.run_validation();
        }
        Ok(())
    }

    /// All entries in table order, materializing the table first.
    pub fn entries(&mut self) -> Result<impl Iterator<Item = &Entry> + '_> {
        self.load_all()?;
        Ok(self.slots.iter().flatten())
    }

    fn run_validation(&mut self) {
        for diag in self.validate_loaded() {
            match &diag {
                Diagnostic::TableOverlap { .. } => error!("{diag}"),
                _ => warn!("{diag}"),
            }
        }
        self.fully_loaded = true;
    }

    /// Whole-table consistency check.
    ///
    /// Returns the findings without logging or mutating anything, so two
    /// calls on an unchanged table report the same list. An all-zero gap
    /// between table and first segment counts as reserved padding and is
    /// accepted silently.
    pub fn validate(&mut self) -> Result<Vec<Diagnostic>> {
        self.load_all()?;
        Ok(self.validate_loaded())
    }

    fn validate_loaded(&self) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        let table_end = HEADER_SIZE as u64 + self.slots.len() as u64 * ENTRY_SIZE as u64;

        if let Some(first) = self.slots.iter().flatten().min_by_key(|e| e.offset) {
            let first_offset = u64::from(first.offset);
            if first_offset > table_end {
                let zeroed = self
                    .region
                    .get(table_end as usize, (first_offset - table_end) as usize)
                    .map(|gap| gap.iter().all(|&b| b == 0))
                    .unwrap_or(false);
                if !zeroed {
                    diags.push(Diagnostic::HiddenData {
                        start: table_end,
                        end: first_offset,
                    });
                }
            } else if first_offset < table_end {
                diags.push(Diagnostic::TableOverlap {
                    table_end,
                    first_offset: first.offset,
                });
            }
        }

        if self.region.len() as u64 > u64::from(self.header.file_length) {
            diags.push(Diagnostic::SizeMismatch {
                declared: self.header.file_length,
                physical: self.region.len() as u64,
            });
        }

        diags
    }

    /// Slot of the lowest-offset entry that owns any payload bytes.
    /// Zero-length segments occupy nothing, so the growing table cannot
    /// destroy them; skipping them also keeps the relocation loop from
    /// spinning on an entry whose move would never advance the file end.
    fn min_offset_index(&self) -> Option<usize> {
        self.slots
            .iter()
            .flatten()
            .filter(|e| e.length > 0)
            .min_by_key(|e| e.offset)
            .map(|e| e.index)
    }

    /// Move the payload of slot `index` to the end of the file: grow the
    /// declared length, copy the bytes, zero the vacated range, persist the
    /// updated record.
    fn relocate(&mut self, index: usize) -> Result<()> {
        let (old_offset, length) = match &self.slots[index] {
            Some(e) => (e.offset, e.length),
            None => unreachable!(),
        };

        let new_offset = self.header.file_length;
        let file_length = u32::try_from(u64::from(new_offset) + u64::from(length))
            .map_err(|_| ArchiveError::SizeOverflow)?;
        info!("moving entry {index} data ({length} bytes) from {old_offset} to {new_offset}");

        self.region.resize(file_length as usize)?;
        self.header.file_length = file_length;
        self.region
            .copy_within(old_offset as usize, new_offset as usize, length as usize)?;
        self.region.fill(old_offset as usize, length as usize, 0)?;

        if let Some(e) = self.slots[index].as_mut() {
            e.offset = new_offset;
        }
        self.write_record(index)
    }

    /// Append a new entry and reserve space for its payload at the end of
    /// the file.
    ///
    /// `entry.length` may be a placeholder when the payload size is not yet
    /// known; see [`Archive::rewrite_last_entry_length`]. The table grows by
    /// one record, so any payload sitting where the grown table will reach
    /// is relocated to the end of the file first. Growing the table can
    /// only ever collide with the entry physically closest to it, so
    /// rescanning for the minimum offset until it clears the prospective
    /// table end is sufficient and terminates.
    ///
    /// Returns the appended entry with its assigned offset and index.
    pub fn append(&mut self, entry: NewEntry) -> Result<&Entry> {
        let length = u32::try_from(entry.length)
            .map_err(|_| ArchiveError::InvalidLength(entry.length))?;
        self.load_all()?;

        let table_end_after_growth =
            HEADER_SIZE as u64 + (self.slots.len() as u64 + 1) * ENTRY_SIZE as u64;
        loop {
            let Some(index) = self.min_offset_index() else {
                break;
            };
            let offset = match &self.slots[index] {
                Some(e) => e.offset,
                None => unreachable!(),
            };
            if u64::from(offset) >= table_end_after_growth {
                break;
            }
            self.relocate(index)?;
        }

        let table_end =
            u32::try_from(table_end_after_growth).map_err(|_| ArchiveError::SizeOverflow)?;
        let index = self.slots.len();
        // a factory-fresh archive still has file_length inside the table
        // region, so new data starts past the grown table at the earliest
        let offset = self.header.file_length.max(table_end);
        let file_length = u32::try_from(u64::from(offset) + u64::from(length))
            .map_err(|_| ArchiveError::SizeOverflow)?;

        self.region.resize(file_length as usize)?;
        self.header.file_length = file_length;
        self.slots.push(Some(Entry {
            file_name: entry.file_name,
            directory_name: entry.directory_name,
            offset,
            length,
            zero: entry.zero,
            index,
        }));
        self.header.entry_count = self.slots.len() as u32;
        self.write_record(index)?;
        self.write_header()?;

        match self.slots[index].as_ref() {
            Some(entry) => Ok(entry),
            None => unreachable!(),
        }
    }

    /// Correct the length of the most recently appended entry once its true
    /// payload size is known.
    ///
    /// Only valid immediately after an [`Archive::append`] whose payload the
    /// caller then wrote past the declared end of the file: the placeholder
    /// length is dropped from the declared length and everything between the
    /// rewound end and the physical end becomes the entry's payload.
    pub fn rewrite_last_entry_length(&mut self) -> Result<()> {
        if !self.fully_loaded {
            return Err(ArchiveError::NotFullyLoaded);
        }
        let len = self.slots.len();
        let index = len
            .checked_sub(1)
            .ok_or(ArchiveError::IndexOutOfRange { index: 0, len })?;
        let physical =
            u32::try_from(self.region.len()).map_err(|_| ArchiveError::SizeOverflow)?;

        let entry = match self.slots[index].as_mut() {
            Some(e) => e,
            None => unreachable!(),
        };
        let rewound = self
            .header
            .file_length
            .checked_sub(entry.length)
            .ok_or(ArchiveError::SizeOverflow)?;
        entry.length = physical
            .checked_sub(rewound)
            .ok_or(ArchiveError::SizeOverflow)?;
        self.header.file_length = physical;

        self.write_record(index)?;
        self.write_header()
    }

    /// Shared view of a raw byte range, independent of the entry table.
    pub fn read_raw(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.region.get(offset, len)
    }

    /// Overwrite a raw byte range, independent of the entry table.
    pub fn write_raw(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        self.region.get_mut(offset, bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// The payload bytes of the entry in slot `index`.
    pub fn payload(&mut self, index: usize) -> Result<&[u8]> {
        let (offset, length) = {
            let entry = self.entry(index)?;
            (entry.offset as usize, entry.length as usize)
        };
        self.region.get(offset, length)
    }

    /// Position of the first little-endian occurrence of `value` in the
    /// backing bytes. Debugging aid for chasing offset references.
    pub fn find_offset_ref(&self, value: u32) -> Option<usize> {
        let needle = value.to_le_bytes();
        let haystack = self.region.get(0, self.region.len()).ok()?;
        haystack
            .windows(needle.len())
            .position(|w| w == needle.as_slice())
    }

    /// Force pending changes to stable storage.
    pub fn flush(&mut self) -> Result<()> {
        self.region.flush()
    }

    fn write_record(&mut self, index: usize) -> Result<()> {
        let record = self.region.get_mut(Self::table_offset(index), ENTRY_SIZE)?;
        match &self.slots[index] {
            Some(entry) => entry.encode_into(record),
            None => unreachable!(),
        }
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        self.header.encode_into(self.region.get_mut(0, HEADER_SIZE)?);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entry::NAME_WIDTH;
    use crate::region::VecRegion;

    /// Hand-built archive bytes: header plus one record per (offset, length)
    /// pair, named file0, file1, ...
    fn raw_archive(entries: &[(u32, u32)], file_length: u32, physical: usize) -> Vec<u8> {
        let mut buf = vec![0u8; physical];
        buf[..MAGIC.len()].copy_from_slice(MAGIC);
        buf[20..24].copy_from_slice(&(entries.len() as u32).to_le_bytes());
        buf[24..28].copy_from_slice(&file_length.to_le_bytes());
        for (i, &(offset, length)) in entries.iter().enumerate() {
            let base = HEADER_SIZE + i * ENTRY_SIZE;
            let name = format!("file{i}");
            buf[base..base + name.len()].copy_from_slice(name.as_bytes());
            buf[base + 2 * NAME_WIDTH..base + 2 * NAME_WIDTH + 4]
                .copy_from_slice(&offset.to_le_bytes());
            buf[base + 2 * NAME_WIDTH + 4..base + 2 * NAME_WIDTH + 8]
                .copy_from_slice(&length.to_le_bytes());
        }
        buf
    }

    const TABLE_1: usize = HEADER_SIZE + ENTRY_SIZE;
    const TABLE_2: usize = HEADER_SIZE + 2 * ENTRY_SIZE;

    #[test]
    fn create_writes_fresh_header() {
        let archive = Archive::create(VecRegion::new()).unwrap();
        assert_eq!(archive.len(), 0);
        assert_eq!(archive.file_length() as usize, HEADER_SIZE);
        assert_eq!(&archive.magic()[..MAGIC.len()], MAGIC);
        assert!(archive.magic()[MAGIC.len()..].iter().all(|&b| b == 0));
    }

    #[test]
    fn entry_limit_guards_open() {
        let buf = raw_archive(&[(1612, 1), (1613, 1), (1614, 1)], 1615, 1615);
        let err = Archive::open(VecRegion::from_bytes(buf.clone()), 2).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::EntryLimitExceeded { found: 3, limit: 2 }
        ));
        assert!(Archive::open(VecRegion::from_bytes(buf), 3).is_ok());
    }

    #[test]
    fn first_append_lands_past_the_table() {
        let mut archive = Archive::create(VecRegion::new()).unwrap();
        let offset = {
            let entry = archive
                .append(NewEntry::new("a.dat", "data").with_length(4))
                .unwrap();
            assert_eq!(entry.index(), 0);
            assert_eq!(entry.offset as usize, TABLE_1);
            entry.offset as usize
        };
        assert_eq!(archive.file_length() as usize, TABLE_1 + 4);

        archive.write_raw(offset, b"ABCD").unwrap();
        assert_eq!(archive.payload(0).unwrap(), b"ABCD");
        assert!(archive.validate().unwrap().is_empty());
    }

    #[test]
    fn adjacent_entry_is_relocated_before_the_table_grows() {
        let mut archive = Archive::create(VecRegion::new()).unwrap();
        let offset0 = {
            let e = archive
                .append(NewEntry::new("first", "").with_length(4))
                .unwrap();
            e.offset as usize
        };
        archive.write_raw(offset0, b"PAY0").unwrap();

        // growing the table to two slots reaches past the first payload, so
        // it must end up relocated beyond the new table end
        let (offset1, index1) = {
            let e = archive
                .append(NewEntry::new("second", "").with_length(8))
                .unwrap();
            (e.offset as usize, e.index())
        };

        let moved = archive.entry(0).unwrap().offset as usize;
        assert_eq!(moved, TABLE_2);
        assert_eq!(archive.payload(0).unwrap(), b"PAY0");
        assert_eq!(index1, 1);
        assert_eq!(offset1, TABLE_2 + 4);
        assert_eq!(archive.file_length() as usize, TABLE_2 + 4 + 8);
        assert_eq!(archive.len(), 2);
        assert!(archive.validate().unwrap().is_empty());
    }

    #[test]
    fn relocation_zero_fills_the_vacated_range() {
        // one entry whose payload straddles the prospective table end
        let offset = TABLE_1 as u32;
        let length = 600u32;
        let end = (offset + length) as usize;
        let mut buf = raw_archive(&[(offset, length)], offset + length, end);
        for b in &mut buf[offset as usize..end] {
            *b = 0xcd;
        }
        let mut archive = Archive::open(VecRegion::from_bytes(buf), 16).unwrap();

        let offset1 = {
            let e = archive
                .append(NewEntry::new("next", "").with_length(2))
                .unwrap();
            e.offset as usize
        };

        // a single relocation clears the collision: the payload moved to the
        // old end of file, byte for byte
        let moved = archive.entry(0).unwrap().offset as usize;
        assert_eq!(moved, end);
        assert_eq!(offset1, end + 600);
        let payload = archive.payload(0).unwrap();
        assert_eq!(payload.len(), 600);
        assert!(payload.iter().all(|&b| b == 0xcd));

        // and the vacated bytes between the grown table and the moved
        // payload read as zero
        assert!(archive
            .read_raw(TABLE_2, end - TABLE_2)
            .unwrap()
            .iter()
            .all(|&b| b == 0));
    }

    #[test]
    fn append_rejects_negative_length() {
        let buf = raw_archive(&[(TABLE_1 as u32, 4)], TABLE_1 as u32 + 4, TABLE_1 + 4);
        let mut archive = Archive::open(VecRegion::from_bytes(buf), 16).unwrap();

        let err = archive
            .append(NewEntry::new("bad", "").with_length(-1))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidLength(-1)));
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.file_length() as usize, TABLE_1 + 4);
    }

    #[test]
    fn zero_gap_before_first_segment_is_accepted() {
        let first = TABLE_1 as u32 + 10;
        let buf = raw_archive(&[(first, 4)], first + 4, first as usize + 4);
        let mut archive = Archive::open(VecRegion::from_bytes(buf), 16).unwrap();
        assert!(archive.validate().unwrap().is_empty());
    }

    #[test]
    fn nonzero_gap_is_reported_as_hidden_data() {
        let first = TABLE_1 as u32 + 10;
        let mut buf = raw_archive(&[(first, 4)], first + 4, first as usize + 4);
        buf[TABLE_1 + 3] = 0x5a;
        let mut archive = Archive::open(VecRegion::from_bytes(buf), 16).unwrap();

        let diags = archive.validate().unwrap();
        assert_eq!(
            diags,
            vec![Diagnostic::HiddenData {
                start: TABLE_1 as u64,
                end: u64::from(first),
            }]
        );
    }

    #[test]
    fn table_overlap_is_reported() {
        let buf = raw_archive(&[(500, 60)], 560, 560);
        let mut archive = Archive::open(VecRegion::from_bytes(buf), 16).unwrap();
        assert_eq!(
            archive.validate().unwrap(),
            vec![Diagnostic::TableOverlap {
                table_end: TABLE_1 as u64,
                first_offset: 500,
            }]
        );
    }

    #[test]
    fn oversized_backing_is_reported_once() {
        // five trailing zero bytes past the declared length
        let declared = TABLE_1 as u32 + 4;
        let buf = raw_archive(&[(TABLE_1 as u32, 4)], declared, declared as usize + 5);
        let mut archive = Archive::open(VecRegion::from_bytes(buf), 16).unwrap();
        assert_eq!(
            archive.validate().unwrap(),
            vec![Diagnostic::SizeMismatch {
                declared,
                physical: u64::from(declared) + 5,
            }]
        );
    }

    #[test]
    fn validation_is_idempotent() {
        let first = TABLE_1 as u32 + 10;
        let mut buf = raw_archive(&[(first, 4)], first + 4, first as usize + 4);
        buf[TABLE_1] = 1;
        let mut archive = Archive::open(VecRegion::from_bytes(buf), 16).unwrap();

        let once = archive.validate().unwrap();
        let twice = archive.validate().unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn entries_are_decoded_once_and_cached() {
        let buf = raw_archive(&[(TABLE_1 as u32, 4)], TABLE_1 as u32 + 4, TABLE_1 + 4);
        let mut archive = Archive::open(VecRegion::from_bytes(buf), 16).unwrap();
        assert_eq!(archive.entry(0).unwrap().offset as usize, TABLE_1);

        // raw-patch the record on disk; the cached entry must not change
        let patched = 999u32.to_le_bytes();
        archive
            .write_raw(HEADER_SIZE + 2 * NAME_WIDTH, &patched)
            .unwrap();
        assert_eq!(archive.entry(0).unwrap().offset as usize, TABLE_1);
    }

    #[test]
    fn entry_index_out_of_range() {
        let buf = raw_archive(&[(TABLE_1 as u32, 4)], TABLE_1 as u32 + 4, TABLE_1 + 4);
        let mut archive = Archive::open(VecRegion::from_bytes(buf), 16).unwrap();
        assert!(matches!(
            archive.entry(1),
            Err(ArchiveError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn length_rewrite_needs_the_loaded_table() {
        let buf = raw_archive(&[(TABLE_1 as u32, 4)], TABLE_1 as u32 + 4, TABLE_1 + 4);
        let mut archive = Archive::open(VecRegion::from_bytes(buf), 16).unwrap();
        assert!(matches!(
            archive.rewrite_last_entry_length(),
            Err(ArchiveError::NotFullyLoaded)
        ));
    }

    #[test]
    fn length_rewrite_adopts_the_physical_size() {
        let mut archive = Archive::create(VecRegion::new()).unwrap();
        let offset = {
            let e = archive
                .append(NewEntry::new("grow.bin", "").with_length(1))
                .unwrap();
            e.offset as usize
        };

        // the real payload turns out to be 42 bytes, written past the
        // declared end
        archive.region_mut().resize(offset + 42).unwrap();
        archive.write_raw(offset, &[7u8; 42]).unwrap();
        archive.rewrite_last_entry_length().unwrap();

        assert_eq!(archive.file_length() as usize, offset + 42);
        let entry = archive.entry(0).unwrap();
        assert_eq!(entry.length, 42);

        // and the record on disk agrees
        let raw = archive
            .read_raw(HEADER_SIZE + 2 * NAME_WIDTH + 4, 4)
            .unwrap();
        assert_eq!(raw, 42u32.to_le_bytes());
    }

    #[test]
    fn find_offset_ref_locates_table_references() {
        let buf = raw_archive(&[(TABLE_1 as u32, 4)], TABLE_1 as u32 + 4, TABLE_1 + 4);
        let archive = Archive::open(VecRegion::from_bytes(buf), 16).unwrap();

        // the record's offset field is the first LE occurrence of the value
        assert_eq!(
            archive.find_offset_ref(TABLE_1 as u32),
            Some(HEADER_SIZE + 2 * NAME_WIDTH)
        );
        assert_eq!(archive.find_offset_ref(0xdead_beef), None);
    }

    #[test]
    fn zero_length_entries_never_relocate() {
        let mut archive = Archive::create(VecRegion::new()).unwrap();
        archive
            .append(NewEntry::new("empty", "").with_length(0))
            .unwrap();

        let offset1 = {
            let e = archive
                .append(NewEntry::new("next", "").with_length(3))
                .unwrap();
            e.offset as usize
        };
        assert_eq!(offset1, TABLE_2);
        assert_eq!(archive.file_length() as usize, TABLE_2 + 3);
    }

    #[test]
    fn file_length_is_monotonic_across_appends() {
        let mut archive = Archive::create(VecRegion::new()).unwrap();
        let mut last = archive.file_length();
        for i in 0..4 {
            let name = format!("seg{i}");
            archive
                .append(NewEntry::new(name.as_str(), "").with_length(16))
                .unwrap();
            assert!(archive.file_length() >= last);
            assert_eq!(archive.len(), i + 1);
            last = archive.file_length();
        }
    }
}
