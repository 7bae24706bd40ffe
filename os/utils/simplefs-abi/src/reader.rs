//! Zero-copy reader for filesystem images.
//!
//! [`SimpleFs::parse`] validates the header sector once; afterwards names,
//! table entries and file contents are handed out as borrows of the input.

use crate::{
    DATA_REGION_START, FS_MAGIC, FileTableEntry, HEADER_SECTOR_SIZE, PREAMBLE_SIZE, SECTOR_SIZE,
    TABLE_ENTRY_SIZE, header_len, table_offset,
};

/// Parsed view over an image, or over just its header sector.
#[derive(Debug, Clone, Copy)]
pub struct SimpleFs<'a> {
    blob: &'a [u8],
    count: usize,
    table_off: usize,
}

/// A catalogued file: its name and table entry.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FileRecord<'a> {
    pub index: usize,
    pub name: &'a str,
    pub entry: FileTableEntry,
}

/// Iterator over the files of an image, in catalog order.
pub struct Entries<'a> {
    fs: &'a SimpleFs<'a>,
    idx: usize,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FsError {
    #[error("image is shorter than one header sector")]
    TooShort,
    #[error("bad magic")]
    BadMagic,
    #[error("file name is not NUL-terminated within the header sector")]
    UnterminatedName,
    #[error("file table extends past the header sector")]
    TableOverflow,
    #[error("file offset is not sector aligned or points into the header")]
    Misaligned,
    #[error("file data lies outside the image")]
    OutOfBounds,
    #[error("file name is not valid UTF-8")]
    Utf8,
}

#[inline]
fn read_u32_le(buf: &[u8], off: usize) -> Result<u32, FsError> {
    let end = off.checked_add(4).ok_or(FsError::OutOfBounds)?;
    let s = buf.get(off..end).ok_or(FsError::OutOfBounds)?;
    Ok(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
}

#[inline]
fn read_entry(buf: &[u8], off: usize) -> Result<FileTableEntry, FsError> {
    let end = off.checked_add(TABLE_ENTRY_SIZE).ok_or(FsError::OutOfBounds)?;
    let raw: &[u8; TABLE_ENTRY_SIZE] = buf
        .get(off..end)
        .and_then(|s| s.try_into().ok())
        .ok_or(FsError::OutOfBounds)?;
    Ok(FileTableEntry::from_le_bytes(raw))
}

/// Returns the position one past the NUL terminating the name at `start`.
#[inline]
fn skip_name(sector: &[u8], start: usize) -> Result<usize, FsError> {
    let rest = sector.get(start..).ok_or(FsError::UnterminatedName)?;
    let nul = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(FsError::UnterminatedName)?;
    Ok(start + nul + 1)
}

impl<'a> SimpleFs<'a> {
    /// Parse and validate the header sector at the start of `blob`.
    ///
    /// `blob` may be the header sector alone; file contents are then
    /// unavailable through [`SimpleFs::data`].
    ///
    /// # Errors
    /// Returns an [`FsError`] describing the first layout violation found.
    pub fn parse(blob: &'a [u8]) -> Result<Self, FsError> {
        let sector = blob.get(..HEADER_SECTOR_SIZE).ok_or(FsError::TooShort)?;
        if sector[..FS_MAGIC.len()] != FS_MAGIC {
            return Err(FsError::BadMagic);
        }

        let count = read_u32_le(sector, FS_MAGIC.len())? as usize;

        // Names must all terminate inside the sector.
        let mut p = PREAMBLE_SIZE;
        for _ in 0..count {
            p = skip_name(sector, p)?;
        }

        let table_off = table_offset(p - PREAMBLE_SIZE);
        match header_len(p - PREAMBLE_SIZE, count) {
            Some(len) if len <= HEADER_SECTOR_SIZE => {}
            _ => return Err(FsError::TableOverflow),
        }

        for i in 0..count {
            let e = read_entry(sector, table_off + i * TABLE_ENTRY_SIZE)?;
            if e.offset < DATA_REGION_START || e.offset % SECTOR_SIZE != 0 {
                return Err(FsError::Misaligned);
            }
            // The padded region end must be representable too.
            e.offset
                .checked_add(e.size)
                .and_then(|end| end.checked_next_multiple_of(SECTOR_SIZE))
                .ok_or(FsError::OutOfBounds)?;
        }

        Ok(Self {
            blob,
            count,
            table_off,
        })
    }

    /// Number of files in the image.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Position of the offset/size table within the header sector.
    #[must_use]
    pub const fn table_offset(&self) -> usize {
        self.table_off
    }

    /// Bytes of header metadata in use; the rest of the sector is padding.
    #[must_use]
    pub const fn header_len(&self) -> usize {
        self.table_off + self.count * TABLE_ENTRY_SIZE
    }

    #[must_use]
    pub const fn entries(&'a self) -> Entries<'a> {
        Entries { fs: self, idx: 0 }
    }

    /// Fetch name and table entry of file `i`.
    ///
    /// # Errors
    /// [`FsError::OutOfBounds`] if `i` is not below [`SimpleFs::len`],
    /// [`FsError::Utf8`] if the stored name is not UTF-8.
    pub fn get(&self, i: usize) -> Result<FileRecord<'a>, FsError> {
        if i >= self.count {
            return Err(FsError::OutOfBounds);
        }

        let blob = self.blob;
        let sector = &blob[..HEADER_SECTOR_SIZE];
        let mut start = PREAMBLE_SIZE;
        for _ in 0..i {
            start = skip_name(sector, start)?;
        }
        let end = skip_name(sector, start)? - 1;

        let name = core::str::from_utf8(&blob[start..end]).map_err(|_| FsError::Utf8)?;
        let entry = read_entry(sector, self.table_off + i * TABLE_ENTRY_SIZE)?;

        Ok(FileRecord {
            index: i,
            name,
            entry,
        })
    }

    /// Find a file by exact name.
    #[must_use]
    pub fn find(&'a self, needle: &str) -> Option<FileRecord<'a>> {
        self.entries().flatten().find(|r| r.name == needle)
    }

    /// Contents of `record`'s file.
    ///
    /// # Errors
    /// [`FsError::OutOfBounds`] if the data is not contained in the parsed
    /// blob, e.g. when only the header sector was provided.
    pub fn data(&self, record: &FileRecord<'_>) -> Result<&'a [u8], FsError> {
        let start = usize::try_from(record.entry.offset).map_err(|_| FsError::OutOfBounds)?;
        let end = usize::try_from(record.entry.end()).map_err(|_| FsError::OutOfBounds)?;
        self.blob.get(start..end).ok_or(FsError::OutOfBounds)
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<FileRecord<'a>, FsError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.fs.len() {
            return None;
        }
        let i = self.idx;
        self.idx += 1;
        Some(self.fs.get(i))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let r = self.fs.len().saturating_sub(self.idx);
        (r, Some(r))
    }
}

impl core::iter::FusedIterator for Entries<'_> {}
