//! Header sector assembly.
//!
//! [`HeaderSector`] is a zeroed 512-byte buffer with a write cursor. Each
//! `push_*` checks the bytes remaining in the sector first, so oversized
//! metadata is reported as [`BuildError::HeaderOverflow`] instead of spilling
//! into the data region.

use crate::error::BuildError;
use simplefs_abi::{FS_MAGIC, FileTableEntry, HEADER_SECTOR_SIZE, TABLE_ALIGN};

/// Checks that `name` can be stored as a NUL-terminated directory entry.
///
/// # Errors
/// [`BuildError::InvalidEntryName`] for empty names and names containing NUL.
pub fn check_name(name: &str) -> Result<(), BuildError> {
    if name.is_empty() || name.as_bytes().contains(&0) {
        return Err(BuildError::InvalidEntryName(name.to_owned()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct HeaderSector {
    buf: [u8; HEADER_SECTOR_SIZE],
    pos: usize,
}

impl Default for HeaderSector {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderSector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; HEADER_SECTOR_SIZE],
            pos: 0,
        }
    }

    /// Bytes written so far, including alignment padding.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the sector is full.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        HEADER_SECTOR_SIZE - self.pos
    }

    fn reserve(&mut self, len: usize) -> Result<&mut [u8], BuildError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= HEADER_SECTOR_SIZE)
            .ok_or_else(|| BuildError::HeaderOverflow {
                required: self.pos.saturating_add(len),
                capacity: HEADER_SECTOR_SIZE,
            })?;
        let slot = &mut self.buf[self.pos..end];
        self.pos = end;
        Ok(slot)
    }

    fn push(&mut self, bytes: &[u8]) -> Result<(), BuildError> {
        self.reserve(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Writes the magic and the little-endian file count.
    ///
    /// # Errors
    /// [`BuildError::HeaderOverflow`] if the preamble does not fit.
    pub fn push_preamble(&mut self, count: u32) -> Result<(), BuildError> {
        self.push(&FS_MAGIC)?;
        self.push(&count.to_le_bytes())
    }

    /// Appends `name` followed by its NUL terminator.
    ///
    /// # Errors
    /// [`BuildError::InvalidEntryName`] if the name is empty or contains NUL,
    /// [`BuildError::HeaderOverflow`] if it does not fit.
    pub fn push_name(&mut self, name: &str) -> Result<(), BuildError> {
        check_name(name)?;
        let slot = self.reserve(name.len() + 1)?;
        slot[..name.len()].copy_from_slice(name.as_bytes());
        slot[name.len()] = 0;
        Ok(())
    }

    /// Skips zero bytes up to the next 8-byte boundary, where the table starts.
    ///
    /// # Errors
    /// [`BuildError::HeaderOverflow`] if the padding does not fit.
    pub fn align_table(&mut self) -> Result<(), BuildError> {
        let pad = self.pos.next_multiple_of(TABLE_ALIGN) - self.pos;
        self.reserve(pad).map(|_| ())
    }

    /// Appends one offset/size record.
    ///
    /// # Errors
    /// [`BuildError::HeaderOverflow`] if the record does not fit.
    pub fn push_entry(&mut self, entry: &FileTableEntry) -> Result<(), BuildError> {
        self.push(&entry.to_le_bytes())
    }

    /// The complete sector; everything past [`HeaderSector::position`] is zero.
    #[must_use]
    pub const fn finish(self) -> [u8; HEADER_SECTOR_SIZE] {
        self.buf
    }
}
