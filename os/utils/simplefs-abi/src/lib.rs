//! # Flat Sector-Aligned Filesystem Image ABI
//!
//! Shared layout definitions for the flat filesystem image produced by the
//! `mkfsimage` host tool and read back by the kernel at boot.
//!
//! The image is deliberately simple: a consumer locates any file with a
//! handful of integer operations on the first sector, without walking a
//! general-purpose filesystem.
//!
//! ## Layout
//!
//! All integers are little-endian.
//!
//! ```text
//! ┌──────────────────────────── header sector (512 B) ────────────────────────────┐
//! │ 0x000  magic       77 77 12 34                                                │
//! │ 0x004  file_count  u32                                                        │
//! │ 0x008  names       "<name>\0" × file_count                                    │
//! │   ...  padding     zero bytes up to the next multiple of 8                    │
//! │ table  entries     (offset: u64, size: u64) × file_count                      │
//! │   ...  padding     zero bytes up to byte 512                                  │
//! └───────────────────────────────────────────────────────────────────────────────┘
//! ┌──────────────────────────── data region (from 512) ───────────────────────────┐
//! │ file 0 bytes │ zero padding to a sector boundary │ file 1 bytes │ padding │ … │
//! └───────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - The filename list and the table share the single header sector; the
//!   table begins at an 8-byte aligned position so consumers may read its
//!   `u64` fields directly.
//! - Every [`FileTableEntry::offset`] is an absolute byte offset, a multiple
//!   of [`SECTOR_SIZE`], and at least [`DATA_REGION_START`].
//! - A file whose end already lands on a sector boundary gets no padding.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use simplefs_abi::*;
//! // One file named "a", 10 bytes long.
//! let dir = directory_len([1]);
//! assert_eq!(table_offset(dir), 16);
//! assert_eq!(header_len(dir, 1), Some(32));
//!
//! let entry = FileTableEntry::new(DATA_REGION_START, 10);
//! assert_eq!(entry.region_end(), 1024);
//! assert_eq!(entry.padding(), 502);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

#[cfg(feature = "reader")]
pub mod reader;

#[cfg(feature = "reader")]
pub use reader::{Entries, FileRecord, FsError, SimpleFs};

/// Magic bytes at offset 0 of every image.
pub const FS_MAGIC: [u8; 4] = [0x77, 0x77, 0x12, 0x34];

/// [`FS_MAGIC`] as seen by a consumer loading the first four bytes as a
/// little-endian `u32`.
pub const FS_MAGIC_LE: u32 = u32::from_le_bytes(FS_MAGIC);

/// Alignment unit of the data region, matching the consumer's block size.
pub const SECTOR_SIZE: u64 = 512;

/// Size of the header sector holding magic, count, names and table.
pub const HEADER_SECTOR_SIZE: usize = 512;

/// Absolute offset of the first byte of file data.
pub const DATA_REGION_START: u64 = SECTOR_SIZE;

/// Magic plus file count.
pub const PREAMBLE_SIZE: usize = 8;

/// Alignment of the offset/size table within the header sector.
pub const TABLE_ALIGN: usize = 8;

/// Bytes per [`FileTableEntry`] on disk.
pub const TABLE_ENTRY_SIZE: usize = 16;

/// Rounds `n` up to the next multiple of `m`.
///
/// This is a true ceiling: the result is never below `n`, and `n` is returned
/// unchanged when it already is a multiple of `m`.
///
/// ```rust
/// # use simplefs_abi::align_up;
/// assert_eq!(align_up(0, 512), 0);
/// assert_eq!(align_up(1, 512), 512);
/// assert_eq!(align_up(512, 512), 512);
/// assert_eq!(align_up(1112, 512), 1536);
/// ```
///
/// # Panics
/// Panics if `m` is zero.
#[must_use]
#[inline]
pub const fn align_up(n: u64, m: u64) -> u64 {
    n.div_ceil(m) * m
}

/// Zero bytes needed to bring `n` up to the next multiple of `m`.
#[must_use]
#[inline]
pub const fn padding_to(n: u64, m: u64) -> u64 {
    align_up(n, m) - n
}

#[inline]
const fn align_up_usize(n: usize, m: usize) -> usize {
    n.div_ceil(m) * m
}

/// Bytes taken by the filename directory for names of the given lengths,
/// counting one NUL terminator per name.
#[must_use]
pub fn directory_len<I>(name_lengths: I) -> usize
where
    I: IntoIterator<Item = usize>,
{
    name_lengths
        .into_iter()
        .fold(0usize, |acc, len| acc.saturating_add(len).saturating_add(1))
}

/// Position of the offset/size table inside the header sector.
#[must_use]
#[inline]
pub const fn table_offset(directory_len: usize) -> usize {
    align_up_usize(PREAMBLE_SIZE.saturating_add(directory_len), TABLE_ALIGN)
}

/// Total header metadata size: preamble, names, alignment and table.
///
/// Returns `None` on arithmetic overflow. The metadata fits the image iff the
/// result is at most [`HEADER_SECTOR_SIZE`].
#[must_use]
pub const fn header_len(directory_len: usize, count: usize) -> Option<usize> {
    let Some(table) = count.checked_mul(TABLE_ENTRY_SIZE) else {
        return None;
    };
    table_offset(directory_len).checked_add(table)
}

/// One record of the offset/size table.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FileTableEntry {
    /// Absolute byte offset of the file data within the image.
    pub offset: u64,

    /// Length of the file data in bytes.
    pub size: u64,
}

impl FileTableEntry {
    #[must_use]
    pub const fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    /// Offset one past the last data byte.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.offset + self.size
    }

    /// Sector boundary at which the next file starts.
    #[must_use]
    pub const fn region_end(&self) -> u64 {
        align_up(self.end(), SECTOR_SIZE)
    }

    /// Zero bytes written after the file data.
    #[must_use]
    pub const fn padding(&self) -> u64 {
        padding_to(self.end(), SECTOR_SIZE)
    }

    /// Encodes the entry as `offset` then `size`, both little-endian.
    #[must_use]
    pub fn to_le_bytes(&self) -> [u8; TABLE_ENTRY_SIZE] {
        let mut out = [0u8; TABLE_ENTRY_SIZE];
        out[..8].copy_from_slice(&self.offset.to_le_bytes());
        out[8..].copy_from_slice(&self.size.to_le_bytes());
        out
    }

    #[must_use]
    pub const fn from_le_bytes(raw: &[u8; TABLE_ENTRY_SIZE]) -> Self {
        let offset = u64::from_le_bytes([
            raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
        ]);
        let size = u64::from_le_bytes([
            raw[8], raw[9], raw[10], raw[11], raw[12], raw[13], raw[14], raw[15],
        ]);
        Self { offset, size }
    }
}
