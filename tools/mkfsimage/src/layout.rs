//! Offset/size table computation.
//!
//! The table lives in the header sector and therefore must be fully known
//! before the first data byte is written. [`ImageLayout::plan`] walks the
//! catalog once:
//!
//! ```text
//! offset = 512
//! for each file:
//!     entry   = (offset, size)
//!     rounded = ceil(offset + size, 512)
//!     padding = rounded - (offset + size)
//!     offset  = rounded
//! ```

use crate::catalog::Catalog;
use crate::error::BuildError;
use crate::header::{HeaderSector, check_name};
use log::debug;
use simplefs_abi::{
    DATA_REGION_START, FileTableEntry, HEADER_SECTOR_SIZE, SECTOR_SIZE, header_len, table_offset,
};

/// Table entry plus the zero bytes that follow the file in the data region.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PlacedFile {
    pub entry: FileTableEntry,
    pub padding: u64,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ImageLayout {
    count: u32,
    table_offset: usize,
    header_len: usize,
    files: Vec<PlacedFile>,
    total_len: u64,
}

impl ImageLayout {
    /// Computes the placement of every file in `catalog`.
    ///
    /// # Errors
    /// [`BuildError::TooManyFiles`] if the count does not fit a `u32`,
    /// [`BuildError::InvalidEntryName`] for names the directory cannot hold,
    /// [`BuildError::HeaderOverflow`] if names and table exceed the header
    /// sector, [`BuildError::ImageTooLarge`] if an offset overflows.
    pub fn plan(catalog: &Catalog) -> Result<Self, BuildError> {
        let count = u32::try_from(catalog.len()).map_err(|_| BuildError::TooManyFiles {
            count: catalog.len(),
        })?;

        for file in catalog {
            check_name(&file.name)?;
        }

        let directory_len = catalog.directory_len();
        let header_len = header_len(directory_len, catalog.len())
            .filter(|&len| len <= HEADER_SECTOR_SIZE)
            .ok_or_else(|| BuildError::HeaderOverflow {
                required: header_len(directory_len, catalog.len()).unwrap_or(usize::MAX),
                capacity: HEADER_SECTOR_SIZE,
            })?;

        let mut files = Vec::with_capacity(catalog.len());
        let mut offset = DATA_REGION_START;
        for file in catalog {
            let end = offset
                .checked_add(file.size)
                .ok_or(BuildError::ImageTooLarge)?;
            let rounded = end
                .checked_next_multiple_of(SECTOR_SIZE)
                .ok_or(BuildError::ImageTooLarge)?;

            let placed = PlacedFile {
                entry: FileTableEntry::new(offset, file.size),
                padding: rounded - end,
            };
            debug!(
                "{}: offset {:#x}, size {}, padding {}",
                file.name, placed.entry.offset, placed.entry.size, placed.padding
            );
            files.push(placed);
            offset = rounded;
        }

        Ok(Self {
            count,
            table_offset: table_offset(directory_len),
            header_len,
            files,
            total_len: offset,
        })
    }

    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Position of the first table entry inside the header sector.
    #[must_use]
    pub const fn table_offset(&self) -> usize {
        self.table_offset
    }

    /// Header bytes in use before the trailing zero fill.
    #[must_use]
    pub const fn header_len(&self) -> usize {
        self.header_len
    }

    /// Placements in catalog order.
    #[must_use]
    pub fn files(&self) -> &[PlacedFile] {
        &self.files
    }

    /// Size of the complete image in bytes.
    #[must_use]
    pub const fn total_len(&self) -> u64 {
        self.total_len
    }

    /// Renders magic, count, names and table into the header sector.
    ///
    /// `catalog` must be the one this layout was planned from.
    ///
    /// # Errors
    /// [`BuildError::HeaderOverflow`] if the metadata does not fit.
    pub fn header_sector(
        &self,
        catalog: &Catalog,
    ) -> Result<[u8; HEADER_SECTOR_SIZE], BuildError> {
        let mut header = HeaderSector::new();
        header.push_preamble(self.count)?;
        for file in catalog {
            header.push_name(&file.name)?;
        }
        header.align_table()?;
        debug_assert_eq!(header.position(), self.table_offset);

        for placed in &self.files {
            header.push_entry(&placed.entry)?;
        }
        debug_assert_eq!(header.position(), self.header_len);
        Ok(header.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::error::Stage;

    fn catalog(files: &[(&str, u64)]) -> Catalog {
        Catalog::from_entries(
            files
                .iter()
                .map(|&(name, size)| CatalogEntry::new(name, name, size))
                .collect(),
        )
    }

    #[test]
    fn empty_catalog() {
        let layout = ImageLayout::plan(&Catalog::default()).unwrap();
        assert_eq!(layout.count(), 0);
        assert_eq!(layout.header_len(), 8);
        assert_eq!(layout.total_len(), 512);

        let sector = layout.header_sector(&Catalog::default()).unwrap();
        assert_eq!(&sector[..4], &[0x77, 0x77, 0x12, 0x34]);
        assert!(sector[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn single_ten_byte_file() {
        let cat = catalog(&[("a", 10)]);
        let layout = ImageLayout::plan(&cat).unwrap();
        assert_eq!(layout.table_offset(), 16);
        assert_eq!(
            layout.files(),
            &[PlacedFile {
                entry: FileTableEntry::new(512, 10),
                padding: 502
            }]
        );
        assert_eq!(layout.total_len(), 1024);
    }

    #[test]
    fn two_files_600_and_50() {
        let cat = catalog(&[("big", 600), ("small", 50)]);
        let layout = ImageLayout::plan(&cat).unwrap();
        let files = layout.files();
        assert_eq!(files[0].entry, FileTableEntry::new(512, 600));
        assert_eq!(files[0].padding, 424);
        assert_eq!(files[1].entry, FileTableEntry::new(1536, 50));
        assert_eq!(files[1].padding, 462);
        assert_eq!(layout.total_len(), 2048);
    }

    #[test]
    fn sector_sized_and_empty_files_get_no_padding() {
        let cat = catalog(&[("full", 512), ("empty", 0), ("next", 1)]);
        let layout = ImageLayout::plan(&cat).unwrap();
        let files = layout.files();
        assert_eq!(files[0].entry, FileTableEntry::new(512, 512));
        assert_eq!(files[0].padding, 0);
        assert_eq!(files[1].entry, FileTableEntry::new(1024, 0));
        assert_eq!(files[1].padding, 0);
        assert_eq!(files[2].entry, FileTableEntry::new(1024, 1));
        assert_eq!(layout.total_len(), 1536);
    }

    #[test]
    fn offsets_are_sector_aligned_and_ordered() {
        let sizes = [0u64, 1, 511, 512, 513, 1023, 1024, 4097, 7];
        let names: Vec<String> = (0..sizes.len()).map(|i| format!("f{i}")).collect();
        let cat = Catalog::from_entries(
            names
                .iter()
                .zip(sizes)
                .map(|(n, s)| CatalogEntry::new(n.as_str(), n.as_str(), s))
                .collect(),
        );
        let layout = ImageLayout::plan(&cat).unwrap();
        for pair in layout.files().windows(2) {
            let (a, b) = (pair[0].entry, pair[1].entry);
            assert!(b.offset >= a.end());
            assert_eq!(b.offset == a.end(), a.size % 512 == 0);
        }
        for placed in layout.files() {
            assert!(placed.entry.offset >= 512);
            assert_eq!(placed.entry.offset % 512, 0);
            assert_eq!(placed.padding, placed.entry.padding());
        }
    }

    #[test]
    fn header_overflow_is_detected_before_writing() {
        // 30 names of 8 bytes: 8 + 30*9 = 278 -> 280, plus 30*16 = 760 bytes.
        let names: Vec<String> = (0..30).map(|i| format!("file{i:04}")).collect();
        let cat = Catalog::from_entries(
            names
                .iter()
                .map(|n| CatalogEntry::new(n.as_str(), n.as_str(), 1))
                .collect(),
        );
        let err = ImageLayout::plan(&cat).unwrap_err();
        assert!(matches!(
            err,
            BuildError::HeaderOverflow {
                required: 760,
                capacity: 512
            }
        ));
        assert_eq!(err.stage(), Stage::HeaderWrite);
    }

    #[test]
    fn header_exactly_full_is_accepted() {
        // 28 one-letter names: 8 + 28*2 = 64, plus 28*16 = 448 -> 512.
        let names: Vec<String> = ('a'..='z').chain('A'..='B').map(String::from).collect();
        let mut entries: Vec<CatalogEntry> = names
            .iter()
            .map(|n| CatalogEntry::new(n.as_str(), n.as_str(), 3))
            .collect();
        let cat = Catalog::from_entries(entries.clone());
        let layout = ImageLayout::plan(&cat).unwrap();
        assert_eq!(layout.header_len(), 512);
        let sector = layout.header_sector(&cat).unwrap();
        assert_eq!(&sector[64..72], &512u64.to_le_bytes());

        entries.push(CatalogEntry::new("C", "C", 3));
        let err = ImageLayout::plan(&Catalog::from_entries(entries)).unwrap_err();
        assert!(matches!(err, BuildError::HeaderOverflow { required: 536, .. }));
    }

    #[test]
    fn names_that_would_corrupt_the_directory_are_rejected() {
        for bad in ["", "init\0.elf"] {
            let cat = catalog(&[("ok", 1), (bad, 1)]);
            let err = ImageLayout::plan(&cat).unwrap_err();
            assert!(matches!(err, BuildError::InvalidEntryName(ref n) if n == bad));
            assert_eq!(err.stage(), Stage::HeaderWrite);
        }
    }

    #[test]
    fn offset_overflow_is_reported() {
        let cat = catalog(&[("huge", u64::MAX - 100)]);
        let err = ImageLayout::plan(&cat).unwrap_err();
        assert!(matches!(err, BuildError::ImageTooLarge));
        assert_eq!(err.stage(), Stage::TableComputation);
    }
}
