//! Enumerates the input directory and fixes the catalog order.

use crate::error::BuildError;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// A regular file selected for the image.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CatalogEntry {
    /// Name stored in the filename directory.
    pub name: String,
    /// Where the contents are read from.
    pub path: PathBuf,
    /// Size observed at scan time; the table is computed from this.
    pub size: u64,
}

impl CatalogEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size,
        }
    }
}

/// Ordered list of files. The same order is used for the filename
/// directory, the offset/size table and the data region.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Collects the regular files directly inside `dir`, sorted by name.
    ///
    /// Subdirectories, symlinks and special files are skipped.
    ///
    /// # Errors
    /// [`BuildError::DirectoryUnreadable`] if `dir` cannot be listed,
    /// [`BuildError::EntryUnreadable`] if an entry cannot be inspected and
    /// [`BuildError::InvalidFileName`] for names that are not UTF-8.
    pub fn scan(dir: impl AsRef<Path>) -> Result<Self, BuildError> {
        let dir = dir.as_ref();
        let listing = fs::read_dir(dir).map_err(|source| BuildError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;
        let entry_err = |source| BuildError::EntryUnreadable {
            dir: dir.to_path_buf(),
            source,
        };

        let mut entries = Vec::new();
        for ent in listing {
            let ent = ent.map_err(entry_err)?;
            if !ent.file_type().map_err(entry_err)?.is_file() {
                debug!("skipping non-regular entry {}", ent.path().display());
                continue;
            }

            let size = ent.metadata().map_err(entry_err)?.len();
            let name = ent
                .file_name()
                .into_string()
                .map_err(BuildError::InvalidFileName)?;
            entries.push(CatalogEntry::new(name, ent.path(), size));
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("catalogued {} files from {}", entries.len(), dir.display());
        Ok(Self { entries })
    }

    /// Uses `entries` in the given order.
    #[must_use]
    pub const fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    /// Bytes the NUL-terminated filename list occupies in the header.
    #[must_use]
    pub fn directory_len(&self) -> usize {
        simplefs_abi::directory_len(self.entries.iter().map(|e| e.name.len()))
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
