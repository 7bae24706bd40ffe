use std::fmt;
use std::io;
use std::path::PathBuf;

/// Phase of the build in which an error occurred.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Stage {
    CatalogScan,
    TableComputation,
    HeaderWrite,
    DataWrite,
    Verify,
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CatalogScan => "catalog scan",
            Self::TableComputation => "table computation",
            Self::HeaderWrite => "header write",
            Self::DataWrite => "data write",
            Self::Verify => "verify",
            Self::Output => "output",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("cannot read input directory {}", path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot inspect directory entry in {}", dir.display())]
    EntryUnreadable {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("file name {0:?} is not valid UTF-8")]
    InvalidFileName(std::ffi::OsString),
    #[error("{count} files exceed the u32 file count field")]
    TooManyFiles { count: usize },
    #[error("image size overflows a 64-bit offset")]
    ImageTooLarge,
    /// Empty names and names with an embedded NUL cannot be stored.
    #[error("file name {0:?} is empty or contains a NUL byte")]
    InvalidEntryName(String),
    /// Names and table do not fit the fixed header sector.
    #[error("header metadata needs {required} bytes but the header sector holds {capacity}")]
    HeaderOverflow { required: usize, capacity: usize },
    #[error("cannot read {}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A file's size differs from the one recorded during the catalog scan.
    #[error("{} changed during the build: catalogued {expected} bytes, found {actual}", path.display())]
    FileChanged {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
    #[error("cannot write image data")]
    Write(#[source] io::Error),
    #[error("written header does not read back")]
    Verify(#[from] simplefs_abi::FsError),
    #[error("cannot create or replace {}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("wrote {written} bytes but the layout requires {expected}")]
    LengthMismatch { expected: u64, written: u64 },
}

impl BuildError {
    /// The build phase this error aborted.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::DirectoryUnreadable { .. }
            | Self::EntryUnreadable { .. }
            | Self::InvalidFileName(_) => Stage::CatalogScan,
            Self::TooManyFiles { .. } | Self::ImageTooLarge => Stage::TableComputation,
            Self::InvalidEntryName(_) | Self::HeaderOverflow { .. } => Stage::HeaderWrite,
            Self::FileRead { .. }
            | Self::FileChanged { .. }
            | Self::Write(_)
            | Self::LengthMismatch { .. } => Stage::DataWrite,
            Self::Verify(_) => Stage::Verify,
            Self::Output { .. } => Stage::Output,
        }
    }
}
