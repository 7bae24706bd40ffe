//! # Flat Filesystem Image Builder
//!
//! Packs the regular files of a directory into a single sector-aligned
//! image that a kernel can read with nothing more than the layout in
//! [`simplefs_abi`].
//!
//! ## Pipeline
//!
//! ```text
//! input dir ──► Catalog::scan ──► ImageLayout::plan ──► write_image ──► temp file ──► rename
//!               (fix order)       (offset pass,         (header sector,   (verify
//!                                  header capacity)      data + padding)   length + header)
//! ```
//!
//! The offset/size table sits in the first sector, so every offset is
//! computed before any file data is written. Names and table must fit that
//! sector; oversized metadata fails with [`BuildError::HeaderOverflow`]
//! before an output file is created.

pub mod catalog;
pub mod error;
pub mod header;
pub mod image;
pub mod layout;
pub mod writer;

pub use catalog::{Catalog, CatalogEntry};
pub use error::{BuildError, Stage};
pub use image::{BuildSummary, build_from_catalog, build_image};
pub use layout::{ImageLayout, PlacedFile};
pub use writer::write_image;
