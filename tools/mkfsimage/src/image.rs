//! End-to-end build: scan, plan, write, verify, publish.

use crate::catalog::Catalog;
use crate::error::BuildError;
use crate::layout::ImageLayout;
use crate::writer::write_image;
use log::{debug, info, warn};
use simplefs_abi::{HEADER_SECTOR_SIZE, SimpleFs};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tempfile::{NamedTempFile, PersistError};

/// What a successful build produced.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BuildSummary {
    pub file_count: u32,
    /// Header bytes in use before the zero fill.
    pub header_len: usize,
    pub image_len: u64,
}

/// Builds an image of the regular files in `input_dir` at `output`.
///
/// # Errors
/// Any [`BuildError`]; `output` is left untouched in that case.
pub fn build_image(
    output: impl AsRef<Path>,
    input_dir: impl AsRef<Path>,
) -> Result<BuildSummary, BuildError> {
    let catalog = Catalog::scan(input_dir)?;
    build_from_catalog(output, &catalog)
}

/// Builds an image of `catalog`, in its order, at `output`.
///
/// The image is written to a temporary file next to `output` and renamed
/// over it only after the written length and header have been checked. On
/// failure the temporary file is removed.
///
/// # Errors
/// Any [`BuildError`]; `output` is left untouched in that case.
pub fn build_from_catalog(
    output: impl AsRef<Path>,
    catalog: &Catalog,
) -> Result<BuildSummary, BuildError> {
    let output = output.as_ref();
    let layout = ImageLayout::plan(catalog)?;
    debug!(
        "planned {} files, header {} bytes, image {} bytes",
        layout.count(),
        layout.header_len(),
        layout.total_len()
    );

    let out_err = |source| BuildError::Output {
        path: output.to_path_buf(),
        source,
    };
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".mkfsimage-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(out_err)?;

    if let Err(err) = fill(&mut tmp, catalog, &layout) {
        discard(tmp);
        return Err(err);
    }

    tmp.persist(output).map_err(|PersistError { error, file }| {
        discard(file);
        out_err(error)
    })?;
    info!(
        "packed {} files into {} ({} bytes)",
        layout.count(),
        output.display(),
        layout.total_len()
    );

    Ok(BuildSummary {
        file_count: layout.count(),
        header_len: layout.header_len(),
        image_len: layout.total_len(),
    })
}

/// Writes the image into `tmp`, syncs it and checks length and header.
fn fill(
    tmp: &mut NamedTempFile,
    catalog: &Catalog,
    layout: &ImageLayout,
) -> Result<(), BuildError> {
    let mut writer = BufWriter::new(&mut *tmp);
    let written = write_image(&mut writer, catalog, layout)?;
    writer.flush().map_err(BuildError::Write)?;
    drop(writer);
    tmp.as_file().sync_all().map_err(BuildError::Write)?;

    let on_disk = tmp.as_file().metadata().map_err(BuildError::Write)?.len();
    for actual in [written, on_disk] {
        if actual != layout.total_len() {
            return Err(BuildError::LengthMismatch {
                expected: layout.total_len(),
                written: actual,
            });
        }
    }

    let mut header = [0u8; HEADER_SECTOR_SIZE];
    tmp.reopen()
        .and_then(|mut f| f.read_exact(&mut header))
        .map_err(BuildError::Write)?;
    SimpleFs::parse(&header)?;
    Ok(())
}

/// Removes an unfinished image, logging instead of failing.
fn discard(tmp: NamedTempFile) {
    let path = tmp.path().to_path_buf();
    if let Err(e) = tmp.close() {
        warn!("cannot remove temporary image {}: {e}", path.display());
    }
}
