//! Streams the header sector and the data region.

use crate::catalog::{Catalog, CatalogEntry};
use crate::error::BuildError;
use crate::layout::ImageLayout;
use std::fs::File;
use std::io::{self, Read, Write};

const COPY_BUF_SIZE: usize = 64 * 1024;

/// Writes the complete image for `layout` to `out`.
///
/// Returns the number of bytes written, which equals
/// [`ImageLayout::total_len`] on success.
///
/// # Errors
/// [`BuildError::FileRead`] if an input cannot be opened or read,
/// [`BuildError::FileChanged`] if its size no longer matches the catalog,
/// [`BuildError::Write`] if `out` fails.
pub fn write_image<W: Write>(
    out: &mut W,
    catalog: &Catalog,
    layout: &ImageLayout,
) -> Result<u64, BuildError> {
    let header = layout.header_sector(catalog)?;
    out.write_all(&header).map_err(BuildError::Write)?;
    let mut written = header.len() as u64;

    let mut buf = vec![0u8; COPY_BUF_SIZE];
    for (file, placed) in catalog.iter().zip(layout.files()) {
        written += copy_file(out, file, &mut buf)?;
        written += io::copy(&mut io::repeat(0).take(placed.padding), out)
            .map_err(BuildError::Write)?;
    }

    Ok(written)
}

/// Copies exactly `file.size` bytes of `file` into `out`.
fn copy_file<W: Write>(
    out: &mut W,
    file: &CatalogEntry,
    buf: &mut [u8],
) -> Result<u64, BuildError> {
    let read_err = |source| BuildError::FileRead {
        path: file.path.clone(),
        source,
    };
    let changed = |actual| BuildError::FileChanged {
        path: file.path.clone(),
        expected: file.size,
        actual,
    };

    let mut src = File::open(&file.path).map_err(read_err)?;
    let mut remaining = file.size;
    while remaining > 0 {
        let want = usize::try_from(remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let n = match src.read(&mut buf[..want]) {
            Ok(0) => return Err(changed(file.size - remaining)),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_err(e)),
        };
        out.write_all(&buf[..n]).map_err(BuildError::Write)?;
        remaining -= n as u64;
    }

    // Anything left means the file grew after the scan.
    let extra = io::copy(&mut src, &mut io::sink()).map_err(read_err)?;
    if extra > 0 {
        return Err(changed(file.size + extra));
    }

    Ok(file.size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use std::fs;

    #[test]
    fn writes_header_data_and_padding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a");
        fs::write(&path, b"0123456789").unwrap();

        let cat = Catalog::from_entries(vec![CatalogEntry::new("a", &path, 10)]);
        let layout = ImageLayout::plan(&cat).unwrap();

        let mut out = Vec::new();
        let n = write_image(&mut out, &cat, &layout).unwrap();
        assert_eq!(n, 1024);
        assert_eq!(out.len(), 1024);
        assert_eq!(&out[512..522], b"0123456789");
        assert!(out[522..].iter().all(|&b| b == 0));
    }

    #[test]
    fn shrunk_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a");
        fs::write(&path, b"short").unwrap();

        let cat = Catalog::from_entries(vec![CatalogEntry::new("a", &path, 10)]);
        let layout = ImageLayout::plan(&cat).unwrap();
        let err = write_image(&mut Vec::new(), &cat, &layout).unwrap_err();
        assert!(matches!(
            err,
            BuildError::FileChanged {
                expected: 10,
                actual: 5,
                ..
            }
        ));
        assert_eq!(err.stage(), Stage::DataWrite);
    }

    #[test]
    fn grown_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a");
        fs::write(&path, b"much longer than expected").unwrap();

        let cat = Catalog::from_entries(vec![CatalogEntry::new("a", &path, 4)]);
        let layout = ImageLayout::plan(&cat).unwrap();
        let err = write_image(&mut Vec::new(), &cat, &layout).unwrap_err();
        assert!(matches!(
            err,
            BuildError::FileChanged {
                expected: 4,
                actual: 25,
                ..
            }
        ));
    }

    #[test]
    fn vanished_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let cat = Catalog::from_entries(vec![CatalogEntry::new(
            "gone",
            dir.path().join("gone"),
            1,
        )]);
        let layout = ImageLayout::plan(&cat).unwrap();
        let err = write_image(&mut Vec::new(), &cat, &layout).unwrap_err();
        assert!(matches!(err, BuildError::FileRead { .. }));
    }
}
