use clap::Parser;
use std::path::PathBuf;

/// Build a flat, sector-aligned filesystem image from a directory.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Image file to create or replace.
    output: PathBuf,

    /// Directory whose regular files are packed (no recursion).
    input_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::init();

    let summary = mkfsimage::build_image(&args.output, &args.input_dir).map_err(|e| {
        let stage = e.stage();
        anyhow::Error::new(e).context(format!("{stage} failed"))
    })?;

    eprintln!(
        "packed {} files into {} ({} bytes, {} header bytes used)",
        summary.file_count,
        args.output.display(),
        summary.image_len,
        summary.header_len
    );
    Ok(())
}
