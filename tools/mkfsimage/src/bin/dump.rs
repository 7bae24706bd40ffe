use anyhow::{Context, bail};
use clap::Parser;
use simplefs_abi::SimpleFs;
use std::fs;
use std::path::PathBuf;

/// Print the file table of a flat filesystem image.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Image to inspect.
    image: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::init();

    let blob = fs::read(&args.image)
        .with_context(|| format!("cannot read {}", args.image.display()))?;
    let fs = SimpleFs::parse(&blob)
        .with_context(|| format!("{} is not a valid image", args.image.display()))?;

    println!(
        "{}: {} files, table at {:#x}, {} header bytes used, {} bytes total",
        args.image.display(),
        fs.len(),
        fs.table_offset(),
        fs.header_len(),
        blob.len()
    );
    println!("{:>5}  {:>10}  {:>10}  {:>5}  name", "index", "offset", "size", "pad");

    for record in fs.entries() {
        let record = record.context("corrupt directory entry")?;
        println!(
            "{:>5}  {:#010x}  {:>10}  {:>5}  {}",
            record.index,
            record.entry.offset,
            record.entry.size,
            record.entry.padding(),
            record.name
        );
        if fs.data(&record).is_err() {
            bail!("{} extends past the end of the image", record.name);
        }
    }

    Ok(())
}
