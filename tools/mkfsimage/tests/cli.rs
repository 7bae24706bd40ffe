use std::fs;
use std::process::Command;

fn mkfsimage() -> Command {
    Command::new(env!("CARGO_BIN_EXE_mkfsimage"))
}

#[test]
fn wrong_argument_count_is_a_usage_error() {
    let status = mkfsimage().arg("only-one").status().unwrap();
    assert_eq!(status.code(), Some(2));

    let status = mkfsimage().args(["a", "b", "c"]).status().unwrap();
    assert_eq!(status.code(), Some(2));
}

#[test]
fn builds_and_dumps_an_image() {
    let input = tempfile::tempdir().unwrap();
    fs::write(input.path().join("init"), b"\x7fELF").unwrap();
    let out = tempfile::tempdir().unwrap();
    let image = out.path().join("fs.img");

    let status = mkfsimage().arg(&image).arg(input.path()).status().unwrap();
    assert!(status.success());
    assert_eq!(fs::read(&image).unwrap().len(), 1024);

    let dump = Command::new(env!("CARGO_BIN_EXE_fsimage-dump"))
        .arg(&image)
        .output()
        .unwrap();
    assert!(dump.status.success());
    let text = String::from_utf8(dump.stdout).unwrap();
    assert!(text.contains("1 files"));
    assert!(text.contains("init"));
}

#[test]
fn failure_names_the_stage() {
    let out = tempfile::tempdir().unwrap();
    let image = out.path().join("fs.img");

    let result = mkfsimage()
        .arg(&image)
        .arg(out.path().join("missing"))
        .output()
        .unwrap();
    assert_eq!(result.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("catalog scan failed"));
    assert!(!image.exists());
}

#[test]
fn dump_rejects_garbage() {
    let out = tempfile::tempdir().unwrap();
    let bogus = out.path().join("bogus.img");
    fs::write(&bogus, [0u8; 512]).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_fsimage-dump"))
        .arg(&bogus)
        .status()
        .unwrap();
    assert!(!status.success());
}

#[test]
fn dump_rejects_overflowing_entry_without_panicking() {
    let out = tempfile::tempdir().unwrap();
    let bogus = out.path().join("overflow.img");
    let mut img = vec![0u8; 1024];
    img[..4].copy_from_slice(&simplefs_abi::FS_MAGIC);
    img[4..8].copy_from_slice(&1u32.to_le_bytes());
    img[8] = b'a';
    img[16..32]
        .copy_from_slice(&simplefs_abi::FileTableEntry::new(512, u64::MAX - 600).to_le_bytes());
    fs::write(&bogus, &img).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_fsimage-dump"))
        .arg(&bogus)
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}
