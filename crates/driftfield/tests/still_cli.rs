use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn driftfield(config_dir: &std::path::Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_driftfield"));
    command
        .env("DRIFTFIELD_CONFIG_DIR", config_dir)
        .env("RUST_LOG", "warn");
    command
}

fn png_dimensions(bytes: &[u8]) -> (u32, u32) {
    const MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    assert_eq!(&bytes[..8], &MAGIC, "not a PNG file");
    assert_eq!(&bytes[12..16], b"IHDR");
    let width = u32::from_be_bytes(bytes[16..20].try_into().unwrap());
    let height = u32::from_be_bytes(bytes[20..24].try_into().unwrap());
    (width, height)
}

#[test]
fn still_export_writes_png_of_requested_size() {
    let root = TempDir::new().unwrap();
    let output = root.path().join("frame.png");

    let status = driftfield(root.path())
        .args(["still", "--size", "32x16", "--time", "1.5", "--pointer", "8,8", "--output"])
        .arg(&output)
        .status()
        .expect("failed to run driftfield still");

    assert!(status.success());
    let bytes = fs::read(&output).unwrap();
    assert_eq!(png_dimensions(&bytes), (32, 16));
}

#[test]
fn still_export_is_deterministic() {
    let root = TempDir::new().unwrap();
    let first = root.path().join("first.png");
    let second = root.path().join("second.png");

    for output in [&first, &second] {
        let status = driftfield(root.path())
            .args(["still", "--size", "24x24", "--time", "2s", "--output"])
            .arg(output)
            .status()
            .expect("failed to run driftfield still");
        assert!(status.success());
    }

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn config_command_reflects_file_and_flags() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        "version = 1\n\n[field]\noctaves = 4\n\n[render]\nstill_time = \"3s\"\n",
    )
    .unwrap();

    let output = driftfield(root.path())
        .args(["config", "--trail-rate", "0.25"])
        .output()
        .expect("failed to run driftfield config");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("octaves = 4"), "{stdout}");
    assert!(stdout.contains("trail_rate = 0.25"), "{stdout}");
    assert!(stdout.contains("still_time = \"3s\""), "{stdout}");
}

#[test]
fn invalid_config_exits_with_error() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config.toml"), "[field]\noctaves = 12\n").unwrap();

    let output = driftfield(root.path())
        .args(["still", "--size", "8x8", "--output"])
        .arg(root.path().join("never.png"))
        .output()
        .expect("failed to run driftfield still");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("octaves"), "{stderr}");
    assert!(!root.path().join("never.png").exists());
}

#[test]
fn paths_command_reports_config_dir() {
    let root = TempDir::new().unwrap();

    let output = driftfield(root.path())
        .arg("paths")
        .output()
        .expect("failed to run driftfield paths");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(&root.path().display().to_string()));
    assert!(stdout.contains("missing"));
}
