//! CLI integration tests
//!
//! These tests verify the CLI works correctly end-to-end.

#![cfg(feature = "cli")]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use zip::write::SimpleFileOptions;

fn cli_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_safe_extract"))
}

fn create_test_zip(dir: &Path) -> PathBuf {
    let zip_path = dir.join("test.zip");
    let file = fs::File::create(&zip_path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    zip.start_file("hello.txt", options).unwrap();
    zip.write_all(b"Hello, World!").unwrap();

    zip.start_file("subdir/nested.txt", options).unwrap();
    zip.write_all(b"Nested content").unwrap();

    zip.finish().unwrap();
    zip_path
}

fn create_malicious_zip(dir: &Path) -> PathBuf {
    let zip_path = dir.join("evil.zip");
    let mut zip = zip::ZipWriter::new(fs::File::create(&zip_path).unwrap());
    let options = SimpleFileOptions::default();

    zip.start_file("../escape.txt", options).unwrap();
    zip.write_all(b"evil").unwrap();
    zip.start_file("fine.txt", options).unwrap();
    zip.write_all(b"fine").unwrap();

    zip.finish().unwrap();
    zip_path
}

fn create_test_tar(dir: &Path) -> PathBuf {
    let tar_path = dir.join("release.tar");
    let mut builder = tar::Builder::new(fs::File::create(&tar_path).unwrap());
    let files: [(&str, &[u8]); 2] = [
        ("release-1.0/bin/tool", b"#!/bin/sh"),
        ("release-1.0/README", b"docs"),
    ];
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_path(name).unwrap();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append(&header, content).unwrap();
    }
    builder.finish().unwrap();
    tar_path
}

#[test]
fn test_cli_help() {
    let output = cli_binary().arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Policy-driven archive extraction"));
    assert!(stdout.contains("--list"));
    assert!(stdout.contains("--strip-components"));
    assert!(stdout.contains("--on-error"));
}

#[test]
fn test_cli_version() {
    let output = cli_binary().arg("--version").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("safe_extract"));
}

#[test]
fn test_cli_list() {
    let temp = tempfile::tempdir().unwrap();
    let zip_path = create_test_zip(temp.path());

    let output = cli_binary().arg(&zip_path).arg("--list").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hello.txt"));
    assert!(stdout.contains("subdir/nested.txt"));
    assert!(stdout.contains("2 entries"));
}

#[test]
fn test_cli_extract() {
    let temp = tempfile::tempdir().unwrap();
    let zip_path = create_test_zip(temp.path());
    let dest = temp.path().join("output");

    let output = cli_binary()
        .arg(&zip_path)
        .arg("-d")
        .arg(&dest)
        .output()
        .unwrap();

    assert!(output.status.success());

    // Destination is created on demand
    assert!(dest.join("hello.txt").exists());
    assert!(dest.join("subdir/nested.txt").exists());

    let content = fs::read_to_string(dest.join("hello.txt")).unwrap();
    assert_eq!(content, "Hello, World!");
}

#[test]
fn test_cli_extract_verbose() {
    let temp = tempfile::tempdir().unwrap();
    let zip_path = create_test_zip(temp.path());
    let dest = temp.path().join("output");

    let output = cli_binary()
        .arg(&zip_path)
        .arg("-d")
        .arg(&dest)
        .arg("-v")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hello.txt"));
    assert!(stdout.contains("nested.txt"));
}

#[test]
fn test_cli_extract_quiet() {
    let temp = tempfile::tempdir().unwrap();
    let zip_path = create_test_zip(temp.path());
    let dest = temp.path().join("output");

    let output = cli_binary()
        .arg(&zip_path)
        .arg("-d")
        .arg(&dest)
        .arg("-q")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim().is_empty());
}

#[test]
fn test_cli_blocks_traversal() {
    let temp = tempfile::tempdir().unwrap();
    let zip_path = create_malicious_zip(temp.path());
    let dest = temp.path().join("output");

    let output = cli_binary()
        .arg(&zip_path)
        .arg("-d")
        .arg(&dest)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Path traversal blocked"));
    assert!(!temp.path().join("escape.txt").exists());
}

#[test]
fn test_cli_on_error_skip() {
    let temp = tempfile::tempdir().unwrap();
    let zip_path = create_malicious_zip(temp.path());
    let dest = temp.path().join("output");

    let output = cli_binary()
        .arg(&zip_path)
        .arg("-d")
        .arg(&dest)
        .arg("--on-error")
        .arg("skip")
        .output()
        .unwrap();

    // Partial success
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Failed 1 entries"));
    assert!(dest.join("fine.txt").exists());
    assert!(!temp.path().join("escape.txt").exists());
}

#[test]
fn test_cli_strip_components() {
    let temp = tempfile::tempdir().unwrap();
    let tar_path = create_test_tar(temp.path());
    let dest = temp.path().join("output");

    let output = cli_binary()
        .arg(&tar_path)
        .arg("-d")
        .arg(&dest)
        .arg("--strip-components")
        .arg("1")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(dest.join("bin/tool").exists());
    assert!(dest.join("README").exists());
    assert!(!dest.join("release-1.0").exists());
}

#[test]
fn test_cli_include_filter() {
    let temp = tempfile::tempdir().unwrap();
    let zip_path = create_test_zip(temp.path());
    let dest = temp.path().join("output");

    let output = cli_binary()
        .arg(&zip_path)
        .arg("-d")
        .arg(&dest)
        .arg("--include")
        .arg("subdir/**")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(dest.join("subdir/nested.txt").exists());
    assert!(!dest.join("hello.txt").exists());
}

#[test]
fn test_cli_keeps_existing_without_overwrite() {
    let temp = tempfile::tempdir().unwrap();
    let zip_path = create_test_zip(temp.path());
    let dest = temp.path().join("output");
    fs::create_dir(&dest).unwrap();

    // Create existing file
    fs::write(dest.join("hello.txt"), "existing").unwrap();

    let output = cli_binary()
        .arg(&zip_path)
        .arg("-d")
        .arg(&dest)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(fs::read_to_string(dest.join("hello.txt")).unwrap(), "existing");

    let output = cli_binary()
        .arg(&zip_path)
        .arg("-d")
        .arg(&dest)
        .arg("--overwrite")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(fs::read_to_string(dest.join("hello.txt")).unwrap(), "Hello, World!");
}

#[test]
fn test_cli_decompresses_bare_gzip() {
    use flate2::write::GzEncoder;

    let temp = tempfile::tempdir().unwrap();
    let gz_path = temp.path().join("notes.txt.gz");
    let file = fs::File::create(&gz_path).unwrap();
    let mut encoder = GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(b"plain notes").unwrap();
    encoder.finish().unwrap();
    let dest = temp.path().join("output");

    let output = cli_binary()
        .arg(&gz_path)
        .arg("-d")
        .arg(&dest)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(fs::read_to_string(dest.join("notes.txt")).unwrap(), "plain notes");
}

#[test]
fn test_cli_unsupported_format() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("archive.rar");
    fs::write(&path, b"Rar!").unwrap();

    let output = cli_binary().arg(&path).arg("--list").output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported archive format"));
}

#[test]
fn test_cli_missing_archive() {
    let output = cli_binary()
        .arg("/nonexistent/archive.zip")
        .arg("--list")
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn test_cli_completions() {
    let output = cli_binary()
        .arg("--completions")
        .arg("bash")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("safe_extract"));
}
