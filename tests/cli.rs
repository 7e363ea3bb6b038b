//! Command line mode: export and tag listing.

mod common;

use std::fs;
use std::process::Command;

use common::{sanger_read, READ_SEQUENCE};

fn tracetui() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tracetui"))
}

#[test]
fn test_export_fasta() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("read.ab1");
    let output = dir.path().join("read.fasta");
    fs::write(&input, sanger_read()).unwrap();

    let status = tracetui().arg(&input).arg("-o").arg(&output).status().unwrap();
    assert!(status.success());
    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(text, format!(">sample_42\n{}\n", READ_SEQUENCE));
}

#[test]
fn test_export_trimmed_fastq_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("read.ab1");
    fs::write(&input, sanger_read()).unwrap();

    let out = tracetui()
        .arg(&input)
        .args(["-o", "-", "--fastq", "--trim"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, ["@sample_42", "TTGCAACGTACGTACGGATC", "+", "IIIIIIIIIIIIIIIIIIII"]);
}

#[test]
fn test_tag_listing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("read.ab1");
    fs::write(&input, sanger_read()).unwrap();

    let out = tracetui().arg(&input).arg("--tags").output().unwrap();
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    // Calls, qualities, peaks, dye order, sample, spacing and four traces.
    assert_eq!(lines[0], "ABIF version 101, 10 entries");
    assert_eq!(lines.len(), 2 + 10);
    assert!(text.contains("PBAS_2"));
    assert!(text.contains("DATA_12"));
}

#[test]
fn test_rejects_non_abif() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    fs::write(&input, "hello").unwrap();

    let out = tracetui().arg(&input).args(["-o", "-"]).output().unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Not an ABIF file"));
}
