use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

const BEACON_FRAME_HEX: &str =
    "000008006900000080000000ffffffffffff020000000001020000000001 1000";

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("ppiscope"))
}

fn ppi_frame(version: u8, dlt: u32, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![version, 0x00, 0x08, 0x00];
    frame.extend_from_slice(&dlt.to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

fn write_pcap(path: &Path, packets: &[Vec<u8>]) {
    let mut out = Vec::new();
    out.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&65535u32.to_le_bytes());
    out.extend_from_slice(&192u32.to_le_bytes());
    for data in packets {
        out.extend_from_slice(&[0u8; 8]);
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }
    fs::write(path, out).expect("write capture");
}

/// Capture with one clean frame and one frame whose DLT has no decoder.
fn sample_capture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("input.pcap");
    write_pcap(
        &path,
        &[
            ppi_frame(0, 105, &[0xD4, 0x00, 0x00, 0x00, 1, 2, 3, 4, 5, 6]),
            ppi_frame(0, 4242, &[0xAA, 0xBB]),
        ],
    );
    path
}

fn clean_capture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("clean.pcap");
    write_pcap(
        &path,
        &[ppi_frame(0, 105, &[0xD4, 0x00, 0x00, 0x00, 1, 2, 3, 4, 5, 6])],
    );
    path
}

#[test]
fn help_supports_analyse_and_analyze() {
    cmd().arg("pcap").arg("analyse").arg("--help").assert().success();
    cmd().arg("pcap").arg("analyze").arg("--help").assert().success();
}

#[test]
fn decode_prints_layer_json() {
    let assert = cmd().arg("decode").arg(BEACON_FRAME_HEX).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(value["header"]["dlt"], 105);
    assert_eq!(value["header_len"], 8);
    assert_eq!(value["next"]["status"], "decoded");
    assert_eq!(value["next"]["decoder"], "802.11");
    assert_eq!(value["next"]["payload"]["details"]["type"], "management");
}

#[test]
fn decode_reports_header_error() {
    cmd()
        .arg("decode")
        .arg("00000400")
        .assert()
        .code(2)
        .stderr(contains("error:").and(contains("too short")).and(contains("hint:")));
}

#[test]
fn decode_rejects_bad_hex() {
    cmd()
        .arg("decode")
        .arg("zz")
        .assert()
        .failure()
        .stderr(contains("invalid hex input"));
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.pcapng");
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(missing)
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn stdout_outputs_json() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(&temp);
    let assert = cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(input)
        .arg("--stdout")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(value["ppi"]["decoded"], 2);
    assert_eq!(value["encapsulations"][1]["dlt"], 4242);
}

#[test]
fn report_file_is_written() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(&temp);
    let report = temp.path().join("out").join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyse")
        .arg(input)
        .arg("-o")
        .arg(&report)
        .arg("--pretty")
        .assert()
        .success()
        .stderr(contains("OK: report written"));
    let json = fs::read_to_string(&report).expect("report written");
    let value: Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(value["tool"]["name"], "ppiscope");
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(&temp);
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(input)
        .arg("--stdout")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn report_must_differ_from_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(&temp);

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(&input)
        .arg("-o")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("report path must differ from input"));
}

#[test]
fn unsupported_extension_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("capture.txt");
    fs::write(&input, b"not a capture").expect("write input");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(input)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("unsupported input format"));
}

#[test]
fn glob_with_multiple_matches_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    sample_capture(&temp);
    clean_capture(&temp);
    let pattern = temp.path().join("*.pcap");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(pattern)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("multiple files match pattern"));
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(&temp);
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(input)
        .arg("-o")
        .arg(report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn list_violations_outputs_ids() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(&temp);
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(input)
        .arg("-o")
        .arg(report)
        .arg("--list-violations")
        .assert()
        .success()
        .stderr(contains("Compliance violations:").and(contains("PPI-UNKNOWN-DLT")));
}

#[test]
fn strict_fails_when_violations_present() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(&temp);
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(input)
        .arg("-o")
        .arg(report)
        .arg("--strict")
        .assert()
        .failure()
        .stderr(contains("compliance violations detected"));
}

#[test]
fn strict_passes_on_clean_capture() {
    let temp = TempDir::new().expect("tempdir");
    let input = clean_capture(&temp);

    cmd()
        .arg("pcap")
        .arg("analyze")
        .arg(input)
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .success();
}
