//! Integration tests for the `sylva` binary.

use std::io::Write;
use std::process::{Command, Output};

fn sylva(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sylva"))
        .args(args)
        .env_remove("SYLVA_LOG")
        .output()
        .expect("failed to run sylva")
}

fn assembly(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const POINT_ASSEMBLY: &str = r#"{
    "cbuffsize": 8, "cmask": "1",
    "typenames": ["Main::Point", "Main::Unused"],
    "fieldnames": ["x"],
    "typedecls": [{
        "tkind": "Struct", "tkey": "Main::Point", "name": "Point",
        "sizeinfo": {"heapsize": 8, "inlinedatasize": 8, "assigndatasize": 8,
                     "heapmask": null, "inlinedmask": "1"},
        "fields": ["x"], "fieldoffsets": [0]
    }],
    "litdecls": [{"offset": 0, "type": "Int", "value": "3i"}]
}"#;

// ────────────────────────────────────────────────────────────────────────────
// check
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_check_ok() {
    let file = assembly(POINT_ASSEMBLY);
    let out = sylva(&["check", file.path().to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains(": ok"), "{stdout}");
    assert!(stdout.contains("types:        27 (28 ids)"), "{stdout}");
}

#[test]
fn test_check_failure_exits_with_fault_code() {
    let file = assembly(r#"{"litdecls": [{"offset": 0, "type": "Main::Nope", "value": "1"}]}"#);
    let out = sylva(&["check", file.path().to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(5));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Main::Nope"), "{stderr}");
}

// ────────────────────────────────────────────────────────────────────────────
// types
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_types_table() {
    let file = assembly(POINT_ASSEMBLY);
    let out = sylva(&["types", "--all", file.path().to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Point"), "{stdout}");
    assert!(stdout.contains("@StringK128"), "{stdout}");
    assert!(stdout.contains("Main::Unused"), "{stdout}");
}

#[test]
fn test_types_json() {
    let file = assembly(POINT_ASSEMBLY);
    let out = sylva(&["types", "--json", file.path().to_str().unwrap()]);
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let types = value["types"].as_array().unwrap();
    assert_eq!(types.len(), 27);
    assert_eq!(types[26]["name"], "Point");
    assert_eq!(types[26]["kind"], "Struct");
    assert_eq!(types[0]["name"], "None");
}

// ────────────────────────────────────────────────────────────────────────────
// header
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_header_decode() {
    // rc = 1, young, type id 31
    let raw = (1u64 << 24) | (1 << 22) | 31;
    let out = sylva(&["header", &format!("{raw:#x}")]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("rc:        1"), "{stdout}");
    assert!(stdout.contains("young:     true"), "{stdout}");
    assert!(stdout.contains("type id:   31"), "{stdout}");
}

#[test]
fn test_header_forwarded() {
    let out = sylva(&["header", "0"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("forwarded: yes"));
}
