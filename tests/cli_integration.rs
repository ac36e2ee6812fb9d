//! CLI Integration Tests
//!
//! These tests run the built `pmt` binary against small packed files.
//!
//! Run with:
//! ```bash
//! cargo test --test cli_integration
//! ```

use persistent_merkle::{bytes_to_leaves, KeccakHasher, Tree};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

const ZERO_PAIR: &str = "ad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5";
const ONES_TWOS: &str = "346d8c96a2454213fcc0daff3c96ad0398148181b9fa6488f7ae2c0af5b20aa0";

/// Get the path to the built binary
fn pmt_binary() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("target");
    path.push("debug");
    path.push("pmt");
    path
}

/// Run pmt and return (stdout, stderr, success)
fn run_pmt(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(pmt_binary())
        .args(["-f", "json"])
        .args(args)
        .output()
        .expect("Failed to execute pmt");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn run_json(args: &[&str]) -> Value {
    let (stdout, stderr, success) = run_pmt(args);
    assert!(success, "pmt {:?} failed: {}{}", args, stdout, stderr);
    serde_json::from_str(&stdout).expect("stdout should be JSON")
}

/// 0x01 * 32 followed by 0x02 * 32
fn write_two_chunks(dir: &Path) -> String {
    let path = dir.join("two.bin");
    let mut data = vec![1u8; 32];
    data.extend_from_slice(&[2u8; 32]);
    std::fs::write(&path, data).unwrap();
    path.to_str().unwrap().to_string()
}

// ============================================================================
// Zero Hashes
// ============================================================================

#[test]
fn test_cli_zero_hash_depth_one() {
    let json = run_json(&["zero-hash", "1"]);
    assert_eq!(json["root"], ZERO_PAIR);
    assert_eq!(json["hasher"], "keccak256");
}

#[test]
fn test_cli_zero_hash_depth_zero_is_zero_chunk() {
    let json = run_json(&["zero-hash", "0"]);
    assert_eq!(json["root"], "00".repeat(32));
}

#[test]
fn test_cli_zero_hash_rejects_excessive_depth() {
    let (stdout, _stderr, success) = run_pmt(&["zero-hash", "500"]);
    assert!(!success, "depth 500 should fail");
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["status"], "error");
}

#[test]
fn test_cli_blake3_differs() {
    let keccak = run_json(&["zero-hash", "3"]);
    let blake3 = run_json(&["--hasher", "blake3", "zero-hash", "3"]);
    assert_eq!(blake3["hasher"], "blake3");
    assert_ne!(keccak["root"], blake3["root"]);
}

// ============================================================================
// Roots and Chunks
// ============================================================================

#[test]
fn test_cli_root_of_two_chunks() {
    let dir = tempdir().unwrap();
    let file = write_two_chunks(dir.path());

    let json = run_json(&["root", &file]);
    assert_eq!(json["root"], ONES_TWOS);
    assert_eq!(json["depth"], 1);
    assert_eq!(json["bytes"], 64);
}

#[test]
fn test_cli_root_of_empty_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.bin");
    std::fs::write(&path, []).unwrap();

    let json = run_json(&["root", path.to_str().unwrap(), "--depth", "1"]);
    assert_eq!(json["root"], ZERO_PAIR);
}

#[test]
fn test_cli_root_of_mapped_file_matches_library() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("unaligned.bin");
    let data: Vec<u8> = (0..1000u32).map(|i| (i * 31 % 251) as u8).collect();
    std::fs::write(&path, &data).unwrap();

    let leaves = bytes_to_leaves::<KeccakHasher>(&data);
    let expected: Tree = Tree::from_contents(&leaves, 5).unwrap();

    let json = run_json(&["root", path.to_str().unwrap()]);
    assert_eq!(json["depth"], 5);
    assert_eq!(json["bytes"], 1000);
    assert_eq!(json["root"], expected.root().to_hex());
}

#[test]
fn test_cli_root_too_small_depth_fails() {
    let dir = tempdir().unwrap();
    let file = write_two_chunks(dir.path());

    let (stdout, _stderr, success) = run_pmt(&["root", &file, "--depth", "0"]);
    assert!(!success, "two chunks do not fit at depth 0");
    assert!(stdout.contains("error"));
}

#[test]
fn test_cli_missing_file_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope.bin");
    let (stdout, _stderr, success) = run_pmt(&["root", path.to_str().unwrap()]);
    assert!(!success);
    assert!(stdout.contains("\"status\":\"error\""));
}

#[test]
fn test_cli_chunks_pads_last_chunk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("odd.bin");
    std::fs::write(&path, [0xffu8; 33]).unwrap();

    let json = run_json(&["chunks", path.to_str().unwrap()]);
    assert_eq!(json["count"], 2);
    assert_eq!(json["chunks"][0], "ff".repeat(32));
    assert_eq!(json["chunks"][1], format!("ff{}", "00".repeat(31)));
}

// ============================================================================
// Proofs
// ============================================================================

#[test]
fn test_cli_prove_index() {
    let dir = tempdir().unwrap();
    let file = write_two_chunks(dir.path());

    let json = run_json(&["prove", &file, "--index", "1"]);
    assert_eq!(json["gindex"], "3");
    assert_eq!(json["leaf"], "02".repeat(32));
    assert_eq!(json["witnesses"], serde_json::json!(["01".repeat(32)]));
    assert_eq!(json["root"], ONES_TWOS);
}

#[test]
fn test_cli_prove_gindex_of_root() {
    let dir = tempdir().unwrap();
    let file = write_two_chunks(dir.path());

    let json = run_json(&["prove", &file, "--gindex", "1"]);
    assert_eq!(json["leaf"], ONES_TWOS);
    assert_eq!(json["witnesses"].as_array().unwrap().len(), 0);
}

#[test]
fn test_cli_prove_out_of_range_index_fails() {
    let dir = tempdir().unwrap();
    let file = write_two_chunks(dir.path());

    let (_stdout, _stderr, success) = run_pmt(&["prove", &file, "--index", "2"]);
    assert!(!success, "index 2 does not exist at depth 1");
}

#[test]
fn test_cli_multiprove_shares_witnesses() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("four.bin");
    let data: Vec<u8> = (1..=4u8).flat_map(|b| [b; 32]).collect();
    std::fs::write(&path, data).unwrap();

    let json = run_json(&["multiprove", path.to_str().unwrap(), "--index", "0", "1"]);
    assert_eq!(json["gindices"], serde_json::json!(["4", "5"]));
    let witnesses = json["witnesses"].as_array().unwrap();
    assert_eq!(witnesses.len(), 1);
    assert_eq!(witnesses[0]["gindex"], "3");
}

#[test]
fn test_cli_text_format_is_pretty() {
    let output = Command::new(pmt_binary())
        .args(["-f", "text", "zero-hash", "2"])
        .output()
        .expect("Failed to execute pmt");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().count() > 1, "text output should span lines");
}
