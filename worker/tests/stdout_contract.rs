//! Runs the built binary and checks the one-line stdout contract.

use ed25519_dalek::{Signer, SigningKey};
use littercoin_protocol::cbor::Transaction;
use rand::rngs::OsRng;
use std::process::{Command, Output};

const BIN: &str = env!("CARGO_BIN_EXE_littercoin-worker");

// [{0: [], 2: 200000}, {}, true, null]
const UNSIGNED_HEX: &str = "84a20080021a00030d40a0f5f6";
// Offset of the body inside UNSIGNED_HEX's bytes.
const BODY: std::ops::Range<usize> = 1..10;

fn run(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        // Nothing listens here; submission must fail fast.
        .env("LITTERCOIN_SUBMIT_URL", "http://127.0.0.1:9")
        .env("RUST_LOG", "debug")
        .output()
        .expect("spawn littercoin-worker")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1, "stdout was {stdout:?}");
    serde_json::from_str(lines[0]).unwrap()
}

fn witness_hex(key: &SigningKey) -> String {
    let hash = Transaction::from_hex(UNSIGNED_HEX).unwrap().hash();

    let mut bytes = vec![0xa1, 0x00, 0x81, 0x82, 0x58, 0x20];
    bytes.extend_from_slice(key.verifying_key().as_bytes());
    bytes.extend_from_slice(&[0x58, 0x40]);
    bytes.extend_from_slice(&key.sign(&hash).to_bytes());
    hex::encode(bytes)
}

#[test]
fn merge_tx_prints_signed_transaction() {
    let key = SigningKey::generate(&mut OsRng);
    let output = run(&["merge-tx", &witness_hex(&key), UNSIGNED_HEX]);
    let json = stdout_json(&output);

    assert_eq!(json["status"], 200);
    let signed = hex::decode(json["cborTx"].as_str().unwrap()).unwrap();
    let original = hex::decode(UNSIGNED_HEX).unwrap();
    assert_eq!(signed[BODY], original[BODY]);
    assert!(signed.windows(32).any(|w| w == key.verifying_key().as_bytes()));
}

#[test]
fn bad_input_is_status_500_on_stdout() {
    let output = run(&["merge-tx", "not-hex", UNSIGNED_HEX]);
    assert_eq!(stdout_json(&output), serde_json::json!({ "status": 500 }));
    assert!(!output.stderr.is_empty(), "diagnostics belong on stderr");
}

#[test]
fn unreachable_network_is_status_500() {
    let key = SigningKey::generate(&mut OsRng);
    let output = run(&["submit-tx", &witness_hex(&key), UNSIGNED_HEX]);
    assert_eq!(stdout_json(&output)["status"], 500);
}

#[test]
fn malformed_argv_still_prints_one_line() {
    let output = run(&["submit-tx", "a100"]);
    assert_eq!(stdout_json(&output), serde_json::json!({ "status": 500 }));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("TX_HEX"));
}
