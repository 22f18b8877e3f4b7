#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-data")
        .join(name)
}

fn avskild(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_avskild"))
        .args(args)
        .env("AVSKILD_KEYSTORE", fixture_path("keystore.p12"))
        .env("AVSKILD_KEY_ALIAS", "somealias")
        .env("AVSKILD_KEYSTORE_PASSWORD", "changeit")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("avskild-cli-{test}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_sign_then_verify() {
    let dir = scratch_dir("sign-verify");
    let document = fixture_path("document.xml");
    let signature = dir.join("document.sig.xml");

    let out = avskild(&[
        "sign",
        document.to_str().unwrap(),
        "--digest",
        "sha256",
        "--signature",
        "rsa-sha256",
        "-o",
        signature.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let written = std::fs::read_to_string(&signature).unwrap();
    assert!(written.contains(r#"<Reference URI="document.xml">"#));

    let out = avskild(&["verify", document.to_str().unwrap(), signature.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "OK");

    let tampered = dir.join("tampered.xml");
    std::fs::write(&tampered, "<invoice/>").unwrap();
    let out = avskild(&["verify", tampered.to_str().unwrap(), signature.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("INVALID: "));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_sign_to_stdout_with_name() {
    let out = avskild(&[
        "sign",
        fixture_path("document.xml").to_str().unwrap(),
        "--name",
        "invoice-2024-0042.xml",
    ]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><Signature "#));
    assert!(stdout.contains(r#"URI="invoice-2024-0042.xml""#));
    assert!(stdout.contains("rsa-sha512"));
}

#[test]
fn test_verify_missing_signature_exits_with_error() {
    let document = fixture_path("document.xml");
    let out = avskild(&["verify", document.to_str().unwrap(), document.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Error: Signature node not present"), "{stderr}");
}

#[test]
fn test_wrong_password_exits_with_error() {
    let out = Command::new(env!("CARGO_BIN_EXE_avskild"))
        .args([
            "verify",
            fixture_path("document.xml").to_str().unwrap(),
            fixture_path("document.sign.xml").to_str().unwrap(),
            "--keystore",
            fixture_path("keystore.p12").to_str().unwrap(),
            "--alias",
            "somealias",
            "--password",
            "wrong",
        ])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("cannot load the verification key"));
}

#[test]
fn test_password_file_overrides_password() {
    let dir = scratch_dir("password-file");
    let password_file = dir.join("password");
    std::fs::write(&password_file, "changeit\n").unwrap();
    let out = Command::new(env!("CARGO_BIN_EXE_avskild"))
        .args([
            "verify",
            fixture_path("document.xml").to_str().unwrap(),
            fixture_path("document.sign.xml").to_str().unwrap(),
            "--keystore",
            fixture_path("keystore.p12").to_str().unwrap(),
            "--alias",
            "somealias",
            "--password",
            "wrong",
            "--password-file",
            password_file.to_str().unwrap(),
        ])
        .env_remove("AVSKILD_KEYSTORE_PASSWORD")
        .env_remove("AVSKILD_KEYSTORE_PASSWORD_FILE")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "OK");

    let out = Command::new(env!("CARGO_BIN_EXE_avskild"))
        .args([
            "verify",
            fixture_path("document.xml").to_str().unwrap(),
            fixture_path("document.sign.xml").to_str().unwrap(),
            "--keystore",
            fixture_path("keystore.p12").to_str().unwrap(),
            "--alias",
            "somealias",
            "--password-file",
            dir.join("missing").to_str().unwrap(),
        ])
        .env_remove("AVSKILD_KEYSTORE_PASSWORD")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_unknown_algorithm_name() {
    let out = avskild(&[
        "sign",
        fixture_path("document.xml").to_str().unwrap(),
        "--digest",
        "md5",
    ]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("md5"));
}

#[test]
fn test_inspect_legacy() {
    let out = avskild(&["inspect", fixture_path("document.legacy.sign.xml").to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("Reference URI:      document.xml"));
    assert!(stdout.contains("none (legacy)"));
}

#[test]
fn test_info_lists_uris() {
    let out = avskild(&["info"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("http://www.w3.org/2001/04/xmldsig-more#rsa-sha512"));
    assert!(stdout.contains("sha3-256"));
}
