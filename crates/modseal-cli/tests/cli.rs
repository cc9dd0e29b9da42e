//! End-to-end tests for the `modseal` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn modseal(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_modseal"))
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_seal_unseal_roundtrip() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("main.lua"), "return 1").unwrap();

    let out = modseal(temp.path(), &["seal", "main.lua", "main.sealed"]);
    assert!(out.status.success(), "{:?}", out);
    let sealed = fs::read(temp.path().join("main.sealed")).unwrap();
    assert_eq!(&sealed[..8], b"MSEAL01\0");
    assert_eq!(sealed.len(), 12 + 8);

    let out = modseal(temp.path(), &["unseal", "main.sealed", "main.out"]);
    assert!(out.status.success(), "{:?}", out);
    assert_eq!(fs::read(temp.path().join("main.out")).unwrap(), b"return 1");
}

#[test]
fn test_seal_refuses_sealed_input() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("main.lua"), "return 1").unwrap();
    assert!(modseal(temp.path(), &["seal", "main.lua", "a"]).status.success());
    assert!(!modseal(temp.path(), &["seal", "a", "b"]).status.success());
}

#[test]
fn test_unseal_plain_file_fails() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("main.lua"), "return 1").unwrap();
    let out = modseal(temp.path(), &["unseal", "main.lua", "x"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("not a sealed module"));
}

#[test]
fn test_key_changes_ciphertext() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("main.lua"), "return 1").unwrap();
    assert!(modseal(temp.path(), &["seal", "main.lua", "default"]).status.success());
    assert!(modseal(temp.path(), &["--key", "other", "seal", "main.lua", "keyed"])
        .status
        .success());

    let default = fs::read(temp.path().join("default")).unwrap();
    let keyed = fs::read(temp.path().join("keyed")).unwrap();
    assert_eq!(&default[..12], &keyed[..12]);
    assert_ne!(&default[12..], &keyed[12..]);
}

#[test]
fn test_config_file_key_is_used() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("main.lua"), "return 1").unwrap();
    fs::write(temp.path().join("modseal.toml"), "cipher_key = \"other\"\n").unwrap();

    assert!(modseal(temp.path(), &["seal", "main.lua", "from_config"]).status.success());
    assert!(modseal(temp.path(), &["-k", "other", "seal", "main.lua", "from_flag"])
        .status
        .success());
    assert_eq!(
        fs::read(temp.path().join("from_config")).unwrap(),
        fs::read(temp.path().join("from_flag")).unwrap()
    );
}

#[test]
fn test_inspect_json() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("main.lua"), "return 1").unwrap();
    assert!(modseal(temp.path(), &["seal", "main.lua", "main.sealed"]).status.success());

    let out = modseal(temp.path(), &["inspect", "--json", "main.lua", "main.sealed"]);
    assert!(out.status.success(), "{:?}", out);
    let text = stdout(&out);
    assert!(text.contains("\"plain_source\""));
    assert!(text.contains("\"protected\""));
    assert!(text.contains("\"declared_payload\": 8"));
}

#[test]
fn test_pack_and_unpack() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("scripts");
    fs::create_dir_all(src.join("ui")).unwrap();
    fs::write(src.join("main.lua"), "return 1").unwrap();
    fs::write(src.join("ui/list.lua"), "return 2").unwrap();

    let out = modseal(temp.path(), &["pack", "scripts", "game.pack", "--seal"]);
    assert!(out.status.success(), "{:?}", out);
    assert!(stdout(&out).contains("Packed 2 assets (2 sealed)"));

    let out = modseal(temp.path(), &["unpack", "game.pack", "--list"]);
    assert!(out.status.success(), "{:?}", out);
    let listing = stdout(&out);
    assert!(listing.contains("main.lua"));
    assert!(listing.contains("ui/list.lua"));

    let out = modseal(temp.path(), &["unpack", "game.pack", "extracted"]);
    assert!(out.status.success(), "{:?}", out);
    let extracted = fs::read(temp.path().join("extracted/ui/list.lua")).unwrap();
    assert_eq!(&extracted[..8], b"MSEAL01\0");

    let out = modseal(temp.path(), &["unseal", "extracted/ui/list.lua", "list.lua"]);
    assert!(out.status.success(), "{:?}", out);
    assert_eq!(fs::read(temp.path().join("list.lua")).unwrap(), b"return 2");
}

#[test]
fn test_unpack_requires_dir_or_list() {
    let temp = tempfile::tempdir().unwrap();
    assert!(!modseal(temp.path(), &["unpack", "game.pack"]).status.success());
}
