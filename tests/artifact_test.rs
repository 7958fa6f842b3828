mod common;
use common::*;
use tern::lang::{assemble, ErrorCode};
use tern::mach::{Bytecode, Listing, Machine};

const PROGRAM: &str = r#"
        jump main
    .function greet 1 1
        push_string "hello, "
        get_local 0
        add
        push_string "println"
        get
        call
        ret
    main:
        push_string "tern"
        call_local greet
        push_float 0.25
        push_char 'z'
"#;

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("tern-{}-{}.tbc", name, std::process::id()))
}

#[test]
fn test_save_and_load() {
    let code = assemble(PROGRAM).unwrap();
    let path = temp_path("roundtrip");
    code.save(&path).unwrap();
    let loaded = Bytecode::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, code);
    let mut machine = Machine::from_bytecode(loaded);
    let (out, _) = exec_machine(&mut machine, 1000);
    assert_eq!(out, "hello, tern\n");
}

#[test]
fn test_corrupt_artifact() {
    let mut bytes = assemble(PROGRAM).unwrap().to_bytes();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0xFF;
    let err = Bytecode::from_bytes(&bytes).unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadArtifact);
    assert_eq!(err.text(), "CHECKSUM MISMATCH");
    let err = Bytecode::from_bytes(b"TERN").unwrap_err();
    assert_eq!(err.text(), "FILE TOO SHORT");
}

#[test]
fn test_missing_file() {
    let err = Bytecode::load(temp_path("missing")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::BadArtifact);
}

#[test]
fn test_listing() {
    let code = assemble("push_int 7\npush_string \"x\"\nset").unwrap();
    let lines: Vec<String> = Listing::new(&code)
        .lines()
        .into_iter()
        .map(|(addr, text)| format!("{} {}", addr, text))
        .collect();
    assert_eq!(
        lines,
        vec![
            "0 push_int 0     ; 7".to_string(),
            "2 push_string 0     ; \"x\"".to_string(),
            "4 set".to_string(),
        ]
    );
}
