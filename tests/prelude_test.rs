mod common;
use common::*;

fn call(arg: &str, name: &str) -> String {
    format!("{}\npush_string \"{}\"\nget\ncall\n", arg, name)
}

#[test]
fn test_print_values() {
    let mut source = String::new();
    source.push_str(&call("push_int -3", "print"));
    source.push_str(&call("push_char ' '", "print"));
    source.push_str(&call("push_float 1.5", "println"));
    source.push_str(&call("push_true", "println"));
    source.push_str(&call("push_null", "println"));
    source.push_str(&call("push_string \"hi\\tthere\"", "println"));
    assert_eq!(exec(&source), "-3 1.5\ntrue\nnull\nhi\tthere\n");
}

#[test]
fn test_print_array() {
    let source = r#"
        push_int 2
        create_array
        set_local 0
        push_int 0
        get_local 0
        push_string "x"
        set_array
        get_local 0
        push_string "println"
        get
        call
    "#;
    assert_eq!(exec(source), "[x, null]\n");
}

#[test]
fn test_len() {
    let mut source = call("push_string \"four\"", "len");
    source.push_str(&call("", "println"));
    source.push_str(&call("push_int 3\ncreate_array", "len"));
    source.push_str(&call("", "println"));
    assert_eq!(exec(&source), "4\n3\n");
    assert_eq!(
        exec(&call("push_int 3", "len")),
        "?TYPE MISMATCH AT 5; LEN EXPECTS string OR array, FOUND int\n"
    );
}

#[test]
fn test_rand() {
    let mut source = String::new();
    for _ in 0..20 {
        source.push_str(&call("push_int 3", "rand"));
        source.push_str(&call("", "print"));
    }
    let out = exec(&source);
    assert_eq!(out.len(), 20);
    assert!(out.chars().all(|c| c == '0' || c == '1' || c == '2'));
    assert_eq!(
        exec(&call("push_int 0", "rand")),
        "?INDEX OUT OF RANGE AT 5; RAND BOUND 0 IS NOT POSITIVE\n"
    );
}

#[test]
fn test_clock() {
    let mut source = call("", "clock");
    source.push_str("push_int 0\ngte\n");
    source.push_str(&call("", "println"));
    assert_eq!(exec(&source), "true\n");
}
