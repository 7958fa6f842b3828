mod common;
use common::*;
use tern::mach::{Event, LocalBounds, Machine, Options};

const FACTORIAL: &str = r#"
        jump main
    .function fact 1 1
        get_local 0
        push_int 2
        lt
        jump_if_false recurse
        push_int 1
        ret_val
    recurse:
        get_local 0
        get_local 0
        push_int 1
        sub
        call_local fact
        mul
        ret_val
    main:
        push_int 10
        call_local fact
        push_string "println"
        get
        call
"#;

#[test]
fn test_recursive_factorial() {
    assert_eq!(exec(FACTORIAL), "3628800\n");
}

#[test]
fn test_string_building() {
    let source = r#"
        push_string "s"
        push_string ""
        set
        push_int 0
        set_local 0
    top:
        get_local 0
        push_int 3
        lt
        jump_if_false done
        push_string "s"
        push_string "s"
        get
        push_string "ab"
        add
        set
        get_local 0
        push_int 1
        add
        set_local 0
        jump top
    done:
        push_string "s"
        get
        push_string "println"
        get
        call
    "#;
    assert_eq!(exec(source), "ababab\n");
}

#[test]
fn test_runtime_error_output() {
    let source = "push_int 1\npush_string \"x\"\nsub";
    assert_eq!(exec(source), "?TYPE MISMATCH AT 4; SUB OF int AND string\n");
    let source = "push_int 1\npush_int 0\ndiv";
    assert_eq!(exec(source), "?DIVISION BY ZERO AT 4\n");
}

#[test]
fn test_assembly_error_output() {
    assert_eq!(
        exec("push_int 1\n  bogus 2\njump_if_false nowhere"),
        "?SYNTAX ERROR IN 2:3; UNKNOWN MNEMONIC bogus\n\
         ?SYNTAX ERROR IN 3:15; UNDEFINED LABEL nowhere\n"
    );
}

#[test]
fn test_declared_bounds_from_text() {
    let source = r#"
        jump main
    .function f 0 1
        push_int 1
        set_local 1
        ret
    main:
        call_local f
    "#;
    assert_eq!(exec(source), "");
    let options = Options::new().local_bounds(LocalBounds::Declared);
    assert_eq!(
        exec_with(source, options),
        "?INDEX OUT OF RANGE AT 11; LOCAL 1 EXCEEDS DECLARED COUNT 1\n"
    );
}

#[test]
fn test_budgeted_execution() {
    let code = tern::lang::assemble("top:\njump top").unwrap();
    let mut machine = Machine::from_bytecode(code);
    let (out, event) = exec_machine(&mut machine, 1000);
    assert_eq!(out, "");
    assert_eq!(event, Some(Event::Running));
    assert_eq!(machine.program_counter(), 0);
}
