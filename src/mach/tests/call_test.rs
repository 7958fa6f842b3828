use super::*;
use crate::lang::ErrorCode;
use crate::mach::{LocalBounds, Opcode, Val};

fn with_depth_probe(asm: Assembler) -> Machine {
    let mut m = machine(asm, Options::default());
    m.register_native("depth", |m: &mut Machine| {
        let depth = m.call_depth() as i32;
        m.push(Val::Int(depth))
    });
    m
}

#[test]
fn test_two_argument_function() {
    let mut asm = Assembler::new();
    asm.jump(Opcode::Jump, "main");
    asm.function("sub", 2, 2)
        .get_local(0)
        .get_local(1)
        .op(Opcode::Sub)
        .push_string("depth")
        .op(Opcode::Get)
        .op(Opcode::Call)
        .op(Opcode::Add)
        .op(Opcode::ReturnWithValue);
    asm.label("main").push_int(10).push_int(3).call_local("sub");
    let mut m = with_depth_probe(asm);
    m.run().unwrap();
    assert_eq!(m.stack(), vec![Val::Int(8)]);
    assert_eq!(m.call_depth(), 0);
    assert_eq!(m.frame_depth(), 1);
}

#[test]
fn test_return_without_value() {
    let mut asm = Assembler::new();
    asm.jump(Opcode::Jump, "main");
    asm.function("noop", 1, 1).op(Opcode::Return);
    asm.label("main").push_int(1).push_int(2).call_local("noop");
    let m = run(asm);
    assert_eq!(m.stack(), vec![Val::Int(1)]);
}

#[test]
fn test_stray_values_discarded() {
    let mut asm = Assembler::new();
    asm.jump(Opcode::Jump, "main");
    asm.function("messy", 0, 0)
        .push_int(1)
        .push_int(2)
        .op(Opcode::ReturnWithValue);
    asm.label("main").call_local("messy");
    let m = run(asm);
    assert_eq!(m.stack(), vec![Val::Int(2)]);
}

#[test]
fn test_locals_are_per_frame() {
    let mut asm = Assembler::new();
    asm.push_int(5).set_local(0);
    asm.jump(Opcode::Jump, "main");
    asm.function("clobber", 0, 1)
        .push_int(9)
        .set_local(0)
        .op(Opcode::Return);
    asm.label("main").call_local("clobber");
    let m = run(asm);
    assert_eq!(m.locals(), &[Val::Int(5)]);
}

fn out_of_bounds() -> Assembler {
    let mut asm = Assembler::new();
    asm.jump(Opcode::Jump, "main");
    asm.function("f", 1, 1)
        .push_int(0)
        .set_local(1)
        .get_local(0)
        .op(Opcode::ReturnWithValue);
    asm.label("main").push_int(4).call_local("f");
    asm
}

#[test]
fn test_declared_local_bounds() {
    let m = run(out_of_bounds());
    assert_eq!(m.stack(), vec![Val::Int(4)]);

    let options = Options::new().local_bounds(LocalBounds::Declared);
    let err = run_err(out_of_bounds(), options);
    assert_eq!(err.code(), ErrorCode::IndexOutOfRange);
    assert_eq!(err.address(), Some(11));
}

#[test]
fn test_declared_bounds_allow_last_slot() {
    let mut asm = Assembler::new();
    asm.jump(Opcode::Jump, "main");
    asm.function("f", 1, 2)
        .get_local(0)
        .set_local(1)
        .get_local(1)
        .op(Opcode::ReturnWithValue);
    asm.label("main").push_int(4).call_local("f").push_int(0).set_local(200);
    let mut m = machine(asm, Options::new().local_bounds(LocalBounds::Declared));
    m.run().unwrap();
    assert_eq!(m.stack(), vec![Val::Int(4)]);
}

#[test]
fn test_call_depth_limit() {
    let mut asm = Assembler::new();
    asm.function("forever", 0, 0).call_local("forever");
    let err = run_err(asm, Options::new().max_call_depth(16));
    assert_eq!(err.code(), ErrorCode::StackOverflow);
}

#[test]
fn test_missing_arguments() {
    let mut asm = Assembler::new();
    asm.jump(Opcode::Jump, "main");
    asm.function("f", 2, 2).op(Opcode::Return);
    asm.label("main").push_int(1).call_local("f");
    let err = run_err(asm, Options::default());
    assert_eq!(err.code(), ErrorCode::StackUnderflow);
}
