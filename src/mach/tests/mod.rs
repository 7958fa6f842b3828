use crate::lang::Error;
use crate::mach::{Assembler, Machine, Options};

mod call_test;

fn machine(asm: Assembler, options: Options) -> Machine {
    Machine::from_bytecode(asm.finish().unwrap()).with_options(options)
}

fn run(asm: Assembler) -> Machine {
    let mut m = machine(asm, Options::default());
    m.run().unwrap();
    m
}

fn run_err(asm: Assembler, options: Options) -> Error {
    let mut m = machine(asm, options);
    m.run().unwrap_err()
}
