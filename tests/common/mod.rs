#![allow(dead_code)]
use std::cell::RefCell;
use std::rc::Rc;
use tern::lang::assemble;
use tern::mach::{prelude, Event, Machine, Options};

pub fn exec(source: &str) -> String {
    exec_with(source, Options::default())
}

/// Assemble and run `source` with the prelude installed. Returns what the
/// program printed followed by any error, formatted like the command line.
pub fn exec_with(source: &str, options: Options) -> String {
    let code = match assemble(source) {
        Ok(code) => code,
        Err(errors) => return errors.iter().map(|e| format!("?{}\n", e)).collect(),
    };
    let mut machine = Machine::from_bytecode(code).with_options(options);
    let (s, _) = exec_machine(&mut machine, 100_000);
    s
}

pub fn exec_machine(machine: &mut Machine, cycles: usize) -> (String, Option<Event>) {
    let out = Rc::new(RefCell::new(Vec::<u8>::new()));
    prelude::install(machine, out.clone());
    let result = machine.execute(cycles);
    let mut s = String::from_utf8_lossy(&out.borrow()).into_owned();
    match result {
        Ok(event) => (s, Some(event)),
        Err(error) => {
            s.push_str(&format!("?{}\n", error));
            (s, None)
        }
    }
}
