use ansi_term::{Colour, Style};
use std::cell::RefCell;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tern::lang::{assemble, Error};
use tern::mach::{prelude, Bytecode, Event, Listing, LocalBounds, Machine, OpcodePolicy, Options};
use tracing::{info, warn};

pub fn options(
    declared_locals: bool,
    strict_opcodes: bool,
    gc_threshold: Option<usize>,
    max_call_depth: usize,
) -> Options {
    Options::new()
        .local_bounds(if declared_locals {
            LocalBounds::Declared
        } else {
            LocalBounds::Permissive
        })
        .unknown_opcodes(if strict_opcodes {
            OpcodePolicy::Fail
        } else {
            OpcodePolicy::Skip
        })
        .gc_threshold(gc_threshold)
        .max_call_depth(max_call_depth)
}

pub fn run(file: &Path, options: Options, budget: usize) -> bool {
    let code = match load(file) {
        Some(code) => code,
        None => return false,
    };
    let interrupted = Arc::new(AtomicBool::new(false));
    let int_moved = interrupted.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        int_moved.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "no Ctrl-C handler");
    }

    let mut machine = Machine::from_bytecode(code).with_options(options);
    let out: prelude::Output = Rc::new(RefCell::new(std::io::stdout()));
    prelude::install(&mut machine, out.clone());
    let budget = budget.max(1);
    let result = loop {
        if interrupted.load(Ordering::SeqCst) {
            let _ = out.borrow_mut().flush();
            eprintln!(
                "{}",
                Style::new().bold().paint(format!(
                    "INTERRUPTED AT {}",
                    machine.program_counter()
                ))
            );
            break false;
        }
        match machine.execute(budget) {
            Ok(Event::Running) => continue,
            Ok(Event::Halted) => break true,
            Err(error) => {
                let _ = out.borrow_mut().flush();
                report(&error);
                break false;
            }
        }
    };
    let _ = out.borrow_mut().flush();
    info!(
        collections = machine.heap().cycles(),
        live = machine.heap().len(),
        "finished"
    );
    result
}

pub fn asm(input: &Path, output: &Path) -> bool {
    let code = match load(input) {
        Some(code) => code,
        None => return false,
    };
    match code.save(output) {
        Ok(()) => true,
        Err(error) => {
            report(&error);
            false
        }
    }
}

pub fn dis(file: &Path) -> bool {
    match load(file) {
        Some(code) => {
            print!("{}", Listing::new(&code));
            true
        }
        None => false,
    }
}

fn load(file: &Path) -> Option<Bytecode> {
    let is_text = file.extension().map_or(false, |ext| ext == "tasm");
    if !is_text {
        return match Bytecode::load(file) {
            Ok(code) => Some(code),
            Err(error) => {
                report(&error);
                None
            }
        };
    }
    let source = match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{}", Colour::Red.bold().paint(format!("{}: {}", file.display(), e)));
            return None;
        }
    };
    match assemble(&source) {
        Ok(code) => Some(code),
        Err(errors) => {
            for error in &errors {
                report(error);
            }
            None
        }
    }
}

fn report(error: &Error) {
    eprintln!("{}", Colour::Red.bold().paint(format!("?{}", error)));
}
