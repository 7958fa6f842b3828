//! # Tern
//!
//! A compact stack-based bytecode virtual machine with a garbage collected
//! heap of strings and arrays, and a bridge for host supplied native
//! functions.
//!
//! Programs arrive as a [`Bytecode`](mach::Bytecode) artifact: identifier
//! and integer constant pools, a function table, and a flat instruction
//! byte stream. They can be built with the [`Assembler`](mach::Assembler),
//! assembled from text with [`lang::assemble`], or loaded from a `.tbc`
//! file.
//!
//! ```
//! use tern::mach::{Machine, Val};
//!
//! let code = tern::lang::assemble(
//!     "push_string \"answer\"\n\
//!      push_int 6\n\
//!      push_int 7\n\
//!      mul\n\
//!      set\n",
//! )
//! .unwrap();
//! let mut machine = Machine::from_bytecode(code);
//! machine.run().unwrap();
//! assert_eq!(machine.variable("answer"), Some(&Val::Int(42)));
//! ```
//!
//! Execution is single threaded and cooperative. [`Machine::step`](mach::Machine::step)
//! runs exactly one instruction, so a host can budget, interleave or
//! cancel execution simply by choosing when to call it.

pub mod lang;
pub mod mach;
