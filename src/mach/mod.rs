/*!
## Rust Machine Module

This Rust module is the bytecode format and virtual machine for Tern.

*/

pub type Address = usize;

mod assembler;
mod bytecode;
mod frame;
mod function;
mod heap;
mod link;
mod listing;
mod machine;
mod native;
mod opcode;
mod operation;
mod options;
pub mod prelude;
mod stack;
mod val;

#[cfg(test)]
mod tests;

pub use assembler::Assembler;
pub use bytecode::Bytecode;
pub use frame::Frame;
pub use function::Function;
pub use heap::Handle;
pub use heap::Heap;
pub use heap::Object;
pub use link::Fixup;
pub use link::Link;
pub use listing::Listing;
pub use machine::Event;
pub use machine::Machine;
pub use native::NativeFn;
pub use native::NativeFunction;
pub use opcode::Opcode;
pub use opcode::Operand;
pub use operation::Operation;
pub use options::LocalBounds;
pub use options::OpcodePolicy;
pub use options::Options;
pub use stack::Stack;
pub use val::Type;
pub use val::Val;
