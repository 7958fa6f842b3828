use super::{Address, Bytecode, Fixup, Function, Link, Opcode, Operand};
use crate::error;
use crate::lang::{Column, Error, LineNumber};
use std::convert::TryFrom;

/// ## Bytecode builder
///
/// Emits instructions with their immediates, interns constants and
/// resolves labels and function names. Errors are collected and reported
/// together by [`finish`](Assembler::finish).
///
/// ```
/// use tern::mach::{Assembler, Machine, Opcode, Val};
/// let mut asm = Assembler::new();
/// asm.push_int(2).push_int(40).op(Opcode::Add);
/// let mut machine = Machine::from_bytecode(asm.finish().unwrap());
/// machine.run().unwrap();
/// assert_eq!(machine.pop().unwrap(), Val::Int(42));
/// ```
#[derive(Debug, Default)]
pub struct Assembler {
    code: Bytecode,
    link: Link,
    errors: Vec<Error>,
    line_number: LineNumber,
    column: Column,
}

impl Assembler {
    pub fn new() -> Assembler {
        Assembler::default()
    }

    /// Source location attached to errors raised by the following calls.
    pub fn at(&mut self, line_number: LineNumber, column: Column) -> &mut Self {
        self.line_number = line_number;
        self.column = column;
        self
    }

    pub fn address(&self) -> Address {
        self.code.operations.len()
    }

    fn error(&mut self, message: String) {
        let error = match self.line_number {
            Some(_) => error!(SyntaxError, self.line_number, ..&self.column; "{}", message),
            None => error!(SyntaxError; "{}", message),
        };
        self.errors.push(error);
    }

    /// Emit an opcode that takes no immediate.
    pub fn op(&mut self, op: Opcode) -> &mut Self {
        if op.operand() != Operand::None {
            self.error(format!("{} NEEDS AN OPERAND", op));
            return self;
        }
        self.code.operations.push(op.into());
        self
    }

    /// Emit an opcode followed by a one byte immediate.
    pub fn op_u8(&mut self, op: Opcode, byte: u8) -> &mut Self {
        if op.operand().width() != 1 {
            self.error(format!("{} DOES NOT TAKE A BYTE OPERAND", op));
            return self;
        }
        self.code.operations.push(op.into());
        self.code.operations.push(byte);
        self
    }

    /// Emit a raw byte, e.g. for testing how undecodable input is handled.
    pub fn byte(&mut self, byte: u8) -> &mut Self {
        self.code.operations.push(byte);
        self
    }

    pub fn label(&mut self, name: &str) -> &mut Self {
        let addr = self.address();
        if !self.link.insert_label(name, addr) {
            self.error(format!("DUPLICATE LABEL {}", name));
        }
        self
    }

    /// `Jump` or `JumpIfFalse` to a label, which may be defined later.
    pub fn jump(&mut self, op: Opcode, label: &str) -> &mut Self {
        if op.operand() != Operand::Address {
            self.error(format!("{} IS NOT A JUMP", op));
            return self;
        }
        self.code.operations.push(op.into());
        let at = self.address();
        self.link
            .link_addr_to_symbol(at, Fixup::Address, label, self.line_number, &self.column);
        self.code.operations.extend_from_slice(&[0; 8]);
        self
    }

    pub fn jump_to(&mut self, op: Opcode, addr: Address) -> &mut Self {
        if op.operand() != Operand::Address {
            self.error(format!("{} IS NOT A JUMP", op));
            return self;
        }
        self.code.operations.push(op.into());
        self.code
            .operations
            .extend_from_slice(&(addr as u64).to_be_bytes());
        self
    }

    pub fn push_int(&mut self, n: i32) -> &mut Self {
        let index = match self.code.ints.iter().position(|i| *i == n) {
            Some(index) => index,
            None => {
                self.code.ints.push(n);
                self.code.ints.len() - 1
            }
        };
        self.pool_op(Opcode::PushConstInt, index, "INT")
    }

    pub fn push_string(&mut self, s: &str) -> &mut Self {
        let index = match self.code.ids.iter().position(|id| id == s) {
            Some(index) => index,
            None => {
                self.code.ids.push(s.to_string());
                self.code.ids.len() - 1
            }
        };
        self.pool_op(Opcode::PushConstString, index, "STRING")
    }

    fn pool_op(&mut self, op: Opcode, index: usize, pool: &str) -> &mut Self {
        match u8::try_from(index) {
            Ok(index) => self.op_u8(op, index),
            Err(_) => {
                self.error(format!("{} POOL FULL", pool));
                self
            }
        }
    }

    pub fn push_float(&mut self, n: f32) -> &mut Self {
        self.code.operations.push(Opcode::PushConstFloat.into());
        self.code
            .operations
            .extend_from_slice(&n.to_bits().to_be_bytes());
        self
    }

    pub fn push_char(&mut self, c: char) -> &mut Self {
        match u8::try_from(u32::from(c)) {
            Ok(byte) => self.op_u8(Opcode::PushConstChar, byte),
            Err(_) => {
                self.error(format!("CHARACTER {:?} IS NOT LATIN-1", c));
                self
            }
        }
    }

    pub fn push_null(&mut self) -> &mut Self {
        self.op(Opcode::PushConstNull)
    }

    pub fn push_bool(&mut self, b: bool) -> &mut Self {
        self.op(if b { Opcode::PushTrue } else { Opcode::PushFalse })
    }

    pub fn get_local(&mut self, id: u8) -> &mut Self {
        self.op_u8(Opcode::GetLocal, id)
    }

    pub fn set_local(&mut self, id: u8) -> &mut Self {
        self.op_u8(Opcode::SetLocal, id)
    }

    pub fn shrink(&mut self, count: u8) -> &mut Self {
        self.op_u8(Opcode::ShrinkLocals, count)
    }

    /// Declare a function table entry starting at the current address.
    pub fn function(&mut self, name: &str, arg_count: u8, local_count: u8) -> &mut Self {
        let index = self.code.functions.len();
        if index > u8::max_value() as usize {
            self.error("FUNCTION TABLE FULL".to_string());
            return self;
        }
        if !self.link.insert_function(name, index) {
            self.error(format!("DUPLICATE FUNCTION {}", name));
            return self;
        }
        let start = self.address();
        self.code
            .functions
            .push(Function::new(start, arg_count, local_count));
        self
    }

    /// Call a script function by name, which may be declared later.
    pub fn call_local(&mut self, name: &str) -> &mut Self {
        self.code.operations.push(Opcode::CallLocal.into());
        let at = self.address();
        self.link
            .link_addr_to_symbol(at, Fixup::Function, name, self.line_number, &self.column);
        self.code.operations.push(0);
        self
    }

    pub fn finish(mut self) -> Result<Bytecode, Vec<Error>> {
        let mut errors = self.link.link(&mut self.code.operations);
        self.errors.append(&mut errors);
        if self.errors.is_empty() {
            Ok(self.code)
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    #[test]
    fn test_forward_jump_patched() {
        let mut asm = Assembler::new();
        asm.jump(Opcode::Jump, "end").push_int(1).label("end");
        let code = asm.finish().unwrap();
        assert_eq!(code.operations[0], Opcode::Jump as u8);
        assert_eq!(&code.operations[1..9], &11u64.to_be_bytes());
    }

    #[test]
    fn test_constants_interned() {
        let mut asm = Assembler::new();
        asm.push_int(7).push_int(7).push_string("a").push_string("a");
        let code = asm.finish().unwrap();
        assert_eq!(code.ints, vec![7]);
        assert_eq!(code.ids, vec!["a".to_string()]);
    }

    #[test]
    fn test_errors_collected() {
        let mut asm = Assembler::new();
        asm.label("x")
            .label("x")
            .op(Opcode::GetLocal)
            .jump(Opcode::Jump, "nowhere")
            .call_local("missing");
        let errors = asm.finish().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().all(|e| e.code() == ErrorCode::SyntaxError));
    }

    #[test]
    fn test_function_declared_after_call() {
        let mut asm = Assembler::new();
        asm.call_local("f").function("f", 0, 0).op(Opcode::Return);
        let code = asm.finish().unwrap();
        assert_eq!(code.functions, vec![Function::new(2, 0, 0)]);
        assert_eq!(code.operations, vec![Opcode::CallLocal as u8, 0, Opcode::Return as u8]);
    }
}
