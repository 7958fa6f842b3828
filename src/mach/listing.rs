use super::{Address, Bytecode, Opcode, Operand};
use std::convert::TryFrom;

/// ## Disassembler
///
/// Renders a [`Bytecode`] one instruction per line, with pooled constants
/// resolved in a trailing comment.
#[derive(Debug, Clone)]
pub struct Listing<'a> {
    code: &'a Bytecode,
}

impl<'a> Listing<'a> {
    pub fn new(code: &'a Bytecode) -> Listing<'a> {
        Listing { code }
    }

    /// Decoded instructions as `(address, text)` pairs.
    pub fn lines(&self) -> Vec<(Address, String)> {
        let ops = &self.code.operations;
        let mut lines = vec![];
        let mut addr = 0;
        while addr < ops.len() {
            let (text, len) = self.instruction(addr);
            lines.push((addr, text));
            addr += len;
        }
        lines
    }

    fn instruction(&self, addr: Address) -> (String, usize) {
        let ops = &self.code.operations;
        let op = match Opcode::try_from(ops[addr]) {
            Ok(op) => op,
            Err(byte) => return (format!(".byte 0x{:02X}", byte), 1),
        };
        let operand = op.operand();
        let width = operand.width();
        let bytes = match ops.get(addr + 1..addr + 1 + width) {
            Some(bytes) => bytes,
            None => return (format!("{} <truncated>", op.mnemonic()), ops.len() - addr),
        };
        let n = bytes.iter().fold(0u64, |n, b| (n << 8) | u64::from(*b));
        let text = match operand {
            Operand::None => op.mnemonic().to_string(),
            Operand::Address => format!("{} {:04}", op.mnemonic(), n),
            Operand::Float => format!("{} {}", op.mnemonic(), f32::from_bits(n as u32)),
            Operand::Char => format!("{} {:?}", op.mnemonic(), char::from(n as u8)),
            Operand::Local | Operand::Count => format!("{} {}", op.mnemonic(), n),
            Operand::Int => match self.code.ints.get(n as usize) {
                Some(i) => format!("{} {:<6}; {}", op.mnemonic(), n, i),
                None => format!("{} {:<6}; <missing>", op.mnemonic(), n),
            },
            Operand::Id => match self.code.ids.get(n as usize) {
                Some(s) => format!("{} {:<6}; {:?}", op.mnemonic(), n, s),
                None => format!("{} {:<6}; <missing>", op.mnemonic(), n),
            },
            Operand::Function => match self.code.functions.get(n as usize) {
                Some(f) => format!("{} {:<6}; @{:04}", op.mnemonic(), n, f.start),
                None => format!("{} {:<6}; <missing>", op.mnemonic(), n),
            },
        };
        (text, 1 + width)
    }
}

impl<'a> std::fmt::Display for Listing<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (index, function) in self.code.functions.iter().enumerate() {
            writeln!(
                f,
                ".function {} @{:04} args={} locals={}",
                index, function.start, function.arg_count, function.local_count
            )?;
        }
        for (addr, text) in self.lines() {
            writeln!(f, "{:04}  {}", addr, text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mach::Assembler;

    #[test]
    fn test_listing() {
        let mut asm = Assembler::new();
        asm.push_string("x")
            .push_int(5)
            .op(Opcode::Set)
            .label("top")
            .jump(Opcode::Jump, "top")
            .byte(0xEE);
        let code = asm.finish().unwrap();
        let s = Listing::new(&code).to_string();
        assert_eq!(
            s,
            "0000  push_string 0     ; \"x\"\n\
             0002  push_int 0     ; 5\n\
             0004  set\n\
             0005  jump 0005\n\
             0014  .byte 0xEE\n"
        );
    }
}
