use super::Address;
use crate::error;
use crate::lang::{Column, Error, LineNumber};
use std::collections::HashMap;

/// What kind of immediate a fix-up patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixup {
    /// 8-byte jump address resolved from a label.
    Address,
    /// 1-byte function table index resolved from a function name.
    Function,
}

/// ## Label and function name resolution
///
/// Forward references are recorded with the position of their immediate
/// and patched in place once every symbol is known.
#[derive(Debug, Default)]
pub struct Link {
    labels: HashMap<String, Address>,
    functions: HashMap<String, usize>,
    unlinked: Vec<(Address, Fixup, String, LineNumber, Column)>,
}

impl Link {
    /// Returns false if the label was already defined.
    pub fn insert_label(&mut self, name: &str, addr: Address) -> bool {
        if self.labels.contains_key(name) {
            return false;
        }
        self.labels.insert(name.to_string(), addr);
        true
    }

    /// Returns false if the function name was already defined.
    pub fn insert_function(&mut self, name: &str, index: usize) -> bool {
        if self.functions.contains_key(name) {
            return false;
        }
        self.functions.insert(name.to_string(), index);
        true
    }

    pub fn link_addr_to_symbol(
        &mut self,
        addr: Address,
        fixup: Fixup,
        symbol: &str,
        line_number: LineNumber,
        col: &Column,
    ) {
        self.unlinked
            .push((addr, fixup, symbol.to_string(), line_number, col.clone()));
    }

    pub fn link(&mut self, ops: &mut [u8]) -> Vec<Error> {
        let mut errors: Vec<Error> = vec![];
        for (addr, fixup, symbol, line_number, col) in std::mem::take(&mut self.unlinked) {
            let (dest, width) = match fixup {
                Fixup::Address => (self.labels.get(&symbol).map(|a| *a as u64), 8),
                Fixup::Function => (self.functions.get(&symbol).map(|i| *i as u64), 1),
            };
            let dest = match dest {
                Some(dest) => dest,
                None => {
                    let what = match fixup {
                        Fixup::Address => "LABEL",
                        Fixup::Function => "FUNCTION",
                    };
                    errors.push(match line_number {
                        Some(_) => error!(SyntaxError, line_number, ..&col; "UNDEFINED {} {}", what, symbol),
                        None => error!(SyntaxError; "UNDEFINED {} {}", what, symbol),
                    });
                    continue;
                }
            };
            match ops.get_mut(addr..addr + width) {
                Some(slot) => {
                    let bytes = dest.to_be_bytes();
                    slot.copy_from_slice(&bytes[8 - width..]);
                }
                None => errors.push(error!(SyntaxError; "LINK FAILURE AT {}", addr)),
            }
        }
        errors
    }
}
