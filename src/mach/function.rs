use super::Address;

/// ## Function table entry
///
/// Describes one script-defined function: where it starts and how many
/// arguments and local slots it declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Function {
    pub start: Address,
    pub arg_count: u8,
    pub local_count: u8,
}

impl Function {
    pub fn new(start: Address, arg_count: u8, local_count: u8) -> Function {
        Function {
            start,
            arg_count,
            local_count,
        }
    }

    /// Highest local id a call frame may address plus one. Arguments
    /// always occupy slots even when the declared local count is smaller.
    pub fn slot_limit(&self) -> usize {
        usize::from(self.arg_count.max(self.local_count))
    }
}
