use std::convert::TryFrom;

/// ## Virtual machine instruction set
///
/// The virtual machine has no registers.
/// Every operation is performed on the operand stack of the current frame.
///
/// For example: `x = 3 * y` compiles to
/// `[PushConstString(x), PushConstInt(3), PushConstString(y), Get, Mul, Set]`
///
/// Each opcode is one byte. Some are followed by an immediate, see
/// [`Operand`]. Multi-byte immediates are big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // *** Branch control
    /// Unconditional branch to the address immediate.
    Jump = 0,
    /// Pop a bool and branch to the address immediate if it is false.
    JumpIfFalse = 1,

    // *** Arithmetic
    Add = 2,
    Sub = 3,
    Mul = 4,
    Div = 5,
    Mod = 6,

    // *** Globals
    /// Pop value, pop name, bind name to value.
    Set = 7,
    /// Pop name, push the bound value.
    Get = 8,

    // *** Bitwise
    BitAnd = 9,
    BitOr = 10,
    BitXor = 11,
    BitNot = 12,
    ShiftLeft = 13,
    ShiftRight = 14,

    // *** Locals
    SetLocal = 15,
    GetLocal = 16,

    // *** Calls
    /// Pop a native function and invoke it.
    Call = 17,
    /// Call a script function from the function table.
    CallLocal = 18,
    Return = 19,
    ReturnWithValue = 20,

    // *** Constants
    PushConstInt = 21,
    PushConstFloat = 22,
    PushConstChar = 23,
    PushConstString = 24,
    PushConstNull = 25,
    PushTrue = 26,
    PushFalse = 27,

    // *** Arrays
    GetArray = 28,
    SetArray = 29,
    CreateArray = 30,

    // *** Comparison and logic
    Equal = 31,
    NotEqual = 32,
    And = 33,
    Or = 34,
    Less = 35,
    More = 36,
    LessOrEqual = 37,
    MoreOrEqual = 38,
    Negate = 39,
    Not = 40,

    /// Drop the top local slots on block exit.
    ShrinkLocals = 41,
}

/// Inline immediate following an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    None,
    /// 8-byte absolute instruction address.
    Address,
    /// 1-byte local slot id.
    Local,
    /// 1-byte index into the function table.
    Function,
    /// 1-byte index into the integer pool.
    Int,
    /// 1-byte index into the identifier pool.
    Id,
    /// 4-byte IEEE-754 single.
    Float,
    /// 1-byte Latin-1 character.
    Char,
    /// 1-byte count.
    Count,
}

impl Operand {
    pub fn width(self) -> usize {
        match self {
            Operand::None => 0,
            Operand::Address => 8,
            Operand::Float => 4,
            _ => 1,
        }
    }
}

const OPCODES: [Opcode; 42] = {
    use Opcode::*;
    [
        Jump,
        JumpIfFalse,
        Add,
        Sub,
        Mul,
        Div,
        Mod,
        Set,
        Get,
        BitAnd,
        BitOr,
        BitXor,
        BitNot,
        ShiftLeft,
        ShiftRight,
        SetLocal,
        GetLocal,
        Call,
        CallLocal,
        Return,
        ReturnWithValue,
        PushConstInt,
        PushConstFloat,
        PushConstChar,
        PushConstString,
        PushConstNull,
        PushTrue,
        PushFalse,
        GetArray,
        SetArray,
        CreateArray,
        Equal,
        NotEqual,
        And,
        Or,
        Less,
        More,
        LessOrEqual,
        MoreOrEqual,
        Negate,
        Not,
        ShrinkLocals,
    ]
};

impl Opcode {
    pub fn all() -> &'static [Opcode] {
        &OPCODES
    }

    pub fn operand(self) -> Operand {
        use Opcode::*;
        match self {
            Jump | JumpIfFalse => Operand::Address,
            SetLocal | GetLocal => Operand::Local,
            CallLocal => Operand::Function,
            PushConstInt => Operand::Int,
            PushConstString => Operand::Id,
            PushConstFloat => Operand::Float,
            PushConstChar => Operand::Char,
            ShrinkLocals => Operand::Count,
            _ => Operand::None,
        }
    }

    /// Encoded length including the opcode byte.
    pub fn len(self) -> usize {
        1 + self.operand().width()
    }

    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Jump => "jump",
            JumpIfFalse => "jump_if_false",
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            Div => "div",
            Mod => "mod",
            Set => "set",
            Get => "get",
            BitAnd => "bit_and",
            BitOr => "bit_or",
            BitXor => "bit_xor",
            BitNot => "bit_not",
            ShiftLeft => "shl",
            ShiftRight => "shr",
            SetLocal => "set_local",
            GetLocal => "get_local",
            Call => "call",
            CallLocal => "call_local",
            Return => "ret",
            ReturnWithValue => "ret_val",
            PushConstInt => "push_int",
            PushConstFloat => "push_float",
            PushConstChar => "push_char",
            PushConstString => "push_string",
            PushConstNull => "push_null",
            PushTrue => "push_true",
            PushFalse => "push_false",
            GetArray => "get_array",
            SetArray => "set_array",
            CreateArray => "create_array",
            Equal => "eq",
            NotEqual => "neq",
            And => "and",
            Or => "or",
            Less => "lt",
            More => "gt",
            LessOrEqual => "lte",
            MoreOrEqual => "gte",
            Negate => "neg",
            Not => "not",
            ShrinkLocals => "shrink",
        }
    }

    pub fn from_mnemonic(s: &str) -> Option<Opcode> {
        OPCODES.iter().copied().find(|op| op.mnemonic() == s)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;
    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match OPCODES.get(byte as usize) {
            Some(op) => Ok(*op),
            None => Err(byte),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic().to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_table_matches_discriminants() {
        for (byte, op) in OPCODES.iter().enumerate() {
            assert_eq!(*op as usize, byte);
            assert_eq!(Opcode::try_from(byte as u8), Ok(*op));
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(*op));
        }
        assert_eq!(Opcode::try_from(42), Err(42));
        assert_eq!(Opcode::try_from(255), Err(255));
    }

    #[test]
    fn test_operand_widths() {
        assert_eq!(Opcode::Jump.len(), 9);
        assert_eq!(Opcode::PushConstFloat.len(), 5);
        assert_eq!(Opcode::GetLocal.len(), 2);
        assert_eq!(Opcode::Add.len(), 1);
    }
}
