use super::{Handle, NativeFn};

/// ## Runtime value
///
/// Primitives are copied. `Object` is an alias into the [`Heap`](super::Heap);
/// any number of values may hold the same handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Int(i32),
    Float(f32),
    Char(char),
    Bool(bool),
    Null,
    Object(Handle),
    Native(NativeFn),
}

/// Type tag carried by every [`Val`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
    Char,
    Bool,
    Null,
    Object,
    Native,
}

impl Val {
    pub fn kind(&self) -> Type {
        match self {
            Val::Int(_) => Type::Int,
            Val::Float(_) => Type::Float,
            Val::Char(_) => Type::Char,
            Val::Bool(_) => Type::Bool,
            Val::Null => Type::Null,
            Val::Object(_) => Type::Object,
            Val::Native(_) => Type::Native,
        }
    }

    pub fn handle(&self) -> Option<Handle> {
        match self {
            Val::Object(handle) => Some(*handle),
            _ => None,
        }
    }
}

impl Default for Val {
    fn default() -> Val {
        Val::Null
    }
}

impl From<i32> for Val {
    fn from(n: i32) -> Val {
        Val::Int(n)
    }
}

impl From<f32> for Val {
    fn from(n: f32) -> Val {
        Val::Float(n)
    }
}

impl From<bool> for Val {
    fn from(b: bool) -> Val {
        Val::Bool(b)
    }
}

impl From<char> for Val {
    fn from(c: char) -> Val {
        Val::Char(c)
    }
}

impl Type {
    pub fn name(self) -> &'static str {
        use Type::*;
        match self {
            Int => "int",
            Float => "float",
            Char => "char",
            Bool => "bool",
            Null => "null",
            Object => "object",
            Native => "native function",
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
