use super::{Stack, Val};
use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Call frame
///
/// Local slots are addressed by small ids that only mean something inside
/// this frame. Each frame has its own operand stack.
#[derive(Debug)]
pub struct Frame {
    locals: Vec<Val>,
    stack: Stack<Val>,
    local_limit: Option<usize>,
}

impl Frame {
    pub fn new(local_limit: Option<usize>) -> Frame {
        Frame {
            locals: vec![],
            stack: Stack::new("OPERAND STACK OVERFLOW"),
            local_limit,
        }
    }

    /// Frame for a script function; arguments fill the leading slots.
    pub fn with_args(args: Vec<Val>, local_limit: Option<usize>) -> Frame {
        Frame {
            locals: args,
            ..Frame::new(local_limit)
        }
    }

    pub fn stack(&self) -> &Stack<Val> {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut Stack<Val> {
        &mut self.stack
    }

    pub fn locals(&self) -> &[Val] {
        &self.locals
    }

    fn check_limit(&self, id: usize) -> Result<()> {
        match self.local_limit {
            Some(limit) if id >= limit => Err(error!(
                IndexOutOfRange;
                "LOCAL {} EXCEEDS DECLARED COUNT {}", id, limit
            )),
            _ => Ok(()),
        }
    }

    pub fn get_local(&self, id: usize) -> Result<Val> {
        self.check_limit(id)?;
        match self.locals.get(id) {
            Some(val) => Ok(val.clone()),
            None => Err(error!(UndefinedVariable; "LOCAL {} IS NOT SET", id)),
        }
    }

    /// Writing past the end grows the slots, filling the gap with null.
    pub fn set_local(&mut self, id: usize, val: Val) -> Result<()> {
        self.check_limit(id)?;
        if id >= self.locals.len() {
            self.locals.resize(id + 1, Val::Null);
        }
        self.locals[id] = val;
        Ok(())
    }

    /// Drops the top `count` slots. Shrinking past zero leaves no slots.
    pub fn shrink(&mut self, count: usize) {
        let len = self.locals.len().saturating_sub(count);
        self.locals.truncate(len);
    }

    pub fn roots(&self) -> impl Iterator<Item = &Val> {
        self.locals.iter().chain(self.stack.iter())
    }
}
