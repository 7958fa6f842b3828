use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## Stack enforced and size limited vector

pub struct Stack<T> {
    overflow_message: &'static str,
    vec: Vec<T>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.vec)
    }
}

impl<T> Stack<T> {
    pub fn new(overflow_message: &'static str) -> Stack<T> {
        Stack {
            overflow_message,
            vec: vec![],
        }
    }
    fn max_len(&self) -> usize {
        u16::max_value() as usize
    }
    fn overflow_check(&self) -> Result<()> {
        if self.vec.len() >= self.max_len() {
            Err(error!(StackOverflow; "{}", self.overflow_message))
        } else {
            Ok(())
        }
    }
    fn underflow_error(&self) -> Error {
        error!(StackUnderflow)
    }
    pub fn len(&self) -> usize {
        self.vec.len()
    }
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }
    pub fn last(&self) -> Option<&T> {
        self.vec.last()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.vec.iter()
    }
    pub fn push(&mut self, val: T) -> Result<()> {
        self.overflow_check()?;
        self.vec.push(val);
        Ok(())
    }
    pub fn pop(&mut self) -> Result<T> {
        match self.vec.pop() {
            Some(v) => Ok(v),
            None => Err(self.underflow_error()),
        }
    }
    /// Pops `(left, right)`: right was pushed last.
    pub fn pop_2(&mut self) -> Result<(T, T)> {
        let two = self.pop()?;
        let one = self.pop()?;
        Ok((one, two))
    }
    /// Pops the top `len` items, returned in the order they were pushed.
    pub fn pop_n(&mut self, len: usize) -> Result<Vec<T>> {
        if len > self.vec.len() {
            Err(self.underflow_error())
        } else {
            let range = (self.vec.len() - len)..;
            Ok(self.vec.drain(range).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    #[test]
    fn test_pop_order() {
        let mut s: Stack<i32> = Stack::new("TEST");
        for n in 1..=4 {
            s.push(n).unwrap();
        }
        assert_eq!(s.pop_2().unwrap(), (3, 4));
        assert_eq!(s.pop_n(2).unwrap(), vec![1, 2]);
        assert_eq!(s.pop().unwrap_err().code(), ErrorCode::StackUnderflow);
        assert_eq!(s.pop_n(1).unwrap_err().code(), ErrorCode::StackUnderflow);
    }

    #[test]
    fn test_overflow() {
        let mut s: Stack<u8> = Stack::new("TOO DEEP");
        for _ in 0..u16::max_value() {
            s.push(0).unwrap();
        }
        let err = s.push(0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::StackOverflow);
        assert_eq!(err.text(), "TOO DEEP");
        assert_eq!(s.len(), u16::max_value() as usize);
    }
}
