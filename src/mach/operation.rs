use super::{Heap, Object, Val};
use crate::error;
use crate::lang::Error;
use std::cmp::Ordering;

type Result<T> = std::result::Result<T, Error>;

/// ## Operator semantics
///
/// Binary operations take `(lhs, rhs)` in push order. Integer arithmetic
/// wraps; mixing an int with a float promotes to float.
pub struct Operation {}

fn mismatch(op: &str, heap: &Heap, lhs: &Val, rhs: &Val) -> Error {
    error!(
        TypeMismatch;
        "{} OF {} AND {}", op, heap.type_name(lhs), heap.type_name(rhs)
    )
}

fn mismatch_unary(op: &str, heap: &Heap, val: &Val) -> Error {
    error!(TypeMismatch; "{} OF {}", op, heap.type_name(val))
}

impl Operation {
    pub fn negate(heap: &Heap, val: Val) -> Result<Val> {
        use Val::*;
        match val {
            Int(n) => Ok(Int(n.wrapping_neg())),
            Float(n) => Ok(Float(-n)),
            _ => Err(mismatch_unary("NEGATE", heap, &val)),
        }
    }

    pub fn not(heap: &Heap, val: Val) -> Result<Val> {
        match val {
            Val::Bool(b) => Ok(Val::Bool(!b)),
            _ => Err(mismatch_unary("NOT", heap, &val)),
        }
    }

    pub fn bit_not(heap: &Heap, val: Val) -> Result<Val> {
        match val {
            Val::Int(n) => Ok(Val::Int(!n)),
            _ => Err(mismatch_unary("BIT_NOT", heap, &val)),
        }
    }

    /// Adds numbers or concatenates two strings into a deduplicated string.
    pub fn sum(heap: &mut Heap, lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (&lhs, &rhs) {
            (Int(l), Int(r)) => Ok(Int(l.wrapping_add(*r))),
            (Int(l), Float(r)) => Ok(Float(*l as f32 + r)),
            (Float(l), Int(r)) => Ok(Float(l + *r as f32)),
            (Float(l), Float(r)) => Ok(Float(l + r)),
            (Object(l), Object(r)) => {
                let joined = match (heap.get(*l), heap.get(*r)) {
                    (Some(self::Object::String(l)), Some(self::Object::String(r))) => {
                        format!("{}{}", l, r)
                    }
                    _ => return Err(mismatch("ADD", heap, &lhs, &rhs)),
                };
                Ok(Object(heap.create_string(&joined, false)))
            }
            _ => Err(mismatch("ADD", heap, &lhs, &rhs)),
        }
    }

    pub fn subtract(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (&lhs, &rhs) {
            (Int(l), Int(r)) => Ok(Int(l.wrapping_sub(*r))),
            (Int(l), Float(r)) => Ok(Float(*l as f32 - r)),
            (Float(l), Int(r)) => Ok(Float(l - *r as f32)),
            (Float(l), Float(r)) => Ok(Float(l - r)),
            _ => Err(mismatch("SUB", heap, &lhs, &rhs)),
        }
    }

    pub fn multiply(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (&lhs, &rhs) {
            (Int(l), Int(r)) => Ok(Int(l.wrapping_mul(*r))),
            (Int(l), Float(r)) => Ok(Float(*l as f32 * r)),
            (Float(l), Int(r)) => Ok(Float(l * *r as f32)),
            (Float(l), Float(r)) => Ok(Float(l * r)),
            _ => Err(mismatch("MUL", heap, &lhs, &rhs)),
        }
    }

    pub fn divide(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (&lhs, &rhs) {
            (Int(_), Int(0)) => Err(error!(DivisionByZero)),
            (Int(l), Int(r)) => Ok(Int(l.wrapping_div(*r))),
            (Int(l), Float(r)) => Ok(Float(*l as f32 / r)),
            (Float(l), Int(r)) => Ok(Float(l / *r as f32)),
            (Float(l), Float(r)) => Ok(Float(l / r)),
            _ => Err(mismatch("DIV", heap, &lhs, &rhs)),
        }
    }

    pub fn remainder(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        use Val::*;
        match (&lhs, &rhs) {
            (Int(_), Int(0)) => Err(error!(DivisionByZero)),
            (Int(l), Int(r)) => Ok(Int(l.wrapping_rem(*r))),
            _ => Err(mismatch("MOD", heap, &lhs, &rhs)),
        }
    }

    fn integer(op: &str, heap: &Heap, lhs: Val, rhs: Val, f: fn(i32, i32) -> i32) -> Result<Val> {
        match (&lhs, &rhs) {
            (Val::Int(l), Val::Int(r)) => Ok(Val::Int(f(*l, *r))),
            _ => Err(mismatch(op, heap, &lhs, &rhs)),
        }
    }

    pub fn bit_and(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        Operation::integer("BIT_AND", heap, lhs, rhs, |l, r| l & r)
    }

    pub fn bit_or(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        Operation::integer("BIT_OR", heap, lhs, rhs, |l, r| l | r)
    }

    pub fn bit_xor(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        Operation::integer("BIT_XOR", heap, lhs, rhs, |l, r| l ^ r)
    }

    /// Shift count is taken modulo 32.
    pub fn shift_left(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        Operation::integer("SHL", heap, lhs, rhs, |l, r| l.wrapping_shl(r as u32))
    }

    /// Arithmetic shift; count is taken modulo 32.
    pub fn shift_right(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        Operation::integer("SHR", heap, lhs, rhs, |l, r| l.wrapping_shr(r as u32))
    }

    pub fn and(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        match (&lhs, &rhs) {
            (Val::Bool(l), Val::Bool(r)) => Ok(Val::Bool(*l && *r)),
            _ => Err(mismatch("AND", heap, &lhs, &rhs)),
        }
    }

    pub fn or(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        match (&lhs, &rhs) {
            (Val::Bool(l), Val::Bool(r)) => Ok(Val::Bool(*l || *r)),
            _ => Err(mismatch("OR", heap, &lhs, &rhs)),
        }
    }

    pub fn equal(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::Bool(Operation::equal_bool(heap, &lhs, &rhs)?))
    }

    pub fn not_equal(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        Ok(Val::Bool(!Operation::equal_bool(heap, &lhs, &rhs)?))
    }

    pub fn equal_bool(heap: &Heap, lhs: &Val, rhs: &Val) -> Result<bool> {
        use Val::*;
        match (lhs, rhs) {
            (Null, Null) => Ok(true),
            (Null, _) | (_, Null) => Ok(false),
            (Int(l), Int(r)) => Ok(l == r),
            (Int(l), Float(r)) => Ok(*l as f32 == *r),
            (Float(l), Int(r)) => Ok(*l == *r as f32),
            (Float(l), Float(r)) => Ok(l == r),
            (Char(l), Char(r)) => Ok(l == r),
            (Bool(l), Bool(r)) => Ok(l == r),
            (Native(l), Native(r)) => Ok(l == r),
            (Object(l), Object(r)) => {
                if l == r {
                    return Ok(true);
                }
                match (heap.object(*l)?, heap.object(*r)?) {
                    (self::Object::String(l), self::Object::String(r)) => Ok(l == r),
                    _ => Ok(false),
                }
            }
            _ => Err(mismatch("EQ", heap, lhs, rhs)),
        }
    }

    pub fn less(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        let ord = Operation::compare("LT", heap, &lhs, &rhs)?;
        Ok(Val::Bool(ord == Some(Ordering::Less)))
    }

    pub fn greater(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        let ord = Operation::compare("GT", heap, &lhs, &rhs)?;
        Ok(Val::Bool(ord == Some(Ordering::Greater)))
    }

    pub fn less_equal(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        let ord = Operation::compare("LTE", heap, &lhs, &rhs)?;
        Ok(Val::Bool(matches!(
            ord,
            Some(Ordering::Less) | Some(Ordering::Equal)
        )))
    }

    pub fn greater_equal(heap: &Heap, lhs: Val, rhs: Val) -> Result<Val> {
        let ord = Operation::compare("GTE", heap, &lhs, &rhs)?;
        Ok(Val::Bool(matches!(
            ord,
            Some(Ordering::Greater) | Some(Ordering::Equal)
        )))
    }

    /// `None` when the operands are unordered (a NaN is involved).
    fn compare(op: &str, heap: &Heap, lhs: &Val, rhs: &Val) -> Result<Option<Ordering>> {
        use Val::*;
        match (lhs, rhs) {
            (Int(l), Int(r)) => Ok(Some(l.cmp(r))),
            (Int(l), Float(r)) => Ok((*l as f32).partial_cmp(r)),
            (Float(l), Int(r)) => Ok(l.partial_cmp(&(*r as f32))),
            (Float(l), Float(r)) => Ok(l.partial_cmp(r)),
            (Char(l), Char(r)) => Ok(Some(l.cmp(r))),
            (Object(l), Object(r)) => match (heap.get(*l), heap.get(*r)) {
                (Some(self::Object::String(l)), Some(self::Object::String(r))) => {
                    Ok(Some(l.cmp(r)))
                }
                _ => Err(mismatch(op, heap, lhs, rhs)),
            },
            _ => Err(mismatch(op, heap, lhs, rhs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    #[test]
    fn test_operand_order() {
        let heap = Heap::new();
        assert_eq!(
            Operation::subtract(&heap, Val::Int(10), Val::Int(3)),
            Ok(Val::Int(7))
        );
        assert_eq!(
            Operation::divide(&heap, Val::Int(10), Val::Int(3)),
            Ok(Val::Int(3))
        );
        assert_eq!(
            Operation::shift_left(&heap, Val::Int(1), Val::Int(4)),
            Ok(Val::Int(16))
        );
        assert_eq!(
            Operation::less(&heap, Val::Int(1), Val::Int(2)),
            Ok(Val::Bool(true))
        );
        assert_eq!(
            Operation::greater_equal(&heap, Val::Float(1.5), Val::Int(2)),
            Ok(Val::Bool(false))
        );
    }

    #[test]
    fn test_wrapping_and_zero() {
        let heap = Heap::new();
        assert_eq!(
            Operation::multiply(&heap, Val::Int(i32::MAX), Val::Int(2)),
            Ok(Val::Int(-2))
        );
        assert_eq!(
            Operation::negate(&heap, Val::Int(i32::MIN)),
            Ok(Val::Int(i32::MIN))
        );
        let err = Operation::remainder(&heap, Val::Int(1), Val::Int(0)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DivisionByZero);
        assert_eq!(
            Operation::divide(&heap, Val::Float(1.0), Val::Int(0)),
            Ok(Val::Float(f32::INFINITY))
        );
    }

    #[test]
    fn test_mismatch_names_types() {
        let mut heap = Heap::new();
        let s = Val::Object(heap.create_string("a", false));
        let err = Operation::subtract(&heap, s, Val::Int(1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TypeMismatch);
        assert_eq!(err.text(), "SUB OF string AND int");
        let err = Operation::and(&heap, Val::Bool(true), Val::Null).unwrap_err();
        assert_eq!(err.text(), "AND OF bool AND null");
    }

    #[test]
    fn test_string_sum_and_compare() {
        let mut heap = Heap::new();
        let ab = heap.create_string("ab", false);
        let a = Val::Object(heap.create_string("a", false));
        let b = Val::Object(heap.create_string("b", false));
        assert_eq!(
            Operation::sum(&mut heap, a.clone(), b.clone()),
            Ok(Val::Object(ab))
        );
        assert_eq!(Operation::less(&heap, a, b), Ok(Val::Bool(true)));
        let fresh = Val::Object(heap.create_string("ab", true));
        assert_eq!(
            Operation::equal(&heap, fresh, Val::Object(ab)),
            Ok(Val::Bool(true))
        );
    }

    #[test]
    fn test_null_equality() {
        let heap = Heap::new();
        assert_eq!(
            Operation::equal(&heap, Val::Null, Val::Int(0)),
            Ok(Val::Bool(false))
        );
        assert_eq!(
            Operation::not_equal(&heap, Val::Null, Val::Null),
            Ok(Val::Bool(false))
        );
        assert!(Operation::equal(&heap, Val::Int(1), Val::Bool(true)).is_err());
    }
}
