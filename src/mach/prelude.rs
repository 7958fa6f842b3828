use super::{Machine, Val};
use crate::error;
use crate::lang::Error;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::cell::RefCell;
use std::convert::TryFrom;
use std::io::Write;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Shared output sink for `print` and `println`.
pub type Output = Rc<RefCell<dyn Write>>;

/// Register the standard natives: `print`, `println`, `len`, `rand` and
/// `clock` (milliseconds since installation).
pub fn install(machine: &mut Machine, out: Output) {
    let print_out = out.clone();
    machine.register_native("print", move |m: &mut Machine| {
        let val = m.pop()?;
        write_out(&print_out, &m.display(&val))
    });
    machine.register_native("println", move |m: &mut Machine| {
        let val = m.pop()?;
        write_out(&out, &format!("{}\n", m.display(&val)))
    });
    machine.register_native("len", len);
    machine.register_native("rand", random);
    let start = Utc::now();
    machine.register_native("clock", move |m: &mut Machine| {
        let val = elapsed_millis(start, Utc::now())?;
        m.push(val)
    });
}

/// Milliseconds from `start` to `now`. Past `i32::MAX` (about 24.8 days)
/// the clock reports an error rather than wrapping.
fn elapsed_millis(start: DateTime<Utc>, now: DateTime<Utc>) -> Result<Val> {
    let millis = (now - start).num_milliseconds();
    match i32::try_from(millis) {
        Ok(millis) => Ok(Val::Int(millis)),
        Err(_) => Err(error!(NativeError; "CLOCK OVERFLOW AFTER {} MS", millis)),
    }
}

fn write_out(out: &Output, s: &str) -> Result<()> {
    out.borrow_mut()
        .write_all(s.as_bytes())
        .map_err(|e| error!(NativeError; "PRINT: {}", e))
}

fn len(m: &mut Machine) -> Result<()> {
    let val = m.pop()?;
    let n = match (m.string(&val), m.array(&val)) {
        (Some(s), _) => s.chars().count(),
        (_, Some(items)) => items.len(),
        _ => {
            return Err(error!(
                TypeMismatch;
                "LEN EXPECTS string OR array, FOUND {}", m.type_name(&val)
            ))
        }
    };
    m.push(Val::Int(n as i32))
}

/// Pops an upper bound `n` and pushes a uniform int in `0..n`.
fn random(m: &mut Machine) -> Result<()> {
    match m.pop()? {
        Val::Int(n) if n > 0 => m.push(Val::Int(rand::thread_rng().gen_range(0..n))),
        Val::Int(n) => Err(error!(IndexOutOfRange; "RAND BOUND {} IS NOT POSITIVE", n)),
        other => Err(error!(TypeMismatch; "RAND EXPECTS int, FOUND {}", m.type_name(&other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;
    use chrono::Duration;

    #[test]
    fn test_clock_range() {
        let start = Utc::now();
        assert_eq!(
            elapsed_millis(start, start + Duration::milliseconds(1500)),
            Ok(Val::Int(1500))
        );
        let err = elapsed_millis(start, start + Duration::days(25)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NativeError);
    }
}
