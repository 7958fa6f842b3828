use super::Machine;
use crate::lang::Error;
use std::rc::Rc;

/// ## Host supplied callable
///
/// Invoked by the `Call` opcode with the machine as context. A native pops
/// its own arguments from the current operand stack (the last argument is
/// on top) and pushes at most one result.
pub trait NativeFunction {
    fn invoke(&self, machine: &mut Machine) -> Result<(), Error>;
}

impl<F> NativeFunction for F
where
    F: Fn(&mut Machine) -> Result<(), Error>,
{
    fn invoke(&self, machine: &mut Machine) -> Result<(), Error> {
        self(machine)
    }
}

/// Shared reference to a [`NativeFunction`]. Two values are equal only if
/// they refer to the same registration.
#[derive(Clone)]
pub struct NativeFn(Rc<dyn NativeFunction>);

impl NativeFn {
    pub fn new<F: NativeFunction + 'static>(f: F) -> NativeFn {
        NativeFn(Rc::new(f))
    }

    pub fn invoke(&self, machine: &mut Machine) -> Result<(), Error> {
        self.0.invoke(machine)
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &NativeFn) -> bool {
        Rc::as_ptr(&self.0) as *const () == Rc::as_ptr(&other.0) as *const ()
    }
}

impl std::fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NativeFn({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}
