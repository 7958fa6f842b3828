use super::{
    Address, Bytecode, Frame, Function, Handle, Heap, LocalBounds, NativeFn, NativeFunction,
    Object, Opcode, OpcodePolicy, Operation, Options, Val,
};
use crate::error;
use crate::lang::Error;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use tracing::{debug, trace, warn};

type Result<T> = std::result::Result<T, Error>;

/// Outcome of a bounded [`Machine::execute`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The program counter ran off the end or a top-level return was made.
    Halted,
    /// The cycle budget ran out first.
    Running,
}

/// ## Stack based virtual machine
///
/// Executes one linear instruction stream. The current frame is always
/// present; frames of suspended callers sit in `callers`, one per entry
/// of the call stack.
pub struct Machine {
    options: Options,
    forced_end: bool,
    next_gc: usize,
    program_counter: Address,
    operations: Vec<u8>,
    ids: Vec<String>,
    ints: Vec<i32>,
    functions: Vec<Function>,
    globals: BTreeMap<String, Val>,
    frame: Frame,
    callers: Vec<Frame>,
    call_stack: Vec<Address>,
    heap: Heap,
}

impl Default for Machine {
    fn default() -> Machine {
        Machine::new()
    }
}

impl Machine {
    pub fn new() -> Machine {
        Machine {
            options: Options::default(),
            forced_end: false,
            next_gc: 0,
            program_counter: 0,
            operations: vec![],
            ids: vec![],
            ints: vec![],
            functions: vec![],
            globals: BTreeMap::new(),
            frame: Frame::new(None),
            callers: vec![],
            call_stack: vec![],
            heap: Heap::new(),
        }
    }

    pub fn from_bytecode(code: Bytecode) -> Machine {
        Machine {
            operations: code.operations,
            ids: code.ids,
            ints: code.ints,
            functions: code.functions,
            ..Machine::new()
        }
    }

    pub fn with_options(self, options: Options) -> Machine {
        Machine { options, ..self }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    // *** Host driven construction

    pub fn add_operation(&mut self, op: Opcode) {
        self.operations.push(op.into());
    }

    pub fn add_u8(&mut self, byte: u8) {
        self.operations.push(byte);
    }

    pub fn add_string_const(&mut self, s: &str) -> usize {
        self.ids.push(s.to_string());
        self.ids.len() - 1
    }

    pub fn add_int_const(&mut self, n: i32) -> usize {
        self.ints.push(n);
        self.ints.len() - 1
    }

    pub fn add_function(&mut self, function: Function) -> usize {
        self.functions.push(function);
        self.functions.len() - 1
    }

    pub fn operations(&self) -> &[u8] {
        &self.operations
    }

    // *** Execution state

    pub fn program_counter(&self) -> Address {
        self.program_counter
    }

    pub fn is_halted(&self) -> bool {
        self.program_counter >= self.operations.len() || self.forced_end
    }

    /// Number of active script calls.
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Number of live frames, including the outermost one.
    pub fn frame_depth(&self) -> usize {
        self.callers.len() + 1
    }

    /// Rewinds to the first instruction with empty stacks. Globals and
    /// heap objects are kept.
    pub fn reset(&mut self) {
        self.forced_end = false;
        self.program_counter = 0;
        self.frame = Frame::new(None);
        self.callers.clear();
        self.call_stack.clear();
    }

    /// Run until halted or `cycles` instructions have executed.
    ///
    /// With a `gc_threshold`, a collection runs once the live count reaches
    /// the threshold, and the trigger then moves to twice the survivors.
    pub fn execute(&mut self, cycles: usize) -> Result<Event> {
        for _ in 0..cycles {
            if self.is_halted() {
                return Ok(Event::Halted);
            }
            if let Some(threshold) = self.options.gc_threshold {
                if self.heap.len() >= threshold.max(self.next_gc) {
                    self.collect_garbage();
                    self.next_gc = threshold.max(self.heap.len() * 2);
                }
            }
            self.step()?;
        }
        if self.is_halted() {
            Ok(Event::Halted)
        } else {
            Ok(Event::Running)
        }
    }

    /// Run to completion.
    pub fn run(&mut self) -> Result<()> {
        while !self.is_halted() {
            self.step()?;
        }
        Ok(())
    }

    /// Execute exactly one instruction.
    pub fn step(&mut self) -> Result<()> {
        if self.is_halted() {
            return Ok(());
        }
        let address = self.program_counter;
        let byte = self.operations[address];
        self.program_counter += 1;
        let op = match Opcode::try_from(byte) {
            Ok(op) => op,
            Err(byte) => return self.unrecognized(address, byte),
        };
        trace!(address, %op, "step");
        self.dispatch(op).map_err(|e| e.at_address(address))
    }

    fn unrecognized(&mut self, address: Address, byte: u8) -> Result<()> {
        match self.options.unknown_opcodes {
            OpcodePolicy::Skip => {
                warn!(address, byte, "skipping unrecognized opcode");
                Ok(())
            }
            OpcodePolicy::Fail => {
                Err(error!(UnrecognizedOpcode; "0x{:02X}", byte).at_address(address))
            }
        }
    }

    fn dispatch(&mut self, op: Opcode) -> Result<()> {
        use Opcode::*;
        match op {
            Jump => {
                let address = self.read_address()?;
                self.jump(address)
            }
            JumpIfFalse => {
                let address = self.read_address()?;
                match self.pop()? {
                    Val::Bool(false) => self.jump(address),
                    Val::Bool(true) => Ok(()),
                    other => Err(error!(
                        TypeMismatch;
                        "JUMP_IF_FALSE EXPECTS bool, FOUND {}", self.type_name(&other)
                    )),
                }
            }
            Add => {
                let (lhs, rhs) = self.frame.stack_mut().pop_2()?;
                let val = Operation::sum(&mut self.heap, lhs, rhs)?;
                self.push(val)
            }
            Sub => self.binary(Operation::subtract),
            Mul => self.binary(Operation::multiply),
            Div => self.binary(Operation::divide),
            Mod => self.binary(Operation::remainder),
            Set => {
                let val = self.pop()?;
                let name = self.pop()?;
                let name = self.name_of(&name)?;
                self.globals.insert(name, val);
                Ok(())
            }
            Get => {
                let name = self.pop()?;
                let name = self.name_of(&name)?;
                let val = self.get_variable(&name)?;
                self.push(val)
            }
            BitAnd => self.binary(Operation::bit_and),
            BitOr => self.binary(Operation::bit_or),
            BitXor => self.binary(Operation::bit_xor),
            BitNot => self.unary(Operation::bit_not),
            ShiftLeft => self.binary(Operation::shift_left),
            ShiftRight => self.binary(Operation::shift_right),
            SetLocal => {
                let id = self.read_u8()?;
                let val = self.pop()?;
                self.frame.set_local(usize::from(id), val)
            }
            GetLocal => {
                let id = self.read_u8()?;
                let val = self.frame.get_local(usize::from(id))?;
                self.push(val)
            }
            Call => match self.pop()? {
                Val::Native(f) => f.invoke(self),
                other => Err(error!(NotCallable; "CANNOT CALL {}", self.type_name(&other))),
            },
            CallLocal => {
                let index = self.read_u8()?;
                self.call_local(usize::from(index))
            }
            Return => self.leave(None),
            ReturnWithValue => {
                let val = self.pop()?;
                self.leave(Some(val))
            }
            PushConstInt => {
                let index = usize::from(self.read_u8()?);
                match self.ints.get(index) {
                    Some(n) => self.push(Val::Int(*n)),
                    None => Err(error!(MalformedBytecode; "NO INT CONSTANT {}", index)),
                }
            }
            PushConstFloat => {
                let bits = self.read_be(4)? as u32;
                self.push(Val::Float(f32::from_bits(bits)))
            }
            PushConstChar => {
                let byte = self.read_u8()?;
                self.push(Val::Char(char::from(byte)))
            }
            PushConstString => {
                let index = usize::from(self.read_u8()?);
                let handle = match self.ids.get(index) {
                    Some(s) => self.heap.create_string(s, false),
                    None => return Err(error!(MalformedBytecode; "NO STRING CONSTANT {}", index)),
                };
                self.push(Val::Object(handle))
            }
            PushConstNull => self.push(Val::Null),
            PushTrue => self.push(Val::Bool(true)),
            PushFalse => self.push(Val::Bool(false)),
            GetArray => {
                let array = self.pop()?;
                let index = self.pop()?;
                let handle = self.array_handle(&array, "GET_ARRAY")?;
                let items = self.heap.array(handle).unwrap_or(&[]);
                let val = items[array_index(&self.heap, &index, items.len())?].clone();
                self.push(val)
            }
            SetArray => {
                let val = self.pop()?;
                let array = self.pop()?;
                let index = self.pop()?;
                let handle = self.array_handle(&array, "SET_ARRAY")?;
                let len = self.heap.array(handle).map_or(0, |items| items.len());
                let i = array_index(&self.heap, &index, len)?;
                if let Some(items) = self.heap.array_mut(handle) {
                    items[i] = val;
                }
                Ok(())
            }
            CreateArray => match self.pop()? {
                Val::Int(size) => {
                    let val = self.create_array(size)?;
                    self.push(val)
                }
                other => Err(error!(
                    TypeMismatch;
                    "CREATE_ARRAY EXPECTS int, FOUND {}", self.type_name(&other)
                )),
            },
            Equal => self.binary(Operation::equal),
            NotEqual => self.binary(Operation::not_equal),
            And => self.binary(Operation::and),
            Or => self.binary(Operation::or),
            Less => self.binary(Operation::less),
            More => self.binary(Operation::greater),
            LessOrEqual => self.binary(Operation::less_equal),
            MoreOrEqual => self.binary(Operation::greater_equal),
            Negate => self.unary(Operation::negate),
            Not => self.unary(Operation::not),
            ShrinkLocals => {
                let count = self.read_u8()?;
                self.frame.shrink(usize::from(count));
                Ok(())
            }
        }
    }

    fn binary(&mut self, f: fn(&Heap, Val, Val) -> Result<Val>) -> Result<()> {
        let (lhs, rhs) = self.frame.stack_mut().pop_2()?;
        let val = f(&self.heap, lhs, rhs)?;
        self.push(val)
    }

    fn unary(&mut self, f: fn(&Heap, Val) -> Result<Val>) -> Result<()> {
        let val = self.pop()?;
        let val = f(&self.heap, val)?;
        self.push(val)
    }

    fn read_u8(&mut self) -> Result<u8> {
        match self.operations.get(self.program_counter) {
            Some(byte) => {
                self.program_counter += 1;
                Ok(*byte)
            }
            None => Err(error!(MalformedBytecode; "TRUNCATED OPERAND")),
        }
    }

    /// Big-endian immediate of `width` bytes.
    fn read_be(&mut self, width: usize) -> Result<u64> {
        let mut n: u64 = 0;
        for _ in 0..width {
            n = (n << 8) | u64::from(self.read_u8()?);
        }
        Ok(n)
    }

    fn read_address(&mut self) -> Result<Address> {
        let address = self.read_be(8)?;
        match Address::try_from(address) {
            Ok(address) => Ok(address),
            Err(_) => Err(error!(MalformedBytecode; "ADDRESS {} OUT OF RANGE", address)),
        }
    }

    fn jump(&mut self, address: Address) -> Result<()> {
        if address > self.operations.len() {
            return Err(error!(MalformedBytecode; "JUMP TO {} PAST END", address));
        }
        self.program_counter = address;
        Ok(())
    }

    fn call_local(&mut self, index: usize) -> Result<()> {
        let function = match self.functions.get(index) {
            Some(function) => *function,
            None => return Err(error!(MalformedBytecode; "NO FUNCTION {}", index)),
        };
        if self.call_stack.len() >= self.options.max_call_depth {
            return Err(error!(StackOverflow; "CALL DEPTH EXCEEDS {}", self.options.max_call_depth));
        }
        let args = self.frame.stack_mut().pop_n(usize::from(function.arg_count))?;
        let limit = match self.options.local_bounds {
            LocalBounds::Permissive => None,
            LocalBounds::Declared => Some(function.slot_limit()),
        };
        debug!(function = index, start = function.start, "call");
        let caller = std::mem::replace(&mut self.frame, Frame::with_args(args, limit));
        self.callers.push(caller);
        self.call_stack.push(self.program_counter);
        self.jump(function.start)
    }

    fn leave(&mut self, val: Option<Val>) -> Result<()> {
        let (caller, address) = match (self.callers.pop(), self.call_stack.pop()) {
            (Some(caller), Some(address)) => (caller, address),
            _ => {
                debug!("return from top level");
                self.forced_end = true;
                return match val {
                    Some(val) => self.push(val),
                    None => Ok(()),
                };
            }
        };
        let callee = std::mem::replace(&mut self.frame, caller);
        if !callee.stack().is_empty() {
            warn!(
                count = callee.stack().len(),
                "discarding values left on a returning frame"
            );
        }
        debug!(address, "return");
        self.program_counter = address;
        match val {
            Some(val) => self.push(val),
            None => Ok(()),
        }
    }

    fn name_of(&self, val: &Val) -> Result<String> {
        if let Val::Object(handle) = val {
            if let Object::String(s) = self.heap.object(*handle)? {
                return Ok(s.clone());
            }
        }
        Err(error!(TypeMismatch; "NAME MUST BE string, FOUND {}", self.type_name(val)))
    }

    fn array_handle(&self, val: &Val, op: &str) -> Result<Handle> {
        if let Val::Object(handle) = val {
            if let Object::Array(_) = self.heap.object(*handle)? {
                return Ok(*handle);
            }
        }
        Err(error!(TypeMismatch; "{} EXPECTS array, FOUND {}", op, self.type_name(val)))
    }

    // *** Operand stack

    pub fn push(&mut self, val: Val) -> Result<()> {
        self.frame.stack_mut().push(val)
    }

    pub fn pop(&mut self) -> Result<Val> {
        self.frame.stack_mut().pop()
    }

    pub fn peek(&self) -> Option<&Val> {
        self.frame.stack().last()
    }

    /// Values on the current frame's operand stack, bottom first.
    pub fn stack(&self) -> Vec<Val> {
        self.frame.stack().iter().cloned().collect()
    }

    // *** Locals of the current frame

    pub fn set_local(&mut self, id: usize, val: Val) -> Result<()> {
        self.frame.set_local(id, val)
    }

    pub fn get_local(&self, id: usize) -> Result<Val> {
        self.frame.get_local(id)
    }

    pub fn locals(&self) -> &[Val] {
        self.frame.locals()
    }

    pub fn shrink_locals(&mut self, count: usize) {
        self.frame.shrink(count)
    }

    // *** Globals and the native bridge

    /// Bind a closure under `name` as a native callable global.
    pub fn register_native<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&mut Machine) -> Result<()> + 'static,
    {
        self.register(name, f);
    }

    pub fn register<N: NativeFunction + 'static>(&mut self, name: &str, native: N) {
        self.create_variable(name, Val::Native(NativeFn::new(native)));
    }

    pub fn create_variable(&mut self, name: &str, val: Val) {
        self.globals.insert(name.to_string(), val);
    }

    pub fn variable(&self, name: &str) -> Option<&Val> {
        self.globals.get(name)
    }

    pub fn get_variable(&self, name: &str) -> Result<Val> {
        match self.globals.get(name) {
            Some(val) => Ok(val.clone()),
            None => Err(error!(UndefinedVariable; "{}", name)),
        }
    }

    pub fn globals(&self) -> impl Iterator<Item = (&str, &Val)> {
        self.globals.iter().map(|(k, v)| (k.as_str(), v))
    }

    // *** Heap

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn create_string(&mut self, s: &str, always_new: bool) -> Val {
        Val::Object(self.heap.create_string(s, always_new))
    }

    pub fn create_array(&mut self, size: i32) -> Result<Val> {
        Ok(Val::Object(self.heap.create_array(size)?))
    }

    pub fn string<'a>(&'a self, val: &Val) -> Option<&'a str> {
        val.handle().and_then(|handle| self.heap.string(handle))
    }

    pub fn array<'a>(&'a self, val: &Val) -> Option<&'a [Val]> {
        val.handle().and_then(|handle| self.heap.array(handle))
    }

    pub fn type_name(&self, val: &Val) -> &'static str {
        self.heap.type_name(val)
    }

    /// Free every object unreachable from globals and live frames.
    pub fn collect_garbage(&mut self) -> usize {
        let roots = self
            .globals
            .values()
            .chain(self.frame.roots())
            .chain(self.callers.iter().flat_map(|frame| frame.roots()));
        self.heap.collect(roots)
    }

    /// Text form of a value as printed by the prelude.
    pub fn display(&self, val: &Val) -> String {
        let mut s = String::new();
        self.display_into(val, &mut vec![], &mut s);
        s
    }

    fn display_into(&self, val: &Val, seen: &mut Vec<Handle>, s: &mut String) {
        match val {
            Val::Int(n) => s.push_str(&n.to_string()),
            Val::Float(n) => s.push_str(&n.to_string()),
            Val::Char(c) => s.push(*c),
            Val::Bool(b) => s.push_str(if *b { "true" } else { "false" }),
            Val::Null => s.push_str("null"),
            Val::Native(_) => s.push_str("<native>"),
            Val::Object(handle) => match self.heap.get(*handle) {
                None => s.push_str("<collected>"),
                Some(Object::String(text)) => s.push_str(text),
                Some(Object::Array(items)) => {
                    if seen.contains(handle) {
                        s.push_str("[...]");
                        return;
                    }
                    seen.push(*handle);
                    s.push('[');
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            s.push_str(", ");
                        }
                        self.display_into(item, seen, s);
                    }
                    s.push(']');
                    seen.pop();
                }
            },
        }
    }
}

fn array_index(heap: &Heap, index: &Val, len: usize) -> Result<usize> {
    match index {
        Val::Int(i) => match usize::try_from(*i) {
            Ok(i) if i < len => Ok(i),
            _ => Err(error!(IndexOutOfRange; "INDEX {} NOT IN 0..{}", i, len)),
        },
        other => Err(error!(
            TypeMismatch;
            "ARRAY INDEX MUST BE int, FOUND {}", heap.type_name(other)
        )),
    }
}
