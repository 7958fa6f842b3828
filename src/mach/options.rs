/// How local slot ids are checked inside script function frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalBounds {
    /// Any id is accepted; writes grow the slot array.
    Permissive,
    /// Ids must stay below the function's declared slot count.
    Declared,
}

/// What the dispatch loop does with a byte that is not an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodePolicy {
    /// Log a warning and continue at the next byte.
    Skip,
    /// Stop with an `UnrecognizedOpcode` error.
    Fail,
}

/// ## Machine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub local_bounds: LocalBounds,
    pub unknown_opcodes: OpcodePolicy,
    pub max_call_depth: usize,
    /// Live object count at which [`execute`](super::Machine::execute)
    /// runs a collection. `None` leaves collection to the host.
    pub gc_threshold: Option<usize>,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            local_bounds: LocalBounds::Permissive,
            unknown_opcodes: OpcodePolicy::Skip,
            max_call_depth: 1024,
            gc_threshold: None,
        }
    }
}

impl Options {
    pub fn new() -> Options {
        Options::default()
    }

    pub fn local_bounds(self, local_bounds: LocalBounds) -> Options {
        Options {
            local_bounds,
            ..self
        }
    }

    pub fn unknown_opcodes(self, unknown_opcodes: OpcodePolicy) -> Options {
        Options {
            unknown_opcodes,
            ..self
        }
    }

    pub fn max_call_depth(self, max_call_depth: usize) -> Options {
        Options {
            max_call_depth,
            ..self
        }
    }

    pub fn gc_threshold(self, gc_threshold: Option<usize>) -> Options {
        Options {
            gc_threshold,
            ..self
        }
    }
}
