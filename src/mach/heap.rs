use super::Val;
use crate::error;
use crate::lang::Error;
use std::convert::TryFrom;
use tracing::debug;

type Result<T> = std::result::Result<T, Error>;

/// ## Stable reference to a heap object
///
/// Slots are reused after a collection; the generation tells a live
/// object apart from whatever used to occupy the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    String(String),
    Array(Vec<Val>),
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::String(_) => "string",
            Object::Array(_) => "array",
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    object: Option<Object>,
}

/// ## Garbage collected object store
///
/// Objects live until a [`collect`](Heap::collect) proves them unreachable
/// from the roots it is handed. Nothing is collected implicitly.
#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Slot>,
    marks: Vec<bool>,
    free: Vec<u32>,
    worklist: Vec<usize>,
    live: usize,
    cycles: usize,
}

impl Heap {
    pub fn new() -> Heap {
        Heap::default()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of completed collection cycles.
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub fn alloc(&mut self, object: Object) -> Handle {
        let index = match self.free.pop() {
            Some(index) => index as usize,
            None => {
                self.slots.push(Slot::default());
                self.marks.push(false);
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        debug_assert!(slot.object.is_none());
        slot.object = Some(object);
        self.live += 1;
        Handle {
            index: index as u32,
            generation: slot.generation,
        }
    }

    /// Strings with equal content share one object unless `always_new` is set.
    pub fn create_string(&mut self, text: &str, always_new: bool) -> Handle {
        if !always_new {
            if let Some(handle) = self.find_string(text) {
                return handle;
            }
        }
        self.alloc(Object::String(text.to_string()))
    }

    pub fn create_array(&mut self, len: i32) -> Result<Handle> {
        let len = match usize::try_from(len) {
            Ok(len) => len,
            Err(_) => return Err(error!(IndexOutOfRange; "ARRAY SIZE {} IS NEGATIVE", len)),
        };
        Ok(self.alloc(Object::Array(vec![Val::Null; len])))
    }

    fn find_string(&self, text: &str) -> Option<Handle> {
        self.slots
            .iter()
            .enumerate()
            .find_map(|(index, slot)| match &slot.object {
                Some(Object::String(s)) if s == text => Some(Handle {
                    index: index as u32,
                    generation: slot.generation,
                }),
                _ => None,
            })
    }

    pub fn get(&self, handle: Handle) -> Option<&Object> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.object.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Object> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.object.as_mut()
    }

    pub fn object(&self, handle: Handle) -> Result<&Object> {
        self.get(handle)
            .ok_or_else(|| error!(DanglingReference; "OBJECT {} WAS COLLECTED", handle.index))
    }

    pub fn string(&self, handle: Handle) -> Option<&str> {
        match self.get(handle) {
            Some(Object::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn array(&self, handle: Handle) -> Option<&[Val]> {
        match self.get(handle) {
            Some(Object::Array(items)) => Some(items),
            _ => None,
        }
    }

    pub fn array_mut(&mut self, handle: Handle) -> Option<&mut Vec<Val>> {
        match self.get_mut(handle) {
            Some(Object::Array(items)) => Some(items),
            _ => None,
        }
    }

    /// Name of the value's type, looking through heap references.
    pub fn type_name(&self, val: &Val) -> &'static str {
        match val {
            Val::Object(handle) => match self.get(*handle) {
                Some(object) => object.type_name(),
                None => "collected object",
            },
            other => other.kind().name(),
        }
    }

    /// Mark everything reachable from `roots`, then free the rest.
    /// Returns the number of objects freed.
    pub fn collect<'a, I>(&mut self, roots: I) -> usize
    where
        I: IntoIterator<Item = &'a Val>,
    {
        let before = self.live;
        let slots = &self.slots;
        let marks = &mut self.marks;
        let worklist = &mut self.worklist;

        worklist.clear();
        for val in roots {
            mark(slots, marks, worklist, val);
        }
        while let Some(index) = worklist.pop() {
            if let Some(Object::Array(items)) = &slots[index].object {
                for val in items {
                    mark(slots, marks, worklist, val);
                }
            }
        }

        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if self.marks[index] {
                self.marks[index] = false;
                continue;
            }
            if slot.object.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }
        self.live -= freed;
        self.cycles += 1;
        debug!(before, after = self.live, freed, "garbage collection");
        freed
    }
}

fn mark(slots: &[Slot], marks: &mut [bool], worklist: &mut Vec<usize>, val: &Val) {
    let handle = match val {
        Val::Object(handle) => *handle,
        _ => return,
    };
    let index = handle.index();
    match slots.get(index) {
        Some(slot) if slot.generation == handle.generation && slot.object.is_some() => {
            if !marks[index] {
                marks[index] = true;
                worklist.push(index);
            }
        }
        _ => {}
    }
}
