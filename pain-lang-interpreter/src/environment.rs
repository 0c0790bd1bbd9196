use std::collections::HashMap;
use std::rc::Rc;

use gc::{Finalize, Gc, GcCell, Trace};

use crate::object::Value;

#[derive(Trace, Finalize)]
struct Frame {
    bindings: HashMap<Rc<str>, Value>,
    parent: Option<Scope>,
}

/// Handle to one frame of a chain of name bindings. Cloning the handle
/// shares the frame.
#[derive(Clone, Trace, Finalize)]
pub struct Scope {
    frame: Gc<GcCell<Frame>>,
}

impl Scope {
    pub fn new() -> Self {
        Scope {
            frame: Gc::new(GcCell::new(Frame {
                bindings: HashMap::new(),
                parent: None,
            })),
        }
    }

    pub fn new_enclosed(parent: &Scope) -> Self {
        Scope {
            frame: Gc::new(GcCell::new(Frame {
                bindings: HashMap::new(),
                parent: Some(parent.clone()),
            })),
        }
    }

    /// Looks `name` up, walking outwards to the first frame binding it.
    pub fn get(&self, name: &str) -> Option<Value> {
        let frame = self.frame.borrow();
        frame
            .bindings
            .get(name)
            .cloned()
            .or_else(|| frame.parent.as_ref().and_then(|parent| parent.get(name)))
    }

    /// Rebinds `name` in the frame that already holds it, or binds it here
    /// when no frame does.
    pub fn assign(&self, name: Rc<str>, value: Value) {
        match self.owner_of(&name) {
            Some(owner) => owner.define(name, value),
            None => self.define(name, value),
        }
    }

    /// Binds `name` in this frame, shadowing outer bindings.
    pub fn define(&self, name: Rc<str>, value: Value) {
        self.frame.borrow_mut().bindings.insert(name, value);
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.frame.borrow().bindings.contains_key(name)
    }

    pub fn parent(&self) -> Option<Scope> {
        self.frame.borrow().parent.clone()
    }

    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Gc::ptr_eq(&self.frame, &other.frame)
    }

    fn owner_of(&self, name: &str) -> Option<Scope> {
        let frame = self.frame.borrow();
        if frame.bindings.contains_key(name) {
            Some(self.clone())
        } else {
            frame.parent.as_ref().and_then(|parent| parent.owner_of(name))
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let frame = self.frame.borrow();
        let mut names = frame.bindings.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("Scope")
            .field("names", &names)
            .field("parent", &frame.parent)
            .finish()
    }
}
