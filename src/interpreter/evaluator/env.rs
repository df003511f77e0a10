use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::interpreter::value::Value;

/// A shared, parent-linked environment frame.
pub type Env = Arc<Frame>;

/// One scope frame in the environment tree.
///
/// Frames form a tree rather than a stack: closures keep the frame of their
/// definition site alive, and `par` tasks share the frame of the enclosing
/// block by reference. Lookups walk the parent chain outward; assignments
/// mutate the innermost frame that holds the binding.
///
/// Each frame guards its slot map with a lock so parallel tasks can insert
/// and update bindings without corrupting the map. Reads take a consistent
/// snapshot of a slot, so a task never observes a torn value.
pub struct Frame {
    slots:  RwLock<HashMap<String, Value>>,
    parent: Option<Env>,
}

impl Frame {
    /// Creates the root frame of a program.
    #[must_use]
    pub fn root() -> Env {
        Arc::new(Self { slots:  RwLock::new(HashMap::new()),
                        parent: None, })
    }

    /// Creates a frame nested inside `parent`.
    #[must_use]
    pub fn child(parent: &Env) -> Env {
        Arc::new(Self { slots:  RwLock::new(HashMap::new()),
                        parent: Some(Arc::clone(parent)), })
    }

    /// Binds `name` in this frame, replacing any binding it already holds.
    pub fn define(&self, name: &str, value: Value) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value);
    }

    /// Looks up `name`, walking the parent chain outward.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut frame = self;
        loop {
            if let Some(value) = frame.slots
                                      .read()
                                      .unwrap_or_else(PoisonError::into_inner)
                                      .get(name)
            {
                return Some(value.clone());
            }
            match &frame.parent {
                Some(parent) => frame = parent.as_ref(),
                None => return None,
            }
        }
    }

    /// Writes `value` into the innermost frame that already binds `name`.
    ///
    /// Returns `false` when no frame in the chain holds the binding; the
    /// caller then decides where the new binding belongs.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let mut frame = self;
        loop {
            let mut slots = frame.slots
                                 .write()
                                 .unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get_mut(name) {
                *slot = value;
                return true;
            }
            drop(slots);
            match &frame.parent {
                Some(parent) => frame = parent.as_ref(),
                None => return false,
            }
        }
    }
}
