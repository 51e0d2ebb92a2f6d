//! Environment: the scope chain
//!
//! Frames live in an arena and point to their parent by id, which keeps
//! closures (which hold a frame id, not a pointer) free of ownership
//! cycles. Frames captured by a closure are pinned; everything else is
//! recycled on exit through a free list, so loops do not grow the arena.

use id_arena::{Arena, Id};
use rustc_hash::FxHashMap;

use crate::diagnostics::RuntimeError;
use crate::interp::value::Value;

pub type FrameId = Id<Frame>;

/// One layer of the scope chain
pub struct Frame {
    parent: Option<FrameId>,
    bindings: FxHashMap<String, Binding>,
    /// Kept alive past its natural exit (captured by a closure)
    pinned: bool,
}

/// A (mutability, value) pair living in one frame
#[derive(Clone)]
pub struct Binding {
    pub mutable: bool,
    pub value: Value,
}

/// The scope chain: an arena of frames plus the current frame cursor
pub struct Environment {
    frames: Arena<Frame>,
    root: FrameId,
    current: FrameId,
    free: Vec<FrameId>,
}

impl Environment {
    pub fn new() -> Self {
        let mut frames = Arena::new();
        let root = frames.alloc(Frame {
            parent: None,
            bindings: FxHashMap::default(),
            pinned: true,
        });
        Environment {
            frames,
            root,
            current: root,
            free: Vec::new(),
        }
    }

    pub fn root(&self) -> FrameId {
        self.root
    }

    pub fn current(&self) -> FrameId {
        self.current
    }

    /// Look a name up, innermost frame outward; first match wins
    pub fn lookup(&self, name: &str) -> Result<Value, RuntimeError> {
        let mut frame = Some(self.current);
        while let Some(id) = frame {
            if let Some(binding) = self.frames[id].bindings.get(name) {
                return Ok(binding.value.clone());
            }
            frame = self.frames[id].parent;
        }
        Err(RuntimeError::name(name))
    }

    /// Declare or re-declare a name
    ///
    /// If the name already resolves anywhere in the chain this is an
    /// assignment: the value is replaced in the owning frame, and only if
    /// that binding is mutable. Otherwise a new binding is created in the
    /// innermost frame with the given mutability.
    pub fn declare(
        &mut self,
        name: &str,
        mutable: bool,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let mut frame = Some(self.current);
        while let Some(id) = frame {
            if let Some(binding) = self.frames[id].bindings.get(name) {
                if !binding.mutable {
                    return Err(RuntimeError::immutability(name));
                }
                let owner = &mut self.frames[id];
                if let Some(binding) = owner.bindings.get_mut(name) {
                    binding.value = value;
                }
                return Ok(());
            }
            frame = self.frames[id].parent;
        }
        self.frames[self.current]
            .bindings
            .insert(name.to_string(), Binding { mutable, value });
        Ok(())
    }

    /// Bind a name directly in the current frame, shadowing any outer
    /// binding of the same name (parameters, loop variables)
    pub fn insert(&mut self, name: &str, mutable: bool, value: Value) {
        self.frames[self.current]
            .bindings
            .insert(name.to_string(), Binding { mutable, value });
    }

    /// Install an immutable binding in the root frame, replacing any
    /// previous one; the builtin-registration path
    pub fn insert_root(&mut self, name: &str, value: Value) {
        self.frames[self.root].bindings.insert(
            name.to_string(),
            Binding {
                mutable: false,
                value,
            },
        );
    }

    /// Enter a child frame of the current one
    pub fn descend(&mut self) -> FrameId {
        self.descend_from(self.current)
    }

    /// Enter a child frame of an arbitrary frame (function calls descend
    /// from the frame the closure captured, not from the caller)
    pub fn descend_from(&mut self, parent: FrameId) -> FrameId {
        let child = match self.free.pop() {
            Some(id) => {
                let frame = &mut self.frames[id];
                frame.parent = Some(parent);
                frame.bindings.clear();
                frame.pinned = false;
                id
            }
            None => self.frames.alloc(Frame {
                parent: Some(parent),
                bindings: FxHashMap::default(),
                pinned: false,
            }),
        };
        self.current = child;
        child
    }

    /// Exit the current frame, copying every binding introduced in it
    /// into its parent (block and for-loop natural exit)
    pub fn ascend_merge(&mut self) {
        let id = self.current;
        let parent = self.frames[id].parent.unwrap_or(self.root);
        let merged: Vec<(String, Binding)> = self.frames[id]
            .bindings
            .drain()
            .collect();
        self.frames[parent].bindings.extend(merged);
        self.release(id, parent);
    }

    /// Exit the current frame discarding its bindings (abrupt escape,
    /// function-call return, module construction)
    pub fn ascend_discard(&mut self) {
        let id = self.current;
        let parent = self.frames[id].parent.unwrap_or(self.root);
        self.release(id, parent);
    }

    /// Restore the cursor to `frame` without touching anything else
    /// (caller-side bookkeeping around function calls)
    pub fn restore(&mut self, frame: FrameId) {
        self.current = frame;
    }

    fn release(&mut self, id: FrameId, parent: FrameId) {
        self.current = parent;
        if !self.frames[id].pinned {
            self.frames[id].bindings.clear();
            self.frames[id].parent = None;
            self.free.push(id);
        }
    }

    /// Pin a frame and its ancestors so closure captures stay live
    pub fn pin(&mut self, frame: FrameId) {
        let mut cursor = Some(frame);
        while let Some(id) = cursor {
            if self.frames[id].pinned {
                break;
            }
            self.frames[id].pinned = true;
            cursor = self.frames[id].parent;
        }
    }

    /// Bindings introduced directly in `frame`, for module export capture
    pub fn frame_binding(&self, frame: FrameId, name: &str) -> Option<Binding> {
        self.frames[frame].bindings.get(name).cloned()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outward() {
        let mut env = Environment::new();
        env.insert("x", false, Value::number(1.0));
        env.descend();
        assert!(env.lookup("x").is_ok());
        env.insert("x", false, Value::number(2.0));
        let v = env.lookup("x").expect("shadowed binding resolves");
        assert_eq!(v.to_string(), "2");
    }

    #[test]
    fn test_declare_rejects_immutable_reassignment() {
        let mut env = Environment::new();
        env.declare("x", false, Value::number(1.0))
            .expect("fresh declaration succeeds");
        let err = env.declare("x", false, Value::number(2.0));
        assert!(matches!(err, Err(RuntimeError::Immutability { .. })));
    }

    #[test]
    fn test_declare_updates_mutable_in_owning_frame() {
        let mut env = Environment::new();
        env.declare("x", true, Value::number(1.0))
            .expect("fresh declaration succeeds");
        env.descend();
        env.declare("x", false, Value::number(5.0))
            .expect("mutable re-declaration succeeds");
        env.ascend_discard();
        let v = env.lookup("x").expect("binding still resolves");
        assert_eq!(v.to_string(), "5");
    }

    #[test]
    fn test_merge_copies_locals_into_parent() {
        let mut env = Environment::new();
        env.descend();
        env.insert("y", false, Value::number(9.0));
        env.ascend_merge();
        assert_eq!(env.lookup("y").expect("merged binding").to_string(), "9");
    }

    #[test]
    fn test_discard_drops_locals() {
        let mut env = Environment::new();
        env.descend();
        env.insert("y", false, Value::number(9.0));
        env.ascend_discard();
        assert!(env.lookup("y").is_err());
    }

    #[test]
    fn test_unpinned_frames_are_recycled() {
        let mut env = Environment::new();
        let first = env.descend();
        env.ascend_discard();
        let second = env.descend();
        assert_eq!(first, second);
        env.ascend_discard();
    }

    #[test]
    fn test_pinned_frames_survive() {
        let mut env = Environment::new();
        let captured = env.descend();
        env.insert("state", false, Value::number(7.0));
        env.pin(captured);
        env.ascend_discard();
        assert!(env.frame_binding(captured, "state").is_some());
    }
}
