//! Reversible name bindings
//!
//! A map with an undo log. Pushing a name shadows whatever it was bound to;
//! popping restores exactly the previous binding. Scopes are opened with
//! [`ScopedBindings::frame`], which pops everything pushed through it when
//! dropped, whichever way the enclosing code exits.

use rustc_hash::FxHashMap;
use std::ops::{Deref, DerefMut};

/// Name-to-value bindings with stack discipline
#[derive(Debug, Clone)]
pub struct ScopedBindings<V> {
    current: FxHashMap<String, V>,
    undo: Vec<(String, Option<V>)>,
}

impl<V> ScopedBindings<V> {
    /// Create an empty binding stack
    pub fn new() -> Self {
        Self {
            current: FxHashMap::default(),
            undo: Vec::new(),
        }
    }

    /// Bind `name`, shadowing any existing binding
    pub fn push(&mut self, name: impl Into<String>, value: V) {
        let name = name.into();
        let previous = self.current.insert(name.clone(), value);
        self.undo.push((name, previous));
    }

    /// Undo the most recent push, returning the binding it removed
    pub fn pop(&mut self) -> Option<(String, V)> {
        let (name, previous) = self.undo.pop()?;
        let removed = match previous {
            Some(value) => self.current.insert(name.clone(), value),
            None => self.current.remove(&name),
        };
        removed.map(|value| (name, value))
    }

    /// Innermost binding of `name`
    pub fn get(&self, name: &str) -> Option<&V> {
        self.current.get(name)
    }

    /// Whether `name` is bound at all
    pub fn contains(&self, name: &str) -> bool {
        self.current.contains_key(name)
    }

    /// Number of pushes not yet popped
    pub fn depth(&self) -> usize {
        self.undo.len()
    }

    /// Open a scope. Bindings pushed through the frame are popped on drop.
    pub fn frame(&mut self) -> ScopeFrame<'_, V> {
        ScopeFrame {
            bindings: self,
            pushed: 0,
        }
    }
}

impl<V> Default for ScopedBindings<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A lexical scope over a [`ScopedBindings`]
///
/// Derefs to the underlying bindings, so it can be passed wherever
/// `&mut ScopedBindings<V>` is expected and nested with another `frame()`.
pub struct ScopeFrame<'a, V> {
    bindings: &'a mut ScopedBindings<V>,
    pushed: usize,
}

impl<V> ScopeFrame<'_, V> {
    /// Bind `name` for the lifetime of this frame
    pub fn push(&mut self, name: impl Into<String>, value: V) {
        self.bindings.push(name, value);
        self.pushed += 1;
    }

    /// Number of bindings this frame owns
    pub fn pushed(&self) -> usize {
        self.pushed
    }
}

impl<V> Deref for ScopeFrame<'_, V> {
    type Target = ScopedBindings<V>;

    fn deref(&self) -> &ScopedBindings<V> {
        self.bindings
    }
}

impl<V> DerefMut for ScopeFrame<'_, V> {
    fn deref_mut(&mut self) -> &mut ScopedBindings<V> {
        self.bindings
    }
}

impl<V> Drop for ScopeFrame<'_, V> {
    fn drop(&mut self) {
        for _ in 0..self.pushed {
            self.bindings.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_restores_shadowed_binding() {
        let mut scope = ScopedBindings::new();
        scope.push("x", 1);
        scope.push("x", 2);
        assert_eq!(scope.get("x"), Some(&2));

        assert_eq!(scope.pop(), Some(("x".to_string(), 2)));
        assert_eq!(scope.get("x"), Some(&1));
        scope.pop();
        assert_eq!(scope.get("x"), None);
        assert_eq!(scope.pop(), None);
    }

    #[test]
    fn test_frame_pops_on_drop() {
        let mut scope = ScopedBindings::new();
        scope.push("outer", 0);
        {
            let mut frame = scope.frame();
            frame.push("a", 1);
            frame.push("b", 2);
            frame.push("outer", 3);
            assert_eq!(frame.get("outer"), Some(&3));
            assert_eq!(frame.depth(), 4);
        }
        assert_eq!(scope.depth(), 1);
        assert_eq!(scope.get("outer"), Some(&0));
        assert!(!scope.contains("a"));
    }

    #[test]
    fn test_nested_frames() {
        let mut scope: ScopedBindings<&str> = ScopedBindings::new();
        let mut outer = scope.frame();
        outer.push("x", "outer");
        {
            let mut inner = outer.frame();
            inner.push("x", "inner");
            assert_eq!(inner.get("x"), Some(&"inner"));
        }
        assert_eq!(outer.get("x"), Some(&"outer"));
        assert_eq!(outer.pushed(), 1);
        drop(outer);
        assert_eq!(scope.depth(), 0);
    }

    #[test]
    fn test_frame_pops_on_early_return() {
        fn bind_then_fail(scope: &mut ScopedBindings<u32>, fail: bool) -> Result<usize, String> {
            let mut frame = scope.frame();
            frame.push("tmp", 7);
            if fail {
                return Err("failed inside scope".to_string());
            }
            frame.push("more", 8);
            Ok(frame.depth())
        }

        let mut scope = ScopedBindings::new();
        assert!(bind_then_fail(&mut scope, true).is_err());
        assert_eq!(scope.depth(), 0);
        assert!(!scope.contains("tmp"));

        assert_eq!(bind_then_fail(&mut scope, false), Ok(2));
        assert_eq!(scope.depth(), 0);
    }
}
