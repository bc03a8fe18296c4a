//! Lexical scope model (C2).
//!
//! Two scope kinds back the translated program's variable lookups:
//!
//! - A [`WritableScope`] backs `rec { ... }` and `let ... in` bindings: a
//!   single-assignment map of names to values, chained to a parent scope
//!   for lookups that miss locally. Writes are rejected once a name is
//!   already bound, and `__proto__` can never be bound or looked up —
//!   the translated program's lexical scopes are plain bindings, not
//!   JavaScript-style prototype objects, and admitting `__proto__`
//!   would let a Nix expression smuggle prototype-pollution into the
//!   host runtime through an entirely unrelated attribute name.
//! - A [`ReadOnlyScope`] backs `with EXPR; BODY`: an ordered stack of
//!   attribute-set fallback layers consulted only when a name is not
//!   found in any enclosing writable scope. Layers closer to the `with`
//!   site shadow outer ones.
//!
//! Chaining is by `Rc<RefCell<..>>`, the same interior-mutability
//! pattern used for [`crate::value::Thunk`], since scopes are
//! single-threaded and frequently shared between sibling closures.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::errors::{Error, ScopeError};
use crate::value::{NixAttrs, Value};

const PROTO_KEY: &str = "__proto__";

/// A single `rec`/`let` scope: a flat map of bindings plus an optional
/// parent to chain lookups to.
#[derive(Debug)]
pub struct WritableScope {
    bindings: RefCell<FxHashMap<String, Value>>,
    parent: Option<Scope>,
}

/// Shared handle to a [`WritableScope`], cheap to clone.
#[derive(Clone, Debug)]
pub struct Scope(Rc<WritableScope>);

impl Scope {
    /// Creates a new root scope with no parent.
    pub fn root() -> Self {
        Scope(Rc::new(WritableScope {
            bindings: RefCell::new(FxHashMap::default()),
            parent: None,
        }))
    }

    /// Creates a child scope chained to `self`.
    pub fn child(&self) -> Self {
        Scope(Rc::new(WritableScope {
            bindings: RefCell::new(FxHashMap::default()),
            parent: Some(self.clone()),
        }))
    }

    /// Binds `name` to `value` in this scope. Fails if `name` is already
    /// bound here (single-assignment discipline) or is `__proto__`.
    pub fn bind(&self, name: impl Into<String>, value: Value) -> Result<(), Error> {
        let name = name.into();
        if name == PROTO_KEY {
            return Err(ScopeError::PrototypeModification.into());
        }

        let mut bindings = self.0.bindings.borrow_mut();
        if bindings.contains_key(&name) {
            return Err(ScopeError::AlreadyBound { name }.into());
        }
        bindings.insert(name, value);
        Ok(())
    }

    /// Looks up `name`, walking the parent chain outward. Returns
    /// `None` (not an error) if unresolved in every writable scope, so
    /// callers can fall back to an enclosing [`ReadOnlyScope`] before
    /// reporting [`ScopeError::UnknownVariable`].
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if name == PROTO_KEY {
            return None;
        }

        if let Some(v) = self.0.bindings.borrow().get(name) {
            return Some(v.clone());
        }

        self.0.parent.as_ref().and_then(|p| p.lookup(name))
    }

    /// `allKeys`: every name visible from this scope, own bindings
    /// unioned with everything visible from the parent, sorted and
    /// de-duplicated.
    pub fn all_keys(&self) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self.0.bindings.borrow().keys().cloned().collect();
        if let Some(parent) = &self.0.parent {
            keys.extend(parent.all_keys());
        }
        keys
    }

    /// `extractScope`: a detached, prototype-free attribute set of this
    /// scope's own bindings only — the parent chain is not walked.
    pub fn extract_scope(&self) -> NixAttrs {
        self.0
            .bindings
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// One `with EXPR` layer: an evaluated attribute set consulted for names
/// not found in any writable scope.
#[derive(Clone, Debug)]
pub struct ReadOnlyScope {
    layers: Vec<Rc<NixAttrs>>,
    parent: Option<Box<ReadOnlyScope>>,
}

impl ReadOnlyScope {
    pub fn empty() -> Self {
        ReadOnlyScope {
            layers: vec![],
            parent: None,
        }
    }

    /// Pushes a new `with` layer, with `attrs` shadowing everything
    /// already visible through `self`.
    pub fn push(&self, attrs: Rc<NixAttrs>) -> Self {
        ReadOnlyScope {
            layers: vec![attrs],
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Looks up `name` across layers, innermost (most recently pushed)
    /// first. Writes through a `with` overlay are never possible —
    /// there is no `bind`/`set` method on this type.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if name == PROTO_KEY {
            return None;
        }

        for layer in &self.layers {
            if let Some(v) = layer.select(name) {
                return Some(v.clone());
            }
        }

        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    /// `allKeys`: the union of every layer's keys, de-duplicated and
    /// preserving first-seen order (innermost layer first), unlike the
    /// writable scope's sorted `allKeys`.
    pub fn all_keys(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for layer in &self.layers {
            for key in layer.keys() {
                let key = key.to_string();
                if seen.insert(key.clone()) {
                    out.push(key);
                }
            }
        }
        if let Some(parent) = &self.parent {
            for key in parent.all_keys() {
                if seen.insert(key.clone()) {
                    out.push(key);
                }
            }
        }
        out
    }
}

impl Default for ReadOnlyScope {
    fn default() -> Self {
        Self::empty()
    }
}

/// Resolves a variable reference against both scope kinds: writable
/// scopes take precedence, `with` overlays are consulted only on a
/// writable-scope miss, matching Nix's own shadowing rules.
pub fn resolve(
    writable: &Scope,
    readonly: &ReadOnlyScope,
    name: &str,
) -> Result<Value, Error> {
    if let Some(v) = writable.lookup(name) {
        return Ok(v);
    }

    if let Some(v) = readonly.lookup(name) {
        return Ok(v);
    }

    Err(ScopeError::UnknownVariable {
        name: name.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_lookup() {
        let scope = Scope::root();
        scope.bind("x", Value::Integer(1)).unwrap();
        assert_eq!(scope.lookup("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn rebinding_same_name_fails() {
        let scope = Scope::root();
        scope.bind("x", Value::Integer(1)).unwrap();
        let err = scope.bind("x", Value::Integer(2)).unwrap_err();
        assert!(matches!(err, Error::Scope(ScopeError::AlreadyBound { .. })));
    }

    #[test]
    fn child_sees_parent_bindings() {
        let parent = Scope::root();
        parent.bind("x", Value::Integer(1)).unwrap();
        let child = parent.child();
        child.bind("y", Value::Integer(2)).unwrap();

        assert_eq!(child.lookup("x"), Some(Value::Integer(1)));
        assert_eq!(child.lookup("y"), Some(Value::Integer(2)));
        assert_eq!(parent.lookup("y"), None);
    }

    #[test]
    fn child_shadows_parent() {
        let parent = Scope::root();
        parent.bind("x", Value::Integer(1)).unwrap();
        let child = parent.child();
        child.bind("x", Value::Integer(2)).unwrap();

        assert_eq!(child.lookup("x"), Some(Value::Integer(2)));
        assert_eq!(parent.lookup("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn proto_key_cannot_be_bound() {
        let scope = Scope::root();
        let err = scope.bind("__proto__", Value::Integer(1)).unwrap_err();
        assert!(matches!(
            err,
            Error::Scope(ScopeError::PrototypeModification)
        ));
    }

    #[test]
    fn with_overlay_only_consulted_on_writable_miss() {
        let writable = Scope::root();
        writable.bind("x", Value::Integer(1)).unwrap();

        let attrs = Rc::new(
            NixAttrs::construct(vec![
                (Value::String("x".into()), Value::Integer(99)),
                (Value::String("y".into()), Value::Integer(2)),
            ])
            .unwrap(),
        );
        let readonly = ReadOnlyScope::empty().push(attrs);

        assert_eq!(resolve(&writable, &readonly, "x").unwrap(), Value::Integer(1));
        assert_eq!(resolve(&writable, &readonly, "y").unwrap(), Value::Integer(2));
    }

    #[test]
    fn inner_with_shadows_outer_with() {
        let writable = Scope::root();
        let outer = Rc::new(
            NixAttrs::construct(vec![(Value::String("x".into()), Value::Integer(1))]).unwrap(),
        );
        let inner = Rc::new(
            NixAttrs::construct(vec![(Value::String("x".into()), Value::Integer(2))]).unwrap(),
        );

        let readonly = ReadOnlyScope::empty().push(outer).push(inner);
        assert_eq!(resolve(&writable, &readonly, "x").unwrap(), Value::Integer(2));
    }

    #[test]
    fn unknown_variable_errors() {
        let writable = Scope::root();
        let readonly = ReadOnlyScope::empty();
        let err = resolve(&writable, &readonly, "nope").unwrap_err();
        assert!(matches!(err, Error::Scope(ScopeError::UnknownVariable { .. })));
    }

    #[test]
    fn all_keys_unions_own_and_parent_sorted() {
        let parent = Scope::root();
        parent.bind("b", Value::Integer(1)).unwrap();
        let child = parent.child();
        child.bind("a", Value::Integer(2)).unwrap();

        let keys: Vec<_> = child.all_keys().into_iter().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn extract_scope_copies_own_bindings_only() {
        let parent = Scope::root();
        parent.bind("b", Value::Integer(1)).unwrap();
        let child = parent.child();
        child.bind("a", Value::Integer(2)).unwrap();

        let extracted = child.extract_scope();
        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted.select("a").unwrap().as_int().unwrap(), 2);
        assert!(extracted.select("b").is_none());
    }

    #[test]
    fn read_only_scope_all_keys_preserves_first_seen_order() {
        let outer = Rc::new(
            NixAttrs::construct(vec![
                (Value::String("x".into()), Value::Integer(1)),
                (Value::String("z".into()), Value::Integer(1)),
            ])
            .unwrap(),
        );
        let inner = Rc::new(
            NixAttrs::construct(vec![(Value::String("y".into()), Value::Integer(2))]).unwrap(),
        );

        let readonly = ReadOnlyScope::empty().push(outer).push(inner);
        assert_eq!(
            readonly.all_keys(),
            vec!["y".to_string(), "x".to_string(), "z".to_string()]
        );
    }

    #[test]
    fn proto_key_never_resolves_through_with() {
        let writable = Scope::root();
        let attrs = Rc::new(
            NixAttrs::construct(vec![(Value::String("__proto__".into()), Value::Integer(1))])
                .unwrap(),
        );
        let readonly = ReadOnlyScope::empty().push(attrs);
        assert!(resolve(&writable, &readonly, "__proto__").is_err());
    }
}
