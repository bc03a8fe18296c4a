//! This module implements the runtime representation of Thunks.
//!
//! A thunk is a suspended computation that yields a [`Value`] the first
//! time it is forced, then memoises that value for every subsequent
//! force. Thunks are how this runtime implements Nix's lazy evaluation:
//! the translator wraps any expression the language says should be
//! evaluated lazily in a thunk instead of calling it directly.
//!
//! Thunks have interior mutability to allow memoisation; forcing a thunk
//! mutates its representation in place so every `Rc`-shared reference to
//! it observes the same, now-evaluated, value.

use rustc_hash::FxHashSet;
use std::{
    cell::{Ref, RefCell},
    fmt::{Debug, Display},
    rc::Rc,
};

use crate::errors::{Error, NixEvalError};

use super::Value;

/// A suspended computation. Must be a reusable `Fn`, not `FnOnce`: if
/// forcing the thunk fails, the producer is put back so a subsequent
/// force (e.g. after `builtins.tryEval` catches the error) can retry it.
type Producer = Rc<dyn Fn() -> Result<Value, Error>>;

#[derive(Clone)]
struct Suspended(Producer);

impl Debug for Suspended {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Suspended({:p})", Rc::as_ptr(&self.0))
    }
}

/// Internal representation of a thunk's state machine.
#[derive(Debug, Clone)]
enum ThunkRepr {
    /// Awaiting execution.
    Suspended(Suspended),

    /// Currently under evaluation. Forcing a blackholed thunk again means
    /// the computation refers to its own result, i.e. infinite recursion.
    Blackhole,

    /// Fully evaluated.
    Evaluated(Value),
}

impl ThunkRepr {
    fn debug_repr(&self) -> String {
        match self {
            ThunkRepr::Evaluated(v) => format!("thunk(val|{})", v),
            ThunkRepr::Blackhole => "thunk(blackhole)".to_string(),
            ThunkRepr::Suspended(_) => "thunk(suspended)".to_string(),
        }
    }

    fn is_forced(&self) -> bool {
        matches!(self, ThunkRepr::Evaluated(Value::Thunk(t)) if t.is_forced())
            || matches!(self, ThunkRepr::Evaluated(_))
    }
}

/// A thunk is created for any value which requires non-strict evaluation
/// due to self-reference or lazy semantics (or both). Every reference
/// cycle involving [`Value`]s contains at least one `Thunk`.
#[derive(Clone, Debug)]
pub struct Thunk(Rc<RefCell<ThunkRepr>>);

impl Thunk {
    /// Creates a new thunk wrapping the given producer closure.
    pub fn new(producer: impl Fn() -> Result<Value, Error> + 'static) -> Self {
        Thunk(Rc::new(RefCell::new(ThunkRepr::Suspended(Suspended(
            Rc::new(producer),
        )))))
    }

    /// Creates an already-evaluated thunk. Used for eagerly supplied
    /// values that still need to flow through thunk-typed positions.
    pub fn evaluated(value: Value) -> Self {
        Thunk(Rc::new(RefCell::new(ThunkRepr::Evaluated(value))))
    }

    /// Forces the thunk, driving the state machine to completion. On
    /// producer failure, the thunk reverts to `Suspended` with the same
    /// producer, so a subsequent force (for example one reached via
    /// `builtins.tryEval`) can retry the computation.
    pub fn force(&self) -> Result<(), Error> {
        let mut myself = self.clone();
        let mut also_update: Vec<Rc<RefCell<ThunkRepr>>> = vec![];

        loop {
            if myself.0.borrow().is_forced() {
                let val = myself.value().clone();
                for other in also_update {
                    other.replace(ThunkRepr::Evaluated(val.clone()));
                }
                return Ok(());
            }

            let inner = myself.0.replace(ThunkRepr::Blackhole);

            match inner {
                ThunkRepr::Blackhole => {
                    myself.0.replace(ThunkRepr::Blackhole);
                    return Err(NixEvalError::InfiniteRecursion.into());
                }

                ThunkRepr::Suspended(Suspended(producer)) => match producer() {
                    Ok(value) => {
                        myself.0.replace(ThunkRepr::Evaluated(value));
                        continue;
                    }
                    Err(err) => {
                        // Restore the producer so a caller catching this
                        // error (tryEval, or_default) can retry.
                        myself
                            .0
                            .replace(ThunkRepr::Suspended(Suspended(producer)));
                        return Err(err);
                    }
                },

                // Nested thunks: splice the inner thunk's representation
                // into this one, flattening thunk chains as they resolve.
                ThunkRepr::Evaluated(Value::Thunk(inner_thunk)) => {
                    match Rc::try_unwrap(inner_thunk.0) {
                        Ok(refcell) => {
                            myself.0.replace(refcell.into_inner());
                            continue;
                        }
                        Err(rc) => {
                            let inner_thunk = Thunk(rc);
                            if inner_thunk.is_forced() {
                                myself
                                    .0
                                    .replace(ThunkRepr::Evaluated(inner_thunk.value().clone()));
                                continue;
                            }
                            also_update.push(myself.0.clone());
                            myself = inner_thunk;
                            continue;
                        }
                    }
                }

                ThunkRepr::Evaluated(val) => {
                    myself.0.replace(ThunkRepr::Evaluated(val));
                    return Ok(());
                }
            }
        }
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(*self.0.borrow(), ThunkRepr::Evaluated(_))
    }

    pub fn is_suspended(&self) -> bool {
        matches!(*self.0.borrow(), ThunkRepr::Suspended(_))
    }

    /// Returns true if forcing this thunk will not change it.
    pub fn is_forced(&self) -> bool {
        self.0.borrow().is_forced()
    }

    /// Returns a reference to the inner evaluated value. It is an error
    /// to call this on a thunk that has not been forced.
    pub fn value(&self) -> Ref<'_, Value> {
        Ref::map(self.0.borrow(), |thunk| match thunk {
            ThunkRepr::Evaluated(value) => value,
            ThunkRepr::Blackhole => panic!("Thunk::value() called on a black-holed thunk"),
            ThunkRepr::Suspended(_) => panic!("Thunk::value() called on a suspended thunk"),
        })
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn debug_repr(&self) -> String {
        self.0.borrow().debug_repr()
    }
}

impl Display for Thunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &*self.0.borrow() {
            ThunkRepr::Evaluated(v) => v.fmt(f),
            ThunkRepr::Suspended(_) => f.write_str("<CODE>"),
            ThunkRepr::Blackhole => f.write_str("<CYCLE>"),
        }
    }
}

/// A wrapper type for tracking which thunks have already been seen in a
/// context, needed for printing cyclic non-diverging structures like
/// `rec { f = [ f ]; }`. Distinct from the blackhole mechanism, which
/// detects truly diverging structures like `(rec { f = f; }).f`.
#[derive(Default)]
pub struct ThunkSet(FxHashSet<*const RefCell<ThunkRepr>>);

impl ThunkSet {
    /// Returns `true` if the thunk was not already present, marking it
    /// seen either way.
    pub fn insert(&mut self, thunk: &Thunk) -> bool {
        let ptr: *const RefCell<ThunkRepr> = Rc::as_ptr(&thunk.0);
        self.0.insert(ptr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn memoises_result() {
        let calls = Rc::new(Cell::new(0));
        let calls2 = calls.clone();
        let thunk = Thunk::new(move || {
            calls2.set(calls2.get() + 1);
            Ok(Value::Integer(42))
        });

        thunk.force().unwrap();
        thunk.force().unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(*thunk.value(), Value::Integer(42));
    }

    #[test]
    fn self_reference_is_infinite_recursion() {
        let thunk = Thunk::new(|| Err(NixEvalError::Throw("placeholder".into()).into()));
        // Force directly triggers the producer, which here always errors;
        // separately check that a blackholed thunk reports recursion.
        let cell: Rc<RefCell<ThunkRepr>> = Rc::new(RefCell::new(ThunkRepr::Blackhole));
        let blackholed = Thunk(cell);
        let err = blackholed.force().unwrap_err();
        assert!(matches!(err, Error::Eval(NixEvalError::InfiniteRecursion)));

        // The original, unrelated thunk still just surfaces its own error.
        assert!(thunk.force().is_err());
    }

    #[test]
    fn retries_after_failure() {
        let attempt = Rc::new(Cell::new(0));
        let attempt2 = attempt.clone();
        let thunk = Thunk::new(move || {
            let n = attempt2.get();
            attempt2.set(n + 1);
            if n == 0 {
                Err(NixEvalError::Throw("first attempt fails".into()).into())
            } else {
                Ok(Value::Integer(7))
            }
        });

        assert!(thunk.force().is_err());
        thunk.force().unwrap();
        assert_eq!(*thunk.value(), Value::Integer(7));
        assert_eq!(attempt.get(), 2);
    }

    #[test]
    fn splices_nested_thunks() {
        let inner = Thunk::evaluated(Value::Integer(5));
        let outer = Thunk::new(move || Ok(Value::Thunk(inner.clone())));

        outer.force().unwrap();
        assert_eq!(*outer.value(), Value::Integer(5));
    }
}
