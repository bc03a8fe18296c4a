//! This module implements the runtime representation of a Nix builtin:
//! a function directly backed by Rust code operating on Nix values,
//! rather than a host closure produced by the translator.

use std::fmt::{Debug, Display};
use std::rc::Rc;

use crate::errors::EvalResult;

use super::Value;

pub type BuiltinFn = Rc<dyn Fn(Vec<Value>) -> EvalResult<Value>>;

/// A single built-in function.
///
/// Builtins are the only functions in this runtime with varying arities
/// (`hasAttr` takes two arguments, `isAttrs` takes one). To support this
/// generically, a builtin is called with a vector of its arguments in
/// order, accumulated one at a time through [`Builtin::apply`].
///
/// Partially applied builtins behave like closures, capturing the
/// arguments supplied so far, and print distinctly from fully-applied
/// ones.
#[derive(Clone)]
pub struct Builtin {
    name: &'static str,
    arity: usize,
    func: BuiltinFn,
    partials: Vec<Value>,
}

impl Builtin {
    pub fn new(name: &'static str, arity: usize, func: BuiltinFn) -> Self {
        Builtin {
            name,
            arity,
            func,
            partials: vec![],
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Apply an additional argument to the builtin, either triggering
    /// execution (if this was the last argument it needed) or returning
    /// a new, more-applied partial builtin.
    pub fn apply(mut self, arg: Value) -> EvalResult<Value> {
        self.partials.push(arg);

        if self.partials.len() == self.arity {
            return (self.func)(self.partials);
        }

        Ok(Value::Builtin(self))
    }
}

impl Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "builtin[{}]", self.name)
    }
}

impl Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.partials.is_empty() {
            write!(f, "<<primop-app {}>>", self.name)
        } else {
            write!(f, "<<primop {}>>", self.name)
        }
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.partials == other.partials
    }
}
