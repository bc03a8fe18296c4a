//! This module implements the runtime representation of user-defined
//! functions (lambdas).
//!
//! Translation to host code happens outside this crate, so a lambda here
//! is simply the closure the translator already produced — there is no
//! bytecode chunk or upvalue vector to carry, unlike an interpreter that
//! compiles Nix to its own VM.

use std::fmt::{Debug, Display};
use std::rc::Rc;

use crate::errors::Error;

use super::{NixString, Value};

pub type LambdaFn = Rc<dyn Fn(Value) -> Result<Value, Error>>;

#[derive(Clone)]
pub struct Lambda {
    name: Option<NixString>,
    func: LambdaFn,
}

impl Lambda {
    pub fn new(func: LambdaFn) -> Self {
        Lambda { name: None, func }
    }

    pub fn named(name: NixString, func: LambdaFn) -> Self {
        Lambda {
            name: Some(name),
            func,
        }
    }

    pub fn name(&self) -> Option<&NixString> {
        self.name.as_ref()
    }

    pub fn call(&self, arg: Value) -> Result<Value, Error> {
        (self.func)(arg)
    }

    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl Debug for Lambda {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Lambda({})", name.as_str()),
            None => write!(f, "Lambda(anonymous)"),
        }
    }
}

impl Display for Lambda {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("lambda")
    }
}

impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}
