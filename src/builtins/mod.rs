//! The non-IO surface of `builtins.*` (C5): predicates, string/list/
//! attr-set operations, version comparison, evaluation control, basic
//! arithmetic, JSON conversion and a handful of miscellaneous helpers.
//!
//! Builtins that would need real filesystem or network access (`toFile`,
//! `storePath`, `fetch*`, `derivation` realisation) as well as the
//! regex- and hashing-backed builtins are not part of this runtime; the
//! translator's own facade layer is the place those would be wired in
//! by an embedder that needs them.

use std::rc::Rc;

use crate::value::{Builtin, NixAttrs, Value};

mod arithmetic;
mod attrs;
mod eval_control;
mod json;
mod lists;
mod misc;
mod predicates;
mod strings;
mod versions;

macro_rules! builtin {
    ($name:expr, $arity:expr, $body:expr) => {
        (
            $name,
            Value::Builtin(Builtin::new($name, $arity, Rc::new($body))),
        )
    };
}

pub(crate) use builtin;
pub use misc::or_default;

/// The combined operators+builtins table passed to each instantiated
/// module.
///
/// The `nixOp` operator group and the `_deepMerge`/`_lambdaArgCheck`
/// auxiliaries are deliberately not entries of `table`: a translated
/// module is itself Rust source with static access to this crate, so
/// it calls `nix_rt::ops::*` and `nix_rt::builtins::or_default`
/// directly rather than through a name-keyed runtime dispatch table.
/// `table` carries exactly the `builtins.*` surface named in this
/// crate's builtin modules.
pub struct Builtins {
    pub table: NixAttrs,
}

impl Builtins {
    pub fn new() -> Self {
        Builtins {
            table: global_builtins(),
        }
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the `builtins` attribute set exposed to translated modules,
/// containing every builtin named in this crate's specification.
pub fn global_builtins() -> NixAttrs {
    let mut entries: Vec<(Value, Value)> = Vec::new();

    for (name, value) in predicates::builtins()
        .into_iter()
        .chain(strings::builtins())
        .chain(lists::builtins())
        .chain(attrs::builtins())
        .chain(eval_control::builtins())
        .chain(arithmetic::builtins())
        .chain(json::builtins())
        .chain(misc::builtins())
    {
        entries.push((Value::from(name), value));
    }

    NixAttrs::construct(entries).expect("builtin names are unique string literals")
}
