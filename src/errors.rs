//! Error taxonomy for the runtime (C6).
//!
//! Five kinds, matching the evaluation-semantic distinctions Nix itself
//! draws: a bad operand type, an out-of-domain numeric/index value, a
//! scope-discipline violation, a user-raised or evaluation-semantic
//! failure, and a fatal abort. Positional information is deliberately not
//! part of these values: the translator that produced the host code owns
//! the source map, and is out of scope for this crate.

use std::path::PathBuf;
use std::rc::Rc;

pub type EvalResult<T> = Result<T, Error>;

/// A single evaluation error.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Eval(#[from] NixEvalError),

    #[error("evaluation aborted: {0}")]
    Abort(String),
}

impl Error {
    /// Returns `true` if this error can be caught by `builtins.tryEval`.
    ///
    /// Only [`Error::Eval`] is catchable; aborts are intentionally not,
    /// and type/range/scope errors propagate since they indicate a bug
    /// in the evaluated program rather than a recoverable condition.
    pub fn is_catchable(&self) -> bool {
        matches!(self, Error::Eval(_))
    }

    pub fn throw(msg: impl Into<String>) -> Self {
        NixEvalError::Throw(msg.into()).into()
    }

    pub fn division_by_zero() -> Self {
        RangeError::DivisionByZero.into()
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum TypeError {
    #[error("invalid input type ({actual}), expected ({expected})")]
    Mismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("given types mismatch ({lhs} != {rhs})")]
    GivenTypesMismatch {
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("cannot compare a {lhs} with a {rhs}")]
    Incomparable {
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("assertion condition must be a bool")]
    NonBoolAssertion,

    #[error("found attribute name of type '{actual}', but attribute names must be strings")]
    InvalidAttributeName { actual: &'static str },

    #[error("only functions and builtins can be called, but this is a '{actual}'")]
    NotCallable { actual: &'static str },

    #[error("cannot coerce a {from} to a string{hint}")]
    NotCoercibleToString {
        from: &'static str,
        hint: &'static str,
    },
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum RangeError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("list index '{index}' is out of bounds")]
    IndexOutOfBounds { index: i64 },

    #[error("'tail' called on an empty list")]
    TailEmptyList,

    #[error("'head' called on an empty list")]
    HeadEmptyList,

    #[error("cannot use a negative integer, {length}, for a value representing length")]
    NegativeLength { length: i64 },
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum ScopeError {
    #[error("tried modifying prototype")]
    PrototypeModification,

    #[error("variable '{name}' has already been defined in this scope")]
    AlreadyBound { name: String },

    #[error("attempted to write to a read-only scope (key '{name}')")]
    ReadOnlyWrite { name: String },

    #[error("variable '{name}' could not be found")]
    UnknownVariable { name: String },
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum NixEvalError {
    #[error("error thrown: {0}")]
    Throw(String),

    #[error("assertion failed")]
    AssertionFailed,

    #[error("attribute with name '{name}' could not be found in the set")]
    AttributeNotFound { name: String },

    /// Distinguishes "attribute selection on an attrset missing this key"
    /// from an ordinary type error, so `or_default` can intercept it by
    /// variant instead of by message text.
    #[error("attrset element '{key}' missing at lambda call")]
    AttrMissing { key: String },

    #[error("self-referential evaluation (infinite recursion)")]
    InfiniteRecursion,

    #[error("duplicate attribute key '{key}'")]
    DuplicateAttrsKey { key: String },

    #[error("nested attribute sets or keys can only be merged with literal attribute sets")]
    UnmergeableValue,

    #[error("path anchor could not be resolved: {0}")]
    UnknownAnchor(String),

    #[error("could not resolve path: {0}")]
    NixPathResolution(String),

    #[error("export did not resolve")]
    ExportUnresolved,

    #[error("I/O error: {path}: {error}")]
    IO {
        path: PathBuf,
        #[source]
        error: Rc<std::io::Error>,
    },

    #[error("error parsing JSON: {0}")]
    FromJson(String),

    #[error("error producing JSON: {0}")]
    ToJson(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("error evaluating imported file '{path}': {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        NixEvalError::IO {
            path: PathBuf::new(),
            error: Rc::new(e),
        }
        .into()
    }
}
