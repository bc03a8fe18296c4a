//! This module implements the backing representation of runtime values
//! in the Nix language.
use std::cell::Ref;
use std::ops::Deref;
use std::rc::Rc;
use std::{fmt::Display, path::PathBuf};

mod attrs;
mod builtin;
mod function;
pub mod json;
mod list;
mod path;
mod string;
mod thunk;

use crate::errors::{Error, NixEvalError, TypeError};
pub use attrs::NixAttrs;
pub use builtin::{Builtin, BuiltinFn};
pub use function::{Lambda, LambdaFn};
pub use list::NixList;
pub use path::canon_path;
pub use string::{NixContext, NixString};
pub use thunk::{Thunk, ThunkSet};

/// The runtime value representation. A value that requires deferred
/// evaluation is a [`Value::Thunk`]; every other variant is already in
/// weak head normal form.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(NixString),
    Path(PathBuf),
    Attrs(Rc<NixAttrs>),
    List(NixList),
    Lambda(Lambda),
    Builtin(Builtin),

    /// A deferred computation. Never observed by code outside this
    /// crate in already-forced positions; [`Value::force`] resolves it.
    Thunk(Thunk),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Path(a), Value::Path(b)) => a == b,
            (Value::Attrs(a), Value::Attrs(b)) => Rc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Lambda(a), Value::Lambda(b)) => a.ptr_eq(b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Thunk(a), Value::Thunk(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

macro_rules! gen_cast {
    ( $name:ident, $type:ty, $expected:expr, $variant:pat, $result:expr ) => {
        pub fn $name(&self) -> Result<$type, Error> {
            match self {
                $variant => Ok($result),
                Value::Thunk(thunk) => {
                    thunk.force()?;
                    Self::$name(&thunk.value())
                }
                other => Err(type_error($expected, other)),
            }
        }
    };
}

macro_rules! gen_is {
    ( $name:ident, $variant:pat ) => {
        pub fn $name(&self) -> bool {
            match self {
                $variant => true,
                Value::Thunk(thunk) if thunk.is_forced() => Self::$name(&thunk.value()),
                _ => false,
            }
        }
    };
}

/// Describes what input types are allowed when coercing a `Value` to a
/// string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoercionKind {
    /// Only coerce already "stringly" types (strings, paths), plus sets
    /// carrying a `__toString` or `outPath` attribute.
    Weak,
    /// Additionally coerce `null`, booleans, numbers and lists of
    /// coercible elements.
    Strong,
}

/// A reference to a [`Value`] returned by [`Value::force`], whether the
/// original value was a thunk or not. Derefs to [`Value`].
pub enum ForceResult<'a> {
    ForcedThunk(Ref<'a, Value>),
    Immediate(&'a Value),
}

impl<'a> Deref for ForceResult<'a> {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        match self {
            ForceResult::ForcedThunk(r) => r,
            ForceResult::Immediate(v) => v,
        }
    }
}

impl<T> From<T> for Value
where
    T: Into<NixString>,
{
    fn from(t: T) -> Self {
        Self::String(t.into())
    }
}

impl Value {
    pub fn attrs(attrs: NixAttrs) -> Self {
        Self::Attrs(Rc::new(attrs))
    }

    /// Ensures `self` is forced if it is a thunk, returning a reference
    /// to the resulting (non-thunk) value. Consumption sites call this
    /// explicitly rather than having it happen implicitly, so that the
    /// point at which evaluation can fail is visible in the code.
    pub fn force(&self) -> Result<ForceResult<'_>, Error> {
        match self {
            Self::Thunk(thunk) => {
                thunk.force()?;
                Ok(ForceResult::ForcedThunk(thunk.value()))
            }
            _ => Ok(ForceResult::Immediate(self)),
        }
    }

    /// Coerce a `Value` to a string. See [`CoercionKind`] for which
    /// input types are accepted under which circumstances.
    pub fn coerce_to_string(&self, kind: CoercionKind) -> Result<NixString, Error> {
        let forced = self.force()?;

        match (&*forced, kind) {
            (Value::String(s), _) => Ok(s.clone()),
            (Value::Path(p), _) => Ok(p.to_string_lossy().into_owned().into()),

            (Value::Attrs(attrs), _) => {
                match (attrs.select("__toString"), attrs.select("outPath")) {
                    (None, None) => Err(TypeError::NotCoercibleToString {
                        from: "set",
                        hint: ", missing a `__toString` or `outPath` attribute",
                    }
                    .into()),

                    (Some(f), _) => {
                        let f = f.force()?;
                        let result = match &*f {
                            Value::Lambda(l) => l.call(forced.clone())?,
                            Value::Builtin(b) => b.clone().apply(forced.clone())?,
                            other => {
                                return Err(TypeError::NotCallable {
                                    actual: other.type_of(),
                                }
                                .into())
                            }
                        };
                        match result {
                            Value::String(s) => Ok(s),
                            other => other.coerce_to_string(kind),
                        }
                    }

                    (None, Some(s)) => s.coerce_to_string(kind),
                }
            }

            (Value::Null, CoercionKind::Strong) | (Value::Bool(false), CoercionKind::Strong) => {
                Ok("".into())
            }
            (Value::Bool(true), CoercionKind::Strong) => Ok("1".into()),

            (Value::Integer(i), CoercionKind::Strong) => Ok(format!("{i}").into()),
            (Value::Float(f), CoercionKind::Strong) => {
                Ok(format!("{:.6}", f).into())
            }

            (Value::List(l), CoercionKind::Strong) => l
                .iter()
                .map(|v| v.coerce_to_string(kind))
                .reduce(|acc, string| {
                    let a = acc?;
                    let s = string?;
                    Ok(a.concat(&" ".into()).concat(&s))
                })
                .unwrap_or_else(|| Ok("".into())),

            (Value::Lambda(_), _)
            | (Value::Builtin(_), _)
            | (Value::Null, _)
            | (Value::Bool(_), _)
            | (Value::Integer(_), _)
            | (Value::Float(_), _)
            | (Value::List(_), _) => Err(TypeError::NotCoercibleToString {
                from: forced.type_of(),
                hint: "",
            }
            .into()),

            (Value::Thunk(_), _) => unreachable!("force() never returns an unforced thunk"),
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Path(_) => "path",
            Value::Attrs(_) => "set",
            Value::List(_) => "list",
            Value::Lambda(_) | Value::Builtin(_) => "lambda",
            Value::Thunk(t) if t.is_forced() => t.value().type_of(),
            Value::Thunk(_) => "thunk",
        }
    }

    gen_cast!(as_bool, bool, "bool", Value::Bool(b), *b);
    gen_cast!(as_int, i64, "int", Value::Integer(x), *x);
    gen_cast!(as_float, f64, "float", Value::Float(x), *x);
    gen_cast!(to_str, NixString, "string", Value::String(s), s.clone());
    gen_cast!(to_attrs, Rc<NixAttrs>, "set", Value::Attrs(a), a.clone());
    gen_cast!(to_list, NixList, "list", Value::List(l), l.clone());

    gen_is!(is_path, Value::Path(_));
    gen_is!(is_number, Value::Integer(_) | Value::Float(_));
    gen_is!(is_bool, Value::Bool(_));
    gen_is!(is_null, Value::Null);
    gen_is!(is_string, Value::String(_));
    gen_is!(is_list, Value::List(_));
    gen_is!(is_attrs, Value::Attrs(_));
    gen_is!(is_callable, Value::Lambda(_) | Value::Builtin(_));

    /// Calls this value as a function with a single argument. Forces the
    /// callee first, since thunked lambdas can arise from e.g. `let f =
    /// g; in f x`.
    pub fn call(&self, arg: Value) -> Result<Value, Error> {
        let forced = self.force()?;
        match &*forced {
            Value::Lambda(l) => l.call(arg),
            Value::Builtin(b) => b.clone().apply(arg),
            other => Err(TypeError::NotCallable {
                actual: other.type_of(),
            }
            .into()),
        }
    }

    /// Compares `self` against `other` using Nix's deep structural
    /// equality, forcing thunks as needed.
    pub fn nix_eq(&self, other: &Self) -> Result<bool, Error> {
        let lhs = self.force()?;
        let rhs = other.force()?;

        match (&*lhs, &*rhs) {
            (Value::Null, Value::Null) => Ok(true),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (Value::String(a), Value::String(b)) => Ok(a == b),
            (Value::Path(a), Value::Path(b)) => Ok(a == b),

            (Value::Integer(a), Value::Integer(b)) => Ok(a == b),
            (Value::Integer(a), Value::Float(b)) => Ok(*a as f64 == *b),
            (Value::Float(a), Value::Float(b)) => Ok(a == b),
            (Value::Float(a), Value::Integer(b)) => Ok(*a == *b as f64),

            (Value::List(a), Value::List(b)) => a.nix_eq(b),

            (Value::Attrs(a), Value::Attrs(b)) => {
                if Rc::ptr_eq(a, b) {
                    return Ok(true);
                }
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (k, v1) in a.iter() {
                    match b.select(k.as_str()) {
                        Some(v2) if v1.nix_eq(v2)? => continue,
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }

            // Lambdas and builtins are never equal to anything, including
            // themselves, except by identity (handled by `==` on `Value`
            // directly via `PartialEq`, not through this comparison).
            _ => Ok(false),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(true) => f.write_str("true"),
            Value::Bool(false) => f.write_str("false"),
            Value::Integer(num) => write!(f, "{}", num),
            Value::String(s) => s.fmt(f),
            Value::Path(p) => p.display().fmt(f),
            Value::Attrs(attrs) => attrs.fmt(f),
            Value::List(list) => list.fmt(f),
            Value::Lambda(l) => l.fmt(f),
            Value::Builtin(b) => b.fmt(f),

            // Nix prints floats with a maximum precision of 5 digits.
            Value::Float(num) => {
                write!(f, "{}", format!("{:.5}", num).trim_end_matches(['.', '0']))
            }

            Value::Thunk(t) => t.fmt(f),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<PathBuf> for Value {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Vec<Value>> for Value {
    fn from(val: Vec<Value>) -> Self {
        Self::List(NixList::from(val))
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(NixEvalError::FromJson(format!(
                        "JSON number not representable as a Nix value: {n}"
                    ))
                    .into())
                }
            }
            serde_json::Value::String(s) => Ok(s.into()),
            serde_json::Value::Array(a) => Ok(a
                .into_iter()
                .map(Value::try_from)
                .collect::<Result<Vec<_>, _>>()?
                .into()),
            serde_json::Value::Object(obj) => Ok(Self::attrs(
                obj.into_iter()
                    .map(|(k, v)| Ok((k, Value::try_from(v)?)))
                    .collect::<Result<Vec<(String, Value)>, Error>>()?
                    .into_iter()
                    .collect(),
            )),
        }
    }
}

fn type_error(expected: &'static str, actual: &Value) -> Error {
    TypeError::Mismatch {
        expected,
        actual: actual.type_of(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nix_eq_reflexive() {
        let v = Value::Integer(5);
        assert!(v.nix_eq(&v).unwrap());
    }

    #[test]
    fn nix_eq_int_float_fungibility() {
        let i = Value::Integer(1);
        let f = Value::Float(1.0);
        assert!(i.nix_eq(&f).unwrap());
    }

    #[test]
    fn nix_eq_list_int_float_fungibility() {
        let v1 = Value::List(NixList::from(vec![Value::Integer(1)]));
        let v2 = Value::List(NixList::from(vec![Value::Float(1.0)]));
        assert!(v1.nix_eq(&v2).unwrap());
    }

    #[test]
    fn attrs_update_is_visible_through_nix_eq() {
        let a = Value::attrs(
            NixAttrs::construct(vec![(Value::String("a".into()), Value::Integer(1))]).unwrap(),
        );
        let b = Value::attrs(
            NixAttrs::construct(vec![(Value::String("a".into()), Value::Integer(1))]).unwrap(),
        );
        assert!(a.nix_eq(&b).unwrap());
    }

    #[test]
    fn strong_coercion_of_null_and_bool() {
        assert_eq!(
            Value::Null.coerce_to_string(CoercionKind::Strong).unwrap().as_str(),
            ""
        );
        assert_eq!(
            Value::Bool(true)
                .coerce_to_string(CoercionKind::Strong)
                .unwrap()
                .as_str(),
            "1"
        );
    }

    #[test]
    fn weak_coercion_rejects_bool() {
        assert!(Value::Bool(true).coerce_to_string(CoercionKind::Weak).is_err());
    }
}
