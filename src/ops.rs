//! Nix operator semantics (C4): binary and unary operators with their
//! type rules, plus the `_deepMerge`/`_lambdaArgCheck` auxiliaries the
//! translator relies on for `rec`-merge patterns and attr-set lambda
//! arguments.

use crate::errors::{Error, NixEvalError, RangeError, TypeError};
use crate::value::{CoercionKind, NixAttrs, Value};

/// Category name used in `GivenTypesMismatch` messages: `typeOf`
/// distinguishes `int`/`float`, but operator error messages report both
/// under the single category "number", matching Nix's own wording.
fn mismatch_category(v: &Value) -> &'static str {
    match v {
        Value::Integer(_) | Value::Float(_) => "number",
        other => other.type_of(),
    }
}

fn mismatch(lhs: &Value, rhs: &Value) -> Error {
    TypeError::GivenTypesMismatch {
        lhs: mismatch_category(lhs),
        rhs: mismatch_category(rhs),
    }
    .into()
}

enum Num {
    Int(i64),
    Float(f64),
}

fn as_num(v: &Value) -> Result<Num, Error> {
    let forced = v.force()?;
    match &*forced {
        Value::Integer(i) => Ok(Num::Int(*i)),
        Value::Float(f) => Ok(Num::Float(*f)),
        other => Err(TypeError::Mismatch {
            expected: "number",
            actual: other.type_of(),
        }
        .into()),
    }
}

/// `+`. Numbers add, strings/paths concatenate (path + string yields a
/// path), everything else is a type mismatch.
pub fn add(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    let lf = lhs.force()?;
    let rf = rhs.force()?;

    match (&*lf, &*rf) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a + b)),
        (Value::Integer(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
        (Value::Float(a), Value::Integer(b)) => Ok(Value::Float(a + *b as f64)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),

        (Value::String(_), Value::String(_)) | (Value::Path(_), Value::String(_)) => {
            let a = lf.coerce_to_string(CoercionKind::Weak)?;
            let b = rf.coerce_to_string(CoercionKind::Weak)?;
            let joined = a.concat(&b);

            if matches!(&*lf, Value::Path(_)) {
                Ok(Value::Path(joined.as_str().into()))
            } else {
                Ok(Value::String(joined))
            }
        }

        _ => Err(mismatch(&lf, &rf)),
    }
}

macro_rules! arith_op {
    ($name:ident, $op:tt, $zero_check:expr) => {
        pub fn $name(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
            match (as_num(lhs)?, as_num(rhs)?) {
                (Num::Int(a), Num::Int(b)) => {
                    if $zero_check(b as f64) {
                        return Err(RangeError::DivisionByZero.into());
                    }
                    Ok(Value::Integer(a $op b))
                }
                (Num::Int(a), Num::Float(b)) => {
                    if $zero_check(b) {
                        return Err(RangeError::DivisionByZero.into());
                    }
                    Ok(Value::Float(a as f64 $op b))
                }
                (Num::Float(a), Num::Int(b)) => {
                    if $zero_check(b as f64) {
                        return Err(RangeError::DivisionByZero.into());
                    }
                    Ok(Value::Float(a $op b as f64))
                }
                (Num::Float(a), Num::Float(b)) => {
                    if $zero_check(b) {
                        return Err(RangeError::DivisionByZero.into());
                    }
                    Ok(Value::Float(a $op b))
                }
            }
        }
    };
}

arith_op!(sub, -, |_: f64| false);
arith_op!(mul, *, |_: f64| false);
arith_op!(div, /, |b: f64| b == 0.0);

/// `++`. List concatenation.
pub fn concat_lists(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    let a = lhs.to_list()?;
    let b = rhs.to_list()?;
    Ok(Value::List(a.concat(&b)))
}

/// `//`. Shallow right-wins merge producing a new attr-set; neither
/// operand is mutated.
pub fn update(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    let a = lhs.to_attrs()?;
    let b = rhs.to_attrs()?;
    Ok(Value::attrs((*a).clone().update((*b).clone())))
}

/// `&&`.
pub fn and(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    if !lhs.as_bool()? {
        return Ok(Value::Bool(false));
    }
    Ok(Value::Bool(rhs.as_bool()?))
}

/// `||`.
pub fn or(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    if lhs.as_bool()? {
        return Ok(Value::Bool(true));
    }
    Ok(Value::Bool(rhs.as_bool()?))
}

/// `->` (logical implication).
pub fn implication(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    if !lhs.as_bool()? {
        return Ok(Value::Bool(true));
    }
    Ok(Value::Bool(rhs.as_bool()?))
}

/// `==`.
pub fn equal(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    Ok(Value::Bool(lhs.nix_eq(rhs)?))
}

/// `!=`.
pub fn not_equal(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    Ok(Value::Bool(!lhs.nix_eq(rhs)?))
}

fn num_cmp(lhs: &Value, rhs: &Value) -> Result<std::cmp::Ordering, Error> {
    match (as_num(lhs)?, as_num(rhs)?) {
        (Num::Int(a), Num::Int(b)) => Ok(a.cmp(&b)),
        (Num::Int(a), Num::Float(b)) => (a as f64)
            .partial_cmp(&b)
            .ok_or_else(|| TypeError::Incomparable {
                lhs: "float",
                rhs: "float",
            }
            .into()),
        (Num::Float(a), Num::Int(b)) => a
            .partial_cmp(&(b as f64))
            .ok_or_else(|| TypeError::Incomparable {
                lhs: "float",
                rhs: "float",
            }
            .into()),
        (Num::Float(a), Num::Float(b)) => a.partial_cmp(&b).ok_or_else(|| {
            TypeError::Incomparable {
                lhs: "float",
                rhs: "float",
            }
            .into()
        }),
    }
}

pub fn less_than(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    Ok(Value::Bool(num_cmp(lhs, rhs)? == std::cmp::Ordering::Less))
}

pub fn less_eq(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    Ok(Value::Bool(num_cmp(lhs, rhs)? != std::cmp::Ordering::Greater))
}

pub fn greater_than(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    Ok(Value::Bool(num_cmp(lhs, rhs)? == std::cmp::Ordering::Greater))
}

pub fn greater_eq(lhs: &Value, rhs: &Value) -> Result<Value, Error> {
    Ok(Value::Bool(num_cmp(lhs, rhs)? != std::cmp::Ordering::Less))
}

/// Unary `!`.
pub fn not(v: &Value) -> Result<Value, Error> {
    Ok(Value::Bool(!v.as_bool()?))
}

/// Unary `-`.
pub fn negate(v: &Value) -> Result<Value, Error> {
    match as_num(v)? {
        Num::Int(i) => Ok(Value::Integer(-i)),
        Num::Float(f) => Ok(Value::Float(-f)),
    }
}

/// `_deepMerge(attrs, value, path...)`: sets `attrs.p1.p2...pn = value`,
/// creating prototype-free intermediate attr-sets on demand. Fails on
/// an empty path or if a path component crosses a non-attr-set node.
pub fn deep_merge(attrs: &Value, value: Value, path: &[&str]) -> Result<Value, Error> {
    let Some((head, rest)) = path.split_first() else {
        return Err(NixEvalError::Throw("_deepMerge: empty path".into()).into());
    };

    let base = match attrs {
        Value::Attrs(a) => NixAttrs::clone(a),
        Value::Null => NixAttrs::empty(),
        other => {
            return Err(TypeError::Mismatch {
                expected: "set",
                actual: other.type_of(),
            }
            .into())
        }
    };

    let existing = base.select(head).cloned();

    let new_value = if rest.is_empty() {
        value
    } else {
        let nested = existing.unwrap_or(Value::Null);
        deep_merge(&nested, value, rest)?
    };

    let overlay =
        NixAttrs::construct(vec![(Value::String((*head).into()), new_value)])?;
    Ok(Value::attrs(base.update(overlay)))
}

/// `_lambdaArgCheck(actual_attrs, key, fallback?)`: resolves a lambda's
/// named argument. Missing keys fall back to `fallback` (forced) if
/// given, otherwise raise [`NixEvalError::AttrMissing`].
pub fn lambda_arg_check(
    actual: &Value,
    key: &str,
    fallback: Option<&Value>,
) -> Result<Value, Error> {
    let attrs = actual.to_attrs()?;

    if let Some(v) = attrs.select(key) {
        return Ok(v.clone());
    }

    match fallback {
        Some(f) => Ok(f.force()?.clone()),
        None => Err(NixEvalError::AttrMissing {
            key: key.to_string(),
        }
        .into()),
    }
}
