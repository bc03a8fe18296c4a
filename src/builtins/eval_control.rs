//! Evaluation-control builtins (C5): the handful of builtins that exist
//! purely to force or defer evaluation, or to signal a deliberate
//! failure from Nix code (`abort`, `throw`, `assert`).

use tracing::trace as trace_log;

use super::builtin;
use crate::errors::{Error, NixEvalError, TypeError};
use crate::value::{NixAttrs, Value};

/// Recursively forces `v` through every list element and attr-set value.
fn deep_force(v: &Value) -> Result<(), Error> {
    let forced = v.force()?;
    match &*forced {
        Value::List(l) => {
            for item in l.iter() {
                deep_force(item)?;
            }
        }
        Value::Attrs(a) => {
            for (_, value) in a.iter() {
                deep_force(value)?;
            }
        }
        _ => {}
    }
    Ok(())
}

pub(super) fn builtins() -> Vec<(&'static str, Value)> {
    vec![
        builtin!("seq", 2, |mut args: Vec<Value>| {
            let y = args.remove(1);
            let x = args.remove(0);
            x.force()?;
            Ok(y)
        }),
        builtin!("deepSeq", 2, |mut args: Vec<Value>| {
            let y = args.remove(1);
            let x = args.remove(0);
            deep_force(&x)?;
            Ok(y)
        }),
        builtin!("tryEval", 1, |mut args: Vec<Value>| {
            let e = args.remove(0);
            match e.force() {
                Ok(forced) => Ok(Value::attrs(
                    NixAttrs::construct(vec![
                        (Value::from("success"), Value::Bool(true)),
                        (Value::from("value"), (*forced).clone()),
                    ])
                    .expect("literal keys are distinct"),
                )),
                Err(err) if err.is_catchable() => Ok(Value::attrs(
                    NixAttrs::construct(vec![
                        (Value::from("success"), Value::Bool(false)),
                        (Value::from("value"), Value::Bool(false)),
                    ])
                    .expect("literal keys are distinct"),
                )),
                Err(err) => Err(err),
            }
        }),
        builtin!("abort", 1, |mut args: Vec<Value>| {
            let msg = args.remove(0).coerce_to_string(crate::value::CoercionKind::Strong)?;
            Err(Error::Abort(msg.as_str().to_string()))
        }),
        builtin!("throw", 1, |mut args: Vec<Value>| {
            let msg = args.remove(0).coerce_to_string(crate::value::CoercionKind::Strong)?;
            Err(NixEvalError::Throw(msg.as_str().to_string()).into())
        }),
        builtin!("assert", 1, |mut args: Vec<Value>| {
            let forced = args.remove(0).force()?;
            match &*forced {
                Value::Bool(true) => Ok(Value::Bool(true)),
                Value::Bool(false) => Err(NixEvalError::AssertionFailed.into()),
                other => Err(TypeError::Mismatch {
                    expected: "bool",
                    actual: other.type_of(),
                }
                .into()),
            }
        }),
        builtin!("trace", 2, |mut args: Vec<Value>| {
            let value = args.remove(1);
            let traced = args.remove(0);
            trace_log!(target: "nix_rt::trace", "{}", traced.force()?.to_string());
            Ok(value)
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RangeError;
    use crate::value::NixList;

    fn call(name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let builtins = builtins();
        let (_, f) = builtins.into_iter().find(|(n, _)| *n == name).unwrap();
        let mut result = f;
        for a in args {
            result = result.call(a)?;
        }
        Ok(result)
    }

    #[test]
    fn try_eval_over_throw() {
        let thrown = Value::Thunk(crate::value::Thunk::new(|| {
            Err(NixEvalError::Throw("boo".into()).into())
        }));
        let v = call("tryEval", vec![thrown]).unwrap();
        let attrs = v.to_attrs().unwrap();
        assert_eq!(attrs.select("success").unwrap(), &Value::Bool(false));
        assert_eq!(attrs.select("value").unwrap(), &Value::Bool(false));
    }

    #[test]
    fn try_eval_over_success() {
        let v = call("tryEval", vec![Value::Integer(5)]).unwrap();
        let attrs = v.to_attrs().unwrap();
        assert_eq!(attrs.select("success").unwrap(), &Value::Bool(true));
        assert_eq!(attrs.select("value").unwrap(), &Value::Integer(5));
    }

    #[test]
    fn try_eval_does_not_catch_range_errors() {
        let bad = Value::Thunk(crate::value::Thunk::new(|| {
            Err(RangeError::DivisionByZero.into())
        }));
        let err = call("tryEval", vec![bad]).unwrap_err();
        assert!(matches!(err, Error::Range(RangeError::DivisionByZero)));
    }

    #[test]
    fn assert_false_is_eval_error() {
        let err = call("assert", vec![Value::Bool(false)]).unwrap_err();
        assert!(matches!(err, Error::Eval(NixEvalError::AssertionFailed)));
    }

    #[test]
    fn abort_is_not_catchable() {
        let err = call("abort", vec![Value::from("bye")]).unwrap_err();
        assert!(!err.is_catchable());
    }

    #[test]
    fn deep_seq_forces_nested_structure() {
        use std::cell::Cell;
        use std::rc::Rc;

        let forced = Rc::new(Cell::new(false));
        let forced2 = forced.clone();
        let nested = Value::Thunk(crate::value::Thunk::new(move || {
            forced2.set(true);
            Ok(Value::Integer(1))
        }));
        let list = Value::List(NixList::from(vec![nested]));

        call("deepSeq", vec![list, Value::Integer(0)]).unwrap();
        assert!(forced.get());
    }
}
