//! Arithmetic builtins exposed as named functions (distinct from the `+
//! - * /` operators in [`crate::ops`], which the translator lowers
//! directly; these are the `builtins.add`/`builtins.sub`/... names Nix
//! programs can reference as ordinary values, e.g. to `foldl' builtins.add
//! 0 xs`).

use super::builtin;
use crate::errors::TypeError;
use crate::ops;
use crate::value::Value;

pub(super) fn builtins() -> Vec<(&'static str, Value)> {
    vec![
        builtin!("add", 2, |mut args: Vec<Value>| {
            let b = args.remove(1);
            let a = args.remove(0);
            ops::add(&a, &b)
        }),
        builtin!("sub", 2, |mut args: Vec<Value>| {
            let b = args.remove(1);
            let a = args.remove(0);
            ops::sub(&a, &b)
        }),
        builtin!("mul", 2, |mut args: Vec<Value>| {
            let b = args.remove(1);
            let a = args.remove(0);
            ops::mul(&a, &b)
        }),
        builtin!("div", 2, |mut args: Vec<Value>| {
            let b = args.remove(1);
            let a = args.remove(0);
            ops::div(&a, &b)
        }),
        builtin!("lessThan", 2, |mut args: Vec<Value>| {
            let b = args.remove(1);
            let a = args.remove(0);
            ops::less_than(&a, &b)
        }),
        builtin!("bitAnd", 2, |mut args: Vec<Value>| {
            let b = args.remove(1).as_int()?;
            let a = args.remove(0).as_int()?;
            Ok(Value::Integer(a & b))
        }),
        builtin!("bitOr", 2, |mut args: Vec<Value>| {
            let b = args.remove(1).as_int()?;
            let a = args.remove(0).as_int()?;
            Ok(Value::Integer(a | b))
        }),
        builtin!("ceil", 1, |mut args: Vec<Value>| {
            let f = args.remove(0).force()?;
            let f = match &*f {
                Value::Float(f) => *f,
                Value::Integer(i) => return Ok(Value::Integer(*i)),
                other => {
                    return Err(TypeError::Mismatch {
                        expected: "float",
                        actual: other.type_of(),
                    }
                    .into())
                }
            };
            Ok(Value::Integer(f.ceil() as i64))
        }),
        builtin!("floor", 1, |mut args: Vec<Value>| {
            let f = args.remove(0).force()?;
            let f = match &*f {
                Value::Float(f) => *f,
                Value::Integer(i) => return Ok(Value::Integer(*i)),
                other => {
                    return Err(TypeError::Mismatch {
                        expected: "float",
                        actual: other.type_of(),
                    }
                    .into())
                }
            };
            Ok(Value::Integer(f.floor() as i64))
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> Value {
        let builtins = builtins();
        let (_, f) = builtins.into_iter().find(|(n, _)| *n == name).unwrap();
        let mut result = f;
        for a in args {
            result = result.call(a).unwrap();
        }
        result
    }

    #[test]
    fn add_dispatches_to_operator() {
        assert_eq!(
            call("add", vec![Value::Integer(1), Value::Integer(2)]),
            Value::Integer(3)
        );
    }

    #[test]
    fn ceil_and_floor_round_floats() {
        assert_eq!(call("ceil", vec![Value::Float(1.2)]), Value::Integer(2));
        assert_eq!(call("floor", vec![Value::Float(1.8)]), Value::Integer(1));
    }

    #[test]
    fn bit_and_or() {
        assert_eq!(
            call("bitAnd", vec![Value::Integer(0b110), Value::Integer(0b011)]),
            Value::Integer(0b010)
        );
        assert_eq!(
            call("bitOr", vec![Value::Integer(0b100), Value::Integer(0b011)]),
            Value::Integer(0b111)
        );
    }
}
