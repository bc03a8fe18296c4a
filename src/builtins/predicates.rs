//! Type predicates and `typeOf`.

use super::builtin;
use crate::errors::Error;
use crate::value::Value;

pub(super) fn builtins() -> Vec<(&'static str, Value)> {
    vec![
        builtin!("isAttrs", 1, |mut args: Vec<Value>| {
            Ok(Value::Bool(args.remove(0).force()?.is_attrs()))
        }),
        builtin!("isBool", 1, |mut args: Vec<Value>| {
            Ok(Value::Bool(args.remove(0).force()?.is_bool()))
        }),
        builtin!("isFloat", 1, |mut args: Vec<Value>| {
            let v = args.remove(0);
            let forced = v.force()?;
            Ok(Value::Bool(matches!(&*forced, Value::Float(_))))
        }),
        builtin!("isFunction", 1, |mut args: Vec<Value>| {
            Ok(Value::Bool(args.remove(0).force()?.is_callable()))
        }),
        builtin!("isInt", 1, |mut args: Vec<Value>| {
            let v = args.remove(0);
            let forced = v.force()?;
            Ok(Value::Bool(matches!(&*forced, Value::Integer(_))))
        }),
        builtin!("isList", 1, |mut args: Vec<Value>| {
            Ok(Value::Bool(args.remove(0).force()?.is_list()))
        }),
        // Deprecated upstream, but still part of the language surface.
        builtin!("isNull", 1, |mut args: Vec<Value>| {
            Ok(Value::Bool(args.remove(0).force()?.is_null()))
        }),
        builtin!("isString", 1, |mut args: Vec<Value>| {
            Ok(Value::Bool(args.remove(0).force()?.is_string()))
        }),
        builtin!("typeOf", 1, |mut args: Vec<Value>| {
            let v = args.remove(0);
            let forced = v.force()?;
            Ok(Value::from(forced.type_of()))
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::NixAttrs;

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
    fn type_of_reports_each_type() {
        assert_eq!(
            call("typeOf", vec![Value::Integer(1)]).unwrap(),
            Value::from("int")
        );
        assert_eq!(
            call("typeOf", vec![Value::attrs(NixAttrs::empty())]).unwrap(),
            Value::from("set")
        );
    }

    #[test]
    fn is_int_rejects_float() {
        assert_eq!(
            call("isInt", vec![Value::Float(1.0)]).unwrap(),
            Value::Bool(false)
        );
    }
}
