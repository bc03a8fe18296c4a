//! `fromJSON`/`toJSON`, backed by [`crate::value::json`].

use super::builtin;
use crate::errors::NixEvalError;
use crate::value::{json, Value};

pub(super) fn builtins() -> Vec<(&'static str, Value)> {
    vec![
        builtin!("fromJSON", 1, |mut args: Vec<Value>| {
            let s = args.remove(0).to_str()?;
            json::from_json(s.as_str())
        }),
        builtin!("toJSON", 1, |mut args: Vec<Value>| {
            let v = args.remove(0);
            let json = v.to_json()?;
            let s = serde_json::to_string(&json).map_err(|e| NixEvalError::ToJson(e.to_string()))?;
            Ok(Value::from(s))
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::NixAttrs;

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
    fn round_trips_through_json_string() {
        let attrs = Value::attrs(
            NixAttrs::construct(vec![(Value::from("a"), Value::Integer(1))]).unwrap(),
        );
        let s = call("toJSON", vec![attrs]);
        let back = call("fromJSON", vec![s]);
        assert_eq!(back.to_attrs().unwrap().select("a").unwrap().as_int().unwrap(), 1);
    }
}
