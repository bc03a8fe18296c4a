//! Environment access and the `or_default` attribute-selection helper
//! the translator emits for Nix's `e.attr or fallback` syntax.

use super::builtin;
use crate::errors::{Error, NixEvalError};
use crate::value::Value;

pub(super) fn builtins() -> Vec<(&'static str, Value)> {
    vec![builtin!("getEnv", 1, |mut args: Vec<Value>| {
        let name = args.remove(0).to_str()?;
        Ok(Value::from(
            std::env::var(name.as_str()).unwrap_or_default(),
        ))
    })]
}

/// `e.attr or fallback`: forces `primary`; if that raises
/// [`NixEvalError::AttrMissing`] (the transpiler's signal that an
/// attribute-selector target was missing the key), returns `fallback`
/// forced instead. Any other error, including an unrelated `TypeError`,
/// propagates unchanged.
pub fn or_default(primary: Value, fallback: Value) -> Result<Value, Error> {
    match primary.force() {
        Ok(v) => Ok((*v).clone()),
        Err(Error::Eval(NixEvalError::AttrMissing { .. })) => {
            Ok((*fallback.force()?).clone())
        }
        Err(e) => Err(e),
    }
}
