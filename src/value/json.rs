//! Conversion between [`Value`] and `serde_json::Value`, backing the
//! `builtins.toJSON`/`builtins.fromJSON` pair.
//!
//! This can't be done through a plain `serde::Serialize` derive: sets
//! with a `__toString` or `outPath` attribute serialise through that
//! attribute rather than structurally, mirroring how Nix itself renders
//! such sets as strings almost everywhere.

use serde_json::{Map, Number, Value as Json};

use crate::errors::{Error, NixEvalError};

use super::{CoercionKind, Value};

impl Value {
    /// Converts this value to JSON, forcing thunks as it descends.
    pub fn to_json(&self) -> Result<Json, Error> {
        let forced = self.force()?;

        let value = match &*forced {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Integer(i) => Json::Number(Number::from(*i)),
            Value::Float(f) => Number::from_f64(*f)
                .map(Json::Number)
                .ok_or_else(|| NixEvalError::ToJson(format!("non-finite float: {f}")))?,
            Value::String(s) => Json::String(s.as_str().to_owned()),
            Value::Path(p) => Json::String(p.to_string_lossy().into_owned()),

            Value::List(l) => {
                let mut out = Vec::with_capacity(l.len());
                for v in l.iter() {
                    out.push(v.to_json()?);
                }
                Json::Array(out)
            }

            Value::Attrs(attrs) => {
                if attrs.select("__toString").is_some() || attrs.select("outPath").is_some() {
                    let s = forced.coerce_to_string(CoercionKind::Strong)?;
                    return Ok(Json::String(s.as_str().to_owned()));
                }

                let mut out = Map::with_capacity(attrs.len());
                for (name, value) in attrs.iter() {
                    out.insert(name.as_str().to_owned(), value.to_json()?);
                }
                Json::Object(out)
            }

            Value::Lambda(_) | Value::Builtin(_) => {
                return Err(NixEvalError::ToJson(format!(
                    "value of type '{}' cannot be represented in JSON",
                    forced.type_of()
                ))
                .into())
            }

            Value::Thunk(_) => unreachable!("force() never returns an unforced thunk"),
        };

        Ok(value)
    }
}

/// Parses JSON text into a [`Value`], via `serde_json`'s `Value`
/// representation and the runtime's `TryFrom<serde_json::Value>` impl.
///
/// Before conversion, any object key named `__proto__` is renamed to
/// `__pollutants__`: `NixAttrs` itself has no prototype to pollute (it is
/// a plain sorted map, not a JavaScript-style object), but a `__proto__`
/// key is still rewritten here so scopes built by `listToAttrs`/`//` from
/// attacker-controlled JSON can never smuggle that reserved name past
/// [`crate::scope::Scope::bind`].
pub fn from_json(input: &str) -> Result<Value, Error> {
    let json: Json =
        serde_json::from_str(input).map_err(|e| NixEvalError::FromJson(e.to_string()))?;
    Value::try_from(sanitise_proto(json)).map_err(Into::into)
}

fn sanitise_proto(json: Json) -> Json {
    match json {
        Json::Array(items) => Json::Array(items.into_iter().map(sanitise_proto).collect()),
        Json::Object(map) => Json::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let k = if k == "__proto__" {
                        "__pollutants__".to_string()
                    } else {
                        k
                    };
                    (k, sanitise_proto(v))
                })
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::NixAttrs;

    #[test]
    fn round_trips_scalars() {
        assert_eq!(Value::Null.to_json().unwrap(), Json::Null);
        assert_eq!(Value::Bool(true).to_json().unwrap(), Json::Bool(true));
        assert_eq!(Value::Integer(5).to_json().unwrap(), Json::Number(5.into()));
    }

    #[test]
    fn from_json_object_becomes_attrs() {
        let v = from_json(r#"{"a": 1, "b": [true, null]}"#).unwrap();
        let attrs = v.to_attrs().unwrap();
        assert_eq!(attrs.select("a").unwrap().as_int().unwrap(), 1);
    }

    #[test]
    fn from_json_renames_proto_key() {
        let v = from_json(r#"{"__proto__": {"x": 1}}"#).unwrap();
        let attrs = v.to_attrs().unwrap();
        assert!(attrs.select("__proto__").is_none());
        assert!(attrs.select("__pollutants__").is_some());
    }

    #[test]
    fn set_with_to_string_serialises_via_call() {
        // Attribute sets without __toString/outPath serialise structurally.
        let attrs = NixAttrs::construct(vec![(
            Value::String("a".into()),
            Value::Integer(1),
        )])
        .unwrap();
        let v = Value::attrs(attrs);
        assert_eq!(v.to_json().unwrap(), serde_json::json!({"a": 1}));
    }
}
