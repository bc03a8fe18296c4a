//! Attribute-set builtins (C5): enumeration, lookup, merge, and the
//! `listToAttrs`/`mapAttrs`/`removeAttrs` family.

use super::builtin;
use crate::errors::Error;
use crate::value::{NixAttrs, NixList, NixString, Value};

pub(super) fn builtins() -> Vec<(&'static str, Value)> {
    vec![
        builtin!("attrNames", 1, |mut args: Vec<Value>| {
            let attrs = args.remove(0).to_attrs()?;
            Ok(Value::List(NixList::from(
                attrs
                    .keys()
                    .map(|k| Value::String(k.clone()))
                    .collect::<Vec<_>>(),
            )))
        }),
        builtin!("attrValues", 1, |mut args: Vec<Value>| {
            let attrs = args.remove(0).to_attrs()?;
            Ok(Value::List(NixList::from(
                attrs.iter().map(|(_, v)| v.clone()).collect::<Vec<_>>(),
            )))
        }),
        builtin!("hasAttr", 2, |mut args: Vec<Value>| {
            let attrs = args.remove(1).to_attrs()?;
            let key = args.remove(0).to_str()?;
            Ok(Value::Bool(attrs.contains(key.as_str())))
        }),
        builtin!("getAttr", 2, |mut args: Vec<Value>| {
            let attrs = args.remove(1).to_attrs()?;
            let key = args.remove(0).to_str()?;
            attrs.select_required(key.as_str()).cloned()
        }),
        builtin!("intersectAttrs", 2, |mut args: Vec<Value>| {
            let e2 = args.remove(1).to_attrs()?;
            let e1 = args.remove(0).to_attrs()?;
            let mut out = Vec::new();
            for (k, v) in e2.iter() {
                if e1.contains(k.as_str()) {
                    out.push((k.clone(), v.clone()));
                }
            }
            Ok(Value::attrs(out.into_iter().collect()))
        }),
        builtin!("listToAttrs", 1, |mut args: Vec<Value>| {
            let list = args.remove(0).to_list()?;
            let mut out = std::collections::BTreeMap::new();
            for item in list.iter() {
                let entry = item.to_attrs()?;
                let name = entry
                    .select_required(NixString::NAME)?
                    .to_str()?;
                let value = entry.select_required(NixString::VALUE)?.clone();
                // Nix keeps the first occurrence of a duplicate name.
                out.entry(name).or_insert(value);
            }
            Ok(Value::attrs(out.into()))
        }),
        builtin!("mapAttrs", 2, |mut args: Vec<Value>| {
            let attrs = args.remove(1).to_attrs()?;
            let f = args.remove(0);
            let mut out = Vec::with_capacity(attrs.len());
            for (k, v) in attrs.iter() {
                let mapped = f.call(Value::String(k.clone()))?.call(v.clone())?;
                out.push((k.clone(), mapped));
            }
            Ok(Value::attrs(out.into_iter().collect()))
        }),
        builtin!("removeAttrs", 2, |mut args: Vec<Value>| {
            let names = args.remove(1).to_list()?;
            let attrs = args.remove(0).to_attrs()?;

            let mut remove = std::collections::HashSet::new();
            for n in names.iter() {
                remove.insert(n.to_str()?.as_str().to_owned());
            }

            let kept: Vec<(NixString, Value)> = attrs
                .iter()
                .filter(|(k, _)| !remove.contains(k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            Ok(Value::attrs(kept.into_iter().collect()))
        }),
        builtin!("catAttrs", 2, |mut args: Vec<Value>| {
            let list = args.remove(1).to_list()?;
            let key = args.remove(0).to_str()?;

            let mut out = Vec::new();
            for item in list.iter() {
                let attrs = item.to_attrs()?;
                if let Some(v) = attrs.select(key.as_str()) {
                    out.push(v.clone());
                }
            }
            Ok(Value::List(NixList::from(out)))
        }),
        builtin!("parseDrvName", 1, |mut args: Vec<Value>| {
            let s = args.remove(0).to_str()?;
            let (name, version) = parse_drv_name(s.as_str());
            Ok(Value::attrs(
                NixAttrs::construct(vec![
                    (Value::from("name"), Value::from(name)),
                    (Value::from("version"), Value::from(version)),
                ])
                .expect("literal keys are distinct"),
            ))
        }),
    ]
}

/// Splits a `name-version` string on the first `-`.
fn parse_drv_name(s: &str) -> (String, String) {
    match s.split_once('-') {
        Some((name, version)) => (name.to_string(), version.to_string()),
        None => (s.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let builtins = builtins();
        let (_, f) = builtins.into_iter().find(|(n, _)| *n == name).unwrap();
        let mut result = f;
        for a in args {
            result = result.call(a)?;
        }
        Ok(result)
    }

    fn attrs(pairs: Vec<(&str, Value)>) -> Value {
        Value::attrs(
            NixAttrs::construct(
                pairs
                    .into_iter()
                    .map(|(k, v)| (Value::from(k), v))
                    .collect(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn attr_names_is_sorted() {
        let a = attrs(vec![("b", Value::Integer(1)), ("a", Value::Integer(2))]);
        let v = call("attrNames", vec![a]).unwrap();
        let l = v.to_list().unwrap();
        assert_eq!(l.get(0).unwrap().to_str().unwrap().as_str(), "a");
        assert_eq!(l.get(1).unwrap().to_str().unwrap().as_str(), "b");
    }

    #[test]
    fn intersect_attrs_values_come_from_e2() {
        let e1 = attrs(vec![("a", Value::Integer(1)), ("b", Value::Integer(2))]);
        let e2 = attrs(vec![("b", Value::Integer(99)), ("c", Value::Integer(3))]);
        let v = call("intersectAttrs", vec![e1, e2]).unwrap();
        let result = v.to_attrs().unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.select("b").unwrap().as_int().unwrap(), 99);
    }

    #[test]
    fn remove_attrs_does_not_mutate_input() {
        let a = attrs(vec![("a", Value::Integer(1)), ("b", Value::Integer(2))]);
        let names = Value::List(NixList::from(vec![Value::from("a")]));
        let removed = call("removeAttrs", vec![a.clone(), names]).unwrap();
        assert_eq!(removed.to_attrs().unwrap().len(), 1);
        assert_eq!(a.to_attrs().unwrap().len(), 2);
    }

    #[test]
    fn list_to_attrs_keeps_first_duplicate() {
        let make_entry = |name: &str, value: i64| {
            attrs(vec![("name", Value::from(name)), ("value", Value::Integer(value))])
        };
        let list = Value::List(NixList::from(vec![
            make_entry("x", 1),
            make_entry("x", 2),
        ]));
        let v = call("listToAttrs", vec![list]).unwrap();
        let result = v.to_attrs().unwrap();
        assert_eq!(result.select("x").unwrap().as_int().unwrap(), 1);
    }

    #[test]
    fn parse_drv_name_splits_on_first_hyphen() {
        let v = call("parseDrvName", vec![Value::from("nix-tools-1.2")]).unwrap();
        let result = v.to_attrs().unwrap();
        assert_eq!(result.select("name").unwrap().to_str().unwrap().as_str(), "nix");
        assert_eq!(
            result.select("version").unwrap().to_str().unwrap().as_str(),
            "tools-1.2"
        );
    }
}
