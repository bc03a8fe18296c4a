//! List builtins (C5): the pure, non-IO subset of `builtins.*` operating
//! on `list`-typed values.

use std::cmp::Ordering;

use super::builtin;
use crate::errors::{Error, RangeError};
use crate::value::{NixList, Thunk, Value};

pub(super) fn builtins() -> Vec<(&'static str, Value)> {
    vec![
        builtin!("length", 1, |mut args: Vec<Value>| {
            let list = args.remove(0).to_list()?;
            Ok(Value::Integer(list.len() as i64))
        }),
        builtin!("head", 1, |mut args: Vec<Value>| {
            let list = args.remove(0).to_list()?;
            list.get(0)
                .cloned()
                .ok_or_else(|| RangeError::HeadEmptyList.into())
        }),
        builtin!("tail", 1, |mut args: Vec<Value>| {
            let list = args.remove(0).to_list()?;
            if list.is_empty() {
                return Ok(Value::List(NixList::from(vec![])));
            }
            Ok(Value::List(NixList::from(
                list.iter().skip(1).cloned().collect::<Vec<_>>(),
            )))
        }),
        builtin!("elem", 2, |mut args: Vec<Value>| {
            let list = args.remove(1).to_list()?;
            let needle = args.remove(0);
            for item in list.iter() {
                if needle.nix_eq(item)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }),
        builtin!("elemAt", 2, |mut args: Vec<Value>| {
            let index = args.remove(1).as_int()?;
            let list = args.remove(0).to_list()?;
            if index < 0 || index as usize >= list.len() {
                return Err(RangeError::IndexOutOfBounds { index }.into());
            }
            Ok(list.get(index as usize).cloned().unwrap())
        }),
        builtin!("concatLists", 1, |mut args: Vec<Value>| {
            let lists = args.remove(0).to_list()?;
            let mut out = NixList::from(vec![]);
            for l in lists.iter() {
                out = out.concat(&l.to_list()?);
            }
            Ok(Value::List(out))
        }),
        builtin!("concatMap", 2, |mut args: Vec<Value>| {
            let list = args.remove(1).to_list()?;
            let f = args.remove(0);
            let mut out = NixList::from(vec![]);
            for item in list.iter() {
                out = out.concat(&f.call(item.clone())?.to_list()?);
            }
            Ok(Value::List(out))
        }),
        builtin!("filter", 2, |mut args: Vec<Value>| {
            let list = args.remove(1).to_list()?;
            let pred = args.remove(0);
            let mut out = Vec::new();
            for item in list.iter() {
                if pred.call(item.clone())?.as_bool()? {
                    out.push(item.clone());
                }
            }
            Ok(Value::List(NixList::from(out)))
        }),
        builtin!("map", 2, |mut args: Vec<Value>| {
            let list = args.remove(1).to_list()?;
            let f = args.remove(0);
            let mut out = Vec::with_capacity(list.len());
            for item in list.iter() {
                let item = item.clone();
                let f = f.clone();
                out.push(Value::Thunk(Thunk::new(move || f.call(item.clone()))));
            }
            Ok(Value::List(NixList::from(out)))
        }),
        builtin!("genList", 2, |mut args: Vec<Value>| {
            let len = args.remove(1).as_int()?;
            if len < 0 {
                return Err(RangeError::NegativeLength { length: len }.into());
            }
            let generator = args.remove(0);

            let mut out = Vec::with_capacity(len as usize);
            for i in 0..len {
                let generator = generator.clone();
                out.push(Value::Thunk(Thunk::new(move || {
                    generator.call(Value::Integer(i))
                })));
            }
            Ok(Value::List(NixList::from(out)))
        }),
        builtin!("foldl'", 3, |mut args: Vec<Value>| {
            let list = args.remove(2).to_list()?;
            let mut acc = args.remove(1);
            let op = args.remove(0);

            for item in list.iter() {
                acc = op.call(acc)?.call(item.clone())?;
                acc.force()?;
            }
            Ok(acc)
        }),
        builtin!("partition", 2, |mut args: Vec<Value>| {
            let list = args.remove(1).to_list()?;
            let pred = args.remove(0);

            let mut right = Vec::new();
            let mut wrong = Vec::new();
            for item in list.iter() {
                if pred.call(item.clone())?.as_bool()? {
                    right.push(item.clone());
                } else {
                    wrong.push(item.clone());
                }
            }

            Ok(Value::attrs(
                crate::value::NixAttrs::construct(vec![
                    (Value::from("right"), Value::List(NixList::from(right))),
                    (Value::from("wrong"), Value::List(NixList::from(wrong))),
                ])
                .expect("literal keys are distinct"),
            ))
        }),
        builtin!("sort", 2, |mut args: Vec<Value>| {
            let list = args.remove(1).to_list()?;
            let cmp = args.remove(0);

            let mut items: Vec<Value> = list.iter().cloned().collect();
            let mut sort_err = None;
            items.sort_by(|a, b| {
                if sort_err.is_some() {
                    return Ordering::Equal;
                }
                match cmp.call(a.clone()).and_then(|f| f.call(b.clone())) {
                    Ok(less) => match less.as_bool() {
                        Ok(true) => Ordering::Less,
                        Ok(false) => match cmp
                            .call(b.clone())
                            .and_then(|f| f.call(a.clone()))
                            .and_then(|v| v.as_bool())
                        {
                            Ok(true) => Ordering::Greater,
                            Ok(false) => Ordering::Equal,
                            Err(e) => {
                                sort_err = Some(e);
                                Ordering::Equal
                            }
                        },
                        Err(e) => {
                            sort_err = Some(e);
                            Ordering::Equal
                        }
                    },
                    Err(e) => {
                        sort_err = Some(e);
                        Ordering::Equal
                    }
                }
            });

            if let Some(err) = sort_err {
                return Err(err);
            }

            Ok(Value::List(NixList::from(items)))
        }),
        builtin!("groupBy", 2, |mut args: Vec<Value>| {
            let list = args.remove(1).to_list()?;
            let f = args.remove(0);

            let mut groups: Vec<(crate::value::NixString, Vec<Value>)> = Vec::new();
            for item in list.iter() {
                let key = f.call(item.clone())?.to_str()?;
                match groups.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, items)) => items.push(item.clone()),
                    None => groups.push((key, vec![item.clone()])),
                }
            }

            Ok(Value::attrs(
                groups
                    .into_iter()
                    .map(|(k, v)| (k, Value::List(NixList::from(v))))
                    .collect(),
            ))
        }),
        builtin!("all", 2, |mut args: Vec<Value>| {
            let list = args.remove(1).to_list()?;
            let pred = args.remove(0);
            for item in list.iter() {
                if !pred.call(item.clone())?.as_bool()? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }),
        builtin!("any", 2, |mut args: Vec<Value>| {
            let list = args.remove(1).to_list()?;
            let pred = args.remove(0);
            for item in list.iter() {
                if pred.call(item.clone())?.as_bool()? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Lambda;

    fn call(name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let builtins = builtins();
        let (_, f) = builtins.into_iter().find(|(n, _)| *n == name).unwrap();
        let mut result = f;
        for a in args {
            result = result.call(a)?;
        }
        Ok(result)
    }

    fn list(vs: Vec<i64>) -> Value {
        Value::List(NixList::from(vs.into_iter().map(Value::Integer).collect()))
    }

    #[test]
    fn head_of_empty_list_is_range_error() {
        let err = call("head", vec![list(vec![])]).unwrap_err();
        assert!(matches!(err, Error::Range(RangeError::HeadEmptyList)));
    }

    #[test]
    fn tail_of_empty_list_is_empty_list() {
        let v = call("tail", vec![list(vec![])]).unwrap();
        assert_eq!(v.to_list().unwrap().len(), 0);
    }

    #[test]
    fn elem_at_out_of_range() {
        let err = call("elemAt", vec![list(vec![1, 2]), Value::Integer(5)]).unwrap_err();
        assert!(matches!(
            err,
            Error::Range(RangeError::IndexOutOfBounds { index: 5 })
        ));
    }

    #[test]
    fn map_produces_lazy_elements() {
        use std::cell::Cell;
        use std::rc::Rc;

        let calls = Rc::new(Cell::new(0));
        let calls2 = calls.clone();
        let f = Value::Lambda(Lambda::new(Rc::new(move |v: Value| {
            calls2.set(calls2.get() + 1);
            Ok(Value::Integer(v.as_int()? * 2))
        })));

        let mapped = call("map", vec![f, list(vec![1, 2, 3])]).unwrap();
        // The producer must not run until elements are forced.
        assert_eq!(calls.get(), 0);

        let result = mapped.to_list().unwrap();
        assert_eq!(result.get(0).unwrap().as_int().unwrap(), 2);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn gen_list_produces_sequence() {
        let f = Value::Lambda(Lambda::new(std::rc::Rc::new(|v: Value| {
            Ok(Value::Integer(v.as_int()? * 10))
        })));
        let v = call("genList", vec![f, Value::Integer(3)]).unwrap();
        let l = v.to_list().unwrap();
        assert_eq!(l.get(0).unwrap().as_int().unwrap(), 0);
        assert_eq!(l.get(1).unwrap().as_int().unwrap(), 10);
        assert_eq!(l.get(2).unwrap().as_int().unwrap(), 20);
    }

    #[test]
    fn foldl_is_strict() {
        let add = Value::Lambda(Lambda::new(std::rc::Rc::new(|a: Value| {
            Ok(Value::Lambda(Lambda::new(std::rc::Rc::new(move |b: Value| {
                Ok(Value::Integer(a.as_int().unwrap() + b.as_int()?))
            }))))
        })));
        let v = call("foldl'", vec![add, Value::Integer(0), list(vec![1, 2, 3])]).unwrap();
        assert_eq!(v, Value::Integer(6));
    }

    #[test]
    fn partition_splits_by_predicate() {
        let is_even = Value::Lambda(Lambda::new(std::rc::Rc::new(|v: Value| {
            Ok(Value::Bool(v.as_int()? % 2 == 0))
        })));
        let v = call("partition", vec![is_even, list(vec![1, 2, 3, 4])]).unwrap();
        let attrs = v.to_attrs().unwrap();
        assert_eq!(attrs.select("right").unwrap().to_list().unwrap().len(), 2);
        assert_eq!(attrs.select("wrong").unwrap().to_list().unwrap().len(), 2);
    }

    #[test]
    fn sort_is_stable_ascending() {
        let less = Value::Lambda(Lambda::new(std::rc::Rc::new(|a: Value| {
            Ok(Value::Lambda(Lambda::new(std::rc::Rc::new(move |b: Value| {
                Ok(Value::Bool(a.as_int().unwrap() < b.as_int()?))
            }))))
        })));
        let v = call("sort", vec![less, list(vec![3, 1, 2])]).unwrap();
        let l = v.to_list().unwrap();
        assert_eq!(l.get(0).unwrap().as_int().unwrap(), 1);
        assert_eq!(l.get(1).unwrap().as_int().unwrap(), 2);
        assert_eq!(l.get(2).unwrap().as_int().unwrap(), 3);
    }

    #[test]
    fn all_and_any() {
        let is_pos = Value::Lambda(Lambda::new(std::rc::Rc::new(|v: Value| {
            Ok(Value::Bool(v.as_int()? > 0))
        })));
        assert_eq!(
            call("all", vec![is_pos.clone(), list(vec![1, 2, 3])]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            call("any", vec![is_pos, list(vec![-1, -2, 3])]).unwrap(),
            Value::Bool(true)
        );
    }

}
