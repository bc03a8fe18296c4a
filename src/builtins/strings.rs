//! String-oriented builtins, including version string splitting and
//! comparison.

use super::builtin;
use super::versions::VersionPartsIter;
use crate::errors::Error;
use crate::value::{CoercionKind, NixList, Value};

pub(super) fn builtins() -> Vec<(&'static str, Value)> {
    vec![
        builtin!("stringLength", 1, |mut args: Vec<Value>| {
            let s = args.remove(0).to_str()?;
            Ok(Value::Integer(s.len() as i64))
        }),
        builtin!("baseNameOf", 1, |mut args: Vec<Value>| {
            let s = args.remove(0).coerce_to_string(CoercionKind::Weak)?;
            let base = s.as_str().rsplit('/').next().unwrap_or(s.as_str());
            Ok(Value::from(base))
        }),
        builtin!("dirOf", 1, |mut args: Vec<Value>| {
            let s = args.remove(0).coerce_to_string(CoercionKind::Weak)?;
            let dir = match s.as_str().rfind('/') {
                Some(0) => "/",
                Some(idx) => &s.as_str()[..idx],
                None => "",
            };
            Ok(Value::from(dir))
        }),
        builtin!("concatStringsSep", 2, |mut args: Vec<Value>| {
            let list = args.remove(1).to_list()?;
            let sep = args.remove(0).to_str()?;

            let mut out = String::new();
            for (i, item) in list.iter().enumerate() {
                if i > 0 {
                    out.push_str(sep.as_str());
                }
                out.push_str(item.coerce_to_string(CoercionKind::Weak)?.as_str());
            }
            Ok(Value::from(out))
        }),
        builtin!("toString", 1, |mut args: Vec<Value>| {
            Ok(Value::String(
                args.remove(0).coerce_to_string(CoercionKind::Strong)?,
            ))
        }),
        builtin!("replaceStrings", 3, |mut args: Vec<Value>| {
            let haystack = args.remove(2).to_str()?;
            let to_list = args.remove(1).to_list()?;
            let from_list = args.remove(0).to_list()?;

            let mut froms = Vec::with_capacity(from_list.len());
            for f in from_list.iter() {
                froms.push(f.to_str()?);
            }
            let mut tos = Vec::with_capacity(to_list.len());
            for t in to_list.iter() {
                tos.push(t.to_str()?);
            }

            Ok(Value::from(replace_strings(
                haystack.as_str(),
                &froms,
                &tos,
            )))
        }),
        builtin!("splitVersion", 1, |mut args: Vec<Value>| {
            let s = args.remove(0).to_str()?;
            let parts: Vec<Value> = VersionPartsIter::new(s.as_str())
                .map(|p| Value::from(part_str(&p)))
                .collect();
            Ok(Value::List(NixList::from(parts)))
        }),
        builtin!("compareVersions", 2, |mut args: Vec<Value>| {
            let b = args.remove(1).to_str()?;
            let a = args.remove(0).to_str()?;
            Ok(Value::Integer(compare_versions(a.as_str(), b.as_str())))
        }),
    ]
}

fn part_str<'a>(part: &super::versions::VersionPart<'a>) -> &'a str {
    match part {
        super::versions::VersionPart::Word(w) => w,
        super::versions::VersionPart::Number(n) => n,
    }
}

/// Replaces every non-overlapping occurrence of a `from` string with its
/// paired `to` string, scanning left to right against the original
/// haystack bytes (never against already-substituted output, so
/// inserted replacement text is never rescanned). At every position,
/// `from` entries are tried in argument order and the first match wins;
/// after an empty `from` match, a second empty match is refused at that
/// same position (so a non-empty pattern still gets a chance there)
/// before the position advances by one byte. Once the end of the
/// haystack is reached, the first empty `from` entry (if any) is applied
/// once more, matching `builtins.replaceStrings`.
fn replace_strings(haystack: &str, from: &[crate::value::NixString], to: &[crate::value::NixString]) -> String {
    let bytes = haystack.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0usize;
    let mut empty_string_replace = false;

    'outer: while i < bytes.len() {
        for (f, t) in from.iter().zip(to.iter()) {
            let fb = f.as_str().as_bytes();

            if i + fb.len() > bytes.len() {
                continue;
            }

            if empty_string_replace && fb.is_empty() {
                continue;
            }

            if &bytes[i..i + fb.len()] == fb {
                out.extend_from_slice(t.as_str().as_bytes());
                i += fb.len();
                empty_string_replace = fb.is_empty();
                continue 'outer;
            }
        }

        out.push(bytes[i]);
        i += 1;
        empty_string_replace = false;
    }

    for (f, t) in from.iter().zip(to.iter()) {
        if f.as_str().is_empty() {
            out.extend_from_slice(t.as_str().as_bytes());
            break;
        }
    }

    String::from_utf8(out).expect("replaceStrings operates on valid UTF-8 slices")
}

fn compare_versions(a: &str, b: &str) -> i64 {
    let mut ia = VersionPartsIter::new_for_cmp(a);
    let mut ib = VersionPartsIter::new_for_cmp(b);

    loop {
        match (ia.next(), ib.next()) {
            (None, None) => return 0,
            (None, Some(_)) => return -1,
            (Some(_), None) => return 1,
            (Some(pa), Some(pb)) => match pa.cmp(&pb) {
                std::cmp::Ordering::Equal => continue,
                std::cmp::Ordering::Less => return -1,
                std::cmp::Ordering::Greater => return 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_of_last_component() {
        assert_eq!(
            Value::from("/foo/bar/baz")
                .coerce_to_string(CoercionKind::Weak)
                .unwrap()
                .as_str(),
            "/foo/bar/baz"
        );
        let base = super::super::strings::builtins();
        let (_, f) = base.into_iter().find(|(n, _)| *n == "baseNameOf").unwrap();
        assert_eq!(
            f.call(Value::from("/foo/bar/baz")).unwrap(),
            Value::from("baz")
        );
    }

    #[test]
    fn compare_versions_matches_spec_examples() {
        assert_eq!(compare_versions("2.3pre1", "2.3"), -1);
        assert_eq!(compare_versions("2.3.1", "2.3"), 1);
        assert_eq!(compare_versions("2.3pre3", "2.3pre12"), -1);
        assert_eq!(compare_versions("2.3a", "2.3c"), -1);
    }

    #[test]
    fn replace_strings_is_non_overlapping() {
        let from = vec!["a".into(), "ab".into()];
        let to = vec!["X".into(), "Y".into()];
        assert_eq!(replace_strings("abc", &from, &to), "Xbc");
    }

    #[test]
    fn replace_strings_empty_from_inserts_at_every_position() {
        let from = vec!["".into()];
        let to = vec!["X".into()];
        assert_eq!(replace_strings("abc", &from, &to), "XaXbXcX");
    }

    #[test]
    fn replace_strings_empty_haystack_with_empty_from() {
        let from = vec!["".into()];
        let to = vec!["X".into()];
        assert_eq!(replace_strings("", &from, &to), "X");
    }

    #[test]
    fn replace_strings_tries_non_empty_pattern_after_empty_match() {
        let from = vec!["".into(), "a".into()];
        let to = vec!["X".into(), "Y".into()];
        assert_eq!(replace_strings("a", &from, &to), "XYX");
    }
}
