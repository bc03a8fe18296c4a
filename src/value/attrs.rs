//! This module implements Nix attribute sets.
use std::borrow::Borrow;
use std::collections::{btree_map, BTreeMap};
use std::fmt::Display;
use std::iter::FromIterator;
use std::rc::Rc;

use super::string::NixString;
use super::thunk::ThunkSet;
use super::Value;
use crate::errors::{Error, NixEvalError, TypeError};


#[derive(Clone, Debug, Default)]
enum AttrsRep {
    #[default]
    Empty,
    Map(BTreeMap<NixString, Value>),
}

impl AttrsRep {
    fn select(&self, key: &str) -> Option<&Value> {
        match self {
            AttrsRep::Empty => None,
            AttrsRep::Map(map) => map.get(key),
        }
    }

    fn contains(&self, key: &str) -> bool {
        match self {
            AttrsRep::Empty => false,
            AttrsRep::Map(map) => map.contains_key(key),
        }
    }
}

/// An immutable Nix attribute set, backed by a sorted map for
/// deterministic (lexicographic) key iteration.
#[derive(Clone, Debug, Default)]
pub struct NixAttrs(Rc<AttrsRep>);

impl From<BTreeMap<NixString, Value>> for NixAttrs {
    fn from(map: BTreeMap<NixString, Value>) -> Self {
        if map.is_empty() {
            NixAttrs(Rc::new(AttrsRep::Empty))
        } else {
            NixAttrs(Rc::new(AttrsRep::Map(map)))
        }
    }
}

impl<K, V> FromIterator<(K, V)> for NixAttrs
where
    NixString: From<K>,
    Value: From<V>,
{
    fn from_iter<T>(iter: T) -> NixAttrs
    where
        T: IntoIterator<Item = (K, V)>,
    {
        let map: BTreeMap<NixString, Value> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        map.into()
    }
}

impl std::fmt::Display for NixAttrs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut set = ThunkSet::default();
        self.total_fmt(f, &mut set)
    }
}

impl NixAttrs {
    pub(crate) fn total_fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        set: &mut ThunkSet,
    ) -> std::fmt::Result {
        f.write_str("{ ")?;

        for (name, value) in self.iter() {
            write!(f, "{} = ", name.ident_str())?;
            match value {
                Value::Thunk(t) => {
                    if set.insert(t) {
                        t.fmt(f)?;
                    } else {
                        f.write_str("<CYCLE>")?;
                    }
                }
                other => other.fmt(f)?,
            }
            f.write_str("; ")?;
        }

        f.write_str("}")
    }

    pub fn empty() -> Self {
        NixAttrs(Rc::new(AttrsRep::Empty))
    }

    /// Pointer equality, used as a fast path before falling back to
    /// structural comparison.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Merge two attribute sets, the way `//` does: entries from `other`
    /// take precedence. Neither operand is mutated.
    pub fn update(self, other: Self) -> Self {
        match (self.0.as_ref(), other.0.as_ref()) {
            (AttrsRep::Empty, AttrsRep::Empty) => self,
            (AttrsRep::Empty, _) => other,
            (_, AttrsRep::Empty) => self,
            (AttrsRep::Map(_), AttrsRep::Map(_)) => {
                let mut m1 = match Rc::unwrap_or_clone(self.0) {
                    AttrsRep::Map(m) => m,
                    AttrsRep::Empty => unreachable!(),
                };
                let m2 = match Rc::unwrap_or_clone(other.0) {
                    AttrsRep::Map(m) => m,
                    AttrsRep::Empty => unreachable!(),
                };
                m1.extend(m2);
                m1.into()
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.0.as_ref() {
            AttrsRep::Map(map) => map.len(),
            AttrsRep::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.0.as_ref(), AttrsRep::Empty)
    }

    pub fn select(&self, key: &str) -> Option<&Value> {
        self.0.select(key)
    }

    pub fn select_required(&self, key: &str) -> Result<&Value, Error> {
        self.select(key).ok_or_else(|| {
            NixEvalError::AttributeNotFound {
                name: key.to_string(),
            }
            .into()
        })
    }

    pub fn contains<K: Borrow<str>>(&self, key: K) -> bool {
        self.0.contains(key.borrow())
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter(match self.0.as_ref() {
            AttrsRep::Empty => None,
            AttrsRep::Map(map) => Some(map.iter()),
        })
    }

    pub fn keys(&self) -> Keys<'_> {
        Keys(match self.0.as_ref() {
            AttrsRep::Empty => None,
            AttrsRep::Map(map) => Some(map.keys()),
        })
    }

    /// Build an attribute set from an even-length vector of alternating
    /// key/value pairs (as produced by a `{ k1 = v1; k2 = v2; }` literal
    /// after the translator has evaluated each key).
    pub fn construct(mut pairs: Vec<(Value, Value)>) -> Result<Self, Error> {
        if pairs.is_empty() {
            return Ok(Self::empty());
        }

        let mut map = BTreeMap::new();

        for (key, value) in pairs.drain(..) {
            match key {
                Value::String(ks) => set_attr(&mut map, ks, value)?,
                // `{ ${null} = v; }` is valid Nix and simply drops the entry.
                Value::Null => continue,
                other => {
                    return Err(TypeError::InvalidAttributeName {
                        actual: other.type_of(),
                    }
                    .into())
                }
            }
        }

        Ok(map.into())
    }
}

fn set_attr(
    map: &mut BTreeMap<NixString, Value>,
    key: NixString,
    value: Value,
) -> Result<(), Error> {
    match map.entry(key) {
        btree_map::Entry::Occupied(entry) => Err(NixEvalError::DuplicateAttrsKey {
            key: entry.key().to_string(),
        }
        .into()),
        btree_map::Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
    }
}

pub struct Iter<'a>(Option<btree_map::Iter<'a, NixString, Value>>);

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a NixString, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.as_mut()?.next()
    }
}

impl<'a> ExactSizeIterator for Iter<'a> {
    fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |it| it.len())
    }
}

pub struct Keys<'a>(Option<btree_map::Keys<'a, NixString, Value>>);

impl<'a> Iterator for Keys<'a> {
    type Item = &'a NixString;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.as_mut()?.next()
    }
}

impl<'a> IntoIterator for &'a NixAttrs {
    type Item = (&'a NixString, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for NixAttrs {
    type Item = (NixString, Value);
    type IntoIter = btree_map::IntoIter<NixString, Value>;

    fn into_iter(self) -> Self::IntoIter {
        match Rc::unwrap_or_clone(self.0) {
            AttrsRep::Empty => BTreeMap::new().into_iter(),
            AttrsRep::Map(map) => map.into_iter(),
        }
    }
}
